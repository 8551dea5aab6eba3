use crate::storage::{Article, Category};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Which article text a rule group looks at.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Title,
    TitleOrSubtitle,
}

/// Rules that move articles out of a set of source categories.
struct RuleGroup {
    name: &'static str,
    from: &'static [Category],
    scope: Scope,
    /// Articles carrying this tag match regardless of their text.
    tag: Option<&'static str>,
    rules: &'static [(Category, &'static str)],
}

/// Correction pass over an existing collection, applied group by group.
///
/// The first group splits the catch-all politics section; the rest move
/// lifestyle pieces out of saude and science stories out of tecnologia/mundo.
/// A group sees the category left by the groups before it.
const GROUPS: &[RuleGroup] = &[
    RuleGroup {
        name: "politica",
        from: &[Category::Politica],
        scope: Scope::TitleOrSubtitle,
        tag: None,
        rules: &[
            (
                Category::Educacao,
                r"\b(?:escola|escolar|aluno|aluna|professor|professora|ensino|educação|universidade|faculdade|vestibular|enem|matrícula|aula|creche|merenda|kit escolar|uniforme escolar|rede municipal de ensino|rede estadual|pé-de-meia)\b",
            ),
            (
                Category::Saude,
                r"\b(?:hospital|saúde|médic\w*|doença|tratamento|covid|pandemia|vacina\w*|ubs|upa|samu|dengue|surto|epidemia|gripe|farmácia|cirurgia|leito|sus|ame|pronto-socorro)\b",
            ),
            (
                Category::Esportes,
                r"\b(?:futebol|gol|campeonato|torneio|atleta|vôlei|basquete|natação|olimpíada|superliga|copa|jogo de estrelas|karatê|judô|maratona|corrida|corinthians|são paulo fc|palmeiras)\b",
            ),
            (
                Category::Economia,
                r"\b(?:economia|inflação|pib|mercado financeiro|dólar|bolsa de valores|emprego|vagas? de emprego|desemprego|feira de empregos|licitação|concurso público|iptu|imposto|tribut\w*|orçamento municipal|receita|déficit|superávit|empreendedor|mei|cnpj)\b",
            ),
            (
                Category::Tecnologia,
                r"\b(?:tecnologia|inteligência artificial|app|software|internet|digital|startup|inovação|dados|cibersegurança|blockchain|5g|fibra óptica|smart city)\b",
            ),
            (
                Category::Cultura,
                r"\b(?:festival|carnaval|festa do divino|akimatsuri|desfile|bloco|samba|música|teatro|cinema|museu|exposição|show|artista|cultural|arte|dança|fotografia|patrimônio histórico|biblioteca)\b",
            ),
            (
                Category::Mundo,
                r"\b(?:trump|biden|eua|estados unidos|china|rússia|ucrânia|guerra|onu|otan|papa|vaticano|israel|gaza|hamas|internacional|exterior|diplomacia|acordo internacional)\b",
            ),
        ],
    },
    RuleGroup {
        name: "astro",
        from: &[Category::Saude],
        scope: Scope::Title,
        tag: None,
        rules: &[(
            Category::Cultura,
            r"\b(?:horóscopo|tarot|signos?|baralho cigano|astrolog\w*|zodíac\w*|previsão para os.*signos?|mercúrio em|missão de vida|lua hoje|fase lunar|mapa astral|ascendente)\b",
        )],
    },
    RuleGroup {
        name: "pet",
        from: &[Category::Saude],
        scope: Scope::Title,
        tag: Some("Diário Pet"),
        rules: &[(
            Category::Cultura,
            r"\b(?:cachorros?|gatos?|pets?|animal de estimação|cão|felinos?|ração|raça.*cão|raça.*gato|diário pet)\b",
        )],
    },
    RuleGroup {
        name: "lifestyle",
        from: &[Category::Saude],
        scope: Scope::Title,
        tag: None,
        rules: &[(
            Category::Cultura,
            r"\b(?:receitas?|vinhos?|cerveja|culinária|gastronomia|cozinha|chef|ingredientes?|decoração|revestimento|reforma|jardim|diy|moda|tendência.*2026|coloração de cabelo|organiz\w*|limpeza|dica.*casa)\b",
        )],
    },
    RuleGroup {
        name: "ciencia",
        from: &[Category::Tecnologia, Category::Mundo],
        scope: Scope::Title,
        tag: None,
        rules: &[(
            Category::Ciencia,
            r"\b(?:nasa|espaço sideral|planeta|asteroide|foguete|genética|dna|fóssil|astronomia|biologia|telescópio|satélite|universo|galáxia|lunar|marte|júpiter|cometa|teoria|pesquisadores?\b.*descobr\w*|estudo.*cientí\w*|cientistas?|laboratório|experimento)\b",
        )],
    },
];

struct Compiled {
    group: &'static RuleGroup,
    rules: Vec<(Category, Regex)>,
}

static COMPILED: LazyLock<Vec<Compiled>> = LazyLock::new(|| {
    GROUPS
        .iter()
        .map(|group| Compiled {
            group,
            rules: group
                .rules
                .iter()
                .map(|(target, pattern)| {
                    let re = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .expect("reclassification rule is valid");
                    (*target, re)
                })
                .collect(),
        })
        .collect()
});

/// One category change made by [`reclassify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reclassification {
    pub id: String,
    pub title: String,
    pub from: Category,
    pub to: Category,
    /// Name of the rule group that fired.
    pub rule: &'static str,
}

/// Applies the correction groups to every article in place.
///
/// Returns every change made, in collection order. Articles no rule matches are
/// left untouched; ordering and ids are the caller's business (see
/// [`reindex`](crate::storage::reindex)).
pub fn reclassify(articles: &mut [Article]) -> Vec<Reclassification> {
    let mut changes = Vec::new();
    for article in articles.iter_mut() {
        for compiled in COMPILED.iter() {
            let group = compiled.group;
            if !group.from.contains(&article.category) {
                continue;
            }
            let Some(target) = compiled.target_for(article) else {
                continue;
            };
            tracing::debug!(
                id = %article.id,
                from = %article.category,
                to = %target,
                rule = group.name,
                "Reclassified"
            );
            changes.push(Reclassification {
                id: article.id.clone(),
                title: article.title.clone(),
                from: article.category,
                to: target,
                rule: group.name,
            });
            article.category = target;
        }
    }
    changes
}

impl Compiled {
    fn target_for(&self, article: &Article) -> Option<Category> {
        let tagged = self
            .group
            .tag
            .is_some_and(|tag| article.tags.iter().any(|t| t == tag));

        self.rules.iter().find_map(|(target, re)| {
            let hit = tagged
                || re.is_match(&article.title)
                || matches!(self.group.scope, Scope::TitleOrSubtitle) && re.is_match(&article.subtitle);
            hit.then_some(*target)
        })
    }
}

use crate::storage::Category;
use crate::util::fold_accents;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Keyword rules, evaluated top to bottom on lower-cased, accent-folded text.
///
/// Order is priority: the specific sections come first so that a headline like
/// "Governo anuncia novo imposto" lands in economia before the broad politics
/// rule sees "governo".
pub const KEYWORD_RULES: &[(Category, &str)] = &[
    (
        Category::Esportes,
        r"\b(?:esporte|futebol|gols?\b|campeonato|copa do (?:mundo|brasil)|libertadores|brasileirao|olimpiad|olimpic|nba\b|corinthians|palmeiras|flamengo|formula 1|mma\b|ufc\b|volei|basquete|atleta)",
    ),
    (
        Category::Saude,
        r"\b(?:saude|vacina|hospital|medic|covid|pandemia|doenca|cancer|oms\b|sus\b|tratamento|dengue|epidemia|surto)",
    ),
    (
        Category::Educacao,
        r"\b(?:educacao|educacional|escola|universidade|faculdade|enem\b|vestibular|professor|aluno|ensino|mec\b)",
    ),
    (
        Category::Ciencia,
        r"\b(?:ciencia|cientific|cientista|nasa\b|espacial|planeta|astronom|telescopio|galaxia|pesquisadores|fossil|dna\b|genetic)",
    ),
    (
        Category::Economia,
        r"\b(?:economi|inflacao|pib\b|mercado financeiro|dolar|ibovespa|bolsa de valores|juros|selic|banco central|imposto|tribut|orcamento|desemprego|emprego|financ)",
    ),
    (
        Category::Tecnologia,
        r"\b(?:tecnologi|apple|google|microsoft|inteligencia artificial|ia\b|software|startup|aplicativo|app\b|digital|ciberseguranca|hacker|internet|chatgpt)",
    ),
    (
        Category::Cultura,
        r"\b(?:cultur|cinema|filme|serie\b|musica|show\b|festival|arte\b|teatro|livro|netflix|disney|oscar|carnaval)",
    ),
    (
        Category::Mundo,
        r"\b(?:internacional|eua\b|estados unidos|china|europa|guerra|otan\b|onu\b|trump|biden|ucrania|russia|israel|gaza)",
    ),
    (
        Category::Opiniao,
        r"\b(?:opiniao|editorial|colunista|ponto de vista)",
    ),
    (
        Category::Politica,
        r"\b(?:politic|governo|governador|prefeit|presiden|deputad|senad|congresso|stf\b|eleic|ministr|lula|bolsonaro|camara)",
    ),
];

/// Path fragments for feeds whose section is encoded in the article URL.
pub const URL_RULES: &[(Category, &[&str])] = &[
    (Category::Politica, &["/sp/", "/politica/"]),
    (Category::Tecnologia, &["/tecnologia/", "/inovacao/"]),
    (Category::Mundo, &["/mundo/"]),
    (Category::Economia, &["/economia/", "/trabalho-e-carreira/"]),
    (Category::Educacao, &["/educacao/"]),
    (Category::Saude, &["/ciencia-e-saude/", "/bemestar/"]),
    (Category::Ciencia, &["/ciencia/"]),
    (Category::Cultura, &["/pop-arte/", "/musica/", "/carnaval/"]),
    (Category::Esportes, &["/futebol/", "/esporte/", "/olimpiadas/"]),
    (Category::Tecnologia, &["/fato-ou-fake/"]),
];

/// URL fragments of video playlists and live broadcasts, which are not articles.
const SKIP_URL_FRAGMENTS: &[&str] = &["/playlist/", "/ao-vivo/", "/videos-"];
const SKIP_TITLE_PREFIXES: &[&str] = &["vídeos:", "videos:", "assista ao"];

static SKIP_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:eptv\d|bom dia)").expect("SKIP_TITLE regex is valid")
});

static KEYWORDS: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(KEYWORD_RULES, Category::DEFAULT).expect("built-in keyword rules are valid")
});

/// Ordered (category, pattern) table with a default. First match wins.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Category, Regex)>,
    default: Category,
}

impl Classifier {
    /// Compiles a rule table. Patterns are matched case-insensitively against
    /// accent-folded text, so they should be written without accents.
    pub fn new(rules: &[(Category, &str)], default: Category) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(category, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (*category, re))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { rules, default })
    }

    /// The built-in keyword table.
    pub fn keywords() -> &'static Classifier {
        &KEYWORDS
    }

    pub fn classify(&self, text: &str) -> Category {
        let folded = fold_accents(text).to_lowercase();
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(&folded))
            .map_or(self.default, |(category, _)| *category)
    }

    /// Categories in rule order (a category may appear more than once).
    pub fn order(&self) -> impl Iterator<Item = Category> + '_ {
        self.rules.iter().map(|(category, _)| *category)
    }
}

/// Classifies free text with the built-in keyword table.
///
/// ```
/// use newswire::classify::classify;
/// use newswire::storage::Category;
///
/// assert_eq!(classify("Governo anuncia novo imposto sobre combustíveis"), Category::Economia);
/// assert_eq!(classify("Sem pistas"), Category::Politica);
/// ```
pub fn classify(text: &str) -> Category {
    KEYWORDS.classify(text)
}

/// Text the keyword classifier sees for a feed item.
pub fn classification_text(title: &str, summary: &str, feed_categories: &[String]) -> String {
    let mut text = format!("{title} {summary}");
    for label in feed_categories {
        text.push(' ');
        text.push_str(label);
    }
    text
}

/// Classifies by the article URL's section path.
///
/// Returns `None` for video playlists, live broadcasts and newscast pages,
/// which are skipped by policy rather than imported.
pub fn classify_url(link: &str, title: &str) -> Option<Category> {
    let url = link.to_lowercase();
    let title = title.trim().to_lowercase();

    let is_video = SKIP_URL_FRAGMENTS.iter().any(|f| url.contains(f))
        || SKIP_TITLE_PREFIXES.iter().any(|p| title.starts_with(p))
        || (SKIP_TITLE.is_match(&title) && !title.contains('?'));
    if is_video {
        return None;
    }

    let category = URL_RULES
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| url.contains(f)))
        .map_or(Category::DEFAULT, |(category, _)| *category);
    Some(category)
}

/// `[label, category, first max_feed_tags feed labels]` without empties or repeats.
pub fn build_tags(label: &str, category: Category, feed_categories: &[String], max_feed_tags: usize) -> Vec<String> {
    let candidates = std::iter::once(label)
        .chain(std::iter::once(category.as_str()))
        .chain(feed_categories.iter().take(max_feed_tags).map(String::as_str));

    let mut tags: Vec<String> = Vec::new();
    for tag in candidates.map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

use crate::feed::{FetchFailure, Fetcher, DEFAULT_SOURCE};
use crate::storage::ScrapedArticle;
use crate::util::{collapse_whitespace, normalize_date, strip_control_chars, truncate_chars};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Description length kept from meta tags.
pub const DESCRIPTION_MAX_CHARS: usize = 400;

/// Paragraphs this short (nav crumbs, captions, bylines) are not body text.
const MIN_PARAGRAPH_CHARS: usize = 30;

/// Plain-text fallback length when a container has no real paragraphs.
const FALLBACK_MAX_CHARS: usize = 2000;

/// Main-content containers, most specific markup first.
static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["article", r#"[role="main"]"#, ".article-body", ".content-text", ".post-content"]
        .into_iter()
        .map(|s| Selector::parse(s).expect("container selector is valid"))
        .collect()
});

static NOISE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, nav, footer, aside, .ad, .advertisement, .social-share, .share, .related")
        .expect("noise selector is valid")
});

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").expect("meta selector is valid"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").expect("p selector is valid"));

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    /// The page has no usable title; nothing worth importing was found.
    #[error("could not extract an article from {url}")]
    NoTitle { url: String },
}

/// Fetches a page and extracts it with [`scrape_article`].
pub async fn fetch_article(fetcher: &Fetcher, url: &str) -> Result<ScrapedArticle, ScrapeError> {
    let html = fetcher.fetch(url).await?;
    scrape_article(&html, url)
}

/// Extracts an article draft from a page's Open Graph / meta tags and main content.
///
/// # Errors
///
/// [`ScrapeError::NoTitle`] when neither the meta tags nor `<title>` yield a title.
pub fn scrape_article(html: &str, source_url: &str) -> Result<ScrapedArticle, ScrapeError> {
    let document = Html::parse_document(html);
    let meta = meta_map(&document);
    let pick = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| meta.get(*k))
            .cloned()
            .unwrap_or_default()
    };

    let mut title = clean(&pick(&["og:title", "twitter:title"]));
    if title.is_empty() {
        if let Some(el) = document.select(&TITLE).next() {
            title = clean(&el.text().collect::<String>());
        }
    }
    if title.is_empty() {
        tracing::debug!(url = %source_url, "No title in page");
        return Err(ScrapeError::NoTitle {
            url: source_url.to_owned(),
        });
    }

    let description = clean(&pick(&["og:description", "twitter:description", "description"]));
    let description = truncate_chars(&description, DESCRIPTION_MAX_CHARS).to_owned();

    let site_name = match clean(&pick(&["og:site_name"])) {
        name if !name.is_empty() => name,
        _ => host_label(source_url),
    };

    Ok(ScrapedArticle {
        title,
        description,
        image: pick(&["og:image", "twitter:image"]).trim().to_owned(),
        body_html: extract_body(&document),
        author: clean(&pick(&["author", "article:author"])),
        published_at: normalize_date(&pick(&["article:published_time"])).unwrap_or_default(),
        site_name,
        source_url: source_url.to_owned(),
    })
}

/// `property`/`name` → `content`, keys lower-cased. Later tags override earlier ones.
fn meta_map(document: &Html) -> HashMap<String, String> {
    document
        .select(&META)
        .filter_map(|m| {
            let el = m.value();
            let key = el.attr("property").or_else(|| el.attr("name"))?.trim();
            let content = el.attr("content")?.trim();
            (!key.is_empty() && !content.is_empty()).then(|| (key.to_ascii_lowercase(), content.to_owned()))
        })
        .collect()
}

fn extract_body(document: &Html) -> String {
    let Some(container) = CONTAINERS.iter().find_map(|sel| document.select(sel).next()) else {
        return String::new();
    };

    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .filter(|p| !is_noise(*p, container))
        .map(|p| clean(&p.text().collect::<String>()))
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .map(|text| format!("<p>{}</p>", html_escape::encode_text(&text)))
        .collect();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n");
    }

    let text: String = container
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            (!is_noise(parent, container)).then_some(&**text)
        })
        .collect::<Vec<_>>()
        .join(" ");
    let text = clean(&text);
    if text.is_empty() {
        return String::new();
    }
    format!("<p>{}</p>", html_escape::encode_text(truncate_chars(&text, FALLBACK_MAX_CHARS)))
}

/// Whether `el` or an ancestor below `container` is boilerplate.
fn is_noise(el: ElementRef<'_>, container: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take_while(|node| node.id() != container.id())
        .any(|node| NOISE.matches(&node))
}

fn clean(raw: &str) -> String {
    collapse_whitespace(&strip_control_chars(raw))
}

/// Host without a leading `www.`, used when the page names no site.
fn host_label(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.strip_prefix("www.").unwrap_or(h).to_owned()))
        .unwrap_or_else(|| DEFAULT_SOURCE.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>Fallback | Jornal</title>
  <meta property="og:title" content="Hospital inaugura nova ala de pediatria">
  <meta property="og:description" content="A nova ala tem 40 leitos.">
  <meta property="og:image" content="https://img.example.com/ala.jpg">
  <meta name="author" content="Maria Lima">
  <meta property="article:published_time" content="2026-03-01T14:05:00-03:00">
</head><body>
  <nav><p>Início › Saúde › Notícias de hoje e de ontem</p></nav>
  <article>
    <h1>Hospital inaugura nova ala</h1>
    <p>Curto.</p>
    <p>A nova ala de pediatria conta com 40 leitos & duas salas cirúrgicas.</p>
    <div class="social-share"><p>Compartilhe esta notícia com seus amigos nas redes</p></div>
    <aside><p>Leia também: outra notícia muito interessante sobre saúde</p></aside>
    <p>O investimento foi de R$ 12 milhões, segundo a prefeitura <b>municipal</b>.</p>
    <script>var x = "<p>não é parágrafo de verdade mesmo</p>";</script>
  </article>
</body></html>"#;

    #[test]
    fn test_full_extraction() {
        let article = scrape_article(PAGE, "https://www.jornal.com.br/saude/ala").unwrap();
        assert_eq!(article.title, "Hospital inaugura nova ala de pediatria");
        assert_eq!(article.description, "A nova ala tem 40 leitos.");
        assert_eq!(article.image, "https://img.example.com/ala.jpg");
        assert_eq!(article.author, "Maria Lima");
        assert_eq!(article.published_at, "2026-03-01T17:05");
        assert_eq!(article.site_name, "jornal.com.br");
        assert_eq!(article.source_url, "https://www.jornal.com.br/saude/ala");
        assert_eq!(
            article.body_html,
            "<p>A nova ala de pediatria conta com 40 leitos &amp; duas salas cirúrgicas.</p>\n\
             <p>O investimento foi de R$ 12 milhões, segundo a prefeitura municipal.</p>"
        );
    }

    #[test]
    fn test_title_falls_back_to_twitter_then_document_title() {
        let twitter = r#"<html><head><meta name="twitter:title" content="Via Twitter"><title>Doc</title></head></html>"#;
        assert_eq!(scrape_article(twitter, "https://x.com/a").unwrap().title, "Via Twitter");

        let doc = "<html><head><title>  Só o título  </title></head><body></body></html>";
        let article = scrape_article(doc, "https://x.com/a").unwrap();
        assert_eq!(article.title, "Só o título");
        assert_eq!(article.body_html, "");
        assert_eq!(article.published_at, "");
    }

    #[test]
    fn test_missing_title_is_an_extraction_failure() {
        let err = scrape_article("<html><body><p>nada</p></body></html>", "https://x.com/a").unwrap_err();
        assert!(matches!(err, ScrapeError::NoTitle { .. }));
    }

    #[test]
    fn test_site_name_prefers_og_tag() {
        let html = r#"<html><head><meta property="og:title" content="T"><meta property="OG:SITE_NAME" content="G1"></head></html>"#;
        assert_eq!(scrape_article(html, "https://g1.globo.com/x").unwrap().site_name, "G1");
        let html = r#"<html><head><meta property="og:title" content="T"></head></html>"#;
        assert_eq!(scrape_article(html, "not a url").unwrap().site_name, DEFAULT_SOURCE);
    }

    #[test]
    fn test_description_is_truncated() {
        let long = "a".repeat(1000);
        let html = format!(r#"<html><head><meta property="og:title" content="T"><meta name="description" content="{long}"></head></html>"#);
        let article = scrape_article(&html, "https://x.com/a").unwrap();
        assert_eq!(article.description.chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn test_plain_text_fallback_without_long_paragraphs() {
        let html = r#"<html><head><title>T</title></head><body>
            <div class="post-content">Texto solto <span>sem parágrafos</span><footer>rodapé</footer></div>
        </body></html>"#;
        let article = scrape_article(html, "https://x.com/a").unwrap();
        assert_eq!(article.body_html, "<p>Texto solto sem parágrafos</p>");
    }

    #[test]
    fn test_container_priority() {
        let html = r#"<html><head><title>T</title></head><body>
            <div class="post-content"><p>Este parágrafo está no container genérico do blog.</p></div>
            <div role="main"><p>Este parágrafo está na região principal da página.</p></div>
        </body></html>"#;
        let article = scrape_article(html, "https://x.com/a").unwrap();
        assert_eq!(article.body_html, "<p>Este parágrafo está na região principal da página.</p>");
    }
}

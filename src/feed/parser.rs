//! Tolerant RSS 2.0 / Atom item extraction.
//!
//! Feeds in the wild carry undeclared namespaces, mismatched end tags, raw HTML
//! in `<description>` and broken entities. Rather than validating the document,
//! the extractor streams it with quick-xml, records every element inside an
//! `<item>` or `<entry>` by (lower-cased, qualified) tag name and then applies
//! per-field preference rules to that flat list. Parsing stops at the first
//! hard XML error; items completed before it are kept.

use crate::storage::RawFeedItem;
use crate::util::{clean_text, decode_entities, normalize_date, truncate_chars};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

/// Summary length after tag stripping.
pub const SUMMARY_MAX_CHARS: usize = 300;

/// `source` for items of a feed without a title.
pub const DEFAULT_SOURCE: &str = "Fonte externa";

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("IMG_SRC regex is valid")
});

static ACTIVE_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<iframe\b.*?</iframe\s*>|<(?:script|style|iframe)\b[^>]*>",
    )
    .expect("ACTIVE_BLOCKS regex is valid")
});

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z][^<>]*>").expect("OPEN_TAG regex is valid"));

static PRESENTATION_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s(?:class|style|id)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("PRESENTATION_ATTR regex is valid")
});

/// Result of extracting one feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// The feed's own title, or [`DEFAULT_SOURCE`].
    pub source: String,
    pub items: Vec<RawFeedItem>,
    /// Item blocks dropped for lacking a title or a usable absolute link.
    pub skipped: usize,
}

/// An element captured inside an item block.
#[derive(Debug, Clone)]
struct Element {
    name: String,
    /// 1 for direct children of `<item>`/`<entry>`.
    depth: usize,
    attrs: Vec<(String, String)>,
    /// Raw inner markup: text as written (entities intact), CDATA unwrapped,
    /// nested tags re-serialized.
    text: String,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    fn from_tag(e: &BytesStart<'_>, depth: usize) -> Self {
        Self {
            name: qualified_name(e),
            depth,
            attrs: attributes(e),
            text: String::new(),
        }
    }

    fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Parses an RSS or Atom document into raw items.
///
/// Never fails: a document with no recognizable `<item>`/`<entry>` blocks (an
/// HTML error page, truncated XML, garbage) simply yields no items, which the
/// caller must tell apart from a fetch failure.
pub fn parse_feed(xml: &str) -> ParseOutcome {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut outcome = ParseOutcome::default();
    let mut channel_title: Option<String> = None;

    // Ancestors outside any item block, used to find the channel title.
    let mut outer: Vec<String> = Vec::new();
    let mut capturing_title = false;
    let mut title_buf = String::new();

    // Inside an item block: all captured elements and the indices of the open ones.
    let mut in_item = false;
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    items = outcome.items.len(),
                    "Malformed feed XML, keeping items parsed so far"
                );
                break;
            }
        };

        match event {
            Event::Eof => break,
            Event::Start(e) if in_item => {
                let markup = format!("<{}>", String::from_utf8_lossy(&e));
                for &idx in &open {
                    elements[idx].text.push_str(&markup);
                }
                elements.push(Element::from_tag(&e, open.len() + 1));
                open.push(elements.len() - 1);
            }
            Event::Start(e) => {
                let local = local_name(&e);
                if local == "item" || local == "entry" {
                    in_item = true;
                    elements.clear();
                    open.clear();
                    continue;
                }
                let name = qualified_name(&e);
                let parent = outer.last().map(String::as_str);
                if channel_title.is_none() && name == "title" && matches!(parent, Some("channel" | "feed")) {
                    capturing_title = true;
                    title_buf.clear();
                }
                outer.push(name);
            }
            Event::Empty(e) if in_item => {
                let markup = format!("<{}/>", String::from_utf8_lossy(&e));
                for &idx in &open {
                    elements[idx].text.push_str(&markup);
                }
                elements.push(Element::from_tag(&e, open.len() + 1));
            }
            Event::End(e) if in_item => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                let matching = open.iter().rposition(|&idx| elements[idx].name == name);
                let local = name.rsplit(':').next().unwrap_or(&name);
                if matching.is_none() && (local == "item" || local == "entry") {
                    // Also closes whatever the item left unterminated.
                    in_item = false;
                    match build_item(&elements) {
                        Some(raw) => outcome.items.push(raw),
                        None => outcome.skipped += 1,
                    }
                    continue;
                }
                // Close up to the matching open element; stray end tags are ignored.
                if let Some(pos) = matching {
                    open.truncate(pos);
                    let markup = format!("</{name}>");
                    for &idx in &open {
                        elements[idx].text.push_str(&markup);
                    }
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if capturing_title && name == "title" {
                    capturing_title = false;
                    let title = clean_text(&title_buf);
                    if !title.is_empty() {
                        channel_title = Some(title);
                    }
                }
                if let Some(pos) = outer.iter().rposition(|n| *n == name) {
                    outer.truncate(pos);
                }
            }
            Event::Text(t) => {
                let text = String::from_utf8_lossy(&t);
                if in_item {
                    for &idx in &open {
                        elements[idx].text.push_str(&text);
                    }
                } else if capturing_title {
                    title_buf.push_str(&text);
                }
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t);
                if in_item {
                    for &idx in &open {
                        elements[idx].text.push_str(&text);
                    }
                } else if capturing_title {
                    title_buf.push_str(&text);
                }
            }
            _ => {}
        }
    }

    if in_item {
        tracing::debug!(elements = elements.len(), "Discarding unterminated item at end of feed");
    }
    if outcome.skipped > 0 {
        tracing::debug!(skipped = outcome.skipped, "Items without title or link dropped");
    }

    outcome.source = channel_title.unwrap_or_else(|| DEFAULT_SOURCE.to_owned());
    for raw in &mut outcome.items {
        raw.source.clone_from(&outcome.source);
    }
    outcome
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value)).trim().to_owned();
            (key, value)
        })
        .collect()
}

/// Applies the field preference rules to one item block.
fn build_item(elements: &[Element]) -> Option<RawFeedItem> {
    let child = |name: &str| elements.iter().find(|el| el.depth == 1 && el.name == name && el.has_text());

    let title = child("title").map(|el| clean_text(&el.text)).filter(|t| !t.is_empty())?;
    let link = find_link(elements)?;

    let description = child("description")
        .or_else(|| child("summary"))
        .or_else(|| child("subtitle"))
        .or_else(|| child("atom:subtitle"))
        .or_else(|| child("content"));
    let summary = description
        .map(|el| truncate_chars(&clean_text(&el.text), SUMMARY_MAX_CHARS).to_owned())
        .unwrap_or_default();

    // A description that carries markup is the article body when no content field exists.
    let full_content = child("content:encoded")
        .or_else(|| child("content"))
        .map(|el| sanitize_markup(&el.text))
        .filter(|html| !html.is_empty())
        .or_else(|| {
            child("description")
                .map(|el| sanitize_markup(&el.text))
                .filter(|html| OPEN_TAG.is_match(html))
        });

    let image = find_image(elements, full_content.as_deref(), description.map(|el| el.text.as_str()));

    let author = child("dc:creator")
        .map(|el| clean_text(&el.text))
        .or_else(|| {
            let author = child("author")?;
            // Atom nests <name> (and <email>) inside <author>.
            let name = elements.iter().find(|el| el.depth == 2 && el.name == "name" && el.has_text());
            Some(clean_text(name.map_or(&author.text, |n| &n.text)))
        })
        .unwrap_or_default();

    let published_at = ["pubdate", "published", "updated", "dc:date"]
        .into_iter()
        .find_map(|name| child(name))
        .and_then(|el| normalize_date(&clean_text(&el.text)))
        .unwrap_or_default();

    let source_categories = elements
        .iter()
        .filter(|el| el.depth == 1 && el.name == "category")
        .filter_map(|el| {
            let label = if el.has_text() {
                clean_text(&el.text)
            } else {
                clean_text(el.attr("term")?)
            };
            (!label.is_empty()).then_some(label)
        })
        .collect();

    Some(RawFeedItem {
        title,
        link,
        summary,
        full_content,
        image,
        author,
        published_at,
        source_categories,
        source: String::new(),
    })
}

/// RSS `<link>` text, Atom `<link href>` (alternate first), then a URL-shaped guid.
fn find_link(elements: &[Element]) -> Option<String> {
    let rss_link = elements
        .iter()
        .filter(|el| el.depth == 1 && el.name == "link" && el.has_text())
        .map(|el| clean_text(&el.text));

    let atom_links: Vec<(&str, Option<&str>)> = elements
        .iter()
        .filter(|el| el.depth == 1 && el.name == "link")
        .filter_map(|el| Some((el.attr("href")?, el.attr("rel"))))
        .collect();
    let atom_link = atom_links
        .iter()
        .filter(|(_, rel)| matches!(rel, None | Some("alternate")))
        .chain(atom_links.iter())
        .map(|(href, _)| (*href).to_owned());

    let guid = elements
        .iter()
        .filter(|el| el.depth == 1 && (el.name == "guid" || el.name == "id") && el.has_text())
        .map(|el| clean_text(&el.text));

    rss_link.chain(atom_link).chain(guid).find(|candidate| is_absolute_http(candidate))
}

fn is_absolute_http(candidate: &str) -> bool {
    Url::parse(candidate).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Enclosure → media thumbnail → media content → `<img>` in full content → `<img>` in description.
fn find_image(elements: &[Element], full_content: Option<&str>, description: Option<&str>) -> String {
    let looks_like_image = |el: &Element| {
        el.attr("type").map_or(true, |t| t.to_ascii_lowercase().starts_with("image"))
            || el.attr("medium") == Some("image")
    };

    let enclosure = elements
        .iter()
        .filter(|el| el.name == "enclosure" && looks_like_image(el))
        .find_map(|el| el.attr("url"));
    let thumbnail = || elements.iter().filter(|el| el.name == "media:thumbnail").find_map(|el| el.attr("url"));
    let media = || {
        elements
            .iter()
            .filter(|el| el.name == "media:content" && looks_like_image(el))
            .find_map(|el| el.attr("url"))
    };

    if let Some(url) = enclosure.or_else(thumbnail).or_else(media) {
        return url.to_owned();
    }

    [full_content.map(Cow::Borrowed), description.map(decode_entities)]
        .into_iter()
        .flatten()
        .find_map(|html| first_img_src(&html))
        .unwrap_or_default()
}

fn first_img_src(html: &str) -> Option<String> {
    IMG_SRC
        .captures_iter(html)
        .map(|caps| decode_entities(caps[1].trim()).into_owned())
        .find(|src| src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//"))
}

/// Removes scripts, styles, iframes and presentational attributes from feed HTML.
///
/// Escaped markup (`&lt;p&gt;…`) is decoded first.
pub fn sanitize_markup(raw: &str) -> String {
    let raw = raw.trim();
    let markup = if raw.contains('<') {
        Cow::Borrowed(raw)
    } else {
        decode_entities(raw)
    };
    let without_blocks = ACTIVE_BLOCKS.replace_all(&markup, "");
    OPEN_TAG
        .replace_all(&without_blocks, |caps: &regex::Captures<'_>| {
            PRESENTATION_ATTR.replace_all(&caps[0], "").into_owned()
        })
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const RSS_FULL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
  <title>O Diário de Mogi</title>
  <link>https://www.odiariodemogi.net.br</link>
  <image><title>Logo</title><url>https://www.odiariodemogi.net.br/logo.png</url></image>
  <item>
    <title><![CDATA[Prefeitura &amp; Câmara aprovam orçamento]]></title>
    <link>https://www.odiariodemogi.net.br/politica/orcamento/</link>
    <dc:creator><![CDATA[Redação]]></dc:creator>
    <pubDate>Tue, 17 Feb 2026 09:20:00 -0300</pubDate>
    <category><![CDATA[Política]]></category>
    <category><![CDATA[Cidade]]></category>
    <description><![CDATA[<p>O orçamento de 2026 foi <b>aprovado</b> ontem.</p>]]></description>
    <content:encoded><![CDATA[<p class="lead" style="color:red">Texto completo.</p><script>track()</script><img id="x" src="https://img.example.com/a.jpg"/>]]></content:encoded>
  </item>
</channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog de Ciência</title>
  <entry>
    <title type="html">Telescópio registra &lt;em&gt;nova&lt;/em&gt; galáxia</title>
    <link rel="self" href="https://blog.example.com/entries/1.xml"/>
    <link rel="alternate" type="text/html" href="https://blog.example.com/2026/galaxia"/>
    <id>tag:blog.example.com,2026:1</id>
    <published>2026-01-05T10:30:00+01:00</published>
    <updated>2026-01-06T00:00:00Z</updated>
    <author><name>Ana Souza</name><email>ana@example.com</email></author>
    <category term="astronomia"/>
    <summary>Astrônomos anunciam descoberta.</summary>
    <content type="html">&lt;p&gt;Detalhes da descoberta.&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn test_minimal_item() {
        let xml = "<rss><channel><item><title>Test</title><link>http://x/a</link></item></channel></rss>";
        let outcome = parse_feed(xml);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].title, "Test");
        assert_eq!(outcome.items[0].link, "http://x/a");
        assert_eq!(outcome.items[0].source, DEFAULT_SOURCE);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_full_rss_item() {
        let outcome = parse_feed(RSS_FULL);
        assert_eq!(outcome.source, "O Diário de Mogi");

        let item = &outcome.items[0];
        assert_eq!(item.title, "Prefeitura & Câmara aprovam orçamento");
        assert_eq!(item.link, "https://www.odiariodemogi.net.br/politica/orcamento/");
        assert_eq!(item.author, "Redação");
        assert_eq!(item.published_at, "2026-02-17T12:20");
        assert_eq!(item.source_categories, vec!["Política", "Cidade"]);
        assert_eq!(item.summary, "O orçamento de 2026 foi aprovado ontem.");
        assert_eq!(item.image, "https://img.example.com/a.jpg");
        assert_eq!(item.source, "O Diário de Mogi");

        let content = item.full_content.as_deref().unwrap();
        assert!(content.starts_with("<p>Texto completo.</p>"), "{content}");
        assert!(!content.contains("script"));
        assert!(!content.contains("class="));
        assert!(!content.contains("id="));
    }

    #[test]
    fn test_atom_entry() {
        let outcome = parse_feed(ATOM);
        assert_eq!(outcome.source, "Blog de Ciência");

        let item = &outcome.items[0];
        assert_eq!(item.title, "Telescópio registra nova galáxia");
        assert_eq!(item.link, "https://blog.example.com/2026/galaxia");
        assert_eq!(item.author, "Ana Souza");
        assert_eq!(item.published_at, "2026-01-05T09:30");
        assert_eq!(item.source_categories, vec!["astronomia"]);
        assert_eq!(item.summary, "Astrônomos anunciam descoberta.");
        assert_eq!(item.full_content.as_deref(), Some("<p>Detalhes da descoberta.</p>"));
        assert_eq!(item.image, "");
    }

    #[test]
    fn test_markup_description_becomes_full_content() {
        let paragraphs: String = (1..=10)
            .map(|n| format!("<p style=\"x\">Parágrafo {n} da matéria completa, com bastante texto.</p>"))
            .collect();
        let xml = format!(
            "<rss><channel><item><title>Longa</title><link>http://x/l</link>\
             <description><![CDATA[{paragraphs}<script>x()</script>]]></description></item></channel></rss>"
        );
        let item = &parse_feed(&xml).items[0];
        let content = item.full_content.as_deref().unwrap();
        assert!(content.starts_with("<p>Parágrafo 1 da matéria"), "{content}");
        assert!(content.contains("<p>Parágrafo 10 da matéria"));
        assert!(!content.contains("script"));
        assert_eq!(item.summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_plain_description_is_not_full_content() {
        let xml = "<rss><channel><item><title>T</title><link>http://x/t</link><description>Só texto.</description></item></channel></rss>";
        assert_eq!(parse_feed(xml).items[0].full_content, None);
    }

    #[test]
    fn test_escaped_comparison_signs_in_title() {
        let xml = "<item><title>Juros &lt; 10% e inflação &gt; 5%</title><link>http://x/a</link></item>";
        assert_eq!(parse_feed(xml).items[0].title, "Juros < 10% e inflação > 5%");
    }

    #[test]
    fn test_items_without_title_or_link_are_dropped() {
        let xml = r#"<rss><channel>
            <item><title>Sem link</title></item>
            <item><link>http://x/sem-titulo</link></item>
            <item><title>Relativo</title><link>/noticia/1</link></item>
            <item><title>Ok</title><link>http://x/ok</link></item>
        </channel></rss>"#;
        let outcome = parse_feed(xml);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].title, "Ok");
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn test_guid_used_when_link_missing() {
        let xml = r#"<rss><channel><item><title>Guid</title>
            <guid isPermaLink="true">https://x.com/p/9</guid></item></channel></rss>"#;
        assert_eq!(parse_feed(xml).items[0].link, "https://x.com/p/9");
    }

    #[test]
    fn test_image_resolution_order() {
        let xml = r#"<rss><channel>
            <item><title>A</title><link>http://x/a</link>
              <media:content url="https://img/media.jpg" medium="image"/>
              <media:thumbnail url="https://img/thumb.jpg"/>
              <enclosure url="https://img/audio.mp3" type="audio/mpeg"/>
            </item>
            <item><title>B</title><link>http://x/b</link>
              <description>&lt;img src="https://img/desc.jpg"&gt; texto</description>
            </item>
        </channel></rss>"#;
        let outcome = parse_feed(xml);
        assert_eq!(outcome.items[0].image, "https://img/thumb.jpg");
        assert_eq!(outcome.items[1].image, "https://img/desc.jpg");
        assert_eq!(outcome.items[1].summary, "texto");
    }

    #[test]
    fn test_summary_is_truncated() {
        let long = "palavra ".repeat(100);
        let xml = format!("<rss><channel><item><title>T</title><link>http://x/t</link><description>{long}</description></item></channel></rss>");
        let item = &parse_feed(&xml).items[0];
        assert_eq!(item.summary.chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_unparseable_date_left_empty() {
        let xml = "<rss><channel><item><title>T</title><link>http://x/t</link><pubDate>ontem</pubDate></item></channel></rss>";
        assert_eq!(parse_feed(xml).items[0].published_at, "");
    }

    #[test]
    fn test_truncated_document_keeps_completed_items() {
        let xml = "<rss><channel><item><title>Um</title><link>http://x/1</link></item><item><title>Dois</title><link>http://x/2";
        let outcome = parse_feed(xml);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].title, "Um");
    }

    #[test]
    fn test_mismatched_end_tags_tolerated() {
        let xml = "<rss><channel><item><title>Torto</b></title><link>http://x/t</link></item></channel></rss>";
        let outcome = parse_feed(xml);
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].title, "Torto");
    }

    #[test]
    fn test_unclosed_child_does_not_swallow_next_item() {
        let xml = "<rss><channel><item><title>Um</title><link>http://x/1</link><description>sem fim</item><item><title>Dois</title><link>http://x/2</link></item></channel></rss>";
        let titles: Vec<String> = parse_feed(xml).items.into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Um", "Dois"]);
    }

    #[test]
    fn test_html_page_yields_nothing() {
        let outcome = parse_feed("<!DOCTYPE html><html><head><title>404</title></head><body>Not found</body></html>");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_sanitize_markup() {
        let html = r#"<div class="x"><p style='a' id=main>Oi</p><iframe src="https://ads"></iframe><style>p{}</style></div>"#;
        assert_eq!(sanitize_markup(html), "<div><p>Oi</p></div>");
        assert_eq!(sanitize_markup("&lt;p&gt;Oi&lt;/p&gt;"), "<p>Oi</p>");
    }

    proptest! {
        #[test]
        fn items_with_title_and_link_survive_verbatim(
            entries in prop::collection::vec(
                ("[A-Za-z0-9]{1,12}( [A-Za-z0-9]{1,12}){0,3}", "[a-z0-9]{1,16}", any::<bool>()),
                0..8,
            )
        ) {
            let mut xml = String::from("<rss><channel><title>Prop</title>");
            for (title, slug, with_link) in &entries {
                xml.push_str("<item><title>");
                xml.push_str(title);
                xml.push_str("</title>");
                if *with_link {
                    xml.push_str(&format!("<link>http://x/{slug}</link>"));
                }
                xml.push_str("</item>");
            }
            xml.push_str("</channel></rss>");

            let outcome = parse_feed(&xml);
            let expected: Vec<(String, String)> = entries
                .iter()
                .filter(|(_, _, with_link)| *with_link)
                .map(|(title, slug, _)| (title.clone(), format!("http://x/{slug}")))
                .collect();
            let got: Vec<(String, String)> = outcome
                .items
                .iter()
                .map(|item| (item.title.clone(), item.link.clone()))
                .collect();
            prop_assert_eq!(got, expected);
            prop_assert_eq!(outcome.skipped, entries.iter().filter(|(_, _, l)| !*l).count());
        }
    }
}

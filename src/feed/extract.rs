use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize, FeedItem, ParseError};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

static ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<item(?:\s[^>]*)?>([\s\S]*?)</item>").expect("valid item regex"));

/// Splits a syndication document into `<item>` fragments, in document order.
pub fn extract_items(document: &str) -> Vec<&str> {
    ITEM.captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Text of the first `<name>` element in the fragment, or `""` when absent.
pub fn extract_field(fragment: &str, name: &str) -> String {
    FieldScanner::new(fragment, name)
        .next()
        .map(|raw| unwrap_cdata(raw).trim().to_string())
        .unwrap_or_default()
}

/// Text of every `<name>` element in the fragment, in document order.
pub fn extract_all(fragment: &str, name: &str) -> Vec<String> {
    FieldScanner::new(fragment, name)
        .map(|raw| unwrap_cdata(raw).trim().to_string())
        .collect()
}

/// Full content wins over the summary; both missing yields `""`.
pub fn resolve_content(fragment: &str) -> String {
    let content = extract_field(fragment, "content:encoded");
    if !content.is_empty() {
        return content;
    }
    extract_field(fragment, "description")
}

pub fn parse_item(fragment: &str) -> Result<FeedItem, ParseError> {
    check_cdata(fragment)?;

    let title = normalize::decode_entities(&extract_field(fragment, "title"));
    let link = extract_field(fragment, "link");
    let published_at = extract_field(fragment, "pubDate");
    let content = resolve_content(fragment);

    let thumbnail_url = normalize::extract_thumbnail(&content);
    let excerpt = normalize::make_excerpt(&normalize::strip_markup(&content));

    let categories = extract_all(fragment, "category")
        .iter()
        .map(|label| normalize::decode_entities(label))
        .collect();

    Ok(FeedItem {
        title,
        link,
        published_at,
        excerpt,
        thumbnail_url,
        categories,
    })
}

/// Walks `<name ...>inner</name>` pairs without a regex per field name.
/// Self-closing tags (`<link href="..."/>`) are not treated as openings, and
/// `<name` must be followed by `>`, whitespace or `/` so `<linked>` is not a match.
struct FieldScanner<'a> {
    haystack: &'a str,
    open: String,
    close: String,
    pos: usize,
}

impl<'a> FieldScanner<'a> {
    fn new(haystack: &'a str, name: &str) -> Self {
        Self {
            haystack,
            open: format!("<{name}"),
            close: format!("</{name}>"),
            pos: 0,
        }
    }
}

impl<'a> Iterator for FieldScanner<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.haystack[self.pos..];
            let start = self.pos + rest.find(&self.open)?;
            let after_name = start + self.open.len();
            let tag_end = after_name + self.haystack[after_name..].find('>')?;
            let attrs = &self.haystack[after_name..tag_end];

            let boundary_ok = attrs.is_empty()
                || attrs.starts_with(|c: char| c.is_whitespace() || c == '/');
            if !boundary_ok || attrs.ends_with('/') {
                self.pos = tag_end + 1;
                continue;
            }

            let body_start = tag_end + 1;
            let body_len = self.haystack[body_start..].find(&self.close)?;
            let body_end = body_start + body_len;
            self.pos = body_end + self.close.len();
            return Some(&self.haystack[body_start..body_end]);
        }
    }
}

fn unwrap_cdata(raw: &str) -> String {
    if !raw.contains(CDATA_OPEN) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(CDATA_OPEN) {
        out.push_str(&rest[..open]);
        let inner = &rest[open + CDATA_OPEN.len()..];
        match inner.find(CDATA_CLOSE) {
            Some(close) => {
                out.push_str(&inner[..close]);
                rest = &inner[close + CDATA_CLOSE.len()..];
            }
            None => {
                out.push_str(inner);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn check_cdata(fragment: &str) -> Result<(), ParseError> {
    let mut rest = fragment;
    while let Some(open) = rest.find(CDATA_OPEN) {
        let inner = &rest[open + CDATA_OPEN.len()..];
        let close = inner
            .find(CDATA_CLOSE)
            .ok_or(ParseError::UnterminatedCdata { offset: fragment.len() - rest.len() + open })?;
        rest = &inner[close + CDATA_CLOSE.len()..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn items_are_split_non_greedily() {
        let doc = "<rss><channel><title>c</title><item><title>a</title></item>\n<item><title>b</title></item></channel></rss>";
        let items = extract_items(doc);
        assert_eq!(items, vec!["<title>a</title>", "<title>b</title>"]);
    }

    #[test]
    fn no_items_is_empty() {
        assert!(extract_items("<rss><channel></channel></rss>").is_empty());
        assert!(extract_items("").is_empty());
    }

    #[test]
    fn item_tag_with_attributes_is_matched() {
        let doc = r#"<item rdf:about="x"><title>t</title></item>"#;
        assert_eq!(extract_items(doc), vec!["<title>t</title>"]);
    }

    #[test]
    fn field_first_occurrence_wins_and_is_trimmed() {
        let fragment = "<title>\n  First  \n</title><title>Second</title>";
        assert_eq!(extract_field(fragment, "title"), "First");
    }

    #[test]
    fn field_tolerates_attributes() {
        let fragment = r#"<guid isPermaLink="false">https://medium.com/p/1</guid>"#;
        assert_eq!(extract_field(fragment, "guid"), "https://medium.com/p/1");
    }

    #[test]
    fn field_absent_is_empty() {
        assert_eq!(extract_field("<title>t</title>", "link"), "");
        assert_eq!(extract_field("<link>unterminated", "link"), "");
    }

    #[test]
    fn field_skips_self_closing_and_longer_names() {
        let fragment = r#"<link href="https://a.test"/><linked>no</linked><link>https://b.test</link>"#;
        assert_eq!(extract_field(fragment, "link"), "https://b.test");
    }

    #[test]
    fn field_unwraps_cdata() {
        let fragment = "<title><![CDATA[Rust & <Friends>]]></title>";
        assert_eq!(extract_field(fragment, "title"), "Rust & <Friends>");
    }

    #[test]
    fn namespaced_field_names_work() {
        let fragment = "<content:encoded><![CDATA[<p>full</p>]]></content:encoded>";
        assert_eq!(extract_field(fragment, "content:encoded"), "<p>full</p>");
    }

    #[test]
    fn all_categories_in_order_with_duplicates() {
        let fragment = "<category>rust</category><title>x</title><category><![CDATA[web]]></category><category>rust</category>";
        assert_eq!(extract_all(fragment, "category"), vec!["rust", "web", "rust"]);
    }

    #[test]
    fn content_prefers_full_then_summary_then_empty() {
        let both = "<description>short</description><content:encoded>long</content:encoded>";
        assert_eq!(resolve_content(both), "long");

        let summary_only = "<description>short</description>";
        assert_eq!(resolve_content(summary_only), "short");

        let empty_full = "<content:encoded>  </content:encoded><description>short</description>";
        assert_eq!(resolve_content(empty_full), "short");

        assert_eq!(resolve_content("<title>t</title>"), "");
    }

    #[test]
    fn parse_item_builds_record() {
        let fragment = r#"
            <title><![CDATA[Tips &amp; Tricks]]></title>
            <link>https://medium.com/@me/tips-1</link>
            <pubDate>Tue, 01 Oct 2024 10:00:00 GMT</pubDate>
            <category><![CDATA[rust]]></category>
            <category><![CDATA[axum]]></category>
            <content:encoded><![CDATA[<figure><img alt="" src="https://cdn-images-1.medium.com/max/1024/a.png" /></figure><p>Hello&nbsp;there</p>]]></content:encoded>
        "#;

        let item = parse_item(fragment).unwrap();
        assert_eq!(item.title, "Tips & Tricks");
        assert_eq!(item.link, "https://medium.com/@me/tips-1");
        assert_eq!(item.published_at, "Tue, 01 Oct 2024 10:00:00 GMT");
        assert_eq!(item.excerpt, "Hello there...");
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some("https://cdn-images-1.medium.com/max/1024/a.png")
        );
        assert_eq!(item.categories, vec!["rust", "axum"]);
    }

    #[test]
    fn parse_item_without_link_still_yields_record() {
        let item = parse_item("<title>Only a title</title>").unwrap();
        assert_eq!(item.link, "");
        assert_eq!(item.title, "Only a title");
        assert_eq!(item.excerpt, "...");
        assert_eq!(item.thumbnail_url, None);
        assert!(item.categories.is_empty());
    }

    #[test]
    fn parse_item_rejects_unterminated_cdata() {
        let err = parse_item("<title><![CDATA[broken</title>").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedCdata { offset: 7 }));
    }
}

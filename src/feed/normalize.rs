use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Characters kept from the stripped content before the marker is appended.
pub const EXCERPT_CHARS: usize = 200;
pub const TRUNCATION_MARKER: &str = "...";
const MAX_DECODE_ROUNDS: usize = 8;

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"'>]+)["']"#).expect("valid img regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static RESIDUAL_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[#a-zA-Z0-9]+;").expect("valid residual entity regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid entity regex")
});

/// First embedded image source in raw (unstripped) markup.
pub fn extract_thumbnail(raw: &str) -> Option<String> {
    IMG_SRC
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|src| !src.is_empty())
}

/// Removes markup and decodes entities so the result is display-safe plain text.
///
/// Decoding repeats until the text stops changing, so double-escaped input
/// (`&amp;lt;b&amp;gt;`) ends up as stripped text too. Entities that still
/// cannot be decoded are dropped.
pub fn strip_markup(html: &str) -> String {
    let mut text = html.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let without_tags = TAG.replace_all(&text, "");
        let decoded = decode_entities(&without_tags.replace("&nbsp;", " "));
        if decoded == text {
            break;
        }
        text = decoded;
    }

    // each pass that changes anything shortens the text
    loop {
        let without_tags = TAG.replace_all(&text, "");
        let cleaned = RESIDUAL_ENTITY.replace_all(&without_tags, "").into_owned();
        if cleaned == text {
            break;
        }
        text = cleaned;
    }

    text.trim().to_string()
}

/// Takes the first [`EXCERPT_CHARS`] characters and always appends the marker,
/// even when the text is shorter.
pub fn make_excerpt(text: &str) -> String {
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str(TRUNCATION_MARKER);
    excerpt
}

/// Single-pass entity decoding. Unknown named entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match decode_entity(name) {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "copy" => Some('\u{a9}'),
        "reg" => Some('\u{ae}'),
        "hellip" => Some('\u{2026}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "lsquo" => Some('\u{2018}'),
        "rsquo" => Some('\u{2019}'),
        "ldquo" => Some('\u{201c}'),
        "rdquo" => Some('\u{201d}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn thumbnail_is_first_image_source() {
        let html = r#"<p>intro</p><figure><img alt="a" src="https://cdn.example.com/1.png"></figure><img src="https://cdn.example.com/2.png">"#;
        assert_eq!(
            extract_thumbnail(html).as_deref(),
            Some("https://cdn.example.com/1.png")
        );
    }

    #[test]
    fn thumbnail_accepts_single_quotes() {
        let html = "<IMG width='10' src='https://x.test/a.jpg' />";
        assert_eq!(extract_thumbnail(html).as_deref(), Some("https://x.test/a.jpg"));
    }

    #[test]
    fn thumbnail_absent_without_image() {
        assert_eq!(extract_thumbnail("<p>no pictures here</p>"), None);
        assert_eq!(extract_thumbnail(""), None);
    }

    #[test]
    fn strip_removes_tags_and_nbsp() {
        let html = "  <p>Hello&nbsp;<b>world</b></p>\n<br/> ";
        assert_eq!(strip_markup(html), "Hello world");
    }

    #[test]
    fn strip_decodes_entities_without_leaving_markup() {
        let html = "<p>Fish &amp; chips &lt;b&gt;hot&lt;/b&gt; &quot;now&quot;</p>";
        assert_eq!(strip_markup(html), "Fish & chips hot \"now\"");
    }

    #[test]
    fn strip_unwraps_double_escaped_text() {
        assert_eq!(strip_markup("a &amp;amp; b"), "a & b");
        assert_eq!(strip_markup("x &amp;lt;b&amp;gt;bold&amp;lt;/b&amp;gt; y"), "x bold y");
        assert_eq!(strip_markup("&amp;amp;amp;lt;i&amp;amp;amp;gt;"), "");
    }

    #[test]
    fn strip_drops_undecodable_entities() {
        assert_eq!(strip_markup("R&amp;D &bogus; &#39;q"), "R&D  'q");
        assert_eq!(strip_markup("&am&bogus;p;"), "");
        assert_eq!(strip_markup("&#xFFFFFF; tail"), "tail");
    }

    #[test]
    fn excerpt_truncates_and_always_appends_marker() {
        let long = "a".repeat(450);
        let excerpt = make_excerpt(&long);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + TRUNCATION_MARKER.len());
        assert!(excerpt.ends_with("..."));

        assert_eq!(make_excerpt("short"), "short...");
        assert_eq!(make_excerpt(""), "...");
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let text = "é".repeat(300);
        let excerpt = make_excerpt(&text);
        assert_eq!(excerpt.chars().count(), 203);
        assert!(excerpt.starts_with("éé"));
    }

    #[test]
    fn decode_handles_named_and_numeric_references() {
        assert_eq!(decode_entities("&amp;Co&lt;/b&gt;"), "&Co</b>");
        assert_eq!(decode_entities("it&#39;s &apos;ok&apos;"), "it's 'ok'");
        assert_eq!(decode_entities("&#x2019;&#8212;"), "\u{2019}\u{2014}");
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
    }

    #[test]
    fn decode_is_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn decode_leaves_unknown_and_bare_ampersands() {
        assert_eq!(decode_entities("R&D &bogus; &"), "R&D &bogus; &");
        assert_eq!(decode_entities("&copy;&hellip;"), "\u{a9}\u{2026}");
        assert_eq!(decode_entities("&#xFFFFFF;"), "&#xFFFFFF;");
    }
}

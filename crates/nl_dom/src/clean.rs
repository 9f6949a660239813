use lazy_static::lazy_static;
use regex_lite::Regex;

lazy_static! {
    static ref COMMENTS: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Tags whose content never carries articles.
const NOISE_TAGS: &[&str] = &["head", "script", "style", "noscript"];

/// Invisible characters mailers pad preview text with.
const INVISIBLE: &[char] = &['\u{200b}', '\u{200c}', '\u{200d}', '\u{00ad}', '\u{034f}', '\u{feff}'];

/// Strips comments, invisible padding and non-content blocks from an email body.
pub fn clean_html(html: &str) -> String {
    let mut result = COMMENTS.replace_all(html, "").into_owned();
    result = remove_tags(&result, NOISE_TAGS);
    result.retain(|c| !INVISIBLE.contains(&c));
    result
}

pub(crate) fn remove_tags(html: &str, tags: &[&str]) -> String {
    let mut result = html.to_string();
    for tag in tags {
        let pattern = format!(r"(?is)<{0}(\s[^>]*)?>.*?</{0}\s*>", tag);
        if let Ok(re) = Regex::new(&pattern) {
            result = re.replace_all(&result, "").into_owned();
        }
    }
    result
}

/// Collapses runs of whitespace (including non-breaking spaces) into one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace('\u{a0}', " ");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

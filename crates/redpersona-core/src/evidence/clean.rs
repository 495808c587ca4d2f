//! Text normalization for post and comment bodies.

use regex::Regex;
use std::sync::LazyLock;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)\]]+").expect("valid url pattern"));
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/?\b[ur]/\w+").expect("valid mention pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"));
static STRIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~~(.*?)~~").expect("valid strikethrough pattern"));

const REMOVED_MARKERS: [&str; 4] = ["[deleted]", "[removed]", "deleted", "removed"];
const MIN_WORDS: usize = 3;

/// Strips links, user/community mentions and inline markdown, decodes the
/// HTML entities Reddit escapes, and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let text = URL.replace_all(text, "");
    let text = MENTION.replace_all(&text, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = STRIKE.replace_all(&text, "$1");
    let text = text
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for bodies the platform replaced after deletion or moderation.
pub fn is_removed(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    REMOVED_MARKERS.contains(&lower.as_str())
}

/// True when `text` carries enough to say something about its author:
/// at least `min_chars` characters and three words.
pub fn is_substantive(text: &str, min_chars: usize) -> bool {
    text.chars().count() >= min_chars && text.split_whitespace().count() >= MIN_WORDS
}

/// Cuts `text` to at most `max_chars` characters, ending with an ellipsis
/// when shortened.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup() {
        let raw = "**Bold** and *soft* ~~gone~~ see https://example.com/x?y=1 or /r/rust &amp; u/someone";
        assert_eq!(clean_text(raw), "Bold and soft gone see or &");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\n\n b\t c  "), "a b c");
    }

    #[test]
    fn test_clean_text_decodes_quotes() {
        assert_eq!(clean_text("&gt; quoted"), "> quoted");
    }

    #[test]
    fn test_is_removed() {
        assert!(is_removed("[deleted]"));
        assert!(is_removed(" [Removed] "));
        assert!(!is_removed("I removed the battery"));
    }

    #[test]
    fn test_is_substantive() {
        assert!(is_substantive("Hand planes are worth it", 10));
        assert!(!is_substantive("lol same", 0));
        assert!(!is_substantive("a b c", 10));
        assert!(is_substantive("a b c", 5));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_chars("short", 8), "short");
    }
}

//! The citation marker mini-protocol.
//!
//! Inference output cites evidence with markers of the form `source #3`,
//! `[source #3]` or `sources #1, #4 and #7` (case-insensitive). Nothing else
//! counts as a citation; narrative text is never matched against evidence.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[?\bsources?\s*(#\d+(?:\s*(?:,|and|&)\s*#\d+)*)\]?")
        .expect("valid marker pattern")
});
static MARKER_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("valid marker index pattern"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+([.,;:!?)])").expect("valid punctuation pattern"));
static DOUBLE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid spacing pattern"));

/// One marker occurrence in a narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte range of the whole marker, brackets included
    pub span: Range<usize>,
    /// Local indices in the order written
    pub indices: Vec<usize>,
}

/// All markers in `text`, in order of appearance.
pub fn find_markers(text: &str) -> Vec<Marker> {
    MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let list = caps.get(1)?;
            let indices = MARKER_INDEX
                .captures_iter(list.as_str())
                .filter_map(|c| c.get(1)?.as_str().parse::<usize>().ok())
                .collect::<Vec<_>>();
            Some(Marker {
                span: whole.range(),
                indices,
            })
        })
        .collect()
}

/// Distinct local indices referenced in `text`, in order of first reference.
pub fn referenced_indices(text: &str) -> Vec<usize> {
    let mut seen = Vec::new();
    for index in find_markers(text).into_iter().flat_map(|m| m.indices) {
        if !seen.contains(&index) {
            seen.push(index);
        }
    }
    seen
}

/// Replaces every marker with the text produced by `replace`.
///
/// `replace` receives the marker's local indices. When it returns an empty
/// string the marker is removed and the surrounding spacing is tidied.
pub fn rewrite_markers(text: &str, mut replace: impl FnMut(&[usize]) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut removed_any = false;

    for marker in find_markers(text) {
        out.push_str(&text[cursor..marker.span.start]);
        let replacement = replace(&marker.indices);
        if replacement.is_empty() {
            removed_any = true;
        }
        out.push_str(&replacement);
        cursor = marker.span.end;
    }
    out.push_str(&text[cursor..]);

    if removed_any {
        let tidied = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
        DOUBLE_SPACE.replace_all(&tidied, " ").into_owned()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_single_and_list_markers() {
        let text = "Likes Rust [source #1]. Works nights (sources #2, #4 and #3).";
        let markers = find_markers(text);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].indices, vec![1]);
        assert_eq!(&text[markers[0].span.clone()], "[source #1]");
        assert_eq!(markers[1].indices, vec![2, 4, 3]);
    }

    #[test]
    fn test_referenced_indices_dedupes_in_order() {
        let text = "A (Source #3). B (source #1). C (SOURCE #3).";
        assert_eq!(referenced_indices(text), vec![3, 1]);
    }

    #[test]
    fn test_unmarked_text_has_no_indices() {
        assert!(referenced_indices("Probably in their twenties, see post 3 and #4.").is_empty());
    }

    #[test]
    fn test_rewrite_markers() {
        let text = "Likes Rust [source #1] and cats (source #2).";
        let rewritten = rewrite_markers(text, |indices| {
            indices.iter().map(|i| format!("[{}]", i * 10)).collect()
        });
        assert_eq!(rewritten, "Likes Rust [10] and cats ([20]).");
    }

    #[test]
    fn test_rewrite_removes_and_tidies() {
        let text = "Lives in Canada [source #9]. Enjoys hiking [source #1].";
        let rewritten = rewrite_markers(text, |indices| {
            if indices == [9] { String::new() } else { "[1]".to_string() }
        });
        assert_eq!(rewritten, "Lives in Canada. Enjoys hiking [1].");
    }
}

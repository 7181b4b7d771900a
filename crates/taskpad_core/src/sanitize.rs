use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Removes every complete `<!-- ... -->` sequence from `content`.
///
/// Unterminated openers are left in place.
pub fn strip_comments(content: &str) -> String {
    COMMENT_RE.replace_all(content, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::strip_comments;

    #[test]
    fn removes_single_and_multiline_comments() {
        assert_eq!(strip_comments("a<!-- x -->b"), "ab");
        assert_eq!(strip_comments("a<!--\nline\n-->b<!---->c"), "abc");
    }

    #[test]
    fn comment_removal_is_lazy() {
        assert_eq!(strip_comments("<!-- a -->keep<!-- b -->"), "keep");
    }

    #[test]
    fn leaves_unterminated_opener() {
        assert_eq!(strip_comments("text <!-- open"), "text <!-- open");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(strip_comments("Buy milk -> fridge"), "Buy milk -> fridge");
    }
}

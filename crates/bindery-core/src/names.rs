#![forbid(unsafe_code)]

//! Reserved words of the binding-expression language.
//!
//! Widget members whose names collide with a reserved word get an `_`
//! suffix when exposed as attributes, so they stay addressable from
//! expressions without breaking the parser.

use std::borrow::Cow;

/// Words the expression language reserves.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Whether `name` is reserved.
#[must_use]
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.binary_search(&name).is_ok()
}

/// `name` with `_` appended if it is reserved.
#[must_use]
pub fn escape_keyword(name: &str) -> Cow<'_, str> {
    if is_keyword(name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_is_sorted() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }

    #[test]
    fn escapes_only_reserved_words() {
        assert_eq!(escape_keyword("raise"), "raise_");
        assert_eq!(escape_keyword("text"), "text");
        assert!(is_keyword("None"));
        assert!(!is_keyword("none"));
    }
}

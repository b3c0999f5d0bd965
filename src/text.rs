//! Shared text normalization: NFC unicode normalization and whitespace
//! collapsing, applied before any tokenization or hashing happens.

use unicode_normalization::UnicodeNormalization;

/// NFC-normalize, trim, and collapse interior whitespace to single spaces.
/// Returns `None` if the result is empty.
pub fn normalize(raw: &str) -> Option<String> {
    let nfc: String = raw.nfc().collect();
    let collapsed = nfc.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  1   cup   flour  ").as_deref(), Some("1 cup flour"));
    }

    #[test]
    fn empty_becomes_none() {
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn nfc_composes_combining_marks() {
        let decomposed = "cafe\u{0301}";
        let normalized = normalize(decomposed).unwrap();
        assert_eq!(normalized, "caf\u{e9}");
    }
}

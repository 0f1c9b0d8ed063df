use itertools::Itertools;
use quick_xml::escape::unescape;
use std::borrow::Cow;
use tracing::debug;

/// Expand an abbreviated page range such as `"1234-45"` into `"1234-1245"`.
///
/// Both ends must be an optional letter prefix followed by ASCII digits, and
/// the end may only repeat the start's prefix. Anything else is returned as
/// is. A range whose ends are equal collapses to a single page.
pub fn complete_page_range(pages: &str) -> String {
    let Some((from, to)) = pages.split_once('-') else {
        return pages.to_string();
    };
    let (Some((prefix, first)), Some((to_prefix, last))) = (split_page(from), split_page(to))
    else {
        return pages.to_string();
    };
    if !to_prefix.is_empty() && to_prefix != prefix {
        return pages.to_string();
    }

    // Digits are ASCII, so byte offsets are char boundaries
    let last = match first.len().checked_sub(last.len()) {
        Some(kept) if kept > 0 => format!("{}{}", &first[..kept], last),
        _ => last.to_string(),
    };

    if first == last {
        format!("{prefix}{first}")
    } else {
        format!("{prefix}{first}-{prefix}{last}")
    }
}

/// Split a page into its non-digit prefix and trailing ASCII digits.
fn split_page(page: &str) -> Option<(&str, &str)> {
    let (prefix, digits) = page.split_at(page.find(|c: char| c.is_ascii_digit())?);
    digits
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then_some((prefix, digits))
}

/// Join a start and end page into a range, tolerating either side missing.
pub fn join_page_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, _) => String::new(),
        (false, true) => start.to_string(),
        (false, false) => format!("{start}-{end}"),
    }
}

/// Decode XML character references (`&amp;`, `&#946;`, ...) in an extracted value.
///
/// Values containing an unknown entity are returned unchanged.
pub fn decode_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    match unescape(value) {
        Ok(decoded) => decoded,
        Err(error) => {
            debug!(%error, "Keeping value with undecodable entity");
            Cow::Borrowed(value)
        }
    }
}

/// Collapse runs of whitespace (including line breaks from pretty-printed
/// records) into single spaces and trim the ends.
pub fn squash_whitespace(value: &str) -> Cow<'_, str> {
    let needs_work = value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value
            .as_bytes()
            .windows(2)
            .any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
        || value.contains(['\n', '\r', '\t']);
    if needs_work {
        Cow::Owned(value.split_whitespace().join(" "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("1234-45", "1234-1245")]
    #[case("1234", "1234")]
    #[case("123-456", "123-456")]
    #[case("e071674", "e071674")]
    #[case("R575-82", "R575-R582")]
    #[case("12-345", "12-345")]
    #[case("A94-A95", "A94-A95")]
    #[case("01-Apr", "01-Apr")]
    #[case("iii613-iii614", "iii613-iii614")]
    #[case("101-101", "101")]
    #[case("5-e10", "5-e10")]
    #[case("1-2-3", "1-2-3")]
    #[case("12é-3", "12é-3")]
    #[case("1é2-3", "1é2-3")]
    #[case("é12-3", "é12-é13")]
    #[case("１２-３", "１２-３")]
    #[case("", "")]
    fn test_complete_page_range(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(complete_page_range(input), expected);
    }

    #[rstest]
    #[case("", "", "")]
    #[case("", "20", "")]
    #[case("10", "", "10")]
    #[case("10", "20", "10-20")]
    fn test_join_page_range(#[case] start: &str, #[case] end: &str, #[case] expected: &str) {
        assert_eq!(join_page_range(start, end), expected);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("Smith &amp; Jones", "Smith & Jones")]
    #[case("&lt;i&gt;in vivo&lt;/i&gt;", "<i>in vivo</i>")]
    #[case("&#946;-cells", "β-cells")]
    #[case("&#x3B1; helix", "α helix")]
    #[case("A &nbsp; B", "A &nbsp; B")]
    #[case("lonely & ampersand", "lonely & ampersand")]
    fn test_decode_entities(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(decode_entities(input), expected);
    }

    #[test]
    fn test_decode_entities_borrows_when_unchanged() {
        assert!(matches!(decode_entities("no entities"), Cow::Borrowed(_)));
    }

    #[rstest]
    #[case("already clean", "already clean")]
    #[case("  padded  ", "padded")]
    #[case("line\n      continued", "line continued")]
    #[case("tab\tseparated", "tab separated")]
    #[case("", "")]
    fn test_squash_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(squash_whitespace(input), expected);
    }
}

use std::sync::OnceLock;

use regex::Regex;

use super::Paragraphs;
use crate::error::FormattingError;
use crate::models::{PageNumber, PageValue};
use crate::roman;

/// Words accepted between `|| -` and the number, compared case-insensitively.
pub const PAGE_NUMBERING_TOKENS: &[&str] = &["slide", "folie", "seite", "page"];

/// `|| - Seite 12 -`, `||-page IV-`, `|| - Folie 3-5 -`
pub fn page_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let tokens = PAGE_NUMBERING_TOKENS.join("|");
        Regex::new(&format!(
            r"(?i)^\|\|\s*-\s*({tokens})\s+([0-9ivxlcdm]+(?:\s*-\s*[0-9ivxlcdm]+)?)\s*-"
        ))
        .expect("Invalid page number regex")
    })
}

/// Outcome of parsing one marker line.
pub fn parse_page_number(line: &str) -> Option<Result<PageNumber, FormattingError>> {
    let captures = page_number_pattern().captures(line)?;
    let identifier = &captures[1];
    let raw = &captures[2];
    Some(parse_value(raw).map(|(value, arabic)| PageNumber::new(identifier, value, arabic)))
}

fn parse_value(raw: &str) -> Result<(PageValue, bool), FormattingError> {
    let parts: Vec<&str> = raw.split('-').map(str::trim).collect();
    let parsed = parts
        .iter()
        .map(|part| parse_single(part, raw))
        .collect::<Result<Vec<_>, _>>()?;
    match parsed.as_slice() {
        [(n, arabic)] => Ok((PageValue::Single(*n), *arabic)),
        [(start, a), (end, b)] if a == b => Ok((PageValue::Range { start: *start, end: *end }, *a)),
        _ => Err(FormattingError::new(
            "page range mixes arabic and roman numbers",
            raw,
        )),
    }
}

fn parse_single(part: &str, raw: &str) -> Result<(u32, bool), FormattingError> {
    if let Ok(n) = part.parse::<u32>() {
        return Ok((n, true));
    }
    roman::from_roman(part)
        .map(|n| (n, false))
        .map_err(|_| FormattingError::new("cannot recognize page number", raw))
}

fn candidates(
    paragraphs: &Paragraphs,
    ignore_after: Option<usize>,
) -> impl Iterator<Item = (usize, &str)> {
    paragraphs
        .iter()
        .filter(move |(start, _)| ignore_after.is_none_or(|limit| *start <= limit))
        .filter_map(|(start, lines)| match lines {
            [line] if line.starts_with("||") => Some((start, line.as_str())),
            _ => None,
        })
}

/// Collect every page number, together with the markers that could not be
/// parsed. Only paragraphs of exactly one line count as markers; markers
/// after `ignore_after` are not looked at.
pub fn scan_page_numbers(
    paragraphs: &Paragraphs,
    ignore_after: Option<usize>,
) -> (Vec<PageNumber>, Vec<FormattingError>) {
    let mut numbers = Vec::new();
    let mut errors = Vec::new();
    for (start, line) in candidates(paragraphs, ignore_after) {
        match parse_page_number(line) {
            Some(Ok(number)) => numbers.push(number.at_line(start)),
            Some(Err(err)) => errors.push(err.at_line(start)),
            None => {}
        }
    }
    (numbers, errors)
}

/// Page numbers in document order; the first malformed marker is an error.
pub fn try_extract_page_numbers(
    paragraphs: &Paragraphs,
    ignore_after: Option<usize>,
) -> Result<Vec<PageNumber>, FormattingError> {
    let (numbers, mut errors) = scan_page_numbers(paragraphs, ignore_after);
    if errors.is_empty() {
        Ok(numbers)
    } else {
        Err(errors.remove(0))
    }
}

/// Page numbers in document order; malformed markers are skipped.
pub fn extract_page_numbers(paragraphs: &Paragraphs, ignore_after: Option<usize>) -> Vec<PageNumber> {
    let (numbers, errors) = scan_page_numbers(paragraphs, ignore_after);
    for err in errors {
        log::debug!("skipping page number: {err}");
    }
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn single(line: &str) -> Paragraphs {
        [(1, vec![line.to_string()])].into_iter().collect()
    }

    #[rstest]
    #[case("|| - Seite 80 -", 80)]
    #[case("|| -Seite  80 -", 80)]
    #[case("||  - Seite 80-", 80)]
    #[case("|| - seite 80 -", 80)]
    #[case("||-slide 3-", 3)]
    fn test_arabic_page_numbers(#[case] line: &str, #[case] expected: u32) {
        let numbers = extract_page_numbers(&single(line), None);
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].value, PageValue::Single(expected));
        assert!(numbers[0].arabic);
        assert_eq!(numbers[0].line, 1);
    }

    #[rstest]
    #[case("|| - Seite I -", 1)]
    #[case("|| - Seite XVI -", 16)]
    #[case("|| - Seite CCC -", 300)]
    #[case("|| - Seite xi -", 11)]
    fn test_roman_page_numbers(#[case] line: &str, #[case] expected: u32) {
        let numbers = extract_page_numbers(&single(line), None);
        assert_eq!(numbers[0].value, PageValue::Single(expected));
        assert!(!numbers[0].arabic);
    }

    #[test]
    fn test_identifier_is_kept_as_written() {
        let numbers = extract_page_numbers(&single("|| - Folie 2 -"), None);
        assert_eq!(numbers[0].identifier, "Folie");
    }

    #[test]
    fn test_page_range() {
        let numbers = extract_page_numbers(&single("|| - page 100-103 -"), None);
        assert_eq!(numbers[0].value, PageValue::Range { start: 100, end: 103 });
    }

    #[test]
    fn test_not_a_number_is_not_a_marker() {
        assert!(extract_page_numbers(&single("|| - Seite abc -"), None).is_empty());
        assert!(try_extract_page_numbers(&single("|| - Seite abc -"), None).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_roman_numeral() {
        let paragraphs = single("|| - Seite IIIIIVC -");
        assert!(extract_page_numbers(&paragraphs, None).is_empty());

        let err = try_extract_page_numbers(&paragraphs, None).unwrap_err();
        assert_eq!(err.line, Some(1));
        assert_eq!(err.excerpt, "IIIIIVC");
    }

    #[test]
    fn test_marker_must_be_its_own_paragraph() {
        let paragraphs = Paragraphs::from_text("text\n|| - Seite 1 -\n\n|| - Seite 2 -");
        let numbers = extract_page_numbers(&paragraphs, None);
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].line, 4);
    }

    #[test]
    fn test_ignore_after_line() {
        let paragraphs = Paragraphs::from_text("|| - Seite 1 -\n\n|| - Seite 2 -\n\n|| - Seite 3 -");
        assert_eq!(extract_page_numbers(&paragraphs, Some(3)).len(), 2);
        assert_eq!(extract_page_numbers(&paragraphs, None).len(), 3);
    }

    #[test]
    fn test_scan_reports_all_errors() {
        let paragraphs = Paragraphs::from_text("|| - Seite VX -\n\n|| - Seite 2 -\n\n|| - Seite IIII -");
        let (numbers, errors) = scan_page_numbers(&paragraphs, None);
        assert_eq!(numbers.len(), 1);
        assert_eq!(errors.iter().map(|e| e.line).collect::<Vec<_>>(), vec![Some(1), Some(5)]);
    }
}

//! Deriving, checking and repairing the page-number markers of a document.

use std::fmt;
use std::path::Path;

use mdlecture_config::{Phrase, Translator, l10n::capitalize};

use crate::error::{Error, FormattingError};
use crate::io;
use crate::models::{PageNumber, PageValue};
use crate::mparser::{Paragraphs, extract_page_numbers, page_number_pattern, remove_codeblocks};

/// A marker that breaks the monotonic numbering, with the value it should
/// carry instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumberingIssue {
    pub page_number: PageNumber,
    pub expected: PageValue,
}

impl PageNumberingIssue {
    /// The marker rewritten with the expected value.
    pub fn corrected(&self) -> PageNumber {
        PageNumber {
            value: self.expected,
            ..self.page_number.clone()
        }
    }
}

impl fmt::Display for PageNumberingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected page number {}, found {}",
            self.corrected().format_value(),
            self.page_number.format_value()
        )
    }
}

/// The marker to insert at `line`, continuing from the last marker above it.
///
/// Without a predecessor the numbering starts at 1 with the localised word
/// for "page". Fails when the predecessor is already the largest page
/// number that can be represented.
pub fn add_page_number(text: &str, line: usize, translator: &Translator) -> Result<PageNumber, FormattingError> {
    let paragraphs = remove_codeblocks(&Paragraphs::from_text(text));
    let Some(last) = extract_page_numbers(&paragraphs, Some(line)).pop() else {
        return Ok(PageNumber::new(capitalize(translator.get(Phrase::Page)), PageValue::Single(1), true));
    };
    let next = last.value.last().checked_add(1).ok_or_else(|| {
        FormattingError::new("page number has no successor", last.to_string()).at_line(last.line)
    })?;
    Ok(PageNumber::new(last.identifier, PageValue::Single(next), last.arabic))
}

/// Report every marker that does not continue the numbering of its
/// predecessor.
///
/// A change between arabic and roman numerals starts a new sequence, and so
/// does a marker following the largest representable page number. Once a
/// marker was reported, its expected value is what the following marker is
/// compared against. Reversed and empty ranges are reported wherever they
/// occur.
pub fn check_page_numbering(numbers: &[PageNumber]) -> Vec<PageNumberingIssue> {
    let mut issues = Vec::new();
    let mut previous: Option<(PageValue, bool)> = None;

    for number in numbers {
        let (first, last) = (number.value.first(), number.value.last());
        let lowest = first.min(last);
        let start = match previous {
            Some((value, arabic)) if arabic == number.arabic => value.last().checked_add(1).unwrap_or(lowest),
            _ => lowest,
        };
        let malformed = number.value.is_reversed() || (number.value.is_range() && first == last);

        let expected = (malformed || first != start)
            .then(|| value_from(start, first.abs_diff(last)))
            .flatten();
        match expected {
            Some(expected) => {
                previous = Some((expected, number.arabic));
                issues.push(PageNumberingIssue {
                    page_number: number.clone(),
                    expected,
                });
            }
            None => previous = Some((number.value, number.arabic)),
        }
    }
    issues
}

/// `None` when the end of the value would not fit into a page number.
fn value_from(start: u32, width: u32) -> Option<PageValue> {
    if width == 0 {
        return Some(PageValue::Single(start));
    }
    start.checked_add(width).map(|end| PageValue::Range { start, end })
}

/// Rewrite every reported marker with its expected value. Text after the
/// closing `-` of a marker is kept.
pub fn fix_page_numbering(text: &str) -> String {
    let paragraphs = remove_codeblocks(&Paragraphs::from_text(text));
    let issues = check_page_numbering(&extract_page_numbers(&paragraphs, None));
    if issues.is_empty() {
        return text.to_string();
    }

    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for issue in &issues {
        let Some(line) = issue.page_number.line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
            continue;
        };
        let suffix = page_number_pattern()
            .find(line)
            .map(|m| line[m.end()..].to_string())
            .unwrap_or_default();
        log::debug!("line {}: {issue}", issue.page_number.line);
        *line = format!("{}{suffix}", issue.corrected());
    }
    lines.join("\n")
}

/// Fix the page numbering of a file in place; returns whether it changed.
pub fn fix_page_numbering_in_file(path: &Path) -> Result<bool, Error> {
    let text = io::read_file(path)?;
    let fixed = fix_page_numbering(&text);
    if fixed == text {
        return Ok(false);
    }
    io::write_file(path, &fixed)?;
    log::info!("fixed page numbering in {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdlecture_config::Language;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const EXAMPLE_DOCUMENT: &str = "|| - Seite 1 -\n\n|| - slide XI -\n\n|| - page 100-103 -\n";

    fn german() -> Translator {
        Translator::new(Language::De)
    }

    fn arabic(numbers: &[u32]) -> Vec<PageNumber> {
        with_style(numbers, true)
    }

    fn with_style(numbers: &[u32], arabic: bool) -> Vec<PageNumber> {
        numbers
            .iter()
            .enumerate()
            .map(|(i, n)| PageNumber::new("Seite", PageValue::Single(*n), arabic).at_line(i * 2 + 1))
            .collect()
    }

    fn range(start: u32, end: u32) -> PageNumber {
        PageNumber::new("Seite", PageValue::Range { start, end }, true)
    }

    #[rstest]
    #[case(2, 2, true)]
    #[case(4, 12, false)]
    #[case(6, 104, true)]
    fn test_add_page_number_continues_predecessor(#[case] line: usize, #[case] expected: u32, #[case] is_arabic: bool) {
        let number = add_page_number(EXAMPLE_DOCUMENT, line, &german()).unwrap();
        assert_eq!(number.value, PageValue::Single(expected));
        assert_eq!(number.arabic, is_arabic);
    }

    #[test]
    fn test_add_page_number_keeps_identifier() {
        let number = add_page_number(EXAMPLE_DOCUMENT, 4, &german()).unwrap();
        assert_eq!(number.to_string(), "|| - slide XII -");
    }

    #[test]
    fn test_add_page_number_roman_ranges() {
        let document = "|| - Seite I -\n\n|| - Seite C -\n\n|| - Seite 320 -\n\n\n|| - Seite II-III -\n";
        assert_eq!(add_page_number(document, 4, &german()).unwrap().value, PageValue::Single(101));
        assert!(add_page_number(document, 7, &german()).unwrap().arabic);
        let last = add_page_number(document, 9, &german()).unwrap();
        assert_eq!(last.value, PageValue::Single(4));
        assert!(!last.arabic);
    }

    #[test]
    fn test_add_page_number_without_predecessor() {
        let number = add_page_number("Some text\n", 1, &Translator::new(Language::En)).unwrap();
        assert_eq!(number.to_string(), "|| - Page 1 -");
        assert_eq!(add_page_number("", 1, &german()).unwrap().to_string(), "|| - Seite 1 -");
    }

    #[test]
    fn test_add_page_number_after_largest_page() {
        // Given a marker carrying the largest page number
        let text = "|| - Seite 4294967295 -\n\nText\n";

        // When adding a marker below it
        let err = add_page_number(text, 3, &german()).unwrap_err();

        // Then an error points at the predecessor
        assert_eq!(err.message, "page number has no successor");
        assert_eq!(err.line, Some(1));
    }

    #[rstest]
    #[case(&[1, 2, 3, 4], true)]
    #[case(&[1, 2, 3, 4], false)]
    #[case(&[10, 11, 12, 13], true)]
    #[case(&[10, 11, 12, 13], false)]
    fn test_monotonic_numbering_is_fine(#[case] numbers: &[u32], #[case] is_arabic: bool) {
        assert_eq!(check_page_numbering(&with_style(numbers, is_arabic)), vec![]);
    }

    #[test]
    fn test_gap_is_reported_with_expected_value() {
        // Given a jump from 3 to 10
        let numbers = arabic(&[1, 2, 3, 10]);

        // When checking
        let issues = check_page_numbering(&numbers);

        // Then only the jump is reported, expecting 4
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].page_number.value, PageValue::Single(10));
        assert_eq!(issues[0].expected, PageValue::Single(4));
        assert_eq!(issues[0].to_string(), "expected page number 4, found 10");
    }

    #[test]
    fn test_ranges_continue_at_their_end() {
        let numbers = vec![
            PageNumber::new("Seite", PageValue::Single(1), true),
            range(2, 5),
            PageNumber::new("Seite", PageValue::Single(6), true),
            range(7, 21),
            range(22, 25),
        ];
        assert_eq!(check_page_numbering(&numbers), vec![]);
    }

    #[test]
    fn test_all_numbers_after_an_error_are_reported() {
        let issues = check_page_numbering(&arabic(&[2, 11, 12, 19]));
        let expected: Vec<PageValue> = issues.iter().map(|i| i.expected).collect();
        assert_eq!(expected, vec![PageValue::Single(3), PageValue::Single(4), PageValue::Single(5)]);
    }

    #[test]
    fn test_style_change_starts_new_sequence() {
        let mut numbers = arabic(&[10, 22]);
        numbers.extend(with_style(&[98, 99], false));
        let issues = check_page_numbering(&numbers);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].page_number.value, PageValue::Single(22));

        let mut numbers = with_style(&[1, 2, 3], false);
        numbers.extend(arabic(&[1, 2]));
        assert_eq!(check_page_numbering(&numbers), vec![]);
    }

    #[test]
    fn test_reversed_ranges_are_reported() {
        let issues = check_page_numbering(&[range(5, 3)]);
        assert_eq!(issues[0].expected, PageValue::Range { start: 3, end: 5 });

        let numbers = vec![PageNumber::new("Seite", PageValue::Single(1), true), range(4, 2)];
        let issues = check_page_numbering(&numbers);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].expected, PageValue::Range { start: 2, end: 4 });
    }

    #[test]
    fn test_malformed_ranges_are_reported_anywhere() {
        // Given an empty range and a reversed range after the first marker
        let numbers = vec![
            PageNumber::new("Seite", PageValue::Single(1), true),
            range(2, 2),
            range(5, 3),
        ];

        // When checking
        let issues = check_page_numbering(&numbers);

        // Then both are reported with their repaired values
        let expected: Vec<PageValue> = issues.iter().map(|i| i.expected).collect();
        assert_eq!(expected, vec![PageValue::Single(2), PageValue::Range { start: 3, end: 5 }]);
    }

    #[test]
    fn test_largest_page_number_does_not_overflow() {
        // Given a marker with the largest page number followed by another one
        let text = "|| - Seite 4294967295 -\n\n|| - Seite 1 -\n";
        let paragraphs = Paragraphs::from_text(text);
        let numbers = extract_page_numbers(&paragraphs, None);

        // When checking and fixing
        let issues = check_page_numbering(&numbers);

        // Then the second marker starts a new sequence
        assert_eq!(issues, vec![]);
        assert_eq!(fix_page_numbering(text), text);
    }

    #[test]
    fn test_range_reaching_past_largest_page_is_left_alone() {
        let numbers = vec![
            PageNumber::new("Seite", PageValue::Single(u32::MAX - 1), true),
            range(1, u32::MAX),
        ];
        assert_eq!(check_page_numbering(&numbers), vec![]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(check_page_numbering(&[]), vec![]);
    }

    #[test]
    fn test_fix_rewrites_reported_markers() {
        // Given a document with a numbering gap and a trailing remark
        let text = "|| - Seite 1 -\n\nText\n\n|| - Seite 5 - (scan)\n\n|| - Seite 6 -\n";

        // When fixing the numbering
        let fixed = fix_page_numbering(text);

        // Then the markers continue from 1 and the remark survives
        assert_eq!(fixed, "|| - Seite 1 -\n\nText\n\n|| - Seite 2 - (scan)\n\n|| - Seite 3 -\n");
        assert_eq!(fix_page_numbering(&fixed), fixed);
    }

    #[test]
    fn test_fix_keeps_roman_style() {
        let fixed = fix_page_numbering("|| - page I -\n\n|| - page V -\n");
        assert_eq!(fixed, "|| - page I -\n\n|| - page II -\n");
    }

    #[test]
    fn test_fix_in_file() {
        let lecture = crate::tests::create_test_lecture_dir();
        let path = crate::tests::create_test_file(&lecture, "k01/k01.md", "|| - Seite 3 -\n\n|| - Seite 3 -\n");

        assert!(fix_page_numbering_in_file(&path).unwrap());
        assert_eq!(io::read_file(&path).unwrap(), "|| - Seite 3 -\n\n|| - Seite 4 -\n");
        assert!(!fix_page_numbering_in_file(&path).unwrap());
    }
}

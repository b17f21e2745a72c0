//! Display (`$$...$$`) and inline (`$...$`) math.
//!
//! Formulas are keyed by the 1-based line and column of their opening
//! delimiter. Columns count characters, not bytes.

use std::collections::BTreeMap;

use super::Paragraphs;

pub type Formulas = BTreeMap<(usize, usize), String>;

pub const DISPLAY_MATH: &str = "$$";

/// Column right after `text`, given the column `text` starts at. If `text`
/// contains a line break, the column is counted from the last one.
///
/// `compute_position("ab", 1) == 3`, `compute_position("a\n", 1) == 1`
pub fn compute_position(text: &str, start_column: usize) -> usize {
    match text.rfind('\n') {
        None => text.chars().count() + start_column,
        Some(newline) => text[newline + 1..].chars().count() + 1,
    }
}

fn blank_out(text: &str) -> String {
    text.chars().map(|c| if c == '\n' { '\n' } else { ' ' }).collect()
}

/// Extract formulas delimited by `indicator` from `document`, counting lines
/// from `start_line`.
///
/// Also returns the document with every extracted formula (delimiters
/// included) overwritten by spaces, line breaks kept, so that it can be
/// scanned again with unchanged positions. Escaped dollars (`\$`) are
/// never delimiters. A trailing unmatched delimiter yields no formula.
pub fn parse_environments(document: &str, indicator: &str, start_line: usize) -> (Formulas, String) {
    let document = document.replace(r"\$", "  ");
    let tokens: Vec<&str> = document.split(indicator).collect();
    let indicator_width = indicator.chars().count();
    // with an even number of tokens the last formula is never closed
    let closed_formulas = if tokens.len() % 2 == 0 {
        tokens.len() - 1
    } else {
        tokens.len()
    };

    let mut formulas = Formulas::new();
    let mut stripped = String::with_capacity(document.len());
    let mut line = start_line;
    let mut column = 1;
    let mut last_plain = "";

    for (index, token) in tokens.iter().enumerate() {
        let is_formula = index % 2 == 1;
        if is_formula && index < closed_formulas {
            let start = compute_position(last_plain, column);
            formulas.insert((line, start), token.to_string());
            column = compute_position(token, start + indicator_width) + indicator_width;
            stripped.push_str(&" ".repeat(indicator_width));
            stripped.push_str(&blank_out(token));
            stripped.push_str(&" ".repeat(indicator_width));
        } else if is_formula {
            log::debug!("formula starting on line {line} is not terminated");
            stripped.push_str(&" ".repeat(indicator_width));
            stripped.push_str(token);
        } else {
            last_plain = token;
            stripped.push_str(token);
        }
        line += token.matches('\n').count();
    }
    (formulas, stripped)
}

/// Extract `$...$` formulas, line by line. A line ending inside a formula
/// loses its last formula, the ones before it are kept.
pub fn parse_single_dollar_formulas(document: &str, start_line: usize) -> Formulas {
    let mut formulas = Formulas::new();
    for (line_no, line) in (start_line..).zip(document.split('\n')) {
        let tokens: Vec<&str> = line.split('$').collect();
        if tokens.len() < 3 {
            continue;
        }
        let mut column = 0;
        let mut last_added = None;
        for (index, token) in tokens.iter().enumerate() {
            if index % 2 == 1 {
                let key = (line_no, column + 1);
                formulas.insert(key, token.to_string());
                last_added = Some(key);
                column += 2;
            }
            column += token.chars().count();
        }
        if tokens.len() % 2 == 0
            && let Some(key) = last_added
        {
            formulas.remove(&key);
        }
    }
    formulas
}

/// All formulas of a document, sorted by position.
pub fn parse_formulas(paragraphs: &Paragraphs) -> Formulas {
    let mut formulas = Formulas::new();
    for (start, lines) in paragraphs.iter() {
        let paragraph = lines.join("\n");
        let (display, stripped) = parse_environments(&paragraph, DISPLAY_MATH, start);
        formulas.extend(display);
        formulas.extend(parse_single_dollar_formulas(&stripped, start));
    }
    formulas
}

/// Lines on which an inline formula is opened but never closed.
pub fn unterminated_inline_formulas(paragraphs: &Paragraphs) -> Vec<usize> {
    let mut lines = Vec::new();
    for (start, paragraph) in paragraphs.iter() {
        let (_, stripped) = parse_environments(&paragraph.join("\n"), DISPLAY_MATH, start);
        for (line_no, line) in (start..).zip(stripped.split('\n')) {
            if line.matches('$').count() % 2 == 1 {
                lines.push(line_no);
            }
        }
    }
    lines
}

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::Paragraphs;
use crate::error::StructuralError;
use crate::models::Heading;

fn atx_heading() -> &'static Regex {
    static ATX: OnceLock<Regex> = OnceLock::new();
    // "#." never matches: neither \s nor \w accepts the period
    ATX.get_or_init(|| Regex::new(r"^#{1,6}\s*\w").expect("Invalid heading regex"))
}

/// `# text`, `###text ###`, but not `#.` or `#######`.
pub fn is_hashed_heading(line: &str) -> bool {
    atx_heading().is_match(line)
}

/// Split an ATX heading line into level and text.
fn parse_hashed(line: &str) -> (u8, String) {
    let level = line.chars().take_while(|&c| c == '#').count();
    let text = line[level..].trim_end_matches('#').trim();
    (level.min(6) as u8, text.to_string())
}

/// Extract all headings, in document order. Only text, level and line are
/// set on the returned headings.
pub fn extract_headings(paragraphs: &Paragraphs, max_headings: Option<usize>) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (start, lines) in paragraphs.iter() {
        if max_headings.is_some_and(|max| headings.len() >= max) {
            break;
        }
        if lines.first().is_some_and(|first| is_hashed_heading(first)) {
            headings.extend(extract_hashed(start, lines));
        } else if let Some(heading) = extract_underlined(start, lines) {
            headings.push(heading);
        }
    }
    if let Some(max) = max_headings {
        headings.truncate(max);
    }
    headings
}

/// Headings of a chapter file, with the chapter number taken from its name.
pub fn extract_headings_from_file(
    path: &Path,
    paragraphs: &Paragraphs,
    max_headings: Option<usize>,
) -> Result<Vec<Heading>, StructuralError> {
    let chapter = chapter_number_from_path(path)?;
    Ok(extract_headings(paragraphs, max_headings)
        .into_iter()
        .map(|heading| heading.with_chapter_number(chapter))
        .collect())
}

fn extract_hashed(start: usize, lines: &[String]) -> Vec<Heading> {
    let mut headings = Vec::new();
    // heading being continued: (line, level, text)
    let mut pending: Option<(usize, u8, String)> = None;

    for (offset, line) in lines.iter().enumerate() {
        if let Some((_, _, text)) = pending.as_mut() {
            let continues = line.ends_with('\\');
            text.push('\n');
            text.push_str(line.trim_end_matches('\\').trim_end());
            if continues {
                continue;
            }
            if let Some((line_no, level, text)) = pending.take() {
                headings.push(Heading::new(text, level).with_line(line_no));
            }
        } else if is_hashed_heading(line) {
            if let Some(first_part) = line.strip_suffix('\\') {
                let (level, text) = parse_hashed(first_part);
                pending = Some((start + offset, level, text));
            } else {
                let (level, text) = parse_hashed(line);
                headings.push(Heading::new(text, level).with_line(start + offset));
            }
        } else {
            break;
        }
    }
    if let Some((line_no, level, text)) = pending {
        headings.push(Heading::new(text, level).with_line(line_no));
    }
    headings
}

fn extract_underlined(start: usize, lines: &[String]) -> Option<Heading> {
    let mut text = String::new();
    let mut index = 0;
    while index < lines.len() && lines[index].ends_with('\\') {
        text.push_str(lines[index].trim_end_matches('\\'));
        text.push('\n');
        index += 1;
    }
    text.push_str(lines.get(index)?);
    let underline = lines.get(index + 1)?;

    let level = if underline.starts_with("===") {
        1
    } else if underline.starts_with("---") && !underline.contains(' ') {
        2
    } else {
        return None;
    };
    Some(Heading::new(text, level).with_line(start))
}

/// Chapter number encoded in a file name: `k0901.md` belongs to chapter 9.
///
/// The alphabetic prefix is stripped; what remains must be a non-empty,
/// even-length run of digits.
pub fn chapter_number_from_path(path: &Path) -> Result<u32, StructuralError> {
    let invalid = || {
        StructuralError::new(
            "file name must be a chapter prefix followed by an even number of digits, e.g. k01.md",
            path,
        )
    };
    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let stem = name.strip_suffix(".md").unwrap_or(name);
    let digits = stem.trim_start_matches(|c: char| c.is_alphabetic());
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    digits[..2].parse().map_err(|_| invalid())
}

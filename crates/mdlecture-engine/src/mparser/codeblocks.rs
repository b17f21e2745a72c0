//! Blank out code so that later extractors do not see headings, page
//! numbers or formulas inside it.
//!
//! Three kinds of code are handled, in this order of precedence:
//! fenced blocks (possibly spanning several paragraphs), indented blocks and
//! inline back-tick spans. Line numbering is never disturbed.

use std::sync::OnceLock;

use regex::Regex;

use super::Paragraphs;

/// How many paragraphs after an unclosed fence are searched for its end.
pub const FENCE_LOOKAHEAD: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    /// Fence kind of a line, ignoring indentation.
    pub fn sig(line: &str) -> Option<FenceKind> {
        let t = line.trim_start();
        if t.starts_with(Self::BACKTICKS) {
            Some(FenceKind::Backticks)
        } else if t.starts_with(Self::TILDES) {
            Some(FenceKind::Tildes)
        } else {
            None
        }
    }

    pub fn closes(kind: FenceKind, line: &str) -> bool {
        Self::sig(line) == Some(kind)
    }
}

fn inline_code() -> &'static Regex {
    static INLINE_CODE: OnceLock<Regex> = OnceLock::new();
    INLINE_CODE.get_or_init(|| Regex::new(r"`[^`]*`").expect("Invalid inline code regex"))
}

fn list_marker() -> &'static Regex {
    static LIST_MARKER: OnceLock<Regex> = OnceLock::new();
    LIST_MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:[-+*]|\d+\.)\s").expect("Invalid list marker regex")
    })
}

enum FenceScan {
    /// No fence from the scanned position on.
    NoFence,
    /// Fences found and closed within the paragraph, or an unclosed fence
    /// left alone.
    Handled { unclosed: bool },
    /// A fence closed in a later paragraph; scanning resumes there.
    Continued { paragraph: usize, line: usize },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Touched {
    No,
    Fenced,
    Unclosed,
}

/// Blank fenced and indented code blocks and inline code spans.
///
/// Running it on its own output changes nothing.
pub fn remove_codeblocks(paragraphs: &Paragraphs) -> Paragraphs {
    let mut arena: Vec<(usize, Vec<String>)> = paragraphs
        .iter()
        .map(|(start, lines)| (start, lines.to_vec()))
        .collect();
    let mut touched = vec![Touched::No; arena.len()];

    let (mut index, mut from_line) = (0, 0);
    while index < arena.len() {
        match scan_fences(&mut arena, index, from_line) {
            FenceScan::NoFence => {}
            FenceScan::Handled { unclosed } => {
                if touched[index] == Touched::No {
                    touched[index] = if unclosed { Touched::Unclosed } else { Touched::Fenced };
                }
            }
            FenceScan::Continued { paragraph, line } => {
                for state in &mut touched[index..=paragraph] {
                    *state = Touched::Fenced;
                }
                index = paragraph;
                from_line = line;
                continue;
            }
        }
        index += 1;
        from_line = 0;
    }

    for index in 0..arena.len() {
        if touched[index] == Touched::Unclosed {
            continue;
        }
        if is_indented_block(&arena[index].1) && !is_indented_itemize(&arena, index) {
            let len = arena[index].1.len();
            arena[index].1 = vec![String::new(); len + 1];
        } else {
            for line in &mut arena[index].1 {
                scrub_inline_code(line);
            }
        }
    }

    arena.into_iter().collect()
}

fn blank(lines: &mut [String]) {
    for line in lines {
        line.clear();
    }
}

fn scan_fences(arena: &mut [(usize, Vec<String>)], index: usize, from_line: usize) -> FenceScan {
    let mut open: Option<(FenceKind, usize)> = None;
    let mut found = false;
    let lines = &mut arena[index].1;
    for line_no in from_line..lines.len() {
        match open {
            None => {
                if let Some(kind) = CodeFence::sig(&lines[line_no]) {
                    open = Some((kind, line_no));
                }
            }
            Some((kind, start)) if CodeFence::closes(kind, &lines[line_no]) => {
                blank(&mut lines[start..=line_no]);
                open = None;
                found = true;
            }
            Some(_) => {}
        }
    }

    let Some((kind, start)) = open else {
        return if found {
            FenceScan::Handled { unclosed: false }
        } else {
            FenceScan::NoFence
        };
    };

    let last = (index + FENCE_LOOKAHEAD).min(arena.len() - 1);
    for later in index + 1..=last {
        let closing = arena[later]
            .1
            .iter()
            .position(|line| CodeFence::closes(kind, line));
        if let Some(close_line) = closing {
            blank(&mut arena[index].1[start..]);
            for (_, lines) in &mut arena[index + 1..later] {
                blank(lines);
            }
            blank(&mut arena[later].1[..=close_line]);
            return FenceScan::Continued {
                paragraph: later,
                line: close_line + 1,
            };
        }
    }

    log::debug!(
        "code fence opened on line {} is not closed, leaving it untouched",
        arena[index].0 + start
    );
    FenceScan::Handled { unclosed: !found }
}

fn is_indented(line: &str) -> bool {
    line.is_empty() || line.starts_with("    ") || line.starts_with('\t')
}

// blank paragraphs count as indented so that the backward scan can pass them
fn is_fully_indented(lines: &[String]) -> bool {
    lines.iter().all(|line| is_indented(line))
}

fn is_indented_block(lines: &[String]) -> bool {
    is_fully_indented(lines) && lines.iter().any(|line| !line.is_empty())
}

/// Heuristic: an indented paragraph continues a list item if, walking back
/// over fully indented paragraphs, a paragraph containing a list marker is
/// reached. An indented example list inside a code block is misjudged.
fn is_indented_itemize(arena: &[(usize, Vec<String>)], index: usize) -> bool {
    for (_, lines) in arena[..index].iter().rev() {
        if lines.iter().any(|line| list_marker().is_match(line)) {
            return true;
        }
        if !is_fully_indented(lines) {
            return false;
        }
    }
    false
}

fn scrub_inline_code(line: &mut String) {
    let ticks = line.matches('`').count();
    if ticks > 0 && ticks % 2 == 0 {
        *line = inline_code().replace_all(line, "  ").into_owned();
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mdlecture_config::l10n::capitalize;
use regex::Regex;

use super::{FileCheck, FileContext, Issue, Priority};
use crate::convert::page_anchor;
use crate::io;
use crate::models::{Heading, PageNumber, ReferenceKind};
use crate::mparser::{
    PAGE_NUMBERING_TOKENS, Paragraphs, extract_headings, extract_references, html_ids, remove_codeblocks,
    scan_page_numbers, unterminated_inline_formulas,
};
use crate::pagenumbering::check_page_numbering;

fn page_marker_start() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let tokens = PAGE_NUMBERING_TOKENS.join("|");
        Regex::new(&format!(r"(?i)^\|\|\s*-?\s*({tokens})")).expect("Invalid page marker regex")
    })
}

fn old_style_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let tokens = PAGE_NUMBERING_TOKENS.join("|");
        Regex::new(&format!(r"(?i)^\s*######\s*-\s*({tokens})")).expect("Invalid old-style page number regex")
    })
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Page markers need a blank line above and below.
pub struct PageNumberIsParagraph;

impl FileCheck for PageNumberIsParagraph {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        const MESSAGE: &str = "a page number needs an empty line above and below, it must be a paragraph of its own";
        let mut issues = Vec::new();
        let mut paragraph_begun = true;
        let mut previous_was_marker = false;
        for (line_no, line) in (1..).zip(file.lines()) {
            if is_blank(&line) {
                paragraph_begun = true;
                previous_was_marker = false;
                continue;
            }
            if previous_was_marker {
                issues.push(Issue::at_line(line_no - 1, MESSAGE));
                previous_was_marker = false;
            } else if page_marker_start().is_match(&line) {
                if !paragraph_begun {
                    issues.push(Issue::at_line(line_no, MESSAGE));
                } else {
                    previous_was_marker = true;
                }
            }
            paragraph_begun = false;
        }
        issues
    }
}

/// Headings need a blank line above and below.
pub struct HeadingIsParagraph;

impl FileCheck for HeadingIsParagraph {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        const MESSAGE: &str = "a heading needs an empty line above and below, it must be a paragraph of its own";
        let mut issues = Vec::new();
        let mut paragraph_begun = true;
        let mut previous_was_heading = false;
        for (line_no, line) in (1..).zip(file.lines()) {
            if is_blank(&line) {
                paragraph_begun = true;
                previous_was_heading = false;
                continue;
            }
            if !paragraph_begun && (line.starts_with("---") || line.starts_with("===")) {
                previous_was_heading = true;
                continue;
            }
            if previous_was_heading {
                issues.push(Issue::at_line(line_no, MESSAGE));
                previous_was_heading = false;
            } else if line.starts_with('#') {
                if !paragraph_begun {
                    issues.push(Issue::at_line(line_no, MESSAGE));
                }
                previous_was_heading = true;
            }
            paragraph_begun = false;
        }
        issues
    }
}

/// `###### - Seite 5 -` is the retired page-number syntax.
pub struct OldStylePageNumber;

impl FileCheck for OldStylePageNumber {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        (1..)
            .zip(file.lines())
            .filter(|(_, line)| old_style_marker().is_match(line))
            .map(|(line_no, _)| {
                Issue::at_line(
                    line_no,
                    "page numbers of the form \"###### - Seite xyz -\" are no longer supported, use \"|| - Seite xyz -\"",
                )
            })
            .collect()
    }
}

/// `|| - Seite -` with the number forgotten.
pub struct PageTokenWithoutNumber;

impl FileCheck for PageTokenWithoutNumber {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (line_no, line) in (1..).zip(file.lines()) {
            if !line.starts_with("||") {
                continue;
            }
            let Some(token) = page_marker_start().captures(&line).and_then(|c| c.get(1)) else {
                continue;
            };
            let after = line[token.end()..].trim_start();
            let has_number = after
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || "ivxlcdmIVXLCDM".contains(c));
            if !has_number {
                issues.push(Issue::at_line(
                    line_no,
                    format!("page marker \"{}\" is not followed by a number", token.as_str()),
                ));
            }
        }
        issues
    }
}

/// Page numbers increase by one from marker to marker.
pub struct PageNumberSequence;

impl FileCheck for PageNumberSequence {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        check_page_numbering(&file.page_numbers)
            .into_iter()
            .map(|issue| Issue::at_line(issue.page_number.line, issue.to_string()))
            .collect()
    }
}

/// Markers whose number cannot be read, e.g. invalid roman numerals.
pub struct InvalidPageNumber;

impl FileCheck for InvalidPageNumber {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        file.page_number_errors
            .iter()
            .map(|err| Issue {
                line: err.line,
                message: format!("{}: {}", err.message, err.excerpt),
                path: None,
            })
            .collect()
    }
}

/// Reference-style links need exactly one definition, and every definition
/// should be used.
pub struct UnpairedReferences;

impl FileCheck for UnpairedReferences {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let references = extract_references(&file.lines().join("\n"));
        let mut issues = Vec::new();

        let mut definitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for reference in references.iter().filter(|r| r.kind == ReferenceKind::Explicit) {
            definitions.entry(reference.pairing_key()).or_default().push(reference.line);
        }
        for (id, lines) in &definitions {
            for line in lines.iter().skip(1) {
                issues.push(Issue::at_line(*line, format!("link identifier \"{id}\" is defined more than once")));
            }
        }

        let mut used = HashSet::new();
        for reference in &references {
            let needs_definition = match reference.kind {
                ReferenceKind::Implicit => true,
                ReferenceKind::Standalone => reference.is_footnote,
                ReferenceKind::Inline | ReferenceKind::Explicit | ReferenceKind::AutoLink => false,
            };
            if matches!(reference.kind, ReferenceKind::Implicit | ReferenceKind::Standalone) {
                used.insert(reference.pairing_key());
            }
            if needs_definition && !definitions.contains_key(&reference.pairing_key()) {
                issues.push(Issue::at_line(
                    reference.line,
                    format!("reference \"{}\" has no matching definition", reference.id),
                ));
            }
        }
        for reference in references.iter().filter(|r| r.kind == ReferenceKind::Explicit) {
            if !used.contains(&reference.pairing_key()) {
                issues.push(Issue::at_line(
                    reference.line,
                    format!("link definition \"{}\" is never used", reference.id),
                ));
            }
        }
        issues.sort_by_key(|issue| issue.line);
        issues.dedup();
        issues
    }
}

/// An odd number of `$` on a line leaves an inline formula open.
pub struct UnterminatedFormula;

impl FileCheck for UnterminatedFormula {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        unterminated_inline_formulas(&file.paragraphs)
            .into_iter()
            .map(|line| Issue::at_line(line, "inline formula is not terminated, a closing $ is missing"))
            .collect()
    }
}

/// Links into the lecture need an existing target file and, if they name
/// one, an existing anchor. Links to `.html` files are checked against the
/// markdown source they are converted from.
pub struct BrokenLinks;

/// `https://...`, `mailto:...` and friends.
fn is_external(link: &str) -> bool {
    link.starts_with("www.") || link.split(['/', '#']).next().is_some_and(|first| first.contains(':'))
}

/// The markdown file a link to a converted document points to.
fn link_source(target: &str) -> PathBuf {
    let path = Path::new(target);
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm" | "epub") => path.with_extension("md"),
        _ => path.to_path_buf(),
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

/// Ids a document can be linked to: its headings, its `<div>` and `<span>`
/// ids and the anchors of its page numbers.
fn document_anchors(headings: &[Heading], page_numbers: &[PageNumber], text: &str) -> HashSet<String> {
    headings
        .iter()
        .map(|heading| heading.id().to_string())
        .chain(page_numbers.iter().map(|number| format!("p{}", page_anchor(number))))
        .chain(html_ids(text))
        .collect()
}

fn anchors_of_file(path: &Path) -> Option<HashSet<String>> {
    let text = match io::read_file(path) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("not checking anchors: {e}");
            return None;
        }
    };
    let paragraphs = remove_codeblocks(&Paragraphs::from_text(&text));
    let headings = extract_headings(&paragraphs, None);
    let (page_numbers, _) = scan_page_numbers(&paragraphs, None);
    Some(document_anchors(&headings, &page_numbers, &text))
}

impl FileCheck for BrokenLinks {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let dir = file.path.parent().unwrap_or(Path::new(""));
        let own_anchors = document_anchors(&file.headings, &file.page_numbers, file.text);
        let mut target_anchors: HashMap<PathBuf, Option<HashSet<String>>> = HashMap::new();
        let mut issues = Vec::new();

        for reference in extract_references(&file.lines().join("\n")) {
            let Some(link) = reference.link.as_deref() else { continue };
            if reference.is_footnote || link.is_empty() || is_external(link) {
                continue;
            }
            let (target, anchor) = match link.split_once('#') {
                Some((target, anchor)) => (target, Some(anchor)),
                None => (link, None),
            };
            let source = link_source(target);
            // bare <host.tld> is no local link
            if reference.kind == ReferenceKind::AutoLink && !(target.is_empty() || is_markdown(&source)) {
                continue;
            }

            let anchors = if target.is_empty() {
                Some(&own_anchors)
            } else {
                let path = dir.join(&source);
                if !path.exists() {
                    issues.push(Issue::at_line(
                        reference.line,
                        format!("link target \"{target}\" does not exist"),
                    ));
                    continue;
                }
                if !is_markdown(&path) {
                    continue;
                }
                target_anchors
                    .entry(path)
                    .or_insert_with_key(|path| anchors_of_file(path))
                    .as_ref()
            };

            if let (Some(anchor), Some(anchors)) = (anchor.filter(|a| !a.is_empty()), anchors)
                && !anchors.contains(anchor)
            {
                let document = if target.is_empty() { "this file" } else { target };
                issues.push(Issue::at_line(
                    reference.line,
                    format!("anchor \"#{anchor}\" not found in {document}"),
                ));
            }
        }
        issues
    }
}

/// `cases` environments need line breaks and display math to stay readable
/// in the alternative text.
pub struct CasesEnvironment;

impl FileCheck for CasesEnvironment {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (line_no, line) in (1..).zip(file.lines()) {
            let Some(begin) = line.find(r"\begin{cases}") else {
                continue;
            };
            if line.contains(r"\end{cases}") {
                issues.push(Issue::at_line(
                    line_no,
                    "a cases environment should have a line break after each case",
                ));
                continue;
            }
            let before = &line[..begin];
            if !(before.contains("$$") || before.contains(r"\(") || before.contains(r"\[")) {
                issues.push(Issue::at_line(
                    line_no,
                    "a cases environment should be set in display math, use $$ instead of $",
                ));
            }
        }
        issues
    }
}

fn bracketed_matrix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\\left\(.*?begin\{(array|matrix)").expect("Invalid bracketed matrix regex"))
}

fn matrix_on_one_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\\begin\{.*?matrix\}.*\\\\.*&").expect("Invalid matrix row regex"))
}

/// Matrices written with `\left(` or with all rows on one line.
pub struct HardToReadMatrix;

impl FileCheck for HardToReadMatrix {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (line_no, line) in (1..).zip(file.lines()) {
            if bracketed_matrix().is_match(&line) {
                issues.push(Issue::at_line(
                    line_no,
                    "use \\begin{pmatrix} instead of \\left( for matrices, it sets the brackets itself",
                ));
            } else if matrix_on_one_line().is_match(&line) {
                issues.push(Issue::at_line(line_no, "put every row of a matrix on a line of its own"));
            }
        }
        issues
    }
}

fn numbered_item() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\. ").expect("Invalid numbered item regex"))
}

fn is_list_item(line: &str) -> bool {
    line.starts_with("- ") || numbered_item().is_match(line)
}

/// A list must be separated from the paragraph above by a blank line, or it
/// is converted as running text.
pub struct ListIsParagraph;

impl FileCheck for ListIsParagraph {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut in_list = false;
        let mut previous_blank = true;
        for (line_no, line) in (1..).zip(file.lines()) {
            if is_blank(&line) {
                previous_blank = true;
                continue;
            }
            if is_list_item(&line) {
                if !previous_blank && !in_list {
                    issues.push(Issue::at_line(
                        line_no,
                        "a list needs an empty line above, otherwise it is not recognised as a list",
                    ));
                }
                in_list = true;
            } else if !line.starts_with([' ', '\t']) {
                in_list = false;
            }
            previous_blank = false;
        }
        issues
    }
}

/// `|| - seite 5 -`: the German marker words are capitalised.
pub struct LowercasePageToken;

impl FileCheck for LowercasePageToken {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        file.page_numbers
            .iter()
            .filter(|number| matches!(number.identifier.as_str(), "seite" | "folie"))
            .map(|number| {
                let word = &number.identifier;
                let message = format!("\"{word}\" is written in lower case, use \"{}\"", capitalize(word));
                Issue::at_line(number.line, message)
            })
            .collect()
    }
}

/// Long files are hard to navigate and should be split into `kxxyy.md`
/// parts.
pub struct FileTooLong {
    pub max_lines: usize,
}

impl Default for FileTooLong {
    fn default() -> Self {
        Self { max_lines: 2500 }
    }
}

impl FileCheck for FileTooLong {
    fn priority(&self) -> Priority {
        Priority::Pedantic
    }

    fn check(&self, file: &FileContext<'_>) -> Vec<Issue> {
        let lines = file.text.lines().count();
        if lines <= self.max_lines {
            return Vec::new();
        }
        vec![Issue::general(format!(
            "file has {lines} lines, consider splitting it into several files named like k0101.md"
        ))]
    }
}

//! Checks for common editing mistakes in lecture files.
//!
//! [`FileCheck`]s look at one file at a time. [`DirectoryCheck`]s see the
//! headings and page numbers of all files of one directory; the linter
//! caches those while walking and drops them when it moves on.

pub mod directory_rules;
pub mod file_rules;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use mdlecture_config::LectureConfig;

use crate::error::{FormattingError, StructuralError};
use crate::io::FileWalker;
use crate::models::{Heading, PageNumber};
use crate::mparser::{Paragraphs, extract_headings, remove_codeblocks, scan_page_numbers};

pub use directory_rules::{LevelOneHeadings, TooManyHeadings, UniformPageTokens};
pub use file_rules::{
    BrokenLinks, CasesEnvironment, FileTooLong, HardToReadMatrix, HeadingIsParagraph, InvalidPageNumber,
    ListIsParagraph, LowercasePageToken, OldStylePageNumber, PageNumberIsParagraph, PageNumberSequence,
    PageTokenWithoutNumber, UnpairedReferences, UnterminatedFormula,
};

/// How severe a mistake is. Ordered from most to least important.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Breaks conversion or the table of contents.
    Critical,
    #[default]
    Normal,
    Pedantic,
}

impl Priority {
    /// Whether a check of this priority runs when `requested` was asked for.
    pub fn within(self, requested: Priority) -> bool {
        self <= requested
    }
}

/// A mistake as reported by a check, before it is attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub line: Option<usize>,
    pub message: String,
    /// Set by directory checks pointing into one particular file.
    pub path: Option<PathBuf>,
}

impl Issue {
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
            path: None,
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
            path: None,
        }
    }

    pub fn in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A reported mistake.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Finding {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
    pub priority: Priority,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}: {}", self.path.display(), self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

/// Everything file checks get to see, extracted once per file.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    pub path: &'a Path,
    pub text: &'a str,
    /// The document with code blocks blanked out.
    pub paragraphs: Paragraphs,
    pub headings: Vec<Heading>,
    pub page_numbers: Vec<PageNumber>,
    pub page_number_errors: Vec<FormattingError>,
}

impl<'a> FileContext<'a> {
    pub fn new(path: &'a Path, text: &'a str) -> Self {
        let paragraphs = remove_codeblocks(&Paragraphs::from_text(text));
        let headings = extract_headings(&paragraphs, None);
        let (page_numbers, page_number_errors) = scan_page_numbers(&paragraphs, None);
        Self {
            path,
            text,
            paragraphs,
            headings,
            page_numbers,
            page_number_errors,
        }
    }

    /// Lines without code, 1-based line `n` at index `n - 1`.
    pub fn lines(&self) -> Vec<String> {
        self.paragraphs.to_lines()
    }
}

/// What directory checks see of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFile {
    pub path: PathBuf,
    pub headings: Vec<Heading>,
    pub page_numbers: Vec<PageNumber>,
}

pub trait FileCheck {
    fn priority(&self) -> Priority;
    fn check(&self, file: &FileContext<'_>) -> Vec<Issue>;
}

pub trait DirectoryCheck {
    fn priority(&self) -> Priority;
    /// `files` are the checked files of `dir`, in walk order.
    fn check(&self, dir: &Path, files: &[CachedFile]) -> Vec<Issue>;
}

/// Runs all checks up to a requested priority over a file or a tree.
pub struct Linter {
    priority: Priority,
    file_checks: Vec<Box<dyn FileCheck>>,
    directory_checks: Vec<Box<dyn DirectoryCheck>>,
}

impl Linter {
    /// All built-in checks, configured for `config`.
    pub fn new(config: &LectureConfig) -> Self {
        Self {
            priority: Priority::default(),
            file_checks: vec![
                Box::new(PageNumberIsParagraph),
                Box::new(HeadingIsParagraph),
                Box::new(ListIsParagraph),
                Box::new(OldStylePageNumber),
                Box::new(PageTokenWithoutNumber),
                Box::new(PageNumberSequence),
                Box::new(InvalidPageNumber),
                Box::new(LowercasePageToken),
                Box::new(UnpairedReferences),
                Box::new(BrokenLinks),
                Box::new(UnterminatedFormula),
                Box::new(CasesEnvironment),
                Box::new(HardToReadMatrix),
                Box::new(FileTooLong::default()),
            ],
            directory_checks: vec![
                Box::new(LevelOneHeadings),
                Box::new(UniformPageTokens),
                Box::new(TooManyHeadings::new(config.toc_depth)),
            ],
        }
    }

    /// A linter without any checks.
    pub fn empty() -> Self {
        Self {
            priority: Priority::default(),
            file_checks: Vec::new(),
            directory_checks: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn add_file_check(mut self, check: impl FileCheck + 'static) -> Self {
        self.file_checks.push(Box::new(check));
        self
    }

    pub fn add_directory_check(mut self, check: impl DirectoryCheck + 'static) -> Self {
        self.directory_checks.push(Box::new(check));
        self
    }

    /// Run the file checks on one document.
    pub fn check_text(&self, path: &Path, text: &str) -> Vec<Finding> {
        self.check_context(&FileContext::new(path, text))
    }

    fn check_context(&self, file: &FileContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for check in self.file_checks.iter().filter(|c| c.priority().within(self.priority)) {
            findings.extend(
                check
                    .check(file)
                    .into_iter()
                    .map(|issue| finding(file.path, issue, check.priority())),
            );
        }
        findings
    }

    fn check_directory(&self, dir: &Path, files: &[CachedFile]) -> Vec<Finding> {
        if files.is_empty() {
            return Vec::new();
        }
        let mut findings = Vec::new();
        for check in self.directory_checks.iter().filter(|c| c.priority().within(self.priority)) {
            findings.extend(
                check
                    .check(dir, files)
                    .into_iter()
                    .map(|issue| finding(dir, issue, check.priority())),
            );
        }
        findings
    }

    /// Check a single file or every markdown file below a directory.
    /// Findings are sorted by path, then line.
    pub fn run(&self, path: &Path) -> Result<Vec<Finding>, StructuralError> {
        let mut findings = Vec::new();
        for entry in FileWalker::new(path).all_files(true).walk()? {
            let mut cache = Vec::new();
            for file_path in entry.file_paths() {
                let bytes = match fs::read(&file_path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("cannot read {}: {e}", file_path.display());
                        findings.push(Finding {
                            path: file_path,
                            line: None,
                            message: format!("cannot read file: {e}"),
                            priority: Priority::Critical,
                        });
                        continue;
                    }
                };
                let Ok(text) = String::from_utf8(bytes) else {
                    findings.push(Finding {
                        path: file_path,
                        line: None,
                        message: "file is not encoded as UTF-8, please save it as UTF-8".to_string(),
                        priority: Priority::Critical,
                    });
                    continue;
                };
                let text = text.replace("\r\n", "\n");
                let context = FileContext::new(&file_path, &text);
                findings.extend(self.check_context(&context));
                cache.push(CachedFile {
                    path: file_path.clone(),
                    headings: context.headings,
                    page_numbers: context.page_numbers,
                });
            }
            findings.extend(self.check_directory(&entry.dir, &cache));
            log::debug!("checked {} files in {}", cache.len(), entry.dir.display());
        }
        findings.sort();
        Ok(findings)
    }
}

fn finding(default_path: &Path, issue: Issue, priority: Priority) -> Finding {
    Finding {
        path: issue.path.unwrap_or_else(|| default_path.to_path_buf()),
        line: issue.line,
        message: issue.message,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_lecture_dir};
    use pretty_assertions::assert_eq;

    struct AlwaysComplains(Priority);

    impl FileCheck for AlwaysComplains {
        fn priority(&self) -> Priority {
            self.0
        }

        fn check(&self, _file: &FileContext<'_>) -> Vec<Issue> {
            vec![Issue::at_line(2, "second"), Issue::at_line(1, "first")]
        }
    }

    fn relative(findings: &[Finding], root: &Path) -> Vec<(String, Option<usize>, String)> {
        findings
            .iter()
            .map(|f| {
                let path = f.path.strip_prefix(root).unwrap_or(&f.path);
                (path.to_string_lossy().into_owned(), f.line, f.message.clone())
            })
            .collect()
    }

    #[test]
    fn test_priority_filter() {
        assert!(Priority::Critical.within(Priority::Normal));
        assert!(Priority::Normal.within(Priority::Normal));
        assert!(!Priority::Pedantic.within(Priority::Normal));

        let linter = Linter::empty().add_file_check(AlwaysComplains(Priority::Pedantic));
        assert!(linter.check_text(Path::new("k01.md"), "").is_empty());
        let linter = linter.with_priority(Priority::Pedantic);
        assert_eq!(linter.check_text(Path::new("k01.md"), "").len(), 2);
    }

    #[test]
    fn test_findings_are_sorted_by_path_and_line() {
        // Given two files that both produce findings
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k02/k02.md", "text");
        create_test_file(&lecture, "k01/k01.md", "text");

        // When running a check that reports lines out of order
        let linter = Linter::empty().add_file_check(AlwaysComplains(Priority::Critical));
        let findings = linter.run(lecture.path()).unwrap();

        // Then the output is ordered
        assert_eq!(
            relative(&findings, lecture.path()),
            vec![
                ("k01/k01.md".to_string(), Some(1), "first".to_string()),
                ("k01/k01.md".to_string(), Some(2), "second".to_string()),
                ("k02/k02.md".to_string(), Some(1), "first".to_string()),
                ("k02/k02.md".to_string(), Some(2), "second".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_utf8_file_is_a_finding() {
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Fine\n");
        std::fs::write(lecture.path().join("k01/k0102.md"), [b'#', b' ', 0xe4, b'\n']).unwrap();

        let findings = Linter::new(&LectureConfig::default()).run(lecture.path()).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].priority, Priority::Critical);
        assert!(findings[0].path.ends_with("k01/k0102.md"));
        assert!(findings[0].message.contains("UTF-8"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_does_not_stop_the_run() {
        // Given a dangling link next to a chapter with a numbering gap
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Eins\n\n|| - Seite 1 -\n\n|| - Seite 5 -\n");
        std::os::unix::fs::symlink(lecture.path().join("missing.md"), lecture.path().join("k01/k0102.md")).unwrap();

        // When linting the lecture
        let findings = Linter::new(&LectureConfig::default()).run(lecture.path()).unwrap();

        // Then the unreadable file is reported and the other file still checked
        let found = relative(&findings, lecture.path());
        assert!(found.iter().any(|(path, line, message)| path == "k01/k0102.md"
            && line.is_none()
            && message.starts_with("cannot read file")));
        assert!(found.iter().any(|(path, _, message)| path == "k01/k01.md"
            && message == "expected page number 2, found 5"));
    }

    #[test]
    fn test_directory_checks_see_one_directory_at_a_time() {
        // Given two chapters with one level-1 heading each
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Eins\n\nText\n");
        create_test_file(&lecture, "k02/k02.md", "# Zwei\n\nText\n");

        // When linting the whole lecture
        let findings = Linter::new(&LectureConfig::default()).run(lecture.path()).unwrap();

        // Then no directory sees more than one level-1 heading
        assert_eq!(findings, vec![]);
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding {
            path: PathBuf::from("k01/k01.md"),
            line: Some(3),
            message: "broken".to_string(),
            priority: Priority::Normal,
        };
        assert_eq!(finding.to_string(), "k01/k01.md:3: broken");
        let general = Finding { line: None, ..finding };
        assert_eq!(general.to_string(), "k01/k01.md: broken");
    }
}

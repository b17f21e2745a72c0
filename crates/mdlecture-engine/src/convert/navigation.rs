use std::path::{Path, PathBuf};

use mdlecture_config::{LectureConfig, Phrase, l10n::title_case};

use super::page_anchor;
use crate::error::{Error, FormattingError};
use crate::io::{self, FileWalker};
use crate::models::{HeadingType, LectureFile, PageNumber};
use crate::mparser::{Paragraphs, extract_page_numbers, remove_codeblocks};
use crate::toc::TOC_FILE_NAME;

pub const NAVIGATION_BEGIN: &str = "<!-- page navigation -->";
pub const NAVIGATION_END: &str = "<!-- end page navigation -->";

/// Links to the neighbouring chapters, the table of contents and every
/// n-th page of the current file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBar {
    chapter_links: String,
    page_links: Option<String>,
}

impl NavigationBar {
    pub fn new(
        previous: Option<&LectureFile>,
        next: Option<&LectureFile>,
        page_numbers: &[PageNumber],
        config: &LectureConfig,
    ) -> Self {
        let translator = config.translator();
        let extension = config.format.extension();
        let link = |phrase: Phrase, file: &LectureFile| {
            format!("[{}](../{})", title_case(translator.get(phrase)), file.target_path(extension))
        };

        let mut links = Vec::new();
        links.extend(previous.map(|file| link(Phrase::Previous, file)));
        let toc = Path::new(TOC_FILE_NAME).with_extension(extension);
        links.push(format!(
            "[{}](../{})",
            title_case(translator.get(Phrase::TableOfContents)),
            toc.display()
        ));
        links.extend(next.map(|file| link(Phrase::Next, file)));

        let pages = page_links(page_numbers, config.page_numbering_gap)
            .map(|links| format!("{}: {links}", title_case(translator.get(Phrase::Pages))));
        Self {
            chapter_links: links.join("  "),
            page_links: pages,
        }
    }

    fn body(&self) -> String {
        match &self.page_links {
            Some(pages) => format!("{}\n\n{pages}", self.chapter_links),
            None => self.chapter_links.clone(),
        }
    }

    /// Bar for the top of a document.
    pub fn top(&self) -> String {
        format!("{NAVIGATION_BEGIN}\n{}\n\n* * * * *\n{NAVIGATION_END}", self.body())
    }

    /// Bar for the end of a document, page links first.
    pub fn bottom(&self) -> String {
        let body = match &self.page_links {
            Some(pages) => format!("{pages}\n\n{}", self.chapter_links),
            None => self.chapter_links.clone(),
        };
        format!("{NAVIGATION_BEGIN}\n\n* * * * *\n\n{body}\n{NAVIGATION_END}")
    }
}

/// `[[1]](#p1), [[5]](#p5), ...`: the first page, then every page divisible
/// by `gap` that is more than half a gap past the first one.
pub fn page_links(page_numbers: &[PageNumber], gap: u32) -> Option<String> {
    let first = page_numbers.first()?;
    let gap = gap.max(1);
    let start = first.value.first();
    let mut links = vec![page_link(first)];
    links.extend(
        page_numbers
            .iter()
            .skip(1)
            .filter(|number| {
                let page = number.value.first();
                page % gap == 0 && f64::from(page) > f64::from(start) + f64::from(gap) / 2.0
            })
            .map(page_link),
    );
    Some(links.join(", "))
}

fn page_link(number: &PageNumber) -> String {
    let label = page_anchor(number);
    format!("[[{label}]](#p{label})")
}

/// 0-based first and last line of every bar that has both markers. A begin
/// marker followed by another begin marker is left unmatched.
fn navigation_bars(lines: &[&str]) -> Vec<(usize, usize)> {
    let mut bars = Vec::new();
    let mut open = None;
    for (index, line) in lines.iter().enumerate() {
        if line.contains(NAVIGATION_BEGIN) {
            open = Some(index);
        } else if line.contains(NAVIGATION_END)
            && let Some(begin) = open.take()
        {
            bars.push((begin, index));
        }
    }
    bars
}

/// 1-based line of the first begin marker without a matching end marker.
pub fn unclosed_navigation(text: &str) -> Option<usize> {
    let lines: Vec<&str> = text.split('\n').collect();
    let bars = navigation_bars(&lines);
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(NAVIGATION_BEGIN))
        .map(|(index, _)| index)
        .find(|index| !bars.iter().any(|(begin, _)| begin == index))
        .map(|index| index + 1)
}

/// Remove every complete navigation bar, together with the blank lines it
/// leaves at the start and end of the document. Unmatched markers stay in
/// the text.
pub fn strip_navigation(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let bars = navigation_bars(&lines);
    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(index, _)| !bars.iter().any(|&(begin, end)| (begin..=end).contains(index)))
        .map(|(_, line)| *line)
        .collect();
    let stripped = kept.join("\n");
    let trimmed = stripped.trim_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Replace existing bars by `bar` at the top and bottom of the document.
pub fn insert_navigation(text: &str, bar: &NavigationBar) -> String {
    let body = strip_navigation(text);
    format!("{}\n\n{}\n\n{}\n", bar.top(), body.trim_end_matches('\n'), bar.bottom())
}

fn navigation_rank(heading_type: HeadingType) -> u8 {
    match heading_type {
        HeadingType::Preface => 0,
        HeadingType::Normal => 1,
        HeadingType::Appendix => 2,
    }
}

/// Chapter files in reading order: preface, main chapters, appendix.
pub fn navigation_order(mut files: Vec<LectureFile>) -> Vec<LectureFile> {
    files.sort_by(|a, b| {
        navigation_rank(a.heading_type())
            .cmp(&navigation_rank(b.heading_type()))
            .then_with(|| a.cmp(b))
    });
    files
}

/// Navigation bar of the file at `index` of an ordered file list.
pub fn navigation_for(files: &[LectureFile], index: usize, text: &str, config: &LectureConfig) -> NavigationBar {
    let previous = index.checked_sub(1).and_then(|i| files.get(i));
    let next = files.get(index + 1);
    let paragraphs = remove_codeblocks(&Paragraphs::from_text(text));
    NavigationBar::new(previous, next, &extract_page_numbers(&paragraphs, None), config)
}

/// Rewrite the navigation bars of every chapter file of the lecture.
pub fn update_navigation(root: &Path, config: &LectureConfig) -> Result<Vec<PathBuf>, Error> {
    io::ensure_lecture_root(root)?;
    let files = navigation_order(FileWalker::new(root).lecture_files()?);
    let mut written = Vec::new();
    for (index, file) in files.iter().enumerate() {
        let path = file.relative_path().to_path(root);
        let text = io::read_file(&path)?;
        if let Some(line) = unclosed_navigation(&text) {
            return Err(FormattingError::new("navigation bar is not closed", NAVIGATION_BEGIN)
                .at_line(line)
                .in_file(&path)
                .into());
        }
        let updated = insert_navigation(&text, &navigation_for(&files, index, &text, config));
        if updated != text {
            io::write_file(&path, &updated)?;
            written.push(path);
        }
    }
    log::info!("updated navigation in {} files", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageValue;
    use crate::tests::{create_test_file, create_test_lecture_dir};
    use mdlecture_config::Language;
    use pretty_assertions::assert_eq;

    fn pages(numbers: &[u32]) -> Vec<PageNumber> {
        numbers
            .iter()
            .map(|n| PageNumber::new("Seite", PageValue::Single(*n), true))
            .collect()
    }

    #[test]
    fn test_page_links_follow_gap() {
        let links = page_links(&pages(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]), 5).unwrap();
        assert_eq!(links, "[[1]](#p1), [[5]](#p5), [[10]](#p10)");
    }

    #[test]
    fn test_page_links_skip_multiples_close_to_first() {
        let links = page_links(&pages(&[4, 5, 6, 7, 8, 9, 10]), 5).unwrap();
        assert_eq!(links, "[[4]](#p4), [[10]](#p10)");
        assert_eq!(page_links(&[], 5), None);
    }

    #[test]
    fn test_roman_page_links() {
        let numbers = vec![PageNumber::new("Seite", PageValue::Single(3), false)];
        assert_eq!(page_links(&numbers, 5).unwrap(), "[[III]](#pIII)");
    }

    #[test]
    fn test_navigation_bar() {
        // Given a chapter between a preface and an appendix
        let previous = LectureFile::from("v01/v01.md");
        let next = LectureFile::from("anh01/anh01.md");
        let config = LectureConfig::default();

        // When building its bar
        let bar = NavigationBar::new(Some(&previous), Some(&next), &pages(&[1, 2]), &config);

        // Then both ends link neighbours, contents and pages
        insta::assert_snapshot!(bar.top(), @r"
        <!-- page navigation -->
        [Vorheriges](../v01/v01.html)  [Inhaltsverzeichnis](../inhalt.html)  [Nächstes](../anh01/anh01.html)

        Seiten: [[1]](#p1)

        * * * * *
        <!-- end page navigation -->
        ");
        insta::assert_snapshot!(bar.bottom(), @r"
        <!-- page navigation -->

        * * * * *

        Seiten: [[1]](#p1)

        [Vorheriges](../v01/v01.html)  [Inhaltsverzeichnis](../inhalt.html)  [Nächstes](../anh01/anh01.html)
        <!-- end page navigation -->
        ");
    }

    #[test]
    fn test_insert_replaces_existing_bar() {
        let config = LectureConfig {
            language: Language::En,
            ..LectureConfig::default()
        };
        let bar = NavigationBar::new(None, None, &[], &config);
        let once = insert_navigation("# Title\n\nText\n", &bar);
        let twice = insert_navigation(&once, &bar);

        assert_eq!(twice, once);
        assert_eq!(strip_navigation(&once), "# Title\n\nText\n");
        assert!(once.starts_with("<!-- page navigation -->\n[Table Of Contents](../inhalt.html)\n"));
    }

    #[test]
    fn test_navigation_order() {
        let files = vec![
            LectureFile::from("anh01/anh01.md"),
            LectureFile::from("k02/k02.md"),
            LectureFile::from("k01/k01.md"),
            LectureFile::from("v01/v01.md"),
        ];
        let ordered: Vec<String> = navigation_order(files)
            .iter()
            .map(|f| f.relative_path().to_string())
            .collect();
        assert_eq!(ordered, vec!["v01/v01.md", "k01/k01.md", "k02/k02.md", "anh01/anh01.md"]);
    }

    #[test]
    fn test_update_navigation_links_neighbours() {
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Eins\n\n|| - Seite 1 -\n\nText\n");
        create_test_file(&lecture, "k02/k02.md", "# Zwei\n\nText\n");

        let written = update_navigation(lecture.path(), &LectureConfig::default()).unwrap();

        assert_eq!(written.len(), 2);
        let first = io::read_file(&lecture.path().join("k01/k01.md")).unwrap();
        assert!(first.contains("[Inhaltsverzeichnis](../inhalt.html)  [Nächstes](../k02/k02.html)"));
        assert!(first.contains("Seiten: [[1]](#p1)"));
        let second = io::read_file(&lecture.path().join("k02/k02.md")).unwrap();
        assert!(second.contains("[Vorheriges](../k01/k01.html)  [Inhaltsverzeichnis](../inhalt.html)\n"));

        let again = update_navigation(lecture.path(), &LectureConfig::default()).unwrap();
        assert_eq!(again, Vec::<PathBuf>::new());
    }

    #[test]
    fn test_unclosed_bar_keeps_text() {
        // Given a begin marker without end marker
        let text = "<!-- page navigation -->\n# Title\n\nText\n";

        // When stripping navigation bars
        let stripped = strip_navigation(text);

        // Then nothing is lost
        assert_eq!(stripped, text);
        assert_eq!(unclosed_navigation(text), Some(1));
    }

    #[test]
    fn test_stray_begin_before_complete_bar() {
        let text = format!("{NAVIGATION_BEGIN}\nText\n{NAVIGATION_BEGIN}\nbar\n{NAVIGATION_END}\nMore\n");
        assert_eq!(strip_navigation(&text), format!("{NAVIGATION_BEGIN}\nText\nMore\n"));
        assert_eq!(unclosed_navigation(&text), Some(1));
        assert_eq!(unclosed_navigation("Text\n"), None);
    }

    #[test]
    fn test_update_navigation_refuses_unclosed_bar() {
        // Given a chapter with a truncated navigation bar
        let lecture = create_test_lecture_dir();
        let content = "# Eins\n\n<!-- page navigation -->\nText that must survive\n";
        let path = create_test_file(&lecture, "k01/k01.md", content);

        // When updating the navigation
        let err = update_navigation(lecture.path(), &LectureConfig::default()).unwrap_err();

        // Then the marker is reported and the file is untouched
        match err {
            Error::Formatting(err) => {
                assert_eq!(err.message, "navigation bar is not closed");
                assert_eq!(err.line, Some(3));
            }
            other => panic!("expected formatting error, got {other:?}"),
        }
        assert_eq!(io::read_file(&path).unwrap(), content);
    }
}

//! Preparing lecture files for conversion and running the converter over a
//! whole lecture.

pub mod navigation;
pub mod pandoc;

use std::path::{Path, PathBuf};

use mdlecture_config::LectureConfig;

pub use navigation::{
    NAVIGATION_BEGIN, NAVIGATION_END, NavigationBar, insert_navigation, navigation_for, navigation_order, page_links,
    strip_navigation, update_navigation,
};
pub use pandoc::{DocumentConverter, PandocConverter};

use crate::error::{Error, StructuralError};
use crate::io::{self, FileWalker};
use crate::models::{LectureFile, PageNumber, PageValue};
use crate::mparser::{Paragraphs, extract_page_numbers, remove_codeblocks};

/// Anchor of a page, without the `p` prefix: `12` or `XII`. Ranges are
/// addressed by their first page.
pub fn page_anchor(number: &PageNumber) -> String {
    PageNumber {
        value: PageValue::Single(number.value.first()),
        ..number.clone()
    }
    .format_value()
}

/// Replace every page-number paragraph by an HTML anchor the navigation bar
/// can link to, e.g. `<p><span id="p12">- Seite 12 -</span></p>`.
pub fn rewrite_page_numbers(text: &str) -> String {
    let paragraphs = remove_codeblocks(&Paragraphs::from_text(text));
    let numbers = extract_page_numbers(&paragraphs, None);
    if numbers.is_empty() {
        return text.to_string();
    }
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for number in &numbers {
        let Some(line) = number.line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
            continue;
        };
        let label = line.trim_start_matches('|').trim();
        *line = format!(
            "<p><span id=\"p{}\">{}</span></p>",
            page_anchor(number),
            html_escape::encode_text(label)
        );
    }
    lines.join("\n")
}

/// The document as handed to the converter: fresh navigation bars for
/// chapter files, page markers turned into anchors.
pub fn prepare_document(text: &str, navigation: Option<&NavigationBar>) -> String {
    let text = match navigation {
        Some(bar) => insert_navigation(text, bar),
        None => text.to_string(),
    };
    rewrite_page_numbers(&text)
}

/// Outcome of [`convert_tree`]. Files that failed do not stop the others.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub converted: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl ConversionReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert every chapter file and every markdown file at the lecture root,
/// writing `<name>.<ext>` next to each source.
pub fn convert_tree(
    root: &Path,
    config: &LectureConfig,
    converter: &dyn DocumentConverter,
) -> Result<ConversionReport, Error> {
    io::ensure_lecture_root(root)?;
    let chapters = navigation_order(FileWalker::new(root).lecture_files()?);
    let mut report = ConversionReport::default();

    for (index, file) in chapters.iter().enumerate() {
        let path = file.relative_path().to_path(root);
        let result = io::read_file(&path).map_err(Error::from).and_then(|text| {
            let bar = navigation_for(&chapters, index, &text, config);
            convert_file(root, file, &prepare_document(&text, Some(&bar)), config, converter)
        });
        record(&mut report, path, result);
    }

    for file in root_documents(root)? {
        let path = file.relative_path().to_path(root);
        let result = io::read_file(&path)
            .map_err(Error::from)
            .and_then(|text| convert_file(root, &file, &prepare_document(&text, None), config, converter));
        record(&mut report, path, result);
    }
    log::info!(
        "converted {} files, {} failed",
        report.converted.len(),
        report.failures.len()
    );
    Ok(report)
}

fn record(report: &mut ConversionReport, path: PathBuf, result: Result<PathBuf, Error>) {
    match result {
        Ok(target) => report.converted.push(target),
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            report.failures.push((path, err));
        }
    }
}

/// Markdown files directly in the lecture root, such as the table of
/// contents or the glossary.
fn root_documents(root: &Path) -> Result<Vec<LectureFile>, StructuralError> {
    let entries = FileWalker::new(root).all_files(true).walk()?;
    Ok(entries
        .into_iter()
        .find(|entry| entry.dir == root)
        .map(|entry| entry.files.iter().map(|name| LectureFile::from(name.as_str())).collect())
        .unwrap_or_default())
}

fn convert_file(
    root: &Path,
    file: &LectureFile,
    document: &str,
    config: &LectureConfig,
    converter: &dyn DocumentConverter,
) -> Result<PathBuf, Error> {
    let source = file.relative_path().to_path(root);
    let output = converter.convert(document, config.format, &source)?;
    let target = file.target_path(config.format.extension()).to_path(root);
    std::fs::write(&target, output).map_err(|e| StructuralError::io("cannot write file", &target, e))?;
    log::debug!("wrote {}", target.display());
    Ok(target)
}

use std::path::PathBuf;

use mdlecture_config::l10n::{capitalize, title_case};
use mdlecture_config::{LectureConfig, Phrase, Translator};
use relative_path::RelativePathBuf;

use super::{ChapterNumberEnumerator, HeadingIndex};
use crate::error::FormattingError;
use crate::models::{Heading, HeadingType};

/// One numbered line of the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub number: Vec<u32>,
    pub heading: Heading,
    pub path: RelativePathBuf,
}

/// Optional documents at the lecture root that get a link below the
/// chapters, when present.
const EXTRA_DOCUMENTS: &[(&str, Phrase)] = &[
    ("glossar", Phrase::Glossary),
    ("index", Phrase::Index),
    ("kurz", Phrase::ListOfAbbreviations),
    ("taktil", Phrase::ListOfTactileGraphics),
    ("copyright", Phrase::CopyrightNotice),
];

/// Renders a [`HeadingIndex`] as a linked markdown table of contents.
#[derive(Debug, Clone)]
pub struct TocFormatter<'a> {
    config: &'a LectureConfig,
    translator: Translator,
    preface: Vec<TocEntry>,
    chapters: Vec<TocEntry>,
    appendix: Vec<TocEntry>,
    lecture_root: Option<PathBuf>,
}

impl<'a> TocFormatter<'a> {
    /// Number all headings up to the configured depth; preface, chapters
    /// and appendix are numbered independently. Fails on a heading without
    /// chapter number.
    pub fn new(index: &HeadingIndex, config: &'a LectureConfig) -> Result<Self, FormattingError> {
        let mut formatter = Self {
            config,
            translator: config.translator(),
            preface: Vec::new(),
            chapters: Vec::new(),
            appendix: Vec::new(),
            lecture_root: None,
        };
        let mut preface = ChapterNumberEnumerator::new();
        let mut chapters = ChapterNumberEnumerator::new();
        let mut appendix = ChapterNumberEnumerator::new();

        for (file, headings) in index.files() {
            for heading in headings {
                if heading.level() > config.toc_depth {
                    continue;
                }
                let (enumerator, entries) = match heading.heading_type() {
                    HeadingType::Preface => (&mut preface, &mut formatter.preface),
                    HeadingType::Normal => (&mut chapters, &mut formatter.chapters),
                    HeadingType::Appendix => (&mut appendix, &mut formatter.appendix),
                };
                enumerator
                    .register(heading)
                    .map_err(|e| e.at_line(heading.line()).in_file(file.relative_path().as_str()))?;
                let number = enumerator.enumeration();
                let mut heading = heading.clone();
                heading.set_number(number.clone());
                entries.push(TocEntry {
                    number,
                    heading,
                    path: file.relative_path().to_relative_path_buf(),
                });
            }
        }
        Ok(formatter)
    }

    /// Look for optional documents (title page, glossary, ...) in `root`.
    pub fn with_lecture_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.lecture_root = Some(root.into());
        self
    }

    pub fn entries(&self, heading_type: HeadingType) -> &[TocEntry] {
        match heading_type {
            HeadingType::Preface => &self.preface,
            HeadingType::Normal => &self.chapters,
            HeadingType::Appendix => &self.appendix,
        }
    }

    fn phrase(&self, phrase: Phrase) -> &'static str {
        self.translator.get(phrase)
    }

    fn has_document(&self, stem: &str) -> bool {
        self.lecture_root.as_ref().is_some_and(|root| {
            root.join(format!("{stem}.md")).is_file()
                || root.join(format!("{}.md", stem.to_uppercase())).is_file()
        })
    }

    /// The complete table of contents document.
    pub fn format(&self) -> String {
        let extension = self.config.format.extension();
        let title = format!(
            "{} - {}",
            title_case(self.phrase(Phrase::TableOfContents)),
            self.config.lecture_title
        );
        let mut output = format!("{title}\n{}\n\n", "=".repeat(title.chars().count()));

        if self.has_document("titel") {
            output += &format!("[{}](titel.{extension})\n\n", title_case(self.phrase(Phrase::TitlePage)));
        }
        if !self.preface.is_empty() {
            output += &self.format_section(Some(title_case(self.phrase(Phrase::Preface))), &self.preface);
        }
        let chapters_title = (!self.preface.is_empty()).then(|| title_case(self.phrase(Phrase::Chapters)));
        output += &self.format_section(chapters_title, &self.chapters);
        if !self.appendix.is_empty() {
            let appendix_title =
                (!self.config.appendix_prefix).then(|| title_case(self.phrase(Phrase::Appendix)));
            output += &self.format_section(appendix_title, &self.appendix);
        }

        let extras: Vec<String> = EXTRA_DOCUMENTS
            .iter()
            .filter(|(stem, _)| self.has_document(stem))
            .map(|(stem, phrase)| format!("[{}]({stem}.{extension})", capitalize(self.phrase(*phrase))))
            .collect();
        if !extras.is_empty() {
            output += &extras.join("\\\n");
            output += "\n\n";
        }
        if self.has_document("info") {
            output += &format!(
                "* * * * *\n\n[{}](info.{extension})\n",
                capitalize(self.phrase(Phrase::AccessibilityRemarks))
            );
        }
        format!("{}\n", output.trim_end())
    }

    /// A section: optional underlined title, then one link per line, joined
    /// by markdown line breaks.
    fn format_section(&self, title: Option<String>, entries: &[TocEntry]) -> String {
        let mut section = String::new();
        if let Some(title) = title {
            section += &format!("{title}\n{}\n\n", "-".repeat(title.chars().count()));
        }
        let links: Vec<String> = entries.iter().map(|entry| self.toc_link(entry)).collect();
        section += &links.join("\\\n");
        section += "\n\n";
        section
    }

    fn toc_link(&self, entry: &TocEntry) -> String {
        let prefix = if self.config.appendix_prefix && entry.heading.heading_type() == HeadingType::Appendix {
            "A."
        } else {
            ""
        };
        let number = entry.number.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
        let mut text = entry.heading.text().replace('\n', " ");
        if entry.heading.is_unedited() {
            text += &format!(" ({})", self.phrase(Phrase::NotEdited));
        }
        let target = entry.path.with_extension(self.config.format.extension());
        format!("[{prefix}{number}. {text}]({target}#{})", entry.heading.id())
    }
}

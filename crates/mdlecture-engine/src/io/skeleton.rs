use std::path::{Path, PathBuf};

use mdlecture_config::{LectureConfig, Phrase, Translator, l10n::capitalize};

use super::write_file;
use crate::error::{Error, StructuralError};

/// Generates the directory layout of a new lecture.
///
/// Every chapter file holds nothing but an underlined level-1 heading, which
/// is what the table of contents recognises as "not edited".
#[derive(Debug, Clone)]
pub struct LectureSkeleton {
    chapters: u32,
    appendix_chapters: u32,
    preface: bool,
    exercise_sheets: bool,
    config: LectureConfig,
}

impl LectureSkeleton {
    /// Chapter numbers are written with two digits.
    pub const MAX_CHAPTERS: u32 = 99;

    pub fn new(chapters: u32, config: LectureConfig) -> Self {
        Self {
            chapters,
            appendix_chapters: 0,
            preface: false,
            exercise_sheets: false,
            config,
        }
    }

    pub fn appendix_chapters(mut self, count: u32) -> Self {
        self.appendix_chapters = count;
        self
    }

    pub fn preface(mut self, preface: bool) -> Self {
        self.preface = preface;
        self
    }

    /// Use `blattNN` instead of `kNN` for the main chapters.
    pub fn exercise_sheets(mut self, sheets: bool) -> Self {
        self.exercise_sheets = sheets;
        self
    }

    /// Create the lecture at `root`; returns the chapter files written.
    pub fn generate(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        if self.chapters.max(self.appendix_chapters) > Self::MAX_CHAPTERS {
            return Err(StructuralError::new(
                format!("a lecture can have at most {} chapters of each kind", Self::MAX_CHAPTERS),
                root,
            )
            .into());
        }
        if root.exists() && !root.is_dir() {
            return Err(StructuralError::new("lecture root is not a directory", root).into());
        }
        std::fs::create_dir_all(root)
            .map_err(|e| StructuralError::io("cannot create lecture directory", root, e))?;
        self.config.validate()?;
        self.config
            .save_to_lecture(root)
            .map_err(|e| StructuralError::new(format!("cannot write configuration: {e:#}"), root))?;

        let translator = self.config.translator();
        let mut written = Vec::new();
        if self.preface {
            written.push(self.create_chapter(root, "v", 1, Phrase::Preface, &translator)?);
        }
        let (prefix, phrase) = if self.exercise_sheets {
            ("blatt", Phrase::Paper)
        } else {
            ("k", Phrase::Chapter)
        };
        for number in 1..=self.chapters {
            written.push(self.create_chapter(root, prefix, number, phrase, &translator)?);
        }
        for number in 1..=self.appendix_chapters {
            written.push(self.create_chapter(root, "anh", number, Phrase::Appendix, &translator)?);
        }
        log::info!("created lecture skeleton with {} files in {}", written.len(), root.display());
        Ok(written)
    }

    fn create_chapter(
        &self,
        root: &Path,
        prefix: &str,
        number: u32,
        phrase: Phrase,
        translator: &Translator,
    ) -> Result<PathBuf, StructuralError> {
        let name = format!("{prefix}{number:02}");
        let path = root.join(&name).join(format!("{name}.md"));
        write_file(&path, &skeleton_heading(translator.get(phrase), number))?;
        Ok(path)
    }
}

fn skeleton_heading(phrase: &str, number: u32) -> String {
    let heading = capitalize(&format!("{phrase} {number}"));
    format!("{heading}\n{}\n\n", "=".repeat(heading.chars().count()))
}

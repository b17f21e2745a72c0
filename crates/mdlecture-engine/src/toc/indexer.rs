use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, StructuralError};
use crate::io::{self, FileWalker};
use crate::models::{Heading, LectureFile};
use crate::mparser::{Paragraphs, extract_headings_from_file, remove_codeblocks};

/// Headings of every chapter file, ordered by relative path.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeadingIndex {
    files: BTreeMap<LectureFile, Vec<Heading>>,
}

impl HeadingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: LectureFile, headings: Vec<Heading>) {
        self.files.insert(file, headings);
    }

    pub fn files(&self) -> impl Iterator<Item = (&LectureFile, &[Heading])> {
        self.files.iter().map(|(file, headings)| (file, headings.as_slice()))
    }

    pub fn headings_of(&self, file: &LectureFile) -> Option<&[Heading]> {
        self.files.get(file).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if no file contributed a heading.
    pub fn is_empty(&self) -> bool {
        self.files.values().all(Vec::is_empty)
    }
}

/// Collects the headings of all chapter files below a lecture root.
#[derive(Debug, Clone)]
pub struct HeadingIndexer {
    root: PathBuf,
}

impl HeadingIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StructuralError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StructuralError::new("directory does not exist", root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every chapter file and build the index. Headings get their
    /// type from the directory they live in.
    pub fn walk(&self) -> Result<HeadingIndex, Error> {
        let mut index = HeadingIndex::new();
        for file in FileWalker::new(&self.root).lecture_files()? {
            let path = file.relative_path().to_path(&self.root);
            let text = io::read_file(&path)?;
            let mut headings = file_headings(&path, &text)?;
            let heading_type = file.heading_type();
            for heading in &mut headings {
                heading.set_heading_type(heading_type);
            }
            log::debug!("indexed {} headings from {}", headings.len(), file.relative_path());
            index.add_file(file, headings);
        }
        Ok(index)
    }
}

/// Headings of one chapter file, marked unedited if the file is still the
/// generated skeleton.
pub fn file_headings(path: &Path, text: &str) -> Result<Vec<Heading>, StructuralError> {
    let paragraphs = Paragraphs::from_text(text);
    let mut headings = extract_headings_from_file(path, &remove_codeblocks(&paragraphs), None)?;
    if is_unedited(&paragraphs, &headings) {
        for heading in &mut headings {
            heading.set_unedited(true);
        }
    }
    Ok(headings)
}

/// Best-effort check whether a file consists of headings only.
///
/// Accepted paragraphs: a single heading line, two `#` headings, an
/// underlined heading, or any number of `#` headings. Anything else means
/// somebody wrote content.
pub fn is_unedited(paragraphs: &Paragraphs, headings: &[Heading]) -> bool {
    let heading_lines: HashSet<usize> = headings.iter().map(Heading::line).collect();
    let all_hashed = |lines: &[String]| lines.iter().all(|l| l.starts_with('#'));

    paragraphs.iter().all(|(start, lines)| match lines {
        [] => true,
        [_] => heading_lines.contains(&start),
        [_, underline] => {
            all_hashed(lines)
                || ((underline.contains("----") || underline.contains("===="))
                    && heading_lines.contains(&start))
        }
        _ => all_hashed(lines),
    })
}

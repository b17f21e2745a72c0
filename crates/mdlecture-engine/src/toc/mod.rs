//! Table of contents: heading index, chapter numbering and rendering.

pub mod enumerator;
pub mod formatter;
pub mod indexer;

use std::path::{Path, PathBuf};

use mdlecture_config::LectureConfig;

pub use enumerator::{ChapterNumberEnumerator, Enumerable};
pub use formatter::{TocEntry, TocFormatter};
pub use indexer::{HeadingIndex, HeadingIndexer, file_headings, is_unedited};

use crate::error::{Error, StructuralError};
use crate::io;

/// File name of the generated table of contents.
pub const TOC_FILE_NAME: &str = "inhalt.md";

/// Index the lecture at `root` and render its table of contents.
pub fn build_toc(root: &Path, config: &LectureConfig) -> Result<String, Error> {
    io::ensure_lecture_root(root)?;
    let index = HeadingIndexer::new(root)?.walk()?;
    if index.is_empty() {
        return Err(StructuralError::new("no headings found in any chapter", root).into());
    }
    Ok(TocFormatter::new(&index, config)?.with_lecture_root(root).format())
}

/// Write the table of contents to [`TOC_FILE_NAME`] below `root`. Does
/// nothing if the configuration disables it.
pub fn write_toc(root: &Path, config: &LectureConfig) -> Result<Option<PathBuf>, Error> {
    if !config.generate_toc {
        log::info!("table of contents disabled in configuration");
        return Ok(None);
    }
    let toc = build_toc(root, config)?;
    let path = root.join(TOC_FILE_NAME);
    io::write_file(&path, &toc)?;
    log::info!("wrote {}", path.display());
    Ok(Some(path))
}

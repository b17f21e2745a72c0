use relative_path::{RelativePath, RelativePathBuf};

use super::HeadingType;

/// Prefix of preface directories and files (`v01`).
pub const PREFACE_PREFIXES: &[&str] = &["v"];
/// Prefixes of main chapters (`k01`) and exercise sheets (`blatt01`).
pub const MAIN_PREFIXES: &[&str] = &["k", "blatt"];
/// Prefix of appendix chapters (`anh01`).
pub const APPENDIX_PREFIXES: &[&str] = &["anh"];

fn all_prefixes() -> impl Iterator<Item = &'static str> {
    PREFACE_PREFIXES
        .iter()
        .chain(MAIN_PREFIXES)
        .chain(APPENDIX_PREFIXES)
        .copied()
}

/// Whether a file or directory name starts with a chapter prefix directly
/// followed by a digit (`k01`, `anh02.md`, `blatt3`).
pub fn valid_file_bgn(name: &str) -> bool {
    all_prefixes().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Numbering stream of a chapter directory or file, judged by its name.
pub fn heading_type_for(name: &str) -> HeadingType {
    if APPENDIX_PREFIXES.iter().any(|p| name.starts_with(p)) {
        HeadingType::Appendix
    } else if is_preface_name(name) {
        HeadingType::Preface
    } else {
        HeadingType::Normal
    }
}

// `v` followed by two digits; plain `v...` words are not prefaces
fn is_preface_name(name: &str) -> bool {
    PREFACE_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix).is_some_and(|rest| {
            rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_digit)
        })
    })
}

/// A markdown file of a lecture, addressed relative to the lecture root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LectureFile {
    relative_path: RelativePathBuf,
}

impl LectureFile {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        Self { relative_path }
    }

    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    pub fn file_name(&self) -> &str {
        self.relative_path.file_name().unwrap_or_default()
    }

    /// Name of the containing chapter directory, or the file name for files
    /// at the lecture root.
    pub fn chapter_dir(&self) -> &str {
        self.relative_path
            .parent()
            .and_then(|parent| parent.file_name())
            .unwrap_or_else(|| self.file_name())
    }

    pub fn heading_type(&self) -> HeadingType {
        heading_type_for(self.chapter_dir())
    }

    /// Path of the converted file, e.g. `k01/k01.html` for extension `html`.
    pub fn target_path(&self, extension: &str) -> RelativePathBuf {
        self.relative_path.with_extension(extension)
    }
}

impl From<RelativePathBuf> for LectureFile {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for LectureFile {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

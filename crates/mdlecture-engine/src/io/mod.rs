pub mod skeleton;

use std::fs;
use std::path::{Path, PathBuf};

use mdlecture_config::CONFIG_FILE_NAME;
use relative_path::RelativePathBuf;

use crate::error::StructuralError;
use crate::models::{LectureFile, valid_file_bgn};

pub use skeleton::LectureSkeleton;

/// Directory names (lower-cased prefixes) never descended into.
pub const DEFAULT_BLACKLIST: &[&str] = &["quell", ".svn", ".git", "bilder", "images"];

/// One visited directory with its interesting subdirectories and files,
/// both as plain names, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub dir: PathBuf,
    pub subdirs: Vec<String>,
    pub files: Vec<String>,
}

impl WalkEntry {
    pub fn file_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|file| self.dir.join(file))
    }
}

/// Walks a lecture tree, skipping blacklisted directories and, unless told
/// otherwise, everything not named like a chapter (`k01`, `anh02.md`).
#[derive(Debug, Clone)]
pub struct FileWalker {
    root: PathBuf,
    blacklist: Vec<String>,
    endings: Vec<String>,
    chapter_prefixed_only: bool,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            endings: vec![".md".to_string()],
            chapter_prefixed_only: true,
        }
    }

    pub fn add_blacklisted(mut self, name: impl Into<String>) -> Self {
        self.blacklist.push(name.into().to_lowercase());
        self
    }

    pub fn endings(mut self, endings: &[&str]) -> Self {
        self.endings = endings.iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Also list files and directories without a chapter prefix.
    pub fn all_files(mut self, all: bool) -> Self {
        self.chapter_prefixed_only = !all;
        self
    }

    fn interesting_dir(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        !self.blacklist.iter().any(|bad| name.starts_with(bad.as_str()))
            && (!self.chapter_prefixed_only || valid_file_bgn(&name))
    }

    fn interesting_file(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.endings.iter().any(|ending| lower.ends_with(ending.as_str()))
            && (!self.chapter_prefixed_only || valid_file_bgn(name))
    }

    /// Visit the tree breadth first. A file as root yields a single entry
    /// for its directory.
    pub fn walk(&self) -> Result<Vec<WalkEntry>, StructuralError> {
        if !self.root.exists() {
            return Err(StructuralError::new("directory does not exist", &self.root));
        }
        if self.root.is_file() {
            let dir = match self.root.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let file = self
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(vec![WalkEntry {
                dir,
                subdirs: Vec::new(),
                files: vec![file],
            }]);
        }

        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];
        let mut next = 0;
        while next < pending.len() {
            let dir = pending[next].clone();
            next += 1;

            let (mut subdirs, mut files) = (Vec::new(), Vec::new());
            let read = fs::read_dir(&dir)
                .map_err(|e| StructuralError::io("cannot read directory", &dir, e))?;
            for entry in read {
                let entry = entry.map_err(|e| StructuralError::io("cannot read directory", &dir, e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = entry.path();
                if path.is_dir() {
                    if self.interesting_dir(&name) {
                        subdirs.push(name);
                    }
                } else if self.interesting_file(&name) {
                    files.push(name);
                }
            }
            subdirs.sort();
            files.sort();
            pending.extend(subdirs.iter().map(|name| dir.join(name)));
            entries.push(WalkEntry { dir, subdirs, files });
        }
        Ok(entries)
    }

    /// All matching files, in walk order.
    pub fn files(&self) -> Result<Vec<PathBuf>, StructuralError> {
        Ok(self.walk()?.iter().flat_map(WalkEntry::file_paths).collect())
    }

    /// All matching files as [`LectureFile`]s relative to the walked root.
    pub fn lecture_files(&self) -> Result<Vec<LectureFile>, StructuralError> {
        let mut files = Vec::new();
        for path in self.files()? {
            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            let relative = RelativePathBuf::from_path(relative)
                .map_err(|_| StructuralError::new("path cannot be expressed relative to the lecture", &path))?;
            files.push(LectureFile::new(relative));
        }
        Ok(files)
    }
}

/// Read a whole file; missing files and non-UTF-8 content are structural
/// errors.
pub fn read_file(path: &Path) -> Result<String, StructuralError> {
    if !path.exists() {
        return Err(StructuralError::new("file not found", path));
    }
    let bytes = fs::read(path).map_err(|e| StructuralError::io("cannot read file", path, e))?;
    String::from_utf8(bytes).map_err(|_| StructuralError::new("file is not valid UTF-8", path))
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<(), StructuralError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StructuralError::io("cannot create directory", parent, e))?;
    }
    fs::write(path, content).map_err(|e| StructuralError::io("cannot write file", path, e))
}

/// A lecture root is not itself chapter-prefixed and either holds a
/// chapter directory or a configuration file.
pub fn is_lecture_root(dir: &Path) -> bool {
    let name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    if valid_file_bgn(&name) {
        return false;
    }
    if dir.join(CONFIG_FILE_NAME).is_file() {
        return true;
    }
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|entry| {
                entry.path().is_dir() && valid_file_bgn(&entry.file_name().to_string_lossy())
            })
        })
        .unwrap_or(false)
}

/// Fail unless `dir` is a lecture root.
pub fn ensure_lecture_root(dir: &Path) -> Result<(), StructuralError> {
    if !dir.is_dir() {
        return Err(StructuralError::new("directory does not exist", dir));
    }
    if !is_lecture_root(dir) {
        return Err(StructuralError::new(
            "this operation must be run on the lecture root",
            dir,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_lecture_dir};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_walk_filters_and_sorts() {
        // Given a lecture with chapters, an image folder and stray files
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k02/k02.md", "# Zwei");
        create_test_file(&lecture, "k01/k01.md", "# Eins");
        create_test_file(&lecture, "k01/bilder.md", "Bilder\n======");
        create_test_file(&lecture, "k01/bilder/k01.md", "# hidden");
        create_test_file(&lecture, "anh01/anh01.md", "# Anhang");
        create_test_file(&lecture, "notes/k09.md", "# not a chapter dir");
        create_test_file(&lecture, "inhalt.md", "toc");

        // When walking it
        let entries = FileWalker::new(lecture.path()).walk().unwrap();

        // Then only chapter directories and files are listed, sorted
        let listed: Vec<(String, Vec<String>)> = entries
            .iter()
            .map(|e| {
                let dir = e.dir.strip_prefix(lecture.path()).unwrap().to_string_lossy().into_owned();
                (dir, e.files.clone())
            })
            .collect();
        assert_eq!(
            listed,
            vec![
                ("".to_string(), vec![]),
                ("anh01".to_string(), vec!["anh01.md".to_string()]),
                ("k01".to_string(), vec!["k01.md".to_string()]),
                ("k02".to_string(), vec!["k02.md".to_string()]),
            ]
        );
        assert_eq!(entries[0].subdirs, vec!["anh01", "k01", "k02"]);
    }

    #[test]
    fn test_walk_all_files() {
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Eins");
        create_test_file(&lecture, "k01/bilder.md", "Bilder");
        create_test_file(&lecture, "k01/images/pic.md", "ignored");

        let files = FileWalker::new(lecture.path()).all_files(true).files().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["bilder.md", "k01.md"]);
    }

    #[test]
    fn test_walk_single_file() {
        let lecture = create_test_lecture_dir();
        let path = create_test_file(&lecture, "k01/k01.md", "# Eins");

        let entries = FileWalker::new(&path).walk().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].files, vec!["k01.md"]);
        assert_eq!(entries[0].dir, lecture.path().join("k01"));
    }

    #[test]
    fn test_walk_missing_directory() {
        let err = FileWalker::new("/this/path/does/not/exist").walk().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_lecture_files_are_relative() {
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, "k01/k01.md", "# Eins");
        let files = FileWalker::new(lecture.path()).lecture_files().unwrap();
        assert_eq!(files, vec![LectureFile::from("k01/k01.md")]);
    }

    #[test]
    fn test_read_file_rejects_invalid_utf8() {
        let lecture = create_test_lecture_dir();
        let path = lecture.path().join("k01.md");
        std::fs::write(&path, [0x66, 0xff, 0xfe]).unwrap();

        let err = read_file(&path).unwrap_err();
        assert_eq!(err.message, "file is not valid UTF-8");
        assert!(read_file(&lecture.path().join("missing.md")).is_err());
    }

    #[test]
    fn test_write_file_creates_directories() {
        let lecture = create_test_lecture_dir();
        let path = lecture.path().join("k03/k03.md");
        write_file(&path, "# Drei").unwrap();
        assert_eq!(read_file(&path).unwrap(), "# Drei");
    }

    #[test]
    fn test_is_lecture_root() {
        let lecture = create_test_lecture_dir();
        assert!(!is_lecture_root(lecture.path()));

        create_test_file(&lecture, "k01/k01.md", "# Eins");
        assert!(is_lecture_root(lecture.path()));
        assert!(!is_lecture_root(&lecture.path().join("k01")));
        assert!(ensure_lecture_root(&lecture.path().join("k01")).is_err());
    }

    #[test]
    fn test_config_file_marks_lecture_root() {
        let lecture = create_test_lecture_dir();
        create_test_file(&lecture, CONFIG_FILE_NAME, "lectureTitle = \"x\"\n");
        assert!(is_lecture_root(lecture.path()));
    }
}

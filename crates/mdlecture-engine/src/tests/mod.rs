use std::path::PathBuf;
use tempfile::TempDir;

pub fn create_test_lecture_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` to `relative_path` below the lecture, creating directories.
pub fn create_test_file(lecture: &TempDir, relative_path: &str, content: &str) -> PathBuf {
    let path = lecture.path().join(relative_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create directory");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

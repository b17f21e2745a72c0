use std::path::Path;

use super::{CachedFile, DirectoryCheck, Issue, Priority};

/// Directory or file names of image descriptions, in every supported
/// language. Their headings do not belong to the chapter.
const IMAGE_PATH_MARKERS: &[&str] = &["images", "bilder", "image descriptions", "bildbeschreibung"];

fn is_image_description(path: &Path) -> bool {
    let path = path.to_string_lossy().to_lowercase();
    IMAGE_PATH_MARKERS.iter().any(|marker| path.contains(marker))
}

/// A chapter has exactly one level-1 heading, even when split over files.
pub struct LevelOneHeadings;

impl DirectoryCheck for LevelOneHeadings {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, dir: &Path, files: &[CachedFile]) -> Vec<Issue> {
        let mut level_one = files
            .iter()
            .filter(|file| !is_image_description(&file.path))
            .flat_map(|file| file.headings.iter().filter(|h| h.level() == 1).map(move |h| (file, h)));
        let (Some(_), Some((file, second))) = (level_one.next(), level_one.next()) else {
            return Vec::new();
        };
        vec![
            Issue::at_line(
                second.line(),
                format!(
                    "there is more than one level-1 heading in {}, a chapter or slide set has only one",
                    dir.display()
                ),
            )
            .in_file(&file.path),
        ]
    }
}

/// The same word for "page" throughout a directory.
pub struct UniformPageTokens;

impl DirectoryCheck for UniformPageTokens {
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn check(&self, _dir: &Path, files: &[CachedFile]) -> Vec<Issue> {
        let mut numbers = files
            .iter()
            .flat_map(|file| file.page_numbers.iter().map(move |number| (file, number)));
        let Some((first_file, first)) = numbers.next() else {
            return Vec::new();
        };
        let token = first.identifier.to_lowercase();
        let Some((file, diverging)) = numbers.find(|(_, number)| number.identifier.to_lowercase() != token)
        else {
            return Vec::new();
        };
        let first_name = first_file.path.file_name().unwrap_or_default().to_string_lossy();
        vec![
            Issue::at_line(
                diverging.line,
                format!(
                    "\"{}\" was used in {first_name}, line {}, but now \"{}\"; page markers should be uniform",
                    first.identifier, first.line, diverging.identifier
                ),
            )
            .in_file(&file.path),
        ]
    }
}

/// Too many headings of one level in a row make the table of contents hard
/// to read.
pub struct TooManyHeadings {
    pub threshold: usize,
    pub toc_depth: u8,
}

impl TooManyHeadings {
    pub const DEFAULT_THRESHOLD: usize = 20;

    pub fn new(toc_depth: u8) -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            toc_depth,
        }
    }
}

impl DirectoryCheck for TooManyHeadings {
    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn check(&self, _dir: &Path, files: &[CachedFile]) -> Vec<Issue> {
        let mut counters = [0usize; 6];
        for heading in files.iter().flat_map(|file| file.headings.iter()) {
            if heading.level() > self.toc_depth {
                continue;
            }
            let index = usize::from(heading.level()).clamp(1, 6) - 1;
            counters[index] += 1;
            counters[index + 1..].fill(0);
            if counters[index] > self.threshold {
                return vec![Issue::general(format!(
                    "there are more than {} headings of level {}; lower tocDepth in the configuration or use fewer headings",
                    self.threshold,
                    heading.level()
                ))];
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Heading, PageNumber, PageValue};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn file(path: &str, levels: &[u8]) -> CachedFile {
        CachedFile {
            path: PathBuf::from(path),
            headings: levels
                .iter()
                .enumerate()
                .map(|(i, level)| Heading::new(format!("h{i}"), *level).with_line(i * 2 + 1))
                .collect(),
            page_numbers: Vec::new(),
        }
    }

    fn with_tokens(path: &str, tokens: &[&str]) -> CachedFile {
        CachedFile {
            path: PathBuf::from(path),
            headings: Vec::new(),
            page_numbers: tokens
                .iter()
                .enumerate()
                .map(|(i, token)| PageNumber::new(*token, PageValue::Single(i as u32 + 1), true).at_line(i * 2 + 1))
                .collect(),
        }
    }

    #[test]
    fn test_second_level_one_heading_is_reported() {
        // Given a chapter split over two files, each with a level-1 heading
        let files = vec![file("k01/k01.md", &[1, 2]), file("k01/k0101.md", &[1])];

        // When checking the directory
        let issues = LevelOneHeadings.check(Path::new("k01"), &files);

        // Then the second heading is reported in its file
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, Some(PathBuf::from("k01/k0101.md")));
        assert_eq!(issues[0].line, Some(1));
    }

    #[test]
    fn test_image_descriptions_are_ignored() {
        let files = vec![file("k01/k01.md", &[1]), file("k01/bilder.md", &[1])];
        assert_eq!(LevelOneHeadings.check(Path::new("k01"), &files), vec![]);
    }

    #[test]
    fn test_uniform_page_tokens() {
        let uniform = vec![with_tokens("k01/k01.md", &["Seite", "seite"]), with_tokens("k01/k0101.md", &["Seite"])];
        assert_eq!(UniformPageTokens.check(Path::new("k01"), &uniform), vec![]);

        let mixed = vec![with_tokens("k01/k01.md", &["Folie", "Folie"]), with_tokens("k01/k0101.md", &["Seite"])];
        let issues = UniformPageTokens.check(Path::new("k01"), &mixed);
        assert_eq!(
            issues,
            vec![
                Issue::at_line(1, "\"Folie\" was used in k01.md, line 1, but now \"Seite\"; page markers should be uniform")
                    .in_file("k01/k0101.md")
            ]
        );
    }

    #[test]
    fn test_too_many_headings() {
        let check = TooManyHeadings::new(2);

        let mut levels = vec![1];
        levels.extend([2; 20]);
        assert_eq!(check.check(Path::new("k01"), &[file("k01/k01.md", &levels)]), vec![]);

        levels.push(2);
        assert_eq!(check.check(Path::new("k01"), &[file("k01/k01.md", &levels)]).len(), 1);
    }

    #[test]
    fn test_too_many_headings_resets_below_and_respects_depth() {
        let check = TooManyHeadings::new(2);
        let mut levels = Vec::new();
        for _ in 0..3 {
            levels.push(1);
            levels.extend([2; 15]);
        }
        levels.extend([3; 30]);
        assert_eq!(check.check(Path::new("k01"), &[file("k01/k01.md", &levels)]), vec![]);
    }
}

use mdlecture_config::ConfigError;
use std::path::PathBuf;

/// Anything that can go wrong while analysing or converting a lecture.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Formatting(#[from] FormattingError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The lecture tree itself is not what an operation expects: a missing
/// directory, an unreadable file, a badly named chapter.
#[derive(Debug, thiserror::Error)]
#[error("{message}: {}", path.display())]
pub struct StructuralError {
    pub message: String,
    pub path: PathBuf,
    #[source]
    pub source: Option<std::io::Error>,
}

impl StructuralError {
    pub fn new(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            source: Some(source),
        }
    }
}

/// One malformed construct inside a document, e.g. a page number with an
/// invalid roman numeral.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{message}: {excerpt}", location(.path, .line))]
pub struct FormattingError {
    pub message: String,
    pub excerpt: String,
    pub line: Option<usize>,
    pub path: Option<PathBuf>,
}

impl FormattingError {
    pub fn new(message: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            excerpt: excerpt.into(),
            line: None,
            path: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

fn location(path: &Option<PathBuf>, line: &Option<usize>) -> String {
    match (path.as_deref(), *line) {
        (Some(path), Some(line)) => format!("{}:{line}: ", path.display()),
        (Some(path), None) => format!("{}: ", path.display()),
        (None, Some(line)) => format!("line {line}: "),
        (None, None) => String::new(),
    }
}

/// An external program failed; `message` carries its stderr.
#[derive(Debug, thiserror::Error)]
#[error("{command} failed on {}: {message}", path.display())]
pub struct SubprocessError {
    pub command: String,
    pub message: String,
    pub path: PathBuf,
}

impl SubprocessError {
    pub fn new(command: impl Into<String>, message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            path: path.into(),
        }
    }
}

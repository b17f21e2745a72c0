use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use mdlecture_config::OutputFormat;

use crate::error::SubprocessError;

/// Turns a prepared markdown document into the target format.
pub trait DocumentConverter {
    /// `path` names the source file, for error messages only.
    fn convert(&self, text: &str, format: OutputFormat, path: &Path) -> Result<Vec<u8>, SubprocessError>;
}

/// Runs `pandoc -f markdown -t <format>`, document on stdin, result on
/// stdout.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    title: Option<String>,
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
            title: None,
        }
    }
}

impl PandocConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Page title of standalone documents.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn writer(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Html => "html5",
            OutputFormat::Epub => "epub",
        }
    }

    pub fn args(&self, format: OutputFormat) -> Vec<String> {
        let mut args = vec![
            "-s".to_string(),
            "-f".to_string(),
            "markdown".to_string(),
            "-t".to_string(),
            Self::writer(format).to_string(),
        ];
        if let Some(title) = &self.title {
            args.push("--metadata".to_string());
            args.push(format!("pagetitle={title}"));
        }
        args
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(&self, text: &str, format: OutputFormat, path: &Path) -> Result<Vec<u8>, SubprocessError> {
        let command = self.program.display().to_string();
        let error = |message: String| SubprocessError::new(&command, message, path);

        let mut child = Command::new(&self.program)
            .args(self.args(format))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| error(format!("cannot start: {e}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| error(format!("cannot pass document: {e}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| error(format!("did not finish: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(error(format!("{} ({})", stderr.trim(), output.status)));
        }
        Ok(output.stdout)
    }
}

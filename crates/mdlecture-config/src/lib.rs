pub mod l10n;

pub use l10n::{Language, Phrase, Translator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the configuration file marking a lecture root.
pub const CONFIG_FILE_NAME: &str = ".lecture_meta.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No {CONFIG_FILE_NAME} found in {0} or any parent directory")]
    NotFound(PathBuf),

    #[error("Invalid value for {option}: {reason}")]
    Invalid { option: ConfigOption, reason: String },

    #[error("Unknown configuration option: {0}")]
    UnknownOption(String),
}

/// Target format of the converted lecture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Epub,
}

impl OutputFormat {
    /// File extension used for converted chapters and for links in the TOC.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Epub => "epub",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "epub" => Ok(OutputFormat::Epub),
            other => Err(format!("unsupported format \"{other}\", expected html or epub")),
        }
    }
}

/// Every option a lecture configuration knows about.
///
/// The display form is the key used in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigOption {
    LectureTitle,
    Language,
    Format,
    TocDepth,
    GenerateToc,
    AppendixPrefix,
    PageNumberingGap,
    Source,
    Editor,
    Institution,
    WorkingGroup,
}

impl ConfigOption {
    pub const ALL: [ConfigOption; 11] = [
        ConfigOption::LectureTitle,
        ConfigOption::Language,
        ConfigOption::Format,
        ConfigOption::TocDepth,
        ConfigOption::GenerateToc,
        ConfigOption::AppendixPrefix,
        ConfigOption::PageNumberingGap,
        ConfigOption::Source,
        ConfigOption::Editor,
        ConfigOption::Institution,
        ConfigOption::WorkingGroup,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ConfigOption::LectureTitle => "lectureTitle",
            ConfigOption::Language => "language",
            ConfigOption::Format => "format",
            ConfigOption::TocDepth => "tocDepth",
            ConfigOption::GenerateToc => "generateToc",
            ConfigOption::AppendixPrefix => "appendixPrefix",
            ConfigOption::PageNumberingGap => "pageNumberingGap",
            ConfigOption::Source => "source",
            ConfigOption::Editor => "editor",
            ConfigOption::Institution => "institution",
            ConfigOption::WorkingGroup => "workingGroup",
        }
    }
}

impl fmt::Display for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConfigOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigOption::ALL
            .into_iter()
            .find(|option| option.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownOption(s.to_string()))
    }
}

/// Configuration of one lecture, stored in [`CONFIG_FILE_NAME`] at the lecture root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureConfig {
    pub lecture_title: String,
    pub language: Language,
    pub format: OutputFormat,
    /// Headings deeper than this level are left out of the table of contents.
    pub toc_depth: u8,
    pub generate_toc: bool,
    /// Number appendix entries as `A.1.` instead of giving them their own section.
    pub appendix_prefix: bool,
    /// Every n-th page gets a link in the page navigation bar.
    pub page_numbering_gap: u32,
    pub source: String,
    pub editor: String,
    pub institution: String,
    pub working_group: String,
}

impl Default for LectureConfig {
    fn default() -> Self {
        Self {
            lecture_title: "Unknown".to_string(),
            language: Language::default(),
            format: OutputFormat::default(),
            toc_depth: 5,
            generate_toc: true,
            appendix_prefix: false,
            page_numbering_gap: 5,
            source: "Unknown".to_string(),
            editor: "Unknown".to_string(),
            institution: "Unknown".to_string(),
            working_group: "Unknown".to_string(),
        }
    }
}

/// A configuration layer where every field is optional.
///
/// Used for the user's defaults and for lecture files, which may both only
/// mention the options they care about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialConfig {
    pub lecture_title: Option<String>,
    pub language: Option<Language>,
    pub format: Option<OutputFormat>,
    pub toc_depth: Option<u8>,
    pub generate_toc: Option<bool>,
    pub appendix_prefix: Option<bool>,
    pub page_numbering_gap: Option<u32>,
    pub source: Option<String>,
    pub editor: Option<String>,
    pub institution: Option<String>,
    pub working_group: Option<String>,
}

impl PartialConfig {
    /// Load a configuration layer, returning `None` if the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let layer: PartialConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        Ok(Some(layer))
    }
}

impl LectureConfig {
    /// Return a copy with every option set in `layer` overriding this one.
    pub fn merged(mut self, layer: &PartialConfig) -> Self {
        let layer = layer.clone();
        if let Some(v) = layer.lecture_title {
            self.lecture_title = v;
        }
        if let Some(v) = layer.language {
            self.language = v;
        }
        if let Some(v) = layer.format {
            self.format = v;
        }
        if let Some(v) = layer.toc_depth {
            self.toc_depth = v;
        }
        if let Some(v) = layer.generate_toc {
            self.generate_toc = v;
        }
        if let Some(v) = layer.appendix_prefix {
            self.appendix_prefix = v;
        }
        if let Some(v) = layer.page_numbering_gap {
            self.page_numbering_gap = v;
        }
        if let Some(v) = layer.source {
            self.source = v;
        }
        if let Some(v) = layer.editor {
            self.editor = v;
        }
        if let Some(v) = layer.institution {
            self.institution = v;
        }
        if let Some(v) = layer.working_group {
            self.working_group = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=6).contains(&self.toc_depth) {
            return Err(ConfigError::Invalid {
                option: ConfigOption::TocDepth,
                reason: format!("{} is not a heading level between 1 and 6", self.toc_depth),
            });
        }
        if self.page_numbering_gap == 0 {
            return Err(ConfigError::Invalid {
                option: ConfigOption::PageNumberingGap,
                reason: "the gap must be at least 1".to_string(),
            });
        }
        if self.lecture_title.trim().is_empty() {
            return Err(ConfigError::Invalid {
                option: ConfigOption::LectureTitle,
                reason: "the title must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Current value of `option`, formatted the way it is written in the file.
    pub fn get_option(&self, option: ConfigOption) -> String {
        match option {
            ConfigOption::LectureTitle => self.lecture_title.clone(),
            ConfigOption::Language => self.language.code().to_string(),
            ConfigOption::Format => self.format.extension().to_string(),
            ConfigOption::TocDepth => self.toc_depth.to_string(),
            ConfigOption::GenerateToc => self.generate_toc.to_string(),
            ConfigOption::AppendixPrefix => self.appendix_prefix.to_string(),
            ConfigOption::PageNumberingGap => self.page_numbering_gap.to_string(),
            ConfigOption::Source => self.source.clone(),
            ConfigOption::Editor => self.editor.clone(),
            ConfigOption::Institution => self.institution.clone(),
            ConfigOption::WorkingGroup => self.working_group.clone(),
        }
    }

    /// Parse `value` for `option` and store it. The result is validated.
    pub fn set_option(&mut self, option: ConfigOption, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { option, reason };
        match option {
            ConfigOption::LectureTitle => self.lecture_title = value.to_string(),
            ConfigOption::Language => self.language = value.parse().map_err(invalid)?,
            ConfigOption::Format => self.format = value.parse().map_err(invalid)?,
            ConfigOption::TocDepth => {
                self.toc_depth = value
                    .parse()
                    .map_err(|e| invalid(format!("{value}: {e}")))?
            }
            ConfigOption::GenerateToc => {
                self.generate_toc = value
                    .parse()
                    .map_err(|e| invalid(format!("{value}: {e}")))?
            }
            ConfigOption::AppendixPrefix => {
                self.appendix_prefix = value
                    .parse()
                    .map_err(|e| invalid(format!("{value}: {e}")))?
            }
            ConfigOption::PageNumberingGap => {
                self.page_numbering_gap = value
                    .parse()
                    .map_err(|e| invalid(format!("{value}: {e}")))?
            }
            ConfigOption::Source => self.source = value.to_string(),
            ConfigOption::Editor => self.editor = value.to_string(),
            ConfigOption::Institution => self.institution = value.to_string(),
            ConfigOption::WorkingGroup => self.working_group = value.to_string(),
        }
        self.validate()
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Save as the configuration file of the lecture rooted at `lecture_root`.
    pub fn save_to_lecture(&self, lecture_root: &Path) -> anyhow::Result<()> {
        self.save_to_path(lecture_root.join(CONFIG_FILE_NAME))
    }

    /// Translator for the configured language.
    pub fn translator(&self) -> Translator {
        Translator::new(self.language)
    }
}

/// Loads lecture configurations on top of the user's defaults.
///
/// Lookup order, later wins: built-in defaults, the user defaults file, the
/// closest lecture configuration file found walking up from the given path.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    user_defaults: PartialConfig,
}

impl ConfigLoader {
    /// Loader using the defaults file at [`ConfigLoader::user_defaults_path`].
    ///
    /// A broken defaults file is reported and ignored.
    pub fn new() -> Self {
        let path = Self::user_defaults_path();
        let user_defaults = match PartialConfig::load_from_path(&path) {
            Ok(layer) => layer.unwrap_or_default(),
            Err(e) => {
                log::warn!("Ignoring user defaults: {e}");
                PartialConfig::default()
            }
        };
        Self { user_defaults }
    }

    pub fn with_defaults(user_defaults: PartialConfig) -> Self {
        Self { user_defaults }
    }

    pub fn user_defaults_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/mdlecture");
        PathBuf::from(config_dir.as_ref()).join("defaults.toml")
    }

    /// Configuration without any lecture file.
    pub fn defaults(&self) -> LectureConfig {
        LectureConfig::default().merged(&self.user_defaults)
    }

    /// Find the closest configuration file in `path` or one of its parents.
    pub fn find_config_file(path: &Path) -> Option<PathBuf> {
        let start = if path.is_file() { path.parent()? } else { path };
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load and validate the configuration that applies to `path`.
    pub fn load(&self, path: &Path) -> Result<LectureConfig, ConfigError> {
        let config_path =
            Self::find_config_file(path).ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?;
        let layer = PartialConfig::load_from_path(&config_path)?
            .ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?;
        let config = self.defaults().merged(&layer);
        config.validate()?;
        Ok(config)
    }

    /// Configuration to modify and save back: the defaults when the lecture
    /// has no configuration file yet, otherwise the file's content. A file
    /// that cannot be read or parsed is an error.
    pub fn load_for_update(&self, path: &Path) -> Result<LectureConfig, ConfigError> {
        match self.load(path) {
            Err(ConfigError::NotFound(_)) => Ok(self.defaults()),
            result => result,
        }
    }

    /// Like [`ConfigLoader::load`], falling back to the defaults on any error.
    pub fn load_or_default(&self, path: &Path) -> LectureConfig {
        match self.load(path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => self.defaults(),
            Err(e) => {
                log::warn!("Falling back to default configuration: {e}");
                self.defaults()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_user_defaults_path() {
        let path = ConfigLoader::user_defaults_path();
        let path_str = path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/mdlecture/defaults.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = LectureConfig {
            lecture_title: "Analysis I".to_string(),
            toc_depth: 2,
            ..LectureConfig::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: PartialConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(LectureConfig::default().merged(&deserialized), original);
    }

    #[test]
    fn test_keys_are_camel_case_in_file() {
        let toml_str = toml::to_string(&LectureConfig::default()).unwrap();
        assert!(toml_str.contains("tocDepth = 5"));
        assert!(toml_str.contains("appendixPrefix = false"));
    }

    #[test]
    fn test_lecture_file_overrides_user_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "lectureTitle = \"Algebra\"\n",
        )
        .unwrap();
        let loader = ConfigLoader::with_defaults(PartialConfig {
            lecture_title: Some("From defaults".to_string()),
            language: Some(Language::En),
            ..PartialConfig::default()
        });

        let config = loader.load(temp_dir.path()).unwrap();

        assert_eq!(config.lecture_title, "Algebra");
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_config_found_in_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "tocDepth = 2\n").unwrap();
        let chapter = temp_dir.path().join("k01");
        std::fs::create_dir(&chapter).unwrap();

        let config = ConfigLoader::default().load(&chapter).unwrap();

        assert_eq!(config.toc_depth, 2);
    }

    #[test]
    fn test_missing_config_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::default().load(temp_dir.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "tocDepth = \"deep\"\n").unwrap();
        let loader = ConfigLoader::default();

        assert!(matches!(
            loader.load(temp_dir.path()),
            Err(ConfigError::ConfigParseError { .. })
        ));
        assert_eq!(loader.load_or_default(temp_dir.path()), LectureConfig::default());
    }

    #[test]
    fn test_load_for_update_only_falls_back_without_file() {
        // Given one lecture without configuration and one with a broken file
        let empty = TempDir::new().unwrap();
        let broken = TempDir::new().unwrap();
        std::fs::write(broken.path().join(CONFIG_FILE_NAME), "tocDepth = \"deep\"\n").unwrap();
        let loader = ConfigLoader::default();

        // When loading them for an update
        let fresh = loader.load_for_update(empty.path()).unwrap();
        let result = loader.load_for_update(broken.path());

        // Then only the missing file yields the defaults
        assert_eq!(fresh, loader.defaults());
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<PartialConfig, _> = toml::from_str("colour = \"red\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "tocDepth = 9\n").unwrap();

        let result = ConfigLoader::default().load(temp_dir.path());

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                option: ConfigOption::TocDepth,
                ..
            })
        ));
    }

    #[rstest]
    #[case("tocDepth", ConfigOption::TocDepth)]
    #[case("tocdepth", ConfigOption::TocDepth)]
    #[case("appendixPrefix", ConfigOption::AppendixPrefix)]
    #[case("lectureTitle", ConfigOption::LectureTitle)]
    fn test_option_names_parse(#[case] name: &str, #[case] expected: ConfigOption) {
        assert_eq!(name.parse::<ConfigOption>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_option_name() {
        assert!(matches!(
            "nonsense".parse::<ConfigOption>(),
            Err(ConfigError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_set_and_get_option() {
        let mut config = LectureConfig::default();
        config.set_option(ConfigOption::TocDepth, "3").unwrap();
        config.set_option(ConfigOption::Format, "EPUB").unwrap();
        config.set_option(ConfigOption::Language, "en").unwrap();

        assert_eq!(config.get_option(ConfigOption::TocDepth), "3");
        assert_eq!(config.format, OutputFormat::Epub);
        assert_eq!(config.language, Language::En);
        assert!(config.set_option(ConfigOption::TocDepth, "0").is_err());
        assert!(config.set_option(ConfigOption::GenerateToc, "maybe").is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = LectureConfig {
            lecture_title: "Numerik".to_string(),
            appendix_prefix: true,
            ..LectureConfig::default()
        };

        config.save_to_lecture(temp_dir.path()).unwrap();
        let loaded = ConfigLoader::with_defaults(PartialConfig::default())
            .load(temp_dir.path())
            .unwrap();

        assert_eq!(loaded, config);
    }
}

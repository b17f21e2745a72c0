use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use mdlecture_config::{ConfigLoader, ConfigOption, Language, LectureConfig, OutputFormat};
use mdlecture_engine::convert::{self, PandocConverter};
use mdlecture_engine::io::LectureSkeleton;
use mdlecture_engine::lint::{Linter, Priority};
use mdlecture_engine::{io, pagenumbering, toc};

#[derive(Parser)]
#[command(name = "mdlecture")]
#[command(version, about = "Accessible lecture material from annotated Markdown", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the table of contents of a lecture
    Toc {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Check files for common editing mistakes
    Check {
        /// A file or a directory to check recursively
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Report mistakes up to this priority
        #[arg(short, long, value_enum, default_value_t = PriorityArg::Normal)]
        priority: PriorityArg,
    },
    /// Print the page number to insert at a line
    Addpnum {
        file: PathBuf,
        /// 1-based line the marker will be inserted at
        line: usize,
    },
    /// Renumber page markers that break the sequence
    Fixpnum {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Add or refresh the navigation bars of all chapters
    Navbar {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Convert a lecture with pandoc
    Conv {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Override the configured output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Create the skeleton of a new lecture
    New {
        path: PathBuf,
        /// Number of main chapters
        #[arg(short, long, default_value_t = 1)]
        chapters: u32,
        /// Number of appendix chapters
        #[arg(short, long, default_value_t = 0)]
        appendix: u32,
        /// Create a preface chapter
        #[arg(long)]
        preface: bool,
        /// Use exercise sheets (blattNN) instead of chapters
        #[arg(long)]
        sheets: bool,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        language: Option<Language>,
    },
    /// Show or change the lecture configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Set one option in the lecture's configuration file
    Set {
        /// Option name, e.g. tocDepth
        option: ConfigOption,
        value: String,
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PriorityArg {
    Critical,
    Normal,
    Pedantic,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Critical => Priority::Critical,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::Pedantic => Priority::Pedantic,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but found problems.
fn run(command: Command) -> Result<bool> {
    let loader = ConfigLoader::new();
    match command {
        Command::Toc { path } => {
            let config = loader.load_or_default(&path);
            match toc::write_toc(&path, &config)? {
                Some(written) => println!("{}", written.display()),
                None => log::info!("nothing written"),
            }
            Ok(true)
        }
        Command::Check { path, priority } => {
            let config = loader.load_or_default(&path);
            let findings = Linter::new(&config).with_priority(priority.into()).run(&path)?;
            for finding in &findings {
                println!("{finding}");
            }
            Ok(findings.is_empty())
        }
        Command::Addpnum { file, line } => {
            let config = loader.load_or_default(&file);
            let text = io::read_file(&file)?;
            let number =
                pagenumbering::add_page_number(&text, line, &config.translator()).map_err(|e| e.in_file(&file))?;
            println!("{number}");
            Ok(true)
        }
        Command::Fixpnum { files } => {
            for file in &files {
                if pagenumbering::fix_page_numbering_in_file(file)? {
                    println!("{}", file.display());
                }
            }
            Ok(true)
        }
        Command::Navbar { path } => {
            let config = loader.load_or_default(&path);
            convert::update_navigation(&path, &config)?;
            Ok(true)
        }
        Command::Conv { path, format } => {
            let mut config = loader.load_or_default(&path);
            if let Some(format) = format {
                config.format = format;
            }
            refresh_toc(&path, &config);
            let converter = PandocConverter::new().with_title(&config.lecture_title);
            let report = convert::convert_tree(&path, &config, &converter)?;
            for (file, err) in &report.failures {
                eprintln!("{}: {err}", file.display());
            }
            Ok(report.is_success())
        }
        Command::New {
            path,
            chapters,
            appendix,
            preface,
            sheets,
            title,
            language,
        } => {
            let mut config = loader.defaults();
            if let Some(title) = title {
                config.lecture_title = title;
            }
            if let Some(language) = language {
                config.language = language;
            }
            let written = LectureSkeleton::new(chapters, config)
                .appendix_chapters(appendix)
                .preface(preface)
                .exercise_sheets(sheets)
                .generate(&path)?;
            for file in written {
                println!("{}", file.display());
            }
            Ok(true)
        }
        Command::Config { action } => run_config(&loader, action),
    }
}

fn run_config(loader: &ConfigLoader, action: ConfigAction) -> Result<bool> {
    match action {
        ConfigAction::Show { path } => {
            let config = loader.load_or_default(&path);
            for option in ConfigOption::ALL {
                println!("{option} = {}", config.get_option(option));
            }
            Ok(true)
        }
        ConfigAction::Set { option, value, path } => {
            let root = lecture_root_for(&path)?;
            let mut config = loader.load_for_update(&root)?;
            config.set_option(option, &value)?;
            config.validate()?;
            config
                .save_to_lecture(&root)
                .with_context(|| format!("cannot save configuration in {}", root.display()))?;
            log::info!("set {option} = {value} in {}", root.display());
            Ok(true)
        }
    }
}

/// Rewrite the table of contents before a conversion. A failure is logged
/// and the conversion goes ahead with the previous file, if any.
fn refresh_toc(path: &Path, config: &LectureConfig) -> bool {
    match toc::write_toc(path, config) {
        Ok(_) => true,
        Err(e) => {
            log::error!("cannot write table of contents: {e}");
            false
        }
    }
}

/// Directory holding the configuration that applies to `path`, or the
/// lecture root `path` itself when there is none yet.
fn lecture_root_for(path: &Path) -> Result<PathBuf> {
    if let Some(file) = ConfigLoader::find_config_file(path)
        && let Some(dir) = file.parent()
    {
        return Ok(dir.to_path_buf());
    }
    if !io::is_lecture_root(path) {
        bail!("{} is not a lecture root and has no configuration file", path.display());
    }
    Ok(path.to_path_buf())
}

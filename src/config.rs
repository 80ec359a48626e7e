use crate::filter::{KindFilter, Selection};
use crate::render::{OutputEncoding, OutputFormat};
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SAMPLE_SIZE: usize = 5;

#[derive(Parser, Debug, Default)]
#[command(name = "kobo-export")]
#[command(about = "Export annotations and highlights from a Kobo SQLite file")]
pub struct CliArgs {
    /// Path of the input KoboReader.sqlite file
    pub db: PathBuf,

    /// Output to file instead of using the standard output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output in CSV format instead of human-readable format
    #[arg(long)]
    pub csv: bool,

    /// Output in Kindle 'My Clippings.txt' format instead of human-readable format
    #[arg(long)]
    pub kindle: bool,

    /// Output in raw text instead of human-readable format
    #[arg(long)]
    pub raw: bool,

    /// List the titles of books with annotations or highlights
    #[arg(long)]
    pub list: bool,

    /// Output annotations and highlights only from the book with the given title
    #[arg(long)]
    pub book: Option<String>,

    /// Output annotations and highlights only from the book with the given ID
    #[arg(long)]
    pub bookid: Option<String>,

    /// Output annotations only, excluding highlights
    #[arg(long)]
    pub annotations_only: bool,

    /// Output highlights only, excluding annotations
    #[arg(long)]
    pub highlights_only: bool,

    /// Print information about the number of annotations and highlights
    #[arg(long)]
    pub info: bool,

    /// Append the selected book's highlights to its Notion page
    #[arg(long)]
    pub export: bool,

    /// Email a random sample of highlights as a digest
    #[arg(long)]
    pub email: bool,

    /// Number of highlights in the emailed digest (requires --email)
    #[arg(long)]
    pub sample: Option<usize>,

    /// Replace characters outside ASCII with '?'
    #[arg(long)]
    pub ascii: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailSettings {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_host: String,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub encoding: OutputEncoding,
    pub list: bool,
    pub info: bool,
    pub selection: Selection,
    pub notion: Option<NotionSettings>,
    pub email: Option<EmailSettings>,
}

#[derive(Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("You cannot specify both --book and --bookid.")]
    BookAndBookId,

    #[error("Use --annotations-only OR --highlights-only, not both")]
    ConflictingKindFilters,

    #[error("Use only one of --csv, --kindle and --raw")]
    ConflictingFormats,

    #[error("The bookid value must be a positive integer, got '{0}'")]
    InvalidBookId(String),

    #[error("--sample must be at least 1")]
    EmptySample,

    #[error("--sample only applies together with --email")]
    SampleWithoutEmail,

    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let cli = CliArgs::parse();
        Self::from_args(cli, |key| std::env::var(key).ok())
    }

    pub fn from_args<F>(cli: CliArgs, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if cli.book.is_some() && cli.bookid.is_some() {
            return Err(ConfigError::BookAndBookId);
        }

        let kind = match (cli.annotations_only, cli.highlights_only) {
            (true, true) => return Err(ConfigError::ConflictingKindFilters),
            (true, false) => KindFilter::AnnotationsOnly,
            (false, true) => KindFilter::HighlightsOnly,
            (false, false) => KindFilter::All,
        };

        let format = resolve_format(&cli)?;

        let book_id = cli.bookid.as_deref().map(parse_book_id).transpose()?;

        let require = |key: &'static str| env(key).ok_or(ConfigError::MissingEnv(key));

        let notion = if cli.export {
            Some(NotionSettings {
                token: require("NOTION_TOKEN")?,
                database_id: require("NOTION_DATABASE_ID")?,
            })
        } else {
            None
        };

        let email = if cli.email {
            let sample_size = cli.sample.unwrap_or(DEFAULT_SAMPLE_SIZE);
            if sample_size == 0 {
                return Err(ConfigError::EmptySample);
            }
            Some(EmailSettings {
                sender: require("SENDER_EMAIL")?,
                password: require("APP_PASSWORD")?,
                receiver: require("RECEIVER_EMAIL")?,
                smtp_host: env("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                sample_size,
            })
        } else if cli.sample.is_some() {
            return Err(ConfigError::SampleWithoutEmail);
        } else {
            None
        };

        Ok(Config {
            db_path: cli.db,
            output: cli.output,
            format,
            encoding: if cli.ascii {
                OutputEncoding::Ascii
            } else {
                OutputEncoding::Utf8
            },
            list: cli.list,
            info: cli.info,
            selection: Selection {
                book_title: cli.book,
                book_id,
                kind,
            },
            notion,
            email,
        })
    }
}

fn resolve_format(cli: &CliArgs) -> Result<OutputFormat, ConfigError> {
    let chosen: Vec<OutputFormat> = [
        (cli.kindle, OutputFormat::Clippings),
        (cli.csv, OutputFormat::Csv),
        (cli.raw, OutputFormat::Raw),
    ]
    .into_iter()
    .filter_map(|(on, format)| on.then_some(format))
    .collect();

    match chosen.as_slice() {
        [] => Ok(OutputFormat::Human),
        [one] => Ok(*one),
        _ => Err(ConfigError::ConflictingFormats),
    }
}

fn parse_book_id(s: &str) -> Result<usize, ConfigError> {
    match s.trim().parse::<usize>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ConfigError::InvalidBookId(s.to_string())),
    }
}

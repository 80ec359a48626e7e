use crate::config::Config;
use crate::db::{self, DbError};
use crate::digest::{self, NotifyError, SmtpNotifier};
use crate::filter::{self, SelectionError};
use crate::models::{AnnotationRecord, BookRecord};
use crate::notion::{NotionClient, Workspace};
use crate::render::{self, OutputFormat};
use crate::sync::{SyncEngine, SyncError, SyncReport};
use std::fs;
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Unable to write output file, check the path and write permission: {0}")]
    Output(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid book choice '{input}', expected a number between 0 and {max}")]
    InvalidChoice { input: String, max: usize },

    #[error("No books with annotations or highlights to export")]
    NothingToExport,
}

/// Everything one invocation produces locally, before any network step.
#[derive(Debug)]
pub struct Extraction {
    pub books: Vec<BookRecord>,
    /// `None` in list mode unless an export needs the records anyway.
    pub records: Option<Vec<AnnotationRecord>>,
    pub output: String,
}

pub fn run(config: &Config) -> AppResult<()> {
    let extraction = extract(config)?;

    write_output(config, &extraction.output)?;

    if config.info {
        let record_count = if config.list {
            None
        } else {
            extraction.records.as_ref().map(Vec::len)
        };
        println!("{}", render::render_info(extraction.books.len(), record_count));
    }

    let records = extraction.records.as_deref().unwrap_or(&[]);

    if let Some(email) = &config.email {
        if config.list {
            log::warn!("--email is ignored together with --list");
        } else {
            let notifier = SmtpNotifier::new(email.clone());
            let sent =
                digest::send_digest(&notifier, records, email.sample_size, &mut rand::thread_rng())?;
            log::info!("Sent digest with {} highlights to {}", sent, email.receiver);
        }
    }

    if let Some(notion) = &config.notion {
        let stdin = io::stdin();
        let title = export_target(config, &extraction.books, &mut stdin.lock(), &mut io::stderr())?;
        let client = NotionClient::new(&notion.token, &notion.database_id)?;

        let report = export(&client, &title, records)?;
        println!(
            "Added {} highlights to the Notion page {}",
            report.appended, report.document_title
        );
    }

    Ok(())
}

/// Runs both queries, applies the selection and renders the requested
/// format. Fails before anything is written.
pub fn extract(config: &Config) -> AppResult<Extraction> {
    let books = db::load_books(&config.db_path)?;

    let records = if !config.list || config.notion.is_some() {
        let all = db::load_annotations(&config.db_path)?;
        let selected = filter::apply(all, &books, &config.selection)?;
        Some(filter::with_text(selected))
    } else {
        None
    };

    let output = if config.list {
        render::render_book_list(
            &books,
            config.format == OutputFormat::Csv,
            config.encoding,
        )
    } else {
        let records = records.as_deref().unwrap_or(&[]);
        render::render(config.format, records, config.encoding)
    };

    Ok(Extraction {
        books,
        records,
        output,
    })
}

fn write_output(config: &Config, output: &str) -> AppResult<()> {
    let output = config.encoding.encode(output);

    match &config.output {
        Some(path) => {
            fs::write(path, output.as_bytes()).map_err(AppError::Output)?;
            log::info!("Wrote output to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", output)?;
        }
    }

    Ok(())
}

/// Title of the book to publish: from `--book`, from `--bookid`, or asked
/// for interactively from the numbered book list.
pub fn export_target<R: BufRead, W: Write>(
    config: &Config,
    books: &[BookRecord],
    input: &mut R,
    prompt: &mut W,
) -> AppResult<String> {
    if let Some(title) = &config.selection.book_title {
        return Ok(title.clone());
    }
    if let Some(book_id) = config.selection.book_id {
        return Ok(filter::book_by_id(books, book_id)?.title_or_empty().to_string());
    }
    if books.is_empty() {
        return Err(AppError::NothingToExport);
    }

    writeln!(prompt, "Available books:")?;
    for (i, book) in books.iter().enumerate() {
        writeln!(prompt, "{}. {}", i, book.title_or_empty())?;
    }
    write!(prompt, "Please input the number: ")?;
    prompt.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let choice = line.trim();

    choice
        .parse::<usize>()
        .ok()
        .and_then(|i| books.get(i))
        .map(|b| b.title_or_empty().to_string())
        .ok_or_else(|| AppError::InvalidChoice {
            input: choice.to_string(),
            max: books.len() - 1,
        })
}

/// Publishes the records belonging to `title` into its workspace page.
pub fn export<W: Workspace>(
    workspace: &W,
    title: &str,
    records: &[AnnotationRecord],
) -> AppResult<SyncReport> {
    let selected = filter::for_title(records, title);
    if selected.is_empty() {
        log::warn!("No highlights selected for '{}'", title);
    }

    let report = SyncEngine::new(workspace).sync(title, &selected)?;
    log::info!(
        "Synced {} highlights in {} batches to '{}'",
        report.appended,
        report.batches,
        report.document_title
    );
    Ok(report)
}

use crate::dates::format_for_clippings;
use crate::models::{AnnotationRecord, BookRecord, Kind};
use std::borrow::Cow;

const BLOCK_DELIMITER: &str = "\n=== === ===\n";
const CLIPPING_SEPARATOR: &str = "==========";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Csv,
    Clippings,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    #[default]
    Utf8,
    Ascii,
}

impl OutputEncoding {
    /// Replaces every character the encoding cannot hold with `?`.
    pub fn encode<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self {
            OutputEncoding::Utf8 => Cow::Borrowed(s),
            OutputEncoding::Ascii if s.is_ascii() => Cow::Borrowed(s),
            OutputEncoding::Ascii => Cow::Owned(
                s.chars()
                    .map(|c| if c.is_ascii() { c } else { '?' })
                    .collect(),
            ),
        }
    }
}

pub fn render<'a, I>(format: OutputFormat, records: I, encoding: OutputEncoding) -> String
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    match format {
        OutputFormat::Human => render_human(records),
        OutputFormat::Csv => render_csv(records, encoding),
        OutputFormat::Clippings => render_clippings(records),
        OutputFormat::Raw => render_raw(records),
    }
}

pub fn human_block(record: &AnnotationRecord) -> String {
    if record.kind() == Kind::Bookmark {
        return String::new();
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("Type:           {}", record.kind()));
    lines.push(format!("Title:          {}", record.title_or_empty()));
    lines.push(format!(
        "Author:         {}",
        record.author.as_deref().unwrap_or("")
    ));
    lines.push(format!("Date created:   {}", record.date_created));

    if record.kind() == Kind::Annotation {
        lines.push(format!(
            "Annotation:{}{}{}",
            BLOCK_DELIMITER,
            record.annotation.as_deref().unwrap_or(""),
            BLOCK_DELIMITER
        ));
    }
    lines.push(format!(
        "Reference text:{}{}{}",
        BLOCK_DELIMITER,
        record.text_or_empty(),
        BLOCK_DELIMITER
    ));

    lines.join("\n")
}

/// Labeled blocks, one per record, separated by a blank line.
pub fn render_human<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    records
        .into_iter()
        .map(|r| format!("{}\n", human_block(r)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_csv<'a, I>(records: I, encoding: OutputEncoding) -> String
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    write_csv_rows(records.into_iter().map(|r| r.csv_tuple()), encoding)
}

pub fn clipping_entry(record: &AnnotationRecord) -> String {
    let date = format_for_clippings(&record.date_created);
    let label = match record.kind() {
        Kind::Annotation => "Note",
        Kind::Highlight => "Highlight",
        Kind::Bookmark => "Bookmark",
    };

    let mut lines = vec![
        format!(
            "{} ({})",
            record.title_or_empty(),
            record.author.as_deref().unwrap_or("")
        ),
        format!(
            "- Your {} on page {} | location {} | Added on {}",
            label, 1, 1, date
        ),
        String::new(),
    ];

    match record.kind() {
        Kind::Annotation => lines.push(record.annotation.clone().unwrap_or_default()),
        Kind::Highlight => lines.push(record.text_or_empty().to_string()),
        Kind::Bookmark => {}
    }
    lines.push(CLIPPING_SEPARATOR.to_string());

    lines.join("\n")
}

/// Kindle "My Clippings.txt" layout.
pub fn render_clippings<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    records
        .into_iter()
        .map(clipping_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_raw<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    records
        .into_iter()
        .map(|r| format!("{}\n", r.text_or_empty()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered book table with an `ID, TITLE, AUTHOR` header row.
pub fn render_book_list(books: &[BookRecord], as_csv: bool, encoding: OutputEncoding) -> String {
    let ids: Vec<String> = (1..=books.len()).map(|i| i.to_string()).collect();
    let mut rows: Vec<[&str; 3]> = vec![["ID", "TITLE", "AUTHOR"]];
    rows.extend(books.iter().zip(&ids).map(|(book, id)| {
        [
            id.as_str(),
            book.title_or_empty(),
            book.author.as_deref().unwrap_or(""),
        ]
    }));

    if as_csv {
        write_csv_rows(rows, encoding)
    } else {
        rows.iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn render_info(book_count: usize, record_count: Option<usize>) -> String {
    let mut lines = vec![
        String::new(),
        format!("Books with annotations or highlights: {}", book_count),
    ];
    if let Some(count) = record_count {
        lines.push(format!("Annotations and/or highlights:        {}", count));
    }
    lines.join("\n")
}

fn write_csv_rows<'a, R, const N: usize>(rows: R, encoding: OutputEncoding) -> String
where
    R: IntoIterator<Item = [&'a str; N]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    for row in rows {
        let fields = row.map(|field| encoding.encode(field));
        if let Err(e) = writer.write_record(fields.iter().map(|f| f.as_bytes())) {
            log::warn!("Skipping CSV row: {}", e);
        }
    }

    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

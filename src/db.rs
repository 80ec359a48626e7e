use crate::models::{classify, AnnotationRecord, BookRecord, RawAnnotation};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;
use thiserror::Error;

const QUERY_ANNOTATIONS: &str = "SELECT \
    Bookmark.VolumeID, \
    Bookmark.Text, \
    Bookmark.Annotation, \
    Bookmark.ExtraAnnotationData, \
    Bookmark.DateCreated, \
    Bookmark.DateModified, \
    content.BookTitle, \
    content.Title, \
    content.Attribution \
    FROM Bookmark INNER JOIN content \
    ON Bookmark.VolumeID = content.ContentID";

const QUERY_BOOKS: &str = "SELECT DISTINCT \
    Bookmark.VolumeID, \
    content.BookTitle, \
    content.Title, \
    content.Attribution \
    FROM Bookmark INNER JOIN content \
    ON Bookmark.VolumeID = content.ContentID \
    ORDER BY content.Title";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unable to read the KoboReader.sqlite file, check the path and read permission: {0}")]
    NotFound(String),

    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),
}

fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    if !path.exists() {
        return Err(DbError::NotFound(path.display().to_string()));
    }

    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))
}

/// Reads every annotation row from the file; the connection is closed
/// before returning, on success or failure.
pub fn load_annotations(path: &Path) -> Result<Vec<AnnotationRecord>, DbError> {
    let conn = open_read_only(path)?;
    log::debug!("Querying annotations from {}", path.display());
    query_annotations(&conn)
}

pub fn load_books(path: &Path) -> Result<Vec<BookRecord>, DbError> {
    let conn = open_read_only(path)?;
    log::debug!("Querying books from {}", path.display());
    query_books(&conn)
}

pub fn query_annotations(conn: &Connection) -> Result<Vec<AnnotationRecord>, DbError> {
    let mut stmt = conn.prepare(QUERY_ANNOTATIONS)?;
    let rows = stmt.query_map([], raw_annotation_from_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(classify(row?));
    }

    Ok(records)
}

pub fn query_books(conn: &Connection) -> Result<Vec<BookRecord>, DbError> {
    let mut stmt = conn.prepare(QUERY_BOOKS)?;
    let rows = stmt.query_map([], |row| {
        Ok(BookRecord {
            volume_id: column_text(row, 0)?.unwrap_or_default(),
            book_title_raw: column_text(row, 1)?,
            title: column_text(row, 2)?,
            author: column_text(row, 3)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
}

fn raw_annotation_from_row(row: &Row<'_>) -> rusqlite::Result<RawAnnotation> {
    Ok(RawAnnotation {
        volume_id: column_text(row, 0)?.unwrap_or_default(),
        text: column_text(row, 1)?,
        annotation: column_text(row, 2)?,
        extra_data: column_text(row, 3)?,
        date_created: column_text(row, 4)?,
        date_modified: column_text(row, 5)?,
        book_title_raw: column_text(row, 6)?,
        title: column_text(row, 7)?,
        author: column_text(row, 8)?,
    })
}

// The device stores some columns as BLOB or numbers; read everything as
// text and keep NULL as None.
fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

/// Minimal slice of the device schema, enough for both queries.
#[cfg(test)]
pub(crate) fn create_test_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE content (
            ContentID TEXT PRIMARY KEY,
            BookTitle TEXT,
            Title TEXT,
            Attribution TEXT
        );
        CREATE TABLE Bookmark (
            BookmarkID TEXT PRIMARY KEY,
            VolumeID TEXT NOT NULL,
            Text TEXT,
            Annotation TEXT,
            ExtraAnnotationData BLOB,
            DateCreated TEXT,
            DateModified TEXT
        );",
    )
}

//! Publishes highlights into a workspace document.
//!
//! The engine locates the document by exact title, makes sure it has a
//! single "Highlights" heading, then appends one bullet per record under
//! that heading in batches the API accepts.

use crate::models::AnnotationRecord;
use crate::notion::{NewBlock, Workspace};
use thiserror::Error;

pub const SECTION_LABEL: &str = "Highlights";

/// Hard cap on children per append call.
pub const MAX_CHILDREN_PER_APPEND: usize = 100;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("The page ({0}) is not found.")]
    DocumentNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Creating the '{0}' heading returned no block")]
    MissingCreatedBlock(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub document_title: String,
    pub appended: usize,
    pub batches: usize,
}

pub struct SyncEngine<'a, W: Workspace> {
    workspace: &'a W,
    batch_size: usize,
}

impl<'a, W: Workspace> SyncEngine<'a, W> {
    pub fn new(workspace: &'a W) -> Self {
        Self {
            workspace,
            batch_size: MAX_CHILDREN_PER_APPEND,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_CHILDREN_PER_APPEND);
        self
    }

    /// First document whose title equals `title`. No fuzzy matching.
    pub fn locate(&self, title: &str) -> SyncResult<String> {
        let documents = self.workspace.find_documents(title)?;

        match documents.into_iter().next() {
            Some(doc) => Ok(doc.id),
            None => Err(SyncError::DocumentNotFound(title.to_string())),
        }
    }

    /// Returns the id of the document's "Highlights" heading, creating it
    /// only when no such top-level heading exists.
    pub fn ensure_section(&self, document_id: &str) -> SyncResult<String> {
        let children = self.workspace.list_children(document_id)?;

        if let Some(existing) = children
            .iter()
            .find(|b| b.heading_3_text().as_deref() == Some(SECTION_LABEL))
        {
            log::debug!("Reusing heading {} in {}", existing.id, document_id);
            return Ok(existing.id.clone());
        }

        let heading = NewBlock::Heading3 {
            text: SECTION_LABEL.to_string(),
            toggleable: true,
        };
        let created = self.workspace.append_children(document_id, &[heading])?;

        created
            .into_iter()
            .next()
            .map(|b| {
                log::info!("Created '{}' heading {}", SECTION_LABEL, b.id);
                b.id
            })
            .ok_or_else(|| SyncError::MissingCreatedBlock(SECTION_LABEL.to_string()))
    }

    /// Appends one bullet per record under `section_id`, one call per
    /// chunk. A failed chunk stops the run; earlier chunks stay applied.
    pub fn append_batched(
        &self,
        section_id: &str,
        records: &[&AnnotationRecord],
    ) -> SyncResult<(usize, usize)> {
        let total_batches = records.len().div_ceil(self.batch_size);
        let mut appended = 0;

        for (i, chunk) in records.chunks(self.batch_size).enumerate() {
            let bullets: Vec<NewBlock> = chunk
                .iter()
                .map(|r| NewBlock::BulletedListItem {
                    text: r.text_or_empty().to_string(),
                })
                .collect();

            self.workspace.append_children(section_id, &bullets)?;
            appended += bullets.len();
            log::info!(
                "Appended batch {}/{} ({} items)",
                i + 1,
                total_batches,
                bullets.len()
            );
        }

        Ok((appended, total_batches))
    }

    pub fn sync(&self, title: &str, records: &[&AnnotationRecord]) -> SyncResult<SyncReport> {
        let document_id = self.locate(title)?;
        let section_id = self.ensure_section(&document_id)?;
        let (appended, batches) = self.append_batched(&section_id, records)?;

        Ok(SyncReport {
            document_title: title.to_string(),
            appended,
            batches,
        })
    }
}

use crate::models::{AnnotationRecord, BookRecord, Kind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    HighlightsOnly,
    AnnotationsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub book_title: Option<String>,
    /// 1-based position in the book listing.
    pub book_id: Option<usize>,
    pub kind: KindFilter,
}

#[derive(Debug, PartialEq, Error)]
pub enum SelectionError {
    #[error("The bookid value must be an integer between 1 and {max}")]
    BookIdOutOfRange { max: usize },
}

/// Resolves a 1-based book id against the ordered book list.
pub fn book_by_id(books: &[BookRecord], book_id: usize) -> Result<&BookRecord, SelectionError> {
    book_id
        .checked_sub(1)
        .and_then(|idx| books.get(idx))
        .ok_or(SelectionError::BookIdOutOfRange { max: books.len() })
}

pub fn apply(
    mut records: Vec<AnnotationRecord>,
    books: &[BookRecord],
    selection: &Selection,
) -> Result<Vec<AnnotationRecord>, SelectionError> {
    if records.is_empty() {
        return Ok(records);
    }

    if let Some(book_id) = selection.book_id {
        let volume_id = &book_by_id(books, book_id)?.volume_id;
        records.retain(|r| &r.volume_id == volume_id);
    }

    if let Some(title) = &selection.book_title {
        records.retain(|r| r.title.as_deref() == Some(title.as_str()));
    }

    match selection.kind {
        KindFilter::All => {}
        KindFilter::HighlightsOnly => records.retain(|r| r.kind() == Kind::Highlight),
        KindFilter::AnnotationsOnly => records.retain(|r| r.kind() == Kind::Annotation),
    }

    Ok(records)
}

/// Drops records whose reference text is missing or blank.
pub fn with_text(records: Vec<AnnotationRecord>) -> Vec<AnnotationRecord> {
    records
        .into_iter()
        .filter(|r| r.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .collect()
}

pub fn for_title<'a>(records: &'a [AnnotationRecord], title: &str) -> Vec<&'a AnnotationRecord> {
    records
        .iter()
        .filter(|r| r.title.as_deref() == Some(title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{classify, RawAnnotation};

    fn record(volume: &str, title: &str, text: Option<&str>, note: Option<&str>) -> AnnotationRecord {
        classify(RawAnnotation {
            volume_id: volume.to_string(),
            text: text.map(String::from),
            annotation: note.map(String::from),
            title: Some(title.to_string()),
            ..Default::default()
        })
    }

    fn book(volume: &str, title: &str) -> BookRecord {
        BookRecord {
            volume_id: volume.to_string(),
            book_title_raw: None,
            title: Some(title.to_string()),
            author: None,
        }
    }

    fn sample() -> (Vec<AnnotationRecord>, Vec<BookRecord>) {
        let records = vec![
            record("vol-a", "Dune", Some("spice"), None),
            record("vol-a", "Dune", Some("sand"), Some("dry")),
            record("vol-b", "Emma", Some("matchmaking"), None),
            record("vol-b", "Emma", None, None),
        ];
        let books = vec![book("vol-a", "Dune"), book("vol-b", "Emma")];
        (records, books)
    }

    #[test]
    fn test_no_selection_keeps_everything() {
        let (records, books) = sample();

        let kept = apply(records, &books, &Selection::default()).unwrap();

        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_book_id_matches_volume() {
        let (records, books) = sample();
        let selection = Selection {
            book_id: Some(2),
            ..Default::default()
        };

        let kept = apply(records, &books, &selection).unwrap();

        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.volume_id == "vol-b"));
    }

    #[test]
    fn test_book_id_out_of_range() {
        let (records, books) = sample();

        for bad in [0, 3] {
            let selection = Selection {
                book_id: Some(bad),
                ..Default::default()
            };
            let result = apply(records.clone(), &books, &selection);
            assert_eq!(result, Err(SelectionError::BookIdOutOfRange { max: 2 }));
        }
    }

    #[test]
    fn test_book_title_exact_match() {
        let (records, books) = sample();
        let selection = Selection {
            book_title: Some("Dun".to_string()),
            ..Default::default()
        };

        let kept = apply(records, &books, &selection).unwrap();

        assert!(kept.is_empty());
    }

    #[test]
    fn test_kind_filters() {
        let (records, books) = sample();
        let highlights = Selection {
            kind: KindFilter::HighlightsOnly,
            ..Default::default()
        };
        let annotations = Selection {
            kind: KindFilter::AnnotationsOnly,
            ..Default::default()
        };

        let h = apply(records.clone(), &books, &highlights).unwrap();
        let a = apply(records, &books, &annotations).unwrap();

        assert_eq!(h.len(), 2);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].text.as_deref(), Some("sand"));
    }

    #[test]
    fn test_with_text_drops_blank_and_missing() {
        let records = vec![
            record("v", "T", Some("kept"), None),
            record("v", "T", Some("   "), None),
            record("v", "T", None, Some("orphan note")),
        ];

        let kept = with_text(records);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text.as_deref(), Some("kept"));
    }

    #[test]
    fn test_for_title() {
        let (records, _) = sample();

        assert_eq!(for_title(&records, "Emma").len(), 2);
        assert!(for_title(&records, "Nope").is_empty());
    }
}

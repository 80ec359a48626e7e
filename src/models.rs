use std::fmt;

/// Substituted for creation/modification dates the device left empty.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00.000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Annotation,
    Highlight,
    Bookmark,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Annotation => "annotation",
            Kind::Highlight => "highlight",
            Kind::Bookmark => "bookmark",
        }
    }

    fn classify(text: Option<&str>, annotation: Option<&str>) -> Kind {
        let has_text = text.is_some_and(|t| !t.is_empty());
        let has_annotation = annotation.is_some_and(|a| !a.is_empty());

        match (has_text, has_annotation) {
            (true, true) => Kind::Annotation,
            (true, false) => Kind::Highlight,
            _ => Kind::Bookmark,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the annotation query, column for column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnnotation {
    pub volume_id: String,
    pub text: Option<String>,
    pub annotation: Option<String>,
    pub extra_data: Option<String>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
    pub book_title_raw: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub volume_id: String,
    pub text: Option<String>,
    pub annotation: Option<String>,
    pub extra_data: Option<String>,
    pub date_created: String,
    pub date_modified: String,
    pub book_title_raw: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    kind: Kind,
}

impl AnnotationRecord {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Column values in CSV order: kind, title, author, created, modified,
    /// annotation, text. Nulls become empty strings.
    pub fn csv_tuple(&self) -> [&str; 7] {
        [
            self.kind.as_str(),
            self.title_or_empty(),
            self.author.as_deref().unwrap_or(""),
            &self.date_created,
            &self.date_modified,
            self.annotation.as_deref().unwrap_or(""),
            self.text_or_empty(),
        ]
    }
}

impl From<RawAnnotation> for AnnotationRecord {
    fn from(raw: RawAnnotation) -> Self {
        classify(raw)
    }
}

/// Builds a typed record from a raw row. Never fails: missing dates fall
/// back to the epoch, every other null is kept as-is.
pub fn classify(raw: RawAnnotation) -> AnnotationRecord {
    let kind = Kind::classify(raw.text.as_deref(), raw.annotation.as_deref());

    AnnotationRecord {
        volume_id: raw.volume_id,
        text: raw.text,
        annotation: raw.annotation,
        extra_data: raw.extra_data,
        date_created: raw
            .date_created
            .unwrap_or_else(|| EPOCH_TIMESTAMP.to_string()),
        date_modified: raw
            .date_modified
            .unwrap_or_else(|| EPOCH_TIMESTAMP.to_string()),
        book_title_raw: raw.book_title_raw,
        title: raw.title,
        author: raw.author,
        kind,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub volume_id: String,
    pub book_title_raw: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookRecord {
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

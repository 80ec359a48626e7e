use crate::sync::{SyncError, SyncResult};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Per-segment cap the API enforces on `text.content`, counted in UTF-16
/// code units.
pub const MAX_RICH_TEXT_UNITS: usize = 2000;

/// The operations the sync engine needs from a remote workspace.
pub trait Workspace {
    /// Documents whose title property equals `title` exactly.
    fn find_documents(&self, title: &str) -> SyncResult<Vec<DocumentRef>>;

    /// Direct children of a block or page, all pages of them.
    fn list_children(&self, block_id: &str) -> SyncResult<Vec<Block>>;

    /// Appends `children` under `block_id` and returns the created blocks.
    fn append_children(&self, block_id: &str, children: &[NewBlock]) -> SyncResult<Vec<Block>>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub heading_3: Option<TextBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub is_toggleable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextContent {
    pub content: String,
}

impl Block {
    pub fn heading_3(id: &str, text: &str) -> Self {
        Block {
            id: id.to_string(),
            block_type: "heading_3".to_string(),
            heading_3: Some(TextBlock {
                rich_text: vec![RichText {
                    plain_text: Some(text.to_string()),
                    text: Some(TextContent {
                        content: text.to_string(),
                    }),
                }],
                is_toggleable: true,
            }),
        }
    }

    pub fn other(id: &str, block_type: &str) -> Self {
        Block {
            id: id.to_string(),
            block_type: block_type.to_string(),
            heading_3: None,
        }
    }

    /// Plain text of a level-3 heading; `None` for every other block type.
    pub fn heading_3_text(&self) -> Option<String> {
        if self.block_type != "heading_3" {
            return None;
        }
        let heading = self.heading_3.as_ref()?;
        Some(
            heading
                .rich_text
                .iter()
                .filter_map(|rt| {
                    rt.plain_text
                        .as_deref()
                        .or_else(|| rt.text.as_ref().map(|t| t.content.as_str()))
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewBlock {
    Heading3 { text: String, toggleable: bool },
    BulletedListItem { text: String },
}

impl NewBlock {
    pub fn text(&self) -> &str {
        match self {
            NewBlock::Heading3 { text, .. } | NewBlock::BulletedListItem { text } => text,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            NewBlock::Heading3 { text, toggleable } => json!({
                "object": "block",
                "type": "heading_3",
                "heading_3": {
                    "rich_text": rich_text(text),
                    "is_toggleable": toggleable,
                }
            }),
            NewBlock::BulletedListItem { text } => json!({
                "object": "block",
                "type": "bulleted_list_item",
                "bulleted_list_item": {
                    "rich_text": rich_text(text),
                }
            }),
        }
    }
}

fn rich_text(content: &str) -> Value {
    let mut segments: Vec<Value> = Vec::new();
    let mut segment = String::new();
    let mut units = 0;

    for c in content.chars() {
        if units + c.len_utf16() > MAX_RICH_TEXT_UNITS {
            segments.push(text_segment(std::mem::take(&mut segment)));
            units = 0;
        }
        units += c.len_utf16();
        segment.push(c);
    }
    if !segment.is_empty() || segments.is_empty() {
        segments.push(text_segment(segment));
    }

    Value::Array(segments)
}

fn text_segment(content: String) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<DocumentRef>,
}

#[derive(Debug, Deserialize)]
struct BlockList {
    results: Vec<Block>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

pub struct NotionClient {
    client: Client,
    token: String,
    database_id: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: &str, database_id: &str) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SyncError::Http)?;

        Ok(Self {
            client,
            token: token.to_string(),
            database_id: database_id.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<T> {
        let response = self.authorized(request).send()?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>()?)
    }
}

impl Workspace for NotionClient {
    fn find_documents(&self, title: &str) -> SyncResult<Vec<DocumentRef>> {
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        log::debug!("Querying database {} for '{}'", self.database_id, title);

        let body = json!({
            "filter": {
                "property": "title",
                "title": { "equals": title }
            }
        });
        let response: QueryResponse = self.send(self.client.post(&url).json(&body))?;

        Ok(response.results)
    }

    fn list_children(&self, block_id: &str) -> SyncResult<Vec<Block>> {
        let url = format!("{}/blocks/{}/children", self.base_url, block_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("page_size", "100")]);
            if let Some(c) = &cursor {
                request = request.query(&[("start_cursor", c.as_str())]);
            }
            log::debug!("Listing children of {} (cursor {:?})", block_id, cursor);

            let page: BlockList = self.send(request)?;
            blocks.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    fn append_children(&self, block_id: &str, children: &[NewBlock]) -> SyncResult<Vec<Block>> {
        let url = format!("{}/blocks/{}/children", self.base_url, block_id);
        log::debug!("Appending {} blocks under {}", children.len(), block_id);

        let body = json!({
            "children": children.iter().map(NewBlock::to_json).collect::<Vec<_>>()
        });
        let response: BlockList = self.send(self.client.patch(&url).json(&body))?;

        Ok(response.results)
    }
}

//! Typed wire model for the Notion API surface this pipeline consumes,
//! and the snapshot-side block tree derived from it.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a paginated list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Metadata of the page a content tree hangs off.
///
/// `properties` is kept loosely typed; the project transform reads the
/// handful of fields it needs and the rest is persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
}

/// A page's metadata together with its root-level blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageContent {
    pub page: PageMeta,
    pub blocks: Vec<Block>,
}

/// One node of a page's content tree.
///
/// `children` is empty on the wire; the resolver attaches it. Sibling
/// order is semantically meaningful (list numbering, reading order) and is
/// preserved exactly as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

/// Block payload, tagged by the Notion `type` field. Types outside the
/// enumeration fall through to `Unsupported` and never fail
/// deserialization or abort a sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph { paragraph: RichTextBody },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: RichTextBody },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: RichTextBody },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: RichTextBody },
    BulletedListItem { bulleted_list_item: RichTextBody },
    NumberedListItem { numbered_list_item: RichTextBody },
    ToDo { to_do: ToDoBody },
    Quote { quote: RichTextBody },
    Code { code: CodeBody },
    Image { image: MediaBody },
    Video { video: MediaBody },
    File { file: MediaBody },
    Pdf { pdf: MediaBody },
    Table { table: TableBody },
    TableRow { table_row: TableRowBody },
    ColumnList { column_list: EmptyBody },
    Column { column: EmptyBody },
    Divider { divider: EmptyBody },
    Embed { embed: LinkBody },
    Bookmark { bookmark: LinkBody },
    #[serde(other)]
    Unsupported,
}

/// Common rich-text payload shared by paragraph/heading/list/quote blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RichTextBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToDoBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableBody {
    #[serde(default)]
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableRowBody {
    #[serde(default)]
    pub cells: Vec<Vec<RichText>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmptyBody {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkBody {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichText>,
}

/// Embedded media reference of an image/video/file/pdf block.
///
/// `local_path` is absent on the wire and written by the localizer once
/// the asset has been downloaded; `None` after a sync means the download
/// failed and the remote reference is still the only copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaBody {
    #[serde(flatten)]
    pub source: MediaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichText>,
    #[serde(default)]
    pub local_path: Option<String>,
}

/// Storage variant of a media reference: Notion-hosted (time-limited URL)
/// or an external link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    File { file: HostedFile },
    External { external: ExternalFile },
}

impl MediaSource {
    pub fn url(&self) -> &str {
        match self {
            MediaSource::File { file } => &file.url,
            MediaSource::External { external } => &external.url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostedFile {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalFile {
    pub url: String,
}

/// One rich-text span with its annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<TextLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextLink {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "default".to_string()
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_paragraph_block() {
        let raw = json!({
            "id": "b1",
            "has_children": false,
            "type": "paragraph",
            "paragraph": {
                "rich_text": [
                    {
                        "plain_text": "hello",
                        "annotations": { "bold": true, "color": "default" },
                        "text": { "content": "hello" }
                    }
                ]
            }
        });
        let block: Block = serde_json::from_value(raw).unwrap();
        assert_eq!(block.id, "b1");
        assert!(block.children.is_empty());
        match &block.kind {
            BlockKind::Paragraph { paragraph } => {
                assert_eq!(paragraph.rich_text[0].plain_text, "hello");
                assert!(paragraph.rich_text[0].annotations.bold);
                assert!(!paragraph.rich_text[0].annotations.italic);
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_falls_back_to_unsupported() {
        let raw = json!({
            "id": "b2",
            "has_children": true,
            "type": "synced_block",
            "synced_block": { "synced_from": null }
        });
        let block: Block = serde_json::from_value(raw).unwrap();
        assert_eq!(block.kind, BlockKind::Unsupported);
        assert!(block.has_children);
    }

    #[test]
    fn media_source_variants() {
        let hosted = json!({
            "id": "b3",
            "type": "image",
            "image": {
                "type": "file",
                "file": { "url": "https://s3/img.png?sig=1", "expiry_time": "2024-01-01T00:00:00Z" }
            }
        });
        let block: Block = serde_json::from_value(hosted).unwrap();
        match &block.kind {
            BlockKind::Image { image } => {
                assert_eq!(image.source.url(), "https://s3/img.png?sig=1");
                assert!(image.local_path.is_none());
            }
            other => panic!("wrong kind: {other:?}"),
        }

        let external = json!({
            "id": "b4",
            "type": "file",
            "file": {
                "type": "external",
                "external": { "url": "https://cdn/doc.zip" },
                "name": "doc.zip"
            }
        });
        let block: Block = serde_json::from_value(external).unwrap();
        match &block.kind {
            BlockKind::File { file } => {
                assert_eq!(file.source.url(), "https://cdn/doc.zip");
                assert_eq!(file.name.as_deref(), Some("doc.zip"));
            }
            other => panic!("wrong kind: {other:?}"),
        }
    }

    #[test]
    fn block_tree_round_trips_through_json() {
        let tree = Block {
            id: "parent".into(),
            has_children: true,
            kind: BlockKind::NumberedListItem {
                numbered_list_item: RichTextBody {
                    rich_text: vec![RichText {
                        plain_text: "first".into(),
                        ..Default::default()
                    }],
                    color: None,
                },
            },
            children: vec![Block {
                id: "child".into(),
                has_children: false,
                kind: BlockKind::Divider { divider: EmptyBody {} },
                children: vec![],
            }],
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "numbered_list_item");
        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn pagination_envelope() {
        let raw = json!({
            "results": [ { "id": "b1", "type": "divider", "divider": {} } ],
            "has_more": true,
            "next_cursor": "c1"
        });
        let page: Page<Block> = serde_json::from_value(raw).unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("c1"));
    }
}

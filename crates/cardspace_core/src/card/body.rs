//! Variant-specific card payloads.

use super::id::new_item_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardVariant {
    /// Free text note.
    Text,
    /// Checklist note.
    Todo,
    /// Note with a comment thread.
    Chat,
    /// Image referenced by data-URI or remote URL.
    Image,
    /// Freehand drawing.
    Drawing,
    /// Board of columns holding tasks.
    Kanban,
    /// Embedded web page.
    IframeEmbed,
    /// Bundle of attached files.
    MediaBundle,
}

impl CardVariant {
    /// All variants, in declaration order.
    pub const ALL: [CardVariant; 8] = [
        CardVariant::Text,
        CardVariant::Todo,
        CardVariant::Chat,
        CardVariant::Image,
        CardVariant::Drawing,
        CardVariant::Kanban,
        CardVariant::IframeEmbed,
        CardVariant::MediaBundle,
    ];

    /// Returns true if cards of this variant carry a size and can be resized.
    pub fn is_resizable(&self) -> bool {
        matches!(
            self,
            CardVariant::Drawing | CardVariant::IframeEmbed | CardVariant::MediaBundle
        )
    }

    /// Returns true if the card's `content` string is meaningful for this
    /// variant. Other variants keep `content` empty.
    pub fn uses_content(&self) -> bool {
        matches!(
            self,
            CardVariant::Text | CardVariant::Chat | CardVariant::Image
        )
    }

    /// Returns the stable name used in the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardVariant::Text => "text",
            CardVariant::Todo => "todo",
            CardVariant::Chat => "chat",
            CardVariant::Image => "image",
            CardVariant::Drawing => "drawing",
            CardVariant::Kanban => "kanban",
            CardVariant::IframeEmbed => "iframe_embed",
            CardVariant::MediaBundle => "media_bundle",
        }
    }

    /// Parses a variant from its serialized name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }
}

impl fmt::Display for CardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Item id, unique within the card.
    pub id: String,
    /// Item text.
    pub text: String,
    /// Whether the item is checked off.
    pub completed: bool,
}

impl TodoItem {
    /// Creates an unchecked item with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_item_id(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A comment in a chat thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id, unique within the card.
    pub id: String,
    /// Comment text.
    pub text: String,
    /// When the comment was written, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A point in card-local drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Tool a stroke was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeKind {
    /// Ink.
    Pen,
    /// Erases previous ink.
    Eraser,
}

impl StrokeKind {
    /// Default line width for the tool.
    pub fn default_width(&self) -> f64 {
        match self {
            StrokeKind::Pen => 2.0,
            StrokeKind::Eraser => 20.0,
        }
    }
}

/// A freehand stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Polyline points, in drawing order.
    pub points: Vec<Point>,
    /// Tool used.
    pub stroke_kind: StrokeKind,
    /// Line width.
    pub width: f64,
}

/// A task on a kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanTask {
    /// Task id, unique within the board.
    pub id: String,
    /// Task text.
    pub content: String,
    /// Whether the task is done.
    pub completed: bool,
}

/// A named kanban column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanColumn {
    /// Column id, unique within the board.
    pub id: String,
    /// Column heading.
    pub title: String,
    /// Tasks in display order.
    pub tasks: Vec<KanbanTask>,
}

impl KanbanColumn {
    /// Creates an empty column with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_item_id(),
            title: title.into(),
            tasks: Vec::new(),
        }
    }
}

/// A file attached to a media bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// File id, unique within the bundle.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Where the bytes live.
    pub url: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Variant-specific payload of a card.
///
/// Exactly one payload exists per card and its tag is the card's variant,
/// so payloads of other variants cannot be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum CardBody {
    /// Free text lives in `content`.
    Text,
    /// Ordered checklist.
    Todo {
        /// Items in display order.
        items: Vec<TodoItem>,
    },
    /// Comment thread; the note text lives in `content`.
    Chat {
        /// Comments in posting order.
        comments: Vec<Comment>,
    },
    /// Image source lives in `content`.
    Image,
    /// Freehand strokes.
    Drawing {
        /// Strokes in drawing order.
        strokes: Vec<Stroke>,
    },
    /// Board of columns.
    Kanban {
        /// Columns in display order.
        columns: Vec<KanbanColumn>,
    },
    /// Embedded page.
    IframeEmbed {
        /// Target URL.
        url: String,
    },
    /// Attached files.
    MediaBundle {
        /// Files in attach order.
        files: Vec<MediaFile>,
    },
}

impl CardBody {
    /// Returns the variant this payload belongs to.
    pub fn variant(&self) -> CardVariant {
        match self {
            CardBody::Text => CardVariant::Text,
            CardBody::Todo { .. } => CardVariant::Todo,
            CardBody::Chat { .. } => CardVariant::Chat,
            CardBody::Image => CardVariant::Image,
            CardBody::Drawing { .. } => CardVariant::Drawing,
            CardBody::Kanban { .. } => CardVariant::Kanban,
            CardBody::IframeEmbed { .. } => CardVariant::IframeEmbed,
            CardBody::MediaBundle { .. } => CardVariant::MediaBundle,
        }
    }

    /// Returns true if every coordinate and width in the payload is finite.
    ///
    /// JSON has no encoding for NaN or infinity, so a payload failing this
    /// check cannot be persisted.
    pub fn is_finite(&self) -> bool {
        match self {
            CardBody::Drawing { strokes } => strokes.iter().all(|stroke| {
                stroke.width.is_finite()
                    && stroke
                        .points
                        .iter()
                        .all(|p| p.x.is_finite() && p.y.is_finite())
            }),
            _ => true,
        }
    }

    /// Returns the payload a freshly created card of `variant` starts with.
    ///
    /// Kanban boards start with "To Do", "In Progress" and "Done" columns.
    pub fn initial(variant: CardVariant) -> Self {
        match variant {
            CardVariant::Text => CardBody::Text,
            CardVariant::Todo => CardBody::Todo { items: Vec::new() },
            CardVariant::Chat => CardBody::Chat {
                comments: Vec::new(),
            },
            CardVariant::Image => CardBody::Image,
            CardVariant::Drawing => CardBody::Drawing {
                strokes: Vec::new(),
            },
            CardVariant::Kanban => CardBody::Kanban {
                columns: vec![
                    KanbanColumn::new("To Do"),
                    KanbanColumn::new("In Progress"),
                    KanbanColumn::new("Done"),
                ],
            },
            CardVariant::IframeEmbed => CardBody::IframeEmbed { url: String::new() },
            CardVariant::MediaBundle => CardBody::MediaBundle { files: Vec::new() },
        }
    }
}

//! Card entity model.

mod body;
mod id;
mod model;

pub use body::{
    CardBody, CardVariant, Comment, KanbanColumn, KanbanTask, MediaFile, Point, Stroke,
    StrokeKind, TodoItem,
};
pub use id::{new_item_id, CardId};
pub use model::{Card, Position, Size, IFRAME_MIN_SIZE};

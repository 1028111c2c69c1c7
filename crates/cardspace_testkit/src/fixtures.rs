//! Test fixtures and replica helpers.

use cardspace_core::{
    Card, CardBody, CardVariant, Comment, Config, KanbanColumn, KanbanTask, MediaFile, Point,
    Position, ReplicaStore, Size, Stroke, StrokeKind, TodoItem,
};
use cardspace_storage::{FileBlobStore, InMemoryBlobStore};
use std::path::Path;
use tempfile::TempDir;

/// A test replica with automatic cleanup.
pub struct TestReplica {
    /// The replica.
    pub replica: ReplicaStore,
    storage: Storage,
}

enum Storage {
    Memory(InMemoryBlobStore),
    File(TempDir),
}

impl TestReplica {
    /// Creates an empty in-memory replica.
    pub fn memory() -> Self {
        let store = InMemoryBlobStore::new();
        let replica = ReplicaStore::load(Config::default(), Box::new(store.clone()))
            .expect("Failed to open in-memory replica");
        Self {
            replica,
            storage: Storage::Memory(store),
        }
    }

    /// Creates an empty replica persisted in a temporary directory.
    pub fn file() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let replica = open_file_replica(dir.path());
        Self {
            replica,
            storage: Storage::File(dir),
        }
    }

    /// Reloads the replica from its storage, as after a restart.
    pub fn reopen(self) -> Self {
        let Self { replica, storage } = self;
        drop(replica);
        let replica = match &storage {
            Storage::Memory(store) => {
                ReplicaStore::load(Config::default(), Box::new(store.clone()))
                    .expect("Failed to reopen in-memory replica")
            }
            Storage::File(dir) => open_file_replica(dir.path()),
        };
        Self { replica, storage }
    }

    /// Returns the storage directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Memory(_) => None,
            Storage::File(dir) => Some(dir.path()),
        }
    }
}

impl std::ops::Deref for TestReplica {
    type Target = ReplicaStore;

    fn deref(&self) -> &Self::Target {
        &self.replica
    }
}

fn open_file_replica(dir: &Path) -> ReplicaStore {
    let store = FileBlobStore::open(dir).expect("Failed to open blob directory");
    ReplicaStore::load(Config::default(), Box::new(store)).expect("Failed to open file replica")
}

/// Runs a test with a temporary in-memory replica.
pub fn with_temp_replica<F, R>(f: F) -> R
where
    F: FnOnce(&ReplicaStore) -> R,
{
    let replica = TestReplica::memory();
    f(&replica)
}

/// Runs a test with a temporary file-backed replica.
pub fn with_temp_file_replica<F, R>(f: F) -> R
where
    F: FnOnce(&ReplicaStore) -> R,
{
    let replica = TestReplica::file();
    f(&replica)
}

/// Creates a default card of `variant` with a fixed id.
pub fn sample_card(id: &str, variant: CardVariant) -> Card {
    Card::new(id.into(), variant, Position::new(10.0, 20.0))
}

/// Creates one card of every variant, each with a non-default payload.
pub fn sample_workspace() -> Vec<Card> {
    let mut cards = Vec::new();

    cards.push(sample_card("text", CardVariant::Text).with_content("Remember the milk"));

    let mut todo = sample_card("todo", CardVariant::Todo);
    todo.body = CardBody::Todo {
        items: vec![TodoItem {
            id: "t1".into(),
            text: "water plants".into(),
            completed: true,
        }],
    };
    cards.push(todo);

    let mut chat = sample_card("chat", CardVariant::Chat).with_content("Trip plans");
    chat.body = CardBody::Chat {
        comments: vec![Comment {
            id: "c1".into(),
            text: "Book the train".into(),
            timestamp: None,
        }],
    };
    cards.push(chat);

    cards.push(sample_card("image", CardVariant::Image).with_content("https://example.com/a.png"));

    let mut drawing = sample_card("drawing", CardVariant::Drawing);
    drawing.body = CardBody::Drawing {
        strokes: vec![Stroke {
            points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 3.0, y: 4.0 }],
            stroke_kind: StrokeKind::Pen,
            width: StrokeKind::Pen.default_width(),
        }],
    };
    cards.push(drawing);

    let mut kanban = sample_card("kanban", CardVariant::Kanban);
    kanban.body = CardBody::Kanban {
        columns: vec![KanbanColumn {
            id: "col".into(),
            title: "To Do".into(),
            tasks: vec![KanbanTask {
                id: "k1".into(),
                content: "Ship it".into(),
                completed: false,
            }],
        }],
    };
    cards.push(kanban);

    let mut iframe = sample_card("iframe", CardVariant::IframeEmbed);
    iframe.body = CardBody::IframeEmbed {
        url: "https://example.com".into(),
    };
    iframe.size = Some(Size::new(640.0, 480.0));
    cards.push(iframe);

    let mut media = sample_card("media", CardVariant::MediaBundle);
    media.body = CardBody::MediaBundle {
        files: vec![MediaFile {
            id: "m1".into(),
            name: "notes.pdf".into(),
            mime_type: "application/pdf".into(),
            url: "https://example.com/notes.pdf".into(),
            size_bytes: 2048,
        }],
    };
    cards.push(media);

    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_workspace_covers_every_variant() {
        let cards = sample_workspace();
        for variant in CardVariant::ALL {
            assert!(cards.iter().any(|c| c.variant() == variant), "{variant}");
        }
    }

    #[test]
    fn file_replica_reopens() {
        let replica = TestReplica::file();
        assert!(replica.path().is_some());
        replica.import(sample_workspace()).unwrap();

        let replica = replica.reopen();
        assert_eq!(replica.current_cards(), sample_workspace());
    }

    #[test]
    fn memory_replica_reopens() {
        let replica = TestReplica::memory();
        let id = replica
            .create_card(CardVariant::Text, Position::new(1.0, 1.0))
            .unwrap();
        let replica = replica.reopen();
        assert!(replica.card(&id).is_some());
    }
}

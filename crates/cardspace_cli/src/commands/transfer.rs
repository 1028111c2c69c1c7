//! Export, import and clear commands.
//!
//! These go through [`cardspace_core::ReplicaStore`] so the written blob is
//! always in the replica's own format.

use cardspace_core::{decode_cards, WorkspaceSnapshot};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes the workspace to `output` as a JSON snapshot.
pub fn export(path: &Path, key: &str, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let replica = super::open_replica(path, key)?;
    let snapshot = WorkspaceSnapshot::new(replica.current_cards(), Utc::now());

    fs::write(output, serde_json::to_vec_pretty(&snapshot)?)?;
    info!(cards = snapshot.len(), output = %output.display(), "exported workspace");
    println!("✓ Exported {} cards to {}", snapshot.len(), output.display());
    Ok(())
}

/// Replaces the workspace with the cards in `input`.
///
/// Accepts either a snapshot written by [`export`] or a bare card array.
pub fn import(path: &Path, key: &str, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let cards = match serde_json::from_slice::<WorkspaceSnapshot>(&bytes) {
        Ok(snapshot) => decode_cards(&serde_json::to_vec(&snapshot.cards)?)?,
        Err(_) => decode_cards(&bytes)?,
    };

    let replica = super::open_replica(path, key)?;
    let count = cards.len();
    let changed = replica.import(cards)?;
    info!(cards = count, changed, input = %input.display(), "imported workspace");
    println!("✓ Imported {count} cards");
    Ok(())
}

/// Removes every card.
pub fn clear(path: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let replica = super::open_replica(path, key)?;
    let count = replica.len();
    replica.clear_workspace()?;
    println!("✓ Removed {count} cards");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::DEFAULT_WORKSPACE_KEY;
    use cardspace_testkit::sample_workspace;

    #[test]
    fn export_then_import_into_another_workspace() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let file = source.path().join("snapshot.json");

        super::super::open_replica(source.path(), DEFAULT_WORKSPACE_KEY)
            .unwrap()
            .import(sample_workspace())
            .unwrap();

        export(source.path(), DEFAULT_WORKSPACE_KEY, &file).unwrap();
        import(target.path(), DEFAULT_WORKSPACE_KEY, &file).unwrap();

        let replica = super::super::open_replica(target.path(), DEFAULT_WORKSPACE_KEY).unwrap();
        assert_eq!(replica.current_cards(), sample_workspace());
    }

    #[test]
    fn import_accepts_bare_card_array() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cards.json");
        fs::write(&file, serde_json::to_vec(&sample_workspace()).unwrap()).unwrap();

        import(dir.path(), "other-key", &file).unwrap();
        let replica = super::super::open_replica(dir.path(), "other-key").unwrap();
        assert_eq!(replica.len(), sample_workspace().len());
    }

    #[test]
    fn clear_persists() {
        let dir = tempfile::tempdir().unwrap();
        super::super::open_replica(dir.path(), DEFAULT_WORKSPACE_KEY)
            .unwrap()
            .import(sample_workspace())
            .unwrap();

        clear(dir.path(), DEFAULT_WORKSPACE_KEY).unwrap();
        let replica = super::super::open_replica(dir.path(), DEFAULT_WORKSPACE_KEY).unwrap();
        assert!(replica.is_empty());
    }
}

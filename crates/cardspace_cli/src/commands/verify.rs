//! Verify command implementation.

use cardspace_core::{decode_cards, Card};
use std::collections::HashSet;
use std::path::Path;

/// Runs the verify command.
pub fn run(path: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying workspace '{key}' at {}", path.display());
    println!();

    let Some(bytes) = super::read_blob(path, key)? else {
        println!("Workspace blob not found (this is normal for a new workspace)");
        return Ok(());
    };

    let cards = match decode_cards(&bytes) {
        Ok(cards) => cards,
        Err(e) => {
            println!("✗ Workspace blob does not decode: {e}");
            return Err("Verification failed".into());
        }
    };

    let problems = check_cards(&cards);
    println!("Checked {} cards", cards.len());
    for problem in &problems {
        println!("  - {problem}");
    }

    println!();
    if problems.is_empty() {
        println!("✓ Workspace verification passed");
        Ok(())
    } else {
        println!("✗ Workspace verification failed");
        Err("Verification failed".into())
    }
}

/// Returns every consistency problem found in `cards`.
fn check_cards(cards: &[Card]) -> Vec<String> {
    let ids: HashSet<_> = cards.iter().map(|c| &c.id).collect();
    let mut problems = Vec::new();

    for card in cards {
        if !card.position.is_finite() {
            problems.push(format!("{}: position is not finite", card.id));
        }
        match (&card.size, card.variant().is_resizable()) {
            (Some(size), true) if !size.is_valid() => {
                problems.push(format!("{}: invalid size", card.id));
            }
            (Some(_), false) => {
                problems.push(format!("{}: {} cards have no size", card.id, card.variant()));
            }
            _ => {}
        }
        if !card.variant().uses_content() && !card.content.is_empty() {
            problems.push(format!("{}: {} card carries content", card.id, card.variant()));
        }
        for target in &card.connections {
            if target == &card.id {
                problems.push(format!("{}: links to itself", card.id));
            } else if !ids.contains(target) {
                problems.push(format!("{}: links to missing card {target}", card.id));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::{CardVariant, Size};
    use cardspace_testkit::{sample_card, sample_workspace};

    #[test]
    fn sample_workspace_is_consistent() {
        assert!(check_cards(&sample_workspace()).is_empty());
    }

    #[test]
    fn reports_dangling_links() {
        let mut card = sample_card("a", CardVariant::Text);
        card.connections.insert("gone".into());
        let problems = check_cards(&[card]);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("missing card gone"));
    }

    #[test]
    fn reports_size_on_fixed_card() {
        let mut card = sample_card("k", CardVariant::Kanban);
        card.size = Some(Size::new(10.0, 10.0));
        assert_eq!(check_cards(&[card]).len(), 1);
    }
}

//! Inspect command implementation.

use cardspace_core::{decode_cards, Card, CardVariant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Workspace inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage directory.
    pub path: String,
    /// Storage key.
    pub key: String,
    /// Blob size in bytes.
    pub blob_size: usize,
    /// Total number of cards.
    pub card_count: usize,
    /// Card count per variant, only variants present.
    pub variants: BTreeMap<String, usize>,
    /// Total number of links between cards.
    pub connection_count: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, key: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = super::read_blob(path, key)?
        .ok_or_else(|| format!("No workspace blob '{key}' at {}", path.display()))?;
    let cards = decode_cards(&bytes)?;

    let mut result = summarize(&cards);
    result.path = path.display().to_string();
    result.key = key.to_string();
    result.blob_size = bytes.len();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn summarize(cards: &[Card]) -> InspectResult {
    let mut variants = BTreeMap::new();
    for card in cards {
        *variants.entry(card.variant().as_str().to_string()).or_insert(0) += 1;
    }

    InspectResult {
        path: String::new(),
        key: String::new(),
        blob_size: 0,
        card_count: cards.len(),
        variants,
        connection_count: cards.iter().map(|c| c.connections.len()).sum(),
    }
}

fn print_text_output(result: &InspectResult) {
    println!("Workspace: {}", result.path);
    println!("Key:       {}", result.key);
    println!("Size:      {} bytes", result.blob_size);
    println!();
    println!("Cards:       {}", result.card_count);
    println!("Connections: {}", result.connection_count);

    if !result.variants.is_empty() {
        println!();
        for variant in CardVariant::ALL {
            if let Some(count) = result.variants.get(variant.as_str()) {
                println!("  {:<14} {count}", variant.as_str());
            }
        }
    }
}

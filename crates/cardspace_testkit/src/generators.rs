//! Property-based test generators using proptest.
//!
//! Card lists produced here hold unique ids and finite coordinates, so they
//! are always valid replica contents.

use cardspace_core::{
    Card, CardBody, CardId, CardVariant, KanbanColumn, KanbanTask, Position, TodoItem,
};
use proptest::prelude::*;
use std::collections::HashSet;

/// Strategy for card ids drawn from a small pool, so independent lists
/// overlap often.
pub fn card_id_strategy() -> impl Strategy<Value = CardId> {
    prop::string::string_regex("[a-h][0-3]")
        .expect("Invalid regex")
        .prop_map(|s| CardId::from(s.as_str()))
}

/// Strategy for finite canvas positions.
pub fn position_strategy() -> impl Strategy<Value = Position> {
    (-10_000.0f64..10_000.0, -10_000.0f64..10_000.0).prop_map(|(x, y)| Position::new(x, y))
}

/// Strategy for card variants.
pub fn card_variant_strategy() -> impl Strategy<Value = CardVariant> {
    prop::sample::select(CardVariant::ALL.to_vec())
}

fn short_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z ]{0,12}").expect("Invalid regex")
}

/// Strategy for a payload of the given variant.
pub fn card_body_strategy(variant: CardVariant) -> BoxedStrategy<CardBody> {
    match variant {
        CardVariant::Todo => prop::collection::vec((short_text(), any::<bool>()), 0..4)
            .prop_map(|items| CardBody::Todo {
                items: items
                    .into_iter()
                    .enumerate()
                    .map(|(i, (text, completed))| TodoItem {
                        id: format!("item{i}"),
                        text,
                        completed,
                    })
                    .collect(),
            })
            .boxed(),
        CardVariant::Kanban => prop::collection::vec(short_text(), 0..3)
            .prop_map(|tasks| CardBody::Kanban {
                columns: vec![KanbanColumn {
                    id: "col".into(),
                    title: "To Do".into(),
                    tasks: tasks
                        .into_iter()
                        .enumerate()
                        .map(|(i, content)| KanbanTask {
                            id: format!("task{i}"),
                            content,
                            completed: false,
                        })
                        .collect(),
                }],
            })
            .boxed(),
        CardVariant::IframeEmbed => prop::string::string_regex("https://[a-z]{1,8}\\.com")
            .expect("Invalid regex")
            .prop_map(|url| CardBody::IframeEmbed { url })
            .boxed(),
        other => Just(CardBody::initial(other)).boxed(),
    }
}

/// Strategy for a single valid card.
pub fn card_strategy() -> impl Strategy<Value = Card> {
    (
        card_id_strategy(),
        card_variant_strategy(),
        position_strategy(),
        short_text(),
    )
        .prop_flat_map(|(id, variant, position, title)| {
            card_body_strategy(variant).prop_map(move |body| {
                let mut card = Card::new(id.clone(), variant, position).with_title(title.clone());
                card.body = body;
                card
            })
        })
}

fn dedupe(cards: Vec<Card>) -> Vec<Card> {
    let mut seen = HashSet::new();
    cards
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

/// Strategy for up to `max` cards with unique ids.
pub fn card_list_strategy(max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), 0..=max).prop_map(dedupe)
}

/// Strategy for two card lists whose ids never overlap.
pub fn disjoint_card_lists_strategy(max: usize) -> impl Strategy<Value = (Vec<Card>, Vec<Card>)> {
    (
        card_list_strategy(max * 2),
        prop::collection::vec(any::<bool>(), max * 2),
    )
        .prop_map(|(cards, sides)| {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for (card, to_left) in cards.into_iter().zip(sides) {
                if to_left {
                    left.push(card);
                } else {
                    right.push(card);
                }
            }
            (left, right)
        })
}

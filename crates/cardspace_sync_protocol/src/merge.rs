//! Id-level reconciliation of two card lists.
//!
//! Cards are matched by id only. When both sides hold a card with the same
//! id, the whole card from the preferred side wins; fields are never mixed.

use cardspace_core::{Card, CardId};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Which replica wins when both hold a card with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// Remote cards come first and win ties; local-only cards are appended.
    CloudPreferred,
    /// Local cards come first and win ties; remote-only cards are appended.
    LocalPreferred,
}

impl MergePolicy {
    /// Returns true if remote cards win ties.
    pub fn prefers_remote(&self) -> bool {
        matches!(self, MergePolicy::CloudPreferred)
    }
}

/// Result of [`merge_cards`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Merged cards in display order.
    pub cards: Vec<Card>,
    /// Ids held by both sides with differing cards; the preferred side won.
    pub conflicts: Vec<CardId>,
    /// Number of ids held only by the local side.
    pub local_only: usize,
    /// Number of ids held only by the remote side.
    pub remote_only: usize,
}

impl MergeOutcome {
    /// Returns true if the merged cards equal `cards` exactly.
    pub fn matches(&self, cards: &[Card]) -> bool {
        self.cards == cards
    }
}

/// Merges a local and a remote card list.
///
/// The preferred side's cards come first in their own order, followed by
/// the other side's cards whose ids the preferred side lacks, also in their
/// own order. Duplicate ids within one side keep their first occurrence.
pub fn merge_cards(local: &[Card], remote: &[Card], policy: MergePolicy) -> MergeOutcome {
    let (preferred, other) = if policy.prefers_remote() {
        (remote, local)
    } else {
        (local, remote)
    };

    let mut index: HashMap<&CardId, &Card> = HashMap::with_capacity(preferred.len());
    let mut cards = Vec::with_capacity(preferred.len() + other.len());
    for card in preferred {
        if let Entry::Vacant(slot) = index.entry(&card.id) {
            slot.insert(card);
            cards.push(card.clone());
        }
    }

    let mut other_seen: HashSet<&CardId> = HashSet::with_capacity(other.len());
    let mut conflicts = Vec::new();
    let mut other_only = 0;
    let mut shared = 0;
    for card in other {
        if !other_seen.insert(&card.id) {
            continue;
        }
        match index.get(&card.id) {
            None => {
                cards.push(card.clone());
                other_only += 1;
            }
            Some(&winner) => {
                shared += 1;
                if winner != card {
                    conflicts.push(card.id.clone());
                }
            }
        }
    }
    let preferred_only = index.len() - shared;

    let (local_only, remote_only) = if policy.prefers_remote() {
        (other_only, preferred_only)
    } else {
        (preferred_only, other_only)
    };

    MergeOutcome {
        cards,
        conflicts,
        local_only,
        remote_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::{CardVariant, Position};
    use cardspace_testkit::{card_list_strategy, disjoint_card_lists_strategy};
    use proptest::prelude::*;

    fn card(id: &str) -> Card {
        Card::new(id.into(), CardVariant::Text, Position::default())
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn tie_break_follows_policy() {
        let local = vec![card("x").with_title("L")];
        let remote = vec![card("x").with_title("R")];

        let cloud = merge_cards(&local, &remote, MergePolicy::CloudPreferred);
        assert_eq!(cloud.cards.len(), 1);
        assert_eq!(cloud.cards[0].title, "R");
        assert_eq!(cloud.conflicts, vec![CardId::from("x")]);

        let local_wins = merge_cards(&local, &remote, MergePolicy::LocalPreferred);
        assert_eq!(local_wins.cards[0].title, "L");
    }

    #[test]
    fn disjoint_sets_union() {
        let local = vec![card("a"), card("b")];
        let remote = vec![card("c"), card("d")];

        let merged = merge_cards(&local, &remote, MergePolicy::LocalPreferred);
        assert_eq!(ids(&merged.cards), ["a", "b", "c", "d"]);
        assert_eq!(merged.remote_only, 2);
        assert!(merged.conflicts.is_empty());

        let merged = merge_cards(&local, &remote, MergePolicy::CloudPreferred);
        assert_eq!(ids(&merged.cards), ["c", "d", "a", "b"]);
        assert_eq!(merged.local_only, 2);
    }

    #[test]
    fn identical_cards_are_not_conflicts() {
        let both = vec![card("a"), card("b")];
        let merged = merge_cards(&both, &both, MergePolicy::CloudPreferred);
        assert!(merged.matches(&both));
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.local_only, 0);
    }

    #[test]
    fn empty_sides() {
        let local = vec![card("a")];
        let merged = merge_cards(&local, &[], MergePolicy::CloudPreferred);
        assert!(merged.matches(&local));
        assert!(merge_cards(&[], &[], MergePolicy::LocalPreferred).cards.is_empty());
    }

    #[test]
    fn duplicate_ids_within_a_side_keep_first() {
        let remote = vec![card("a").with_title("first"), card("a").with_title("second")];
        let merged = merge_cards(&[], &remote, MergePolicy::CloudPreferred);
        assert_eq!(merged.cards.len(), 1);
        assert_eq!(merged.cards[0].title, "first");
    }

    #[test]
    fn one_sided_counts_ignore_policy() {
        let local = vec![card("a"), card("shared")];
        let remote = vec![card("shared"), card("b"), card("c")];

        for policy in [MergePolicy::CloudPreferred, MergePolicy::LocalPreferred] {
            let merged = merge_cards(&local, &remote, policy);
            assert_eq!(merged.local_only, 1, "{policy:?}");
            assert_eq!(merged.remote_only, 2, "{policy:?}");
            assert_eq!(merged.cards.len(), 4);
        }
    }

    #[test]
    fn merges_a_full_size_workspace() {
        let local: Vec<Card> = (0..10_000).map(|i| card(&format!("l{i}"))).collect();
        let remote: Vec<Card> = (0..10_000)
            .map(|i| card(&format!("l{i}")).with_title("remote"))
            .collect();

        let merged = merge_cards(&local, &remote, MergePolicy::LocalPreferred);
        assert_eq!(merged.cards.len(), 10_000);
        assert_eq!(merged.conflicts.len(), 10_000);
        assert_eq!(merged.local_only + merged.remote_only, 0);
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(
            local in card_list_strategy(8),
            remote in card_list_strategy(8),
        ) {
            for policy in [MergePolicy::CloudPreferred, MergePolicy::LocalPreferred] {
                let once = merge_cards(&local, &remote, policy);
                let again = if policy.prefers_remote() {
                    merge_cards(&once.cards, &remote, policy)
                } else {
                    merge_cards(&local, &once.cards, policy)
                };
                prop_assert_eq!(&again.cards, &once.cards);
            }
        }

        #[test]
        fn disjoint_merge_holds_every_card(
            (local, remote) in disjoint_card_lists_strategy(6),
        ) {
            let a = merge_cards(&local, &remote, MergePolicy::LocalPreferred);
            let b = merge_cards(&remote, &local, MergePolicy::CloudPreferred);
            prop_assert_eq!(a.cards.len(), local.len() + remote.len());
            prop_assert_eq!(&a.cards, &b.cards);
            prop_assert!(a.conflicts.is_empty());
        }

        #[test]
        fn preferred_side_always_survives(
            local in card_list_strategy(8),
            remote in card_list_strategy(8),
        ) {
            let merged = merge_cards(&local, &remote, MergePolicy::LocalPreferred);
            for card in &local {
                prop_assert!(merged.cards.contains(card));
            }
            let merged = merge_cards(&local, &remote, MergePolicy::CloudPreferred);
            for card in &remote {
                prop_assert!(merged.cards.contains(card));
            }
        }
    }
}

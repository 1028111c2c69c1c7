//! Commands issued by the input layer.
//!
//! Every command is a total function over the card list: a command naming an
//! id that is not present changes nothing and is not an error.

use crate::card::{Card, CardBody, CardId, CardVariant, Position, Size, IFRAME_MIN_SIZE};

/// A discrete user intent against the workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Adds a new card. Ignored if `id` is already present.
    Create {
        /// Pre-generated identity of the new card.
        id: CardId,
        /// Kind of card.
        variant: CardVariant,
        /// Initial canvas position.
        position: Position,
    },
    /// Moves a card.
    Move {
        /// Target card.
        id: CardId,
        /// New horizontal coordinate.
        x: f64,
        /// New vertical coordinate.
        y: f64,
    },
    /// Replaces a card's title.
    SetTitle {
        /// Target card.
        id: CardId,
        /// New title.
        title: String,
    },
    /// Replaces a card's primary content.
    SetContent {
        /// Target card.
        id: CardId,
        /// New content.
        content: String,
    },
    /// Replaces a card's structured payload.
    ///
    /// Ignored when the payload belongs to a different variant or holds a
    /// non-finite coordinate.
    SetPayload {
        /// Target card.
        id: CardId,
        /// New payload.
        body: CardBody,
    },
    /// Resizes a resizable card.
    Resize {
        /// Target card.
        id: CardId,
        /// New size.
        size: Size,
    },
    /// Links `from` to `to`.
    Connect {
        /// Card holding the link.
        from: CardId,
        /// Linked card.
        to: CardId,
    },
    /// Removes the link from `from` to `to`.
    Disconnect {
        /// Card holding the link.
        from: CardId,
        /// Linked card.
        to: CardId,
    },
    /// Removes a card and every link pointing at it.
    Delete {
        /// Target card.
        id: CardId,
    },
    /// Removes every card.
    Clear,
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Move { .. } => "move",
            Command::SetTitle { .. } => "set_title",
            Command::SetContent { .. } => "set_content",
            Command::SetPayload { .. } => "set_payload",
            Command::Resize { .. } => "resize",
            Command::Connect { .. } => "connect",
            Command::Disconnect { .. } => "disconnect",
            Command::Delete { .. } => "delete",
            Command::Clear => "clear",
        }
    }
}

fn find_mut<'a>(cards: &'a mut [Card], id: &CardId) -> Option<&'a mut Card> {
    cards.iter_mut().find(|c| &c.id == id)
}

/// Applies `command` to `cards` in place.
///
/// Returns `true` if the card list changed.
pub fn apply_command(cards: &mut Vec<Card>, command: &Command) -> bool {
    match command {
        Command::Create {
            id,
            variant,
            position,
        } => {
            if !position.is_finite() || cards.iter().any(|c| &c.id == id) {
                return false;
            }
            cards.push(Card::new(id.clone(), *variant, *position));
            true
        }

        Command::Move { id, x, y } => {
            let position = Position::new(*x, *y);
            if !position.is_finite() {
                return false;
            }
            match find_mut(cards, id) {
                Some(card) if card.position != position => {
                    card.position = position;
                    true
                }
                _ => false,
            }
        }

        Command::SetTitle { id, title } => match find_mut(cards, id) {
            Some(card) if &card.title != title => {
                card.title.clone_from(title);
                true
            }
            _ => false,
        },

        Command::SetContent { id, content } => match find_mut(cards, id) {
            Some(card) if card.variant().uses_content() && &card.content != content => {
                card.content.clone_from(content);
                true
            }
            _ => false,
        },

        Command::SetPayload { id, body } => match find_mut(cards, id) {
            Some(card)
                if card.variant() == body.variant() && body.is_finite() && &card.body != body =>
            {
                card.body = body.clone();
                true
            }
            _ => false,
        },

        Command::Resize { id, size } => {
            if !size.is_valid() {
                return false;
            }
            match find_mut(cards, id) {
                Some(card) if card.variant().is_resizable() => {
                    let size = if card.variant() == CardVariant::IframeEmbed {
                        Size::new(
                            size.width.max(IFRAME_MIN_SIZE.width),
                            size.height.max(IFRAME_MIN_SIZE.height),
                        )
                    } else {
                        *size
                    };
                    if card.size == Some(size) {
                        return false;
                    }
                    card.size = Some(size);
                    true
                }
                _ => false,
            }
        }

        Command::Connect { from, to } => {
            if from == to || !cards.iter().any(|c| &c.id == to) {
                return false;
            }
            match find_mut(cards, from) {
                Some(card) => card.connections.insert(to.clone()),
                None => false,
            }
        }

        Command::Disconnect { from, to } => match find_mut(cards, from) {
            Some(card) => card.connections.remove(to),
            None => false,
        },

        Command::Delete { id } => {
            let before = cards.len();
            cards.retain(|c| &c.id != id);
            if cards.len() == before {
                return false;
            }
            for card in cards.iter_mut() {
                card.connections.remove(id);
            }
            true
        }

        Command::Clear => {
            if cards.is_empty() {
                return false;
            }
            cards.clear();
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Point, Stroke, StrokeKind, TodoItem};

    fn create(cards: &mut Vec<Card>, id: &str, variant: CardVariant) {
        assert!(apply_command(
            cards,
            &Command::Create {
                id: id.into(),
                variant,
                position: Position::default(),
            }
        ));
    }

    #[test]
    fn create_appends_in_order() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        create(&mut cards, "b", CardVariant::Todo);

        let ids: Vec<_> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn create_never_reuses_an_id() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);

        let dup = Command::Create {
            id: "a".into(),
            variant: CardVariant::Kanban,
            position: Position::default(),
        };
        assert!(!apply_command(&mut cards, &dup));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].variant(), CardVariant::Text);
    }

    #[test]
    fn move_touches_only_target() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        create(&mut cards, "b", CardVariant::Text);
        let untouched = cards[1].clone();

        let changed = apply_command(
            &mut cards,
            &Command::Move {
                id: "a".into(),
                x: 10.0,
                y: 20.0,
            },
        );

        assert!(changed);
        assert_eq!(cards[0].position, Position::new(10.0, 20.0));
        assert_eq!(cards[1], untouched);
    }

    #[test]
    fn non_finite_move_is_ignored() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);

        let nan = Command::Move {
            id: "a".into(),
            x: f64::NAN,
            y: 0.0,
        };
        assert!(!apply_command(&mut cards, &nan));
        assert_eq!(cards[0].position, Position::default());
    }

    #[test]
    fn non_finite_payload_is_ignored() {
        let mut cards = Vec::new();
        create(&mut cards, "d", CardVariant::Drawing);

        let nan = Command::SetPayload {
            id: "d".into(),
            body: CardBody::Drawing {
                strokes: vec![Stroke {
                    points: vec![Point { x: f64::NAN, y: 0.0 }],
                    stroke_kind: StrokeKind::Pen,
                    width: 2.0,
                }],
            },
        };
        assert!(!apply_command(&mut cards, &nan));
        assert_eq!(cards[0].body, CardBody::initial(CardVariant::Drawing));
    }

    #[test]
    fn absent_id_is_noop() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        let before = cards.clone();

        let commands = [
            Command::Move {
                id: "zz".into(),
                x: 1.0,
                y: 1.0,
            },
            Command::SetTitle {
                id: "zz".into(),
                title: "x".into(),
            },
            Command::SetContent {
                id: "zz".into(),
                content: "x".into(),
            },
            Command::Delete { id: "zz".into() },
            Command::Disconnect {
                from: "zz".into(),
                to: "a".into(),
            },
        ];
        for command in &commands {
            assert!(!apply_command(&mut cards, command), "{}", command.name());
        }
        assert_eq!(cards, before);
    }

    #[test]
    fn payload_must_match_variant() {
        let mut cards = Vec::new();
        create(&mut cards, "t", CardVariant::Todo);

        let wrong = Command::SetPayload {
            id: "t".into(),
            body: CardBody::IframeEmbed {
                url: "https://example.com".into(),
            },
        };
        assert!(!apply_command(&mut cards, &wrong));
        assert_eq!(cards[0].variant(), CardVariant::Todo);

        let items = vec![TodoItem::new("buy milk")];
        let right = Command::SetPayload {
            id: "t".into(),
            body: CardBody::Todo {
                items: items.clone(),
            },
        };
        assert!(apply_command(&mut cards, &right));
        assert_eq!(cards[0].body, CardBody::Todo { items });
    }

    #[test]
    fn content_ignored_for_structured_variants() {
        let mut cards = Vec::new();
        create(&mut cards, "k", CardVariant::Kanban);

        let cmd = Command::SetContent {
            id: "k".into(),
            content: "text".into(),
        };
        assert!(!apply_command(&mut cards, &cmd));
        assert!(cards[0].content.is_empty());
    }

    #[test]
    fn resize_clamps_iframes_and_skips_fixed_cards() {
        let mut cards = Vec::new();
        create(&mut cards, "web", CardVariant::IframeEmbed);
        create(&mut cards, "note", CardVariant::Text);

        assert!(apply_command(
            &mut cards,
            &Command::Resize {
                id: "web".into(),
                size: Size::new(50.0, 500.0),
            }
        ));
        assert_eq!(cards[0].size, Some(Size::new(200.0, 500.0)));

        assert!(!apply_command(
            &mut cards,
            &Command::Resize {
                id: "note".into(),
                size: Size::new(500.0, 500.0),
            }
        ));
        assert_eq!(cards[1].size, None);
    }

    #[test]
    fn connections_follow_deletes() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        create(&mut cards, "b", CardVariant::Text);

        let link = Command::Connect {
            from: "a".into(),
            to: "b".into(),
        };
        assert!(apply_command(&mut cards, &link));
        assert!(!apply_command(&mut cards, &link));

        let self_link = Command::Connect {
            from: "a".into(),
            to: "a".into(),
        };
        assert!(!apply_command(&mut cards, &self_link));

        assert!(apply_command(&mut cards, &Command::Delete { id: "b".into() }));
        assert!(cards[0].connections.is_empty());
    }

    #[test]
    fn deleted_id_stays_gone() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        assert!(apply_command(&mut cards, &Command::Delete { id: "a".into() }));

        let later = [
            Command::Move {
                id: "a".into(),
                x: 5.0,
                y: 5.0,
            },
            Command::SetTitle {
                id: "a".into(),
                title: "back?".into(),
            },
            Command::Delete { id: "a".into() },
        ];
        for command in &later {
            assert!(!apply_command(&mut cards, command));
        }
        assert!(cards.is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut cards = Vec::new();
        create(&mut cards, "a", CardVariant::Text);
        create(&mut cards, "b", CardVariant::Image);

        assert!(apply_command(&mut cards, &Command::Clear));
        assert!(cards.is_empty());
        assert!(!apply_command(&mut cards, &Command::Clear));
    }
}

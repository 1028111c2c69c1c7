//! The card entity.

use super::body::{CardBody, CardVariant};
use super::id::CardId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest size an embedded page can be resized to.
pub const IFRAME_MIN_SIZE: Size = Size {
    width: 200.0,
    height: 150.0,
};

/// Position in canvas coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Rendered size of a resizable card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in canvas units.
    pub width: f64,
    /// Height in canvas units.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns true if both dimensions are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    fn initial(variant: CardVariant) -> Option<Self> {
        match variant {
            CardVariant::IframeEmbed => Some(Size::new(400.0, 300.0)),
            CardVariant::MediaBundle => Some(Size::new(320.0, 240.0)),
            CardVariant::Drawing => Some(Size::new(300.0, 200.0)),
            _ => None,
        }
    }
}

/// A card on the canvas: the unit of persistence and merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Immutable identity; the only merge key.
    pub id: CardId,
    /// Display title.
    pub title: String,
    /// Primary payload for text, chat and image cards.
    #[serde(default)]
    pub content: String,
    /// Canvas position.
    pub position: Position,
    /// Size, present only for resizable variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Ids of cards this card links to.
    #[serde(default)]
    pub connections: BTreeSet<CardId>,
    /// Variant tag and its payload.
    pub body: CardBody,
}

impl Card {
    /// Creates a card of `variant` with the default title, content and
    /// payload for that variant.
    pub fn new(id: CardId, variant: CardVariant, position: Position) -> Self {
        let (title, content) = match variant {
            CardVariant::Text => ("New Note", "New note..."),
            CardVariant::Todo | CardVariant::Chat => ("New Note", ""),
            CardVariant::Image => ("Image", ""),
            CardVariant::Drawing => ("Drawing", ""),
            CardVariant::Kanban => ("Kanban Board", ""),
            CardVariant::IframeEmbed => ("Web Page", ""),
            CardVariant::MediaBundle => ("Media", ""),
        };

        Self {
            id,
            title: title.to_string(),
            content: content.to_string(),
            position,
            size: Size::initial(variant),
            connections: BTreeSet::new(),
            body: CardBody::initial(variant),
        }
    }

    /// Returns the card's variant.
    #[inline]
    pub fn variant(&self) -> CardVariant {
        self.body.variant()
    }

    /// Returns true if the card's geometry and payload can be encoded.
    pub fn is_finite(&self) -> bool {
        let size_ok = match self.size {
            Some(size) => size.width.is_finite() && size.height.is_finite(),
            None => true,
        };
        self.position.is_finite() && size_ok && self.body.is_finite()
    }

    /// Sets the title (builder style).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the content (builder style).
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

//! Static card and house reference data.
//!
//! The catalog is embedded at compile time from `data/*.json` and decoded
//! once on first use. Nothing here is ever mutated.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::board::{CardId, Layout, Slot, SLOT_COUNT};

const CARDS_JSON: &str = include_str!("../data/cards.json");
const HOUSES_JSON: &str = include_str!("../data/houses.json");

/// First clock-house id; month `n` (0-based slot) is `CLOCK_HOUSE_BASE + n`.
pub const CLOCK_HOUSE_BASE: u16 = 101;
/// Synthetic house for the clock's center cell.
pub const CLOCK_CENTER_HOUSE: u16 = 113;
pub const CLOCK_CENTER_SLOT: Slot = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn label(&self) -> &'static str {
        match self {
            Polarity::Positive => "Positiva",
            Polarity::Negative => "Negativa",
            Polarity::Neutral => "Neutra",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingSpeed {
    Instant,
    VeryFast,
    Fast,
    Moderate,
    Slow,
    Long,
    VeryLong,
    Uncertain,
}

impl TimingSpeed {
    pub fn label(&self) -> &'static str {
        match self {
            TimingSpeed::Instant => "Imediato",
            TimingSpeed::VeryFast => "Muito Rápido",
            TimingSpeed::Fast => "Rápido",
            TimingSpeed::Moderate => "Moderado",
            TimingSpeed::Slow => "Lento",
            TimingSpeed::Long => "Longo",
            TimingSpeed::VeryLong => "Muito Longo",
            TimingSpeed::Uncertain => "Incerto",
        }
    }
}

/// How a card moves events along in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingCategory {
    Accelerates,
    Sustains,
    Delays,
    Blocks,
    NotApplicable,
}

impl TimingCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TimingCategory::Accelerates => "Acelera",
            TimingCategory::Sustains => "Mantém",
            TimingCategory::Delays => "Retarda",
            TimingCategory::Blocks => "Bloqueia",
            TimingCategory::NotApplicable => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub speed: TimingSpeed,
    pub scale: String,
    pub category: TimingCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u8,
    pub name: String,
    pub suit: String,
    pub polarity: Polarity,
    pub timing: Timing,
    pub keywords: Vec<String>,
    pub brief: String,
    pub at_origin: String,
    pub symbolic_energy: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: u16,
    pub name: String,
    pub polarity: Polarity,
    pub theme: String,
    pub technical_description: String,
    pub pedagogical_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zodiac: Option<String>,
}

impl House {
    pub fn is_clock_house(&self) -> bool {
        self.id >= CLOCK_HOUSE_BASE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected {expected} {kind}, found {found}")]
    Count {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("missing {kind} id {id}")]
    Missing { kind: &'static str, id: u16 },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    cards: Vec<Card>,
    houses: Vec<House>,
}

impl Catalog {
    /// Decode and validate catalog JSON.
    pub fn from_json(cards: &str, houses: &str) -> Result<Self, CatalogError> {
        let mut cards: Vec<Card> = serde_json::from_str(cards)?;
        let mut houses: Vec<House> = serde_json::from_str(houses)?;
        cards.sort_by_key(|c| c.id);
        houses.sort_by_key(|h| h.id);

        if cards.len() != SLOT_COUNT {
            return Err(CatalogError::Count {
                kind: "cards",
                expected: SLOT_COUNT,
                found: cards.len(),
            });
        }
        for (i, card) in cards.iter().enumerate() {
            if usize::from(card.id) != i + 1 {
                return Err(CatalogError::Missing { kind: "card", id: i as u16 + 1 });
            }
        }

        let ids: HashSet<u16> = houses.iter().map(|h| h.id).collect();
        let required = (1..=SLOT_COUNT as u16)
            .chain(CLOCK_HOUSE_BASE..CLOCK_HOUSE_BASE + 12)
            .chain(std::iter::once(CLOCK_CENTER_HOUSE));
        for id in required {
            if !ids.contains(&id) {
                return Err(CatalogError::Missing { kind: "house", id });
            }
        }
        if ids.len() != houses.len() {
            return Err(CatalogError::Count {
                kind: "distinct houses",
                expected: houses.len(),
                found: ids.len(),
            });
        }

        Ok(Self { cards, houses })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(usize::from(id.get()) - 1)
    }

    pub fn house(&self, id: u16) -> Option<&House> {
        self.houses
            .binary_search_by_key(&id, |h| h.id)
            .ok()
            .map(|i| &self.houses[i])
    }

    /// Grid house for a slot: slot `i` is house `i + 1`.
    pub fn grid_house(&self, slot: Slot) -> Option<&House> {
        if slot >= SLOT_COUNT {
            return None;
        }
        self.house(slot as u16 + 1)
    }

    /// Clock house for a slot: months for 0..12, the center for 12.
    pub fn clock_house(&self, slot: Slot) -> Option<&House> {
        match slot {
            s if s < CLOCK_CENTER_SLOT => self.house(CLOCK_HOUSE_BASE + s as u16),
            CLOCK_CENTER_SLOT => self.house(CLOCK_CENTER_HOUSE),
            _ => None,
        }
    }

    pub fn house_for(&self, layout: Layout, slot: Slot) -> Option<&House> {
        match layout {
            Layout::Grid => self.grid_house(slot),
            Layout::Clock => self.clock_house(slot),
        }
    }

    /// Card by number or by name, ignoring case.
    pub fn find_card(&self, query: &str) -> Option<&Card> {
        let query = query.trim();
        if let Ok(n) = query.parse::<u8>() {
            return CardId::new(n).and_then(|id| self.card(id));
        }
        let query = query.to_lowercase();
        self.cards.iter().find(|c| c.name.to_lowercase() == query)
    }

    /// Card name, or the empty/unknown markers used in narration.
    pub fn card_name(&self, id: Option<CardId>) -> &str {
        match id {
            None => "Vazio",
            Some(id) => self.card(id).map(|c| c.name.as_str()).unwrap_or("Desconhecido"),
        }
    }
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// The embedded catalog. Its data is validated by this module's tests.
pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        Catalog::from_json(CARDS_JSON, HOUSES_JSON).expect("embedded catalog data is valid")
    })
}

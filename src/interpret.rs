//! Interpretation context: the resolved facts about a selected slot that
//! the display layer and the narrator consume.
//!
//! Everything is copied out of the catalog and board into plain data, so
//! the context serializes directly. Empty slots are kept and marked
//! `{"status": "empty"}`; an absent card is meaningful to a reader.

use serde::{Deserialize, Serialize};

use crate::board::{Board, CardId, Layout, Slot};
use crate::catalog::{catalog, Card, House, CLOCK_CENTER_SLOT};
use crate::geometry::{self, grid, relations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingTheme {
    #[default]
    General,
    Love,
    Work,
    Spirituality,
}

impl ReadingTheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" | "geral" => Some(ReadingTheme::General),
            "love" | "amor" => Some(ReadingTheme::Love),
            "work" | "trabalho" => Some(ReadingTheme::Work),
            "spirituality" | "espiritualidade" => Some(ReadingTheme::Spirituality),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadingTheme::General => "Geral",
            ReadingTheme::Love => "Amor & Relacionamentos",
            ReadingTheme::Work => "Trabalho & Finanças",
            ReadingTheme::Spirituality => "Espiritualidade & Caminho de Vida",
        }
    }

    /// Cards that stand for the theme itself on the board.
    ///
    /// This mapping is this crate's own choice, taken from common Lenormand
    /// practice: Coração and Anel for love, Peixes and Âncora for work,
    /// Cruz for the spiritual path. General has none.
    pub fn significators(&self) -> &'static [u8] {
        match self {
            ReadingTheme::General => &[],
            ReadingTheme::Love => &[24, 25],
            ReadingTheme::Work => &[34, 35],
            ReadingTheme::Spirituality => &[36],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl StudyLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "iniciante" => Some(StudyLevel::Beginner),
            "intermediate" | "intermediario" | "intermediário" => Some(StudyLevel::Intermediate),
            "advanced" | "avancado" | "avançado" => Some(StudyLevel::Advanced),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StudyLevel::Beginner => "Iniciante",
            StudyLevel::Intermediate => "Intermediário",
            StudyLevel::Advanced => "Avançado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingFacts {
    pub speed: &'static str,
    pub scale: String,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardFacts {
    pub id: u8,
    pub name: String,
    pub polarity: &'static str,
    pub timing: TimingFacts,
    pub keywords: Vec<String>,
    pub brief: String,
    pub symbolic_energy: String,
}

impl From<&Card> for CardFacts {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            name: card.name.clone(),
            polarity: card.polarity.label(),
            timing: TimingFacts {
                speed: card.timing.speed.label(),
                scale: card.timing.scale.clone(),
                category: card.timing.category.label(),
            },
            keywords: card.keywords.clone(),
            brief: card.brief.clone(),
            symbolic_energy: card.symbolic_energy.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotCard {
    Present(CardFacts),
    Empty,
}

impl SlotCard {
    pub fn card(&self) -> Option<&CardFacts> {
        match self {
            SlotCard::Present(c) => Some(c),
            SlotCard::Empty => None,
        }
    }

    pub fn name(&self) -> &str {
        self.card().map(|c| c.name.as_str()).unwrap_or("Vazio")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseFacts {
    pub id: u16,
    pub name: String,
    pub theme: String,
    pub polarity: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zodiac: Option<String>,
}

impl From<&House> for HouseFacts {
    fn from(h: &House) -> Self {
        Self {
            id: h.id,
            name: h.name.clone(),
            theme: h.theme.clone(),
            polarity: h.polarity.label(),
            description: h.technical_description.clone(),
            month: h.month.clone(),
            zodiac: h.zodiac.clone(),
        }
    }
}

/// One slot, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFacts {
    pub slot: Slot,
    /// 1-based position as shown on the board.
    pub house_number: usize,
    pub house: Option<HouseFacts>,
    pub card: SlotCard,
}

impl SlotFacts {
    pub fn resolve(board: &Board, layout: Layout, slot: Slot) -> Self {
        let cat = catalog();
        let card = board
            .get(slot)
            .and_then(|id| cat.card(id))
            .map(|c| SlotCard::Present(c.into()))
            .unwrap_or(SlotCard::Empty);
        Self {
            slot,
            house_number: slot + 1,
            house: cat.house_for(layout, slot).map(HouseFacts::from),
            card,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRef {
    pub id: u8,
    pub name: String,
}

/// Bridge technique: where the owner of the selected house landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeFacts {
    pub expected_owner: CardRef,
    /// `None` when the owner card is not on the board.
    pub target: Option<SlotFacts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisFacts {
    pub name: &'static str,
    pub kind: &'static str,
    pub houses: (u8, u8),
    pub description: &'static str,
    pub tension: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryFacts {
    Grid {
        bridge: Option<BridgeFacts>,
        knight: Vec<SlotFacts>,
        mirrors: Vec<SlotFacts>,
        diagonals_up: Vec<SlotFacts>,
        diagonals_down: Vec<SlotFacts>,
        frame: Vec<SlotFacts>,
        veredict: Vec<SlotFacts>,
    },
    Clock {
        opposition: Option<SlotFacts>,
        axis: Option<AxisFacts>,
        center: SlotFacts,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationContext {
    pub layout: Layout,
    pub theme: ReadingTheme,
    pub theme_label: &'static str,
    pub level: StudyLevel,
    pub level_label: &'static str,
    pub selected: SlotFacts,
    pub geometry: GeometryFacts,
}

/// Assemble the context for `selected`. `None` if the slot is outside the
/// layout.
pub fn build_context(
    board: &Board,
    selected: Slot,
    layout: Layout,
    theme: ReadingTheme,
    level: StudyLevel,
) -> Option<InterpretationContext> {
    if !layout.contains(selected) {
        return None;
    }
    let resolve_all = |slots: &mut dyn Iterator<Item = Slot>| -> Vec<SlotFacts> {
        slots.map(|s| SlotFacts::resolve(board, layout, s)).collect()
    };

    let geometry = match layout {
        Layout::Grid => GeometryFacts::Grid {
            bridge: relations::house_owner(selected).map(|owner| BridgeFacts {
                expected_owner: CardRef {
                    id: owner.get(),
                    name: catalog().card_name(Some(owner)).to_string(),
                },
                target: relations::bridge_target(selected, board)
                    .map(|s| SlotFacts::resolve(board, layout, s)),
            }),
            knight: resolve_all(&mut grid::knight_moves(selected).iter().copied()),
            mirrors: resolve_all(&mut grid::mirrors(selected).iter().copied()),
            diagonals_up: resolve_all(&mut grid::diagonals_above(selected).iter().copied()),
            diagonals_down: resolve_all(&mut grid::diagonals_below(selected).iter().copied()),
            frame: resolve_all(&mut grid::frame().into_iter()),
            veredict: resolve_all(&mut grid::veredict_zone()),
        },
        Layout::Clock => GeometryFacts::Clock {
            opposition: geometry::opposition(selected).map(|s| SlotFacts::resolve(board, layout, s)),
            axis: geometry::axis(selected).map(|a| AxisFacts {
                name: a.name,
                kind: a.kind.label(),
                houses: a.houses,
                description: a.description,
                tension: a.tension,
            }),
            center: SlotFacts::resolve(board, layout, CLOCK_CENTER_SLOT),
        },
    };

    Some(InterpretationContext {
        layout,
        theme,
        theme_label: theme.label(),
        level,
        level_label: level.label(),
        selected: SlotFacts::resolve(board, layout, selected),
        geometry,
    })
}

/// Whether the card in a slot is one of the theme's significators.
pub fn is_significator(theme: ReadingTheme, card: Option<CardId>) -> bool {
    card.map_or(false, |c| theme.significators().contains(&c.get()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significators_name_the_expected_cards() {
        let names = |theme: ReadingTheme| -> Vec<String> {
            theme
                .significators()
                .iter()
                .filter_map(|&n| CardId::new(n))
                .filter_map(|id| crate::catalog::catalog().card(id))
                .map(|c| c.name.clone())
                .collect()
        };
        assert_eq!(names(ReadingTheme::Love), ["Coração", "Anel"]);
        assert_eq!(names(ReadingTheme::Work), ["Peixes", "Âncora"]);
        assert_eq!(names(ReadingTheme::Spirituality), ["Cruz"]);
        assert!(names(ReadingTheme::General).is_empty());
    }

    fn full_board() -> Board {
        Board::from_cards(CardId::all())
    }

    #[test]
    fn test_out_of_layout_selection() {
        let board = full_board();
        assert!(build_context(&board, 13, Layout::Clock, ReadingTheme::General, StudyLevel::Beginner).is_none());
        assert!(build_context(&board, 36, Layout::Grid, ReadingTheme::General, StudyLevel::Beginner).is_none());
    }

    #[test]
    fn test_grid_context_resolves_relations() {
        let mut board = full_board();
        board.assign(10, CardId::new(4).unwrap());
        let ctx = build_context(&board, 3, Layout::Grid, ReadingTheme::Love, StudyLevel::Advanced).unwrap();
        assert_eq!(ctx.selected.house_number, 4);
        assert_eq!(ctx.theme_label, "Amor & Relacionamentos");
        match ctx.geometry {
            GeometryFacts::Grid { bridge, knight, frame, veredict, .. } => {
                let bridge = bridge.unwrap();
                assert_eq!(bridge.expected_owner.id, 4);
                assert_eq!(bridge.target.unwrap().slot, 10);
                assert_eq!(knight.len(), grid::knight_moves(3).len());
                assert_eq!(frame.len(), 4);
                assert_eq!(veredict.len(), 4);
            }
            other => panic!("expected grid facts, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_slots_are_explicit() {
        let board = Board::from_cards([CardId::new(1).unwrap()]);
        let ctx = build_context(&board, 0, Layout::Grid, ReadingTheme::General, StudyLevel::Beginner).unwrap();
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["geometry"]["kind"], "grid");
        let knight = json["geometry"]["knight"].as_array().unwrap();
        assert!(!knight.is_empty());
        assert!(knight.iter().all(|k| k["card"]["status"] == "empty"));
        assert_eq!(json["selected"]["card"]["status"], "present");
        assert_eq!(json["selected"]["card"]["name"], "Cavaleiro");
    }

    #[test]
    fn test_absent_bridge_owner_is_reported() {
        let board = Board::from_cards([CardId::new(1).unwrap()]);
        let ctx = build_context(&board, 5, Layout::Grid, ReadingTheme::General, StudyLevel::Beginner);
        let json = serde_json::to_value(ctx.unwrap()).unwrap();
        assert_eq!(json["geometry"]["bridge"]["expected_owner"]["id"], 6);
        assert!(json["geometry"]["bridge"]["target"].is_null());
    }

    #[test]
    fn test_clock_context() {
        let board = full_board();
        let ctx = build_context(&board, 2, Layout::Clock, ReadingTheme::General, StudyLevel::Beginner).unwrap();
        assert_eq!(ctx.selected.house.as_ref().unwrap().id, 103);
        match ctx.geometry {
            GeometryFacts::Clock { opposition, axis, center } => {
                assert_eq!(opposition.unwrap().slot, 8);
                assert_eq!(axis.unwrap().houses, (3, 9));
                assert_eq!(center.slot, 12);
                assert_eq!(center.house.unwrap().id, 113);
            }
            other => panic!("expected clock facts, got {:?}", other),
        }
    }

    #[test]
    fn test_clock_center_has_no_opposition() {
        let board = full_board();
        let ctx = build_context(&board, 12, Layout::Clock, ReadingTheme::General, StudyLevel::Beginner).unwrap();
        match ctx.geometry {
            GeometryFacts::Clock { opposition, axis, .. } => {
                assert!(opposition.is_none());
                assert!(axis.is_none());
            }
            other => panic!("expected clock facts, got {:?}", other),
        }
    }

    #[test]
    fn test_significators() {
        assert!(is_significator(ReadingTheme::Love, CardId::new(24)));
        assert!(!is_significator(ReadingTheme::General, CardId::new(24)));
        assert!(!is_significator(ReadingTheme::Work, None));
    }
}

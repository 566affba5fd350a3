//! Study-mode topics and the tip balloons shown while practising.

use serde::Serialize;

use crate::board::Layout;

/// A practice topic. Each one drives at most one kind of highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyTopic {
    GridOverview,
    Frame,
    Mirror,
    Knight,
    Bridge,
    Diagonals,
    DiagonalsUp,
    DiagonalsDown,
    Veredict,
    ClockOverview,
    ClockCenter,
    ClockHouse,
    ClockOpposition,
    ClockTemporality,
    ClockAbsence,
    ClockSecondDraw,
}

impl StudyTopic {
    /// Resolve a topic id such as `gt-knight` or `clock-center`.
    ///
    /// Both the English and Portuguese keywords are accepted; the more
    /// specific diagonal directions are matched before the generic one.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        let has = |k: &str| id.contains(k);
        let topic = if has("diagonal-superior") || has("diagonals-up") || has("diagonal-up") {
            StudyTopic::DiagonalsUp
        } else if has("diagonal-inferior") || has("diagonals-down") || has("diagonal-down") {
            StudyTopic::DiagonalsDown
        } else if has("diagonal") {
            StudyTopic::Diagonals
        } else if has("frame") || has("moldura") {
            StudyTopic::Frame
        } else if has("mirror") || has("espelho") {
            StudyTopic::Mirror
        } else if has("knight") || has("cavalo") {
            StudyTopic::Knight
        } else if has("ponte") || has("bridge") {
            StudyTopic::Bridge
        } else if has("veredict") || has("veredito") {
            StudyTopic::Veredict
        } else if has("center") || has("centro") {
            StudyTopic::ClockCenter
        } else if has("oposicao") || has("opposition") {
            StudyTopic::ClockOpposition
        } else if has("house") || has("casa") {
            StudyTopic::ClockHouse
        } else if has("temporality") || has("temporalidade") {
            StudyTopic::ClockTemporality
        } else if has("absence") || has("ausente") {
            StudyTopic::ClockAbsence
        } else if has("second-draw") || has("segunda") {
            StudyTopic::ClockSecondDraw
        } else if has("clock") || has("relogio") {
            StudyTopic::ClockOverview
        } else if has("overview") || has("mesa") {
            StudyTopic::GridOverview
        } else {
            return None;
        };
        Some(topic)
    }

    /// Layout the topic is practised on.
    pub fn target(&self) -> Layout {
        match self {
            StudyTopic::GridOverview
            | StudyTopic::Frame
            | StudyTopic::Mirror
            | StudyTopic::Knight
            | StudyTopic::Bridge
            | StudyTopic::Diagonals
            | StudyTopic::DiagonalsUp
            | StudyTopic::DiagonalsDown
            | StudyTopic::Veredict => Layout::Grid,
            _ => Layout::Clock,
        }
    }

    /// Topics about fixed board regions rather than one selected slot.
    pub fn is_global(&self) -> bool {
        matches!(self, StudyTopic::Frame | StudyTopic::Veredict) || self.target() == Layout::Clock
    }

    /// Key matched against [`StudyBalloon::target`].
    pub fn balloon_key(&self) -> Option<&'static str> {
        match self {
            StudyTopic::Frame => Some("frame"),
            StudyTopic::Diagonals | StudyTopic::DiagonalsUp | StudyTopic::DiagonalsDown => Some("diagonal"),
            StudyTopic::Veredict => Some("veredict"),
            StudyTopic::ClockCenter => Some("center"),
            StudyTopic::ClockHouse => Some("house"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyBalloon {
    pub target: &'static str,
    pub title: &'static str,
    pub text: &'static str,
}

static GRID_BALLOONS: [StudyBalloon; 3] = [
    StudyBalloon {
        target: "frame",
        title: "Moldura",
        text: "Clima geral da vida do consulente. Casas 1, 8, 25 e 32.",
    },
    StudyBalloon {
        target: "diagonal",
        title: "Diagonal",
        text: "Mostra crescimento ou sustentação da situação através das influências ascendentes e descendentes.",
    },
    StudyBalloon {
        target: "veredict",
        title: "Veredito Final",
        text: "Destino inevitável e conselho. Casas 33 a 36 fornecem a síntese final.",
    },
];

static CLOCK_BALLOONS: [StudyBalloon; 2] = [
    StudyBalloon {
        target: "center",
        title: "Centro do Relógio",
        text: "Origem do ciclo anual e energia base da leitura que regula todo o período.",
    },
    StudyBalloon {
        target: "house",
        title: "Casa do Mês",
        text: "Cada posição representa um mês e um tema específico da jornada cíclica.",
    },
];

pub fn balloons(layout: Layout) -> &'static [StudyBalloon] {
    match layout {
        Layout::Grid => &GRID_BALLOONS,
        Layout::Clock => &CLOCK_BALLOONS,
    }
}

/// Balloon explaining `topic`, if it has one.
pub fn balloon_for(topic: StudyTopic) -> Option<&'static StudyBalloon> {
    let key = topic.balloon_key()?;
    balloons(topic.target()).iter().find(|b| b.target == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ids() {
        assert_eq!(StudyTopic::parse("gt-frame"), Some(StudyTopic::Frame));
        assert_eq!(StudyTopic::parse("gt-mirror"), Some(StudyTopic::Mirror));
        assert_eq!(StudyTopic::parse("gt-knight"), Some(StudyTopic::Knight));
        assert_eq!(StudyTopic::parse("gt-diagonals"), Some(StudyTopic::Diagonals));
        assert_eq!(StudyTopic::parse("diagonal-superior"), Some(StudyTopic::DiagonalsUp));
        assert_eq!(StudyTopic::parse("gt-veredict"), Some(StudyTopic::Veredict));
        assert_eq!(StudyTopic::parse("gt-overview"), Some(StudyTopic::GridOverview));
        assert_eq!(StudyTopic::parse("clock-overview"), Some(StudyTopic::ClockOverview));
        assert_eq!(StudyTopic::parse("clock-second-draw"), Some(StudyTopic::ClockSecondDraw));
        assert_eq!(StudyTopic::parse("clock-center"), Some(StudyTopic::ClockCenter));
        assert_eq!(StudyTopic::parse("nonsense"), None);
    }

    #[test]
    fn test_targets_and_globality() {
        assert_eq!(StudyTopic::Knight.target(), Layout::Grid);
        assert!(!StudyTopic::Knight.is_global());
        assert!(StudyTopic::Frame.is_global());
        assert!(StudyTopic::ClockOpposition.is_global());
    }

    #[test]
    fn test_balloon_lookup() {
        assert_eq!(balloon_for(StudyTopic::Frame).map(|b| b.title), Some("Moldura"));
        assert_eq!(balloon_for(StudyTopic::ClockCenter).map(|b| b.target), Some("center"));
        assert!(balloon_for(StudyTopic::Knight).is_none());
    }
}

//! Clock (Relógio) geometry: twelve month slots 0..12 in a circle, with the
//! regulating center at slot 12 outside the circle.

use serde::Serialize;

use crate::board::Slot;

pub const MONTHS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    Horizontal,
    Vertical,
    Oblique,
}

impl AxisKind {
    pub fn label(&self) -> &'static str {
        match self {
            AxisKind::Horizontal => "Horizontal",
            AxisKind::Vertical => "Vertical",
            AxisKind::Oblique => "Oblíquo",
        }
    }
}

/// Descriptor for one of the six opposition axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockAxis {
    /// Month houses joined by the axis, 1-based.
    pub houses: (u8, u8),
    pub name: &'static str,
    pub kind: AxisKind,
    pub description: &'static str,
    pub tension: &'static str,
}

static AXES: [ClockAxis; 6] = [
    ClockAxis {
        houses: (1, 7),
        name: "Eixo da Identidade (1-7)",
        kind: AxisKind::Horizontal,
        description: "Analisa a projeção do Eu sobre o Outro. É o eixo do encontro e do confronto pessoal.",
        tension: "O desafio aqui é não se anular nas parcerias (Casa 7) nem se isolar no ego (Casa 1).",
    },
    ClockAxis {
        houses: (2, 8),
        name: "Eixo dos Recursos (2-8)",
        kind: AxisKind::Oblique,
        description: "Mede a tensão entre o que eu possuo e o que eu transformo ou compartilho com o coletivo.",
        tension: "Equilibre a segurança material com a necessidade de morte simbólica e renascimento.",
    },
    ClockAxis {
        houses: (3, 9),
        name: "Eixo do Conhecimento (3-9)",
        kind: AxisKind::Oblique,
        description: "Equilibra a mente concreta/cotidiana com as grandes filosofias e visões de longo alcance.",
        tension: "Evite o excesso de detalhes práticos que impedem a visão do horizonte expandido.",
    },
    ClockAxis {
        houses: (4, 10),
        name: "Eixo da Segurança (4-10)",
        kind: AxisKind::Vertical,
        description: "O pilar entre a vida privada (raízes) e a vida pública (carreira/reputação).",
        tension: "Sem uma base emocional sólida (Casa 4), o sucesso público (Casa 10) torna-se frágil.",
    },
    ClockAxis {
        houses: (5, 11),
        name: "Eixo da Criação (5-11)",
        kind: AxisKind::Oblique,
        description: "Trata da relação entre a alegria individual e os projetos para o bem comum.",
        tension: "Transforme seu prazer pessoal em algo que sirva à rede e ao futuro da comunidade.",
    },
    ClockAxis {
        houses: (6, 12),
        name: "Eixo do Serviço (6-12)",
        kind: AxisKind::Oblique,
        description: "Investiga o equilíbrio entre as obrigações da rotina física e a dissolução no espiritual.",
        tension: "Não se perca no dever diário a ponto de esquecer a transcendência e o descanso da alma.",
    },
];

/// Fallback description when no axis applies.
pub const NO_AXIS_DESCRIPTION: &str = "Eixo de modulação temporal.";

/// The diametrically opposite month.
pub fn opposition(index: Slot) -> Option<Slot> {
    (index < MONTHS).then_some((index + MONTHS / 2) % MONTHS)
}

/// Axis through a month slot, keyed by `index % 6`.
pub fn axis(index: Slot) -> Option<&'static ClockAxis> {
    if index >= MONTHS {
        return None;
    }
    AXES.get(index % AXES.len())
}

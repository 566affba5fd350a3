use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryFilter {
    /// Sentinel: nothing highlighted.
    None,
    /// Sentinel: every relation highlighted.
    All,
    Bridge,
    Knight,
    Mirror,
    Frame,
    Veredict,
    Diagonals,
}

impl GeometryFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "nenhuma" => Some(GeometryFilter::None),
            "all" | "todas" => Some(GeometryFilter::All),
            "bridge" | "ponte" => Some(GeometryFilter::Bridge),
            "knight" | "cavalo" => Some(GeometryFilter::Knight),
            "mirror" | "espelho" => Some(GeometryFilter::Mirror),
            "frame" | "moldura" => Some(GeometryFilter::Frame),
            "veredict" | "veredito" => Some(GeometryFilter::Veredict),
            "diagonals" | "diagonais" => Some(GeometryFilter::Diagonals),
            _ => None,
        }
    }

    fn is_sentinel(&self) -> bool {
        matches!(self, GeometryFilter::None | GeometryFilter::All)
    }
}

/// Relation categories the user wants highlighted at once.
///
/// Never empty: it holds either one sentinel alone or a non-empty set of
/// concrete filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSet(BTreeSet<GeometryFilter>);

impl Default for FilterSet {
    fn default() -> Self {
        Self(BTreeSet::from([GeometryFilter::None]))
    }
}

impl FilterSet {
    pub fn all() -> Self {
        Self(BTreeSet::from([GeometryFilter::All]))
    }

    pub fn toggle(&mut self, filter: GeometryFilter) {
        if filter.is_sentinel() {
            self.0.clear();
            self.0.insert(filter);
            return;
        }
        self.0.retain(|f| !f.is_sentinel());
        if !self.0.remove(&filter) {
            self.0.insert(filter);
        }
        if self.0.is_empty() {
            self.0.insert(GeometryFilter::None);
        }
    }

    pub fn is_none(&self) -> bool {
        self.0.contains(&GeometryFilter::None)
    }

    pub fn is_all(&self) -> bool {
        self.0.contains(&GeometryFilter::All)
    }

    /// Whether `filter` is shown, counting the `All` sentinel.
    pub fn shows(&self, filter: GeometryFilter) -> bool {
        !self.is_none() && (self.is_all() || self.0.contains(&filter))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeometryFilter> {
        self.0.iter()
    }
}

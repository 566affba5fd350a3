//! Print the geometry table: one JSON line per slot of the chosen layout.
//!
//! Usage: relations [grid|clock]

use anyhow::{anyhow, Result};
use serde_json::json;

use lumina::board::Layout;
use lumina::catalog::{catalog, CLOCK_CENTER_SLOT};
use lumina::geometry::{self, grid};

fn main() -> Result<()> {
    let layout = match std::env::args().nth(1) {
        Some(arg) => Layout::parse(&arg).ok_or_else(|| anyhow!("unknown layout {}", arg))?,
        None => Layout::Grid,
    };

    for slot in 0..layout.active_slots() {
        let house = catalog().house_for(layout, slot).map(|h| h.name.as_str());
        let row = match layout {
            Layout::Grid => json!({
                "slot": slot,
                "house": house,
                "frame": grid::frame().contains(&slot),
                "veredict": grid::is_veredict(slot),
                "horizontal_mirror": grid::horizontal_mirror(slot),
                "mirrors": grid::mirrors(slot),
                "knight": grid::knight_moves(slot),
                "diagonals_up": grid::diagonals_above(slot),
                "diagonals_down": grid::diagonals_below(slot),
                "bridge_owner": slot + 1,
            }),
            Layout::Clock => json!({
                "slot": slot,
                "house": house,
                "center": slot == CLOCK_CENTER_SLOT,
                "opposition": geometry::opposition(slot),
                "axis": geometry::axis(slot).map(|a| a.name),
            }),
        };
        println!("{}", row);
    }
    Ok(())
}

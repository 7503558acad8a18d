use serde::{Deserialize, Serialize};

use crate::color::{Color, Palette};
use crate::config::LegendConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub path: String,
    pub label: String,
    pub color: Color,
    /// Top-left of the swatch, relative to the legend origin.
    pub x: f64,
    pub y: f64,
}

/// Display label of a category: everything after the first `.` of its path.
pub fn label_for(path: &str) -> &str {
    path.split_once('.').map_or(path, |(_, rest)| rest)
}

/// Lay the palette out row-major on a fixed-width grid.
pub fn legend(palette: &Palette, config: &LegendConfig) -> Vec<LegendEntry> {
    let columns = config.columns.max(1);
    palette
        .entries()
        .iter()
        .enumerate()
        .map(|(i, (path, color))| LegendEntry {
            path: path.clone(),
            label: label_for(path).to_string(),
            color: *color,
            x: (i % columns) as f64 * config.cell_width,
            y: (i / columns) as f64 * config.cell_height,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_drops_root_segment() {
        assert_eq!(label_for("Movies.Action"), "Action");
        assert_eq!(label_for("Kickstarter.Product Design"), "Product Design");
        assert_eq!(label_for("Games.3DS.Extra"), "3DS.Extra");
        assert_eq!(label_for("Root"), "Root");
    }

    #[test]
    fn grid_wraps_after_four_columns() {
        let cats: Vec<String> = (0..6).map(|i| format!("Games.P{i}")).collect();
        let palette = Palette::from_categories(&cats);
        let entries = legend(&palette, &LegendConfig::default());
        assert_eq!(entries.len(), 6);
        let pos: Vec<(f64, f64)> = entries.iter().map(|e| (e.x, e.y)).collect();
        assert_eq!(
            pos,
            [
                (0.0, 0.0),
                (95.0, 0.0),
                (190.0, 0.0),
                (285.0, 0.0),
                (0.0, 25.0),
                (95.0, 25.0)
            ]
        );
        assert_eq!(entries[4].label, "P4");
        assert_eq!(Some(entries[4].color), palette.get("Games.P4"));
    }
}

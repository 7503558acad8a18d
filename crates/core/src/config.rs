use serde::{Deserialize, Serialize};

use crate::error::{Result, TreemapError};
use crate::treemap::{LayoutOptions, Rect, TilingMode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 110.0,
            right: 10.0,
            bottom: 150.0,
            left: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub swatch: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            cell_width: 95.0,
            cell_height: 25.0,
            swatch: 15.0,
        }
    }
}

/// Canvas geometry and layout settings for one rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub legend: LegendConfig,
    pub layout: LayoutOptions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            margin: Margin::default(),
            legend: LegendConfig::default(),
            layout: LayoutOptions {
                tiling: TilingMode::Resquarify,
                round: true,
                padding_inner: 1.0,
                ..LayoutOptions::default()
            },
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| TreemapError::InvalidOptions(e.to_string()))
    }

    /// The rectangle tiles are laid out in, in treemap-local coordinates.
    pub fn treemap_area(&self) -> Rect {
        Rect::from_size(
            self.width - self.margin.left - self.margin.right,
            self.height - self.margin.top - self.margin.bottom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_area_is_780_by_540() {
        assert_eq!(RenderConfig::default().treemap_area(), Rect::from_size(780.0, 540.0));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RenderConfig::from_json_str(
            r#"{"width": 1000, "layout": {"tiling": "slice_dice", "padding_inner": 0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.width, 1000.0);
        assert_eq!(cfg.height, 800.0);
        assert_eq!(cfg.layout.tiling, TilingMode::SliceDice);
        assert_eq!(cfg.layout.padding_inner, 0.0);
        // Nested defaults come from LayoutOptions, not from the viewer preset.
        assert!(!cfg.layout.round);
        assert_eq!(cfg.legend.columns, 4);
    }

    #[test]
    fn malformed_json_is_an_options_error() {
        assert!(matches!(
            RenderConfig::from_json_str("{\"width\": \"wide\"}"),
            Err(TreemapError::InvalidOptions(_))
        ));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// Cubehelix basis (Green 2011).
const A: f64 = -0.14861;
const B: f64 = 1.78277;
const C: f64 = -0.29227;
const D: f64 = -0.90649;
const E: f64 = 1.97294;

fn cubehelix(hue_deg: f64, saturation: f64, lightness: f64) -> Color {
    let h = (hue_deg + 120.0).to_radians();
    let l = lightness;
    let a = saturation * l * (1.0 - l);
    let (sin_h, cos_h) = h.sin_cos();
    let channel = |v: f64| (255.0 * v).round().clamp(0.0, 255.0) as u8;
    Color::rgb(
        channel(l + a * (A * cos_h + B * sin_h)),
        channel(l + a * (C * cos_h + D * sin_h)),
        channel(l + a * (E * cos_h)),
    )
}

/// The "warm" scale: a long cubehelix arc from purple through orange to
/// yellow-green. `t` is clamped to `[0, 1]`.
pub fn interpolate_warm(t: f64) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    cubehelix(-100.0 + 180.0 * t, 0.75 + 0.75 * t, 0.35 + 0.45 * t)
}

/// Color of the `index`-th of `count` categories, sampled at `index / count`
/// rounded to two decimals. `None` when the index is out of range.
pub fn color_at(index: usize, count: usize) -> Option<Color> {
    if index >= count {
        return None;
    }
    let t = (index as f64 / count as f64 * 100.0).round() / 100.0;
    Some(interpolate_warm(t))
}

pub fn color_for(category: &str, categories: &[String]) -> Option<Color> {
    let index = categories.iter().position(|c| c == category)?;
    color_at(index, categories.len())
}

/// Ordered category → color table for one tree. Order is the sorted order
/// of the root's children, which is also the legend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<(String, Color)>,
}

impl Palette {
    pub fn from_categories(categories: &[String]) -> Self {
        let count = categories.len();
        let entries = categories
            .iter()
            .enumerate()
            .filter_map(|(i, c)| color_at(i, count).map(|color| (c.clone(), color)))
            .collect();
        Self { entries }
    }

    pub fn from_tree(tree: &Tree) -> Self {
        let categories: Vec<String> = tree
            .top_level()
            .iter()
            .map(|id| tree.get(*id).path.clone())
            .collect();
        Self::from_categories(&categories)
    }

    pub fn entries(&self) -> &[(String, Color)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<Color> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, color)| *color)
    }

    /// Color of a node's top-level ancestor.
    pub fn node_color(&self, tree: &Tree, id: NodeId) -> Option<Color> {
        let top = tree.top_ancestor(id);
        self.get(&tree.get(top).path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build;
    use crate::model::RawNode;

    #[test]
    fn warm_endpoints() {
        assert_eq!(interpolate_warm(0.0).to_string(), "#6e40aa");
        assert_eq!(interpolate_warm(1.0).to_string(), "#aff05b");
        assert_eq!(interpolate_warm(-3.0), interpolate_warm(0.0));
    }

    #[test]
    fn color_depends_only_on_index_and_count() {
        let cats: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(color_for("a", &cats), Some(interpolate_warm(0.0)));
        assert_eq!(color_for("c", &cats), Some(interpolate_warm(0.5)));
        assert_eq!(color_for("c", &cats), color_at(2, 4));
        assert_eq!(color_for("zzz", &cats), None);
        assert_eq!(color_at(4, 4), None);
        assert_ne!(color_at(0, 4), color_at(1, 4));
    }

    #[test]
    fn leaves_share_their_category_color() {
        let raw = RawNode::group(
            "Games",
            vec![
                RawNode::group(
                    "Wii",
                    vec![
                        RawNode::leaf("Wii Sports", "Wii", 82.0),
                        RawNode::leaf("Mario Kart", "Wii", 35.0),
                    ],
                ),
                RawNode::group("DS", vec![RawNode::leaf("Pokemon", "DS", 20.0)]),
            ],
        );
        let tree = build(&raw).unwrap();
        let palette = Palette::from_tree(&tree);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.entries()[0].0, "Games.Wii");

        let a = tree.find("Games.Wii.Wii Sports").unwrap().id;
        let b = tree.find("Games.Wii.Mario Kart").unwrap().id;
        let c = tree.find("Games.DS.Pokemon").unwrap().id;
        assert_eq!(palette.node_color(&tree, a), palette.node_color(&tree, b));
        assert_ne!(palette.node_color(&tree, a), palette.node_color(&tree, c));
        assert_eq!(palette.node_color(&tree, a), Some(interpolate_warm(0.0)));
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::treemap::Rect;

/// Direction a strip runs in. A horizontal strip spans the full width of the
/// remaining rectangle and its members sit side by side; a vertical strip
/// spans the full height with its members stacked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub orientation: Orientation,
    /// Paths of the children in this strip, in placement order.
    pub members: Vec<String>,
}

/// Read-only snapshot of a finished layout, keyed by node path.
///
/// Holds the strips chosen for every squarified parent and the final
/// rectangle of every node. Passing it to the next layout lets
/// [`TilingMode::Resquarify`](crate::treemap::TilingMode::Resquarify) keep
/// shared categories where they were.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LayoutMemory {
    ratio: f64,
    rows: BTreeMap<String, Vec<Row>>,
    rects: BTreeMap<String, Rect>,
}

impl LayoutMemory {
    pub(crate) fn new(ratio: f64) -> Self {
        Self {
            ratio,
            ..Self::default()
        }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn rows(&self, path: &str) -> Option<&[Row]> {
        self.rows.get(path).map(Vec::as_slice)
    }

    pub fn rect(&self, path: &str) -> Option<Rect> {
        self.rects.get(path).copied()
    }

    /// Number of nodes with a recorded rectangle.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub(crate) fn record_rows(&mut self, path: &str, rows: Vec<Row>) {
        self.rows.insert(path.to_string(), rows);
    }

    pub(crate) fn record_rect(&mut self, path: &str, rect: Rect) {
        self.rects.insert(path.to_string(), rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build;
    use crate::model::RawNode;
    use crate::treemap::{layout, LayoutOptions, TilingMode};

    #[test]
    fn records_every_node_and_parent() {
        let raw = RawNode::group(
            "Movies",
            vec![
                RawNode::group(
                    "Action",
                    vec![
                        RawNode::leaf("Avatar", "Action", 7.0),
                        RawNode::leaf("Inception", "Action", 3.0),
                    ],
                ),
                RawNode::group("Drama", vec![RawNode::leaf("Titanic", "Drama", 5.0)]),
            ],
        );
        let mut tree = build(&raw).unwrap();
        let memory = layout(
            &mut tree,
            Rect::from_size(60.0, 40.0),
            &LayoutOptions::default(),
            None,
        )
        .unwrap();

        assert_eq!(memory.len(), tree.len());
        assert_eq!(
            memory.rect("Movies.Action.Inception"),
            Some(tree.find("Movies.Action.Inception").unwrap().rect)
        );
        let rows = memory.rows("Movies.Action").unwrap();
        let members: usize = rows.iter().map(|r| r.members.len()).sum();
        assert_eq!(members, 2);
        assert!(memory.rows("Movies.Action.Avatar").is_none());
    }

    #[test]
    fn slice_layouts_record_no_rows() {
        let raw = RawNode::group(
            "R",
            vec![RawNode::leaf("a", "x", 1.0), RawNode::leaf("b", "x", 2.0)],
        );
        let mut tree = build(&raw).unwrap();
        let opts = LayoutOptions {
            tiling: TilingMode::Slice,
            ..LayoutOptions::default()
        };
        let memory = layout(&mut tree, Rect::from_size(10.0, 10.0), &opts, None).unwrap();
        assert!(memory.rows("R").is_none());
        assert_eq!(memory.rect("R"), Some(Rect::from_size(10.0, 10.0)));
    }

    #[test]
    fn survives_a_json_round_trip() {
        let raw = RawNode::group(
            "R",
            vec![RawNode::leaf("a", "x", 1.0), RawNode::leaf("b", "x", 2.0)],
        );
        let mut tree = build(&raw).unwrap();
        let memory = layout(
            &mut tree,
            Rect::from_size(10.0, 10.0),
            &LayoutOptions::default(),
            None,
        )
        .unwrap();
        let text = serde_json::to_string(&memory).unwrap();
        let back: LayoutMemory = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rows("R"), memory.rows("R"));
        assert_eq!(back.rect("R.a"), memory.rect("R.a"));
    }
}

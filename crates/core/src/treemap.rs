use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreemapError};
use crate::model::{NodeId, Tree};
use crate::stability::{LayoutMemory, Orientation, Row};

/// Previous strip orientation is kept as long as the remaining rectangle's
/// long side is at most this many times its short side.
pub const STRIP_BIAS_TOLERANCE: f64 = 1.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// True when `other` lies inside `self`, allowing `eps` of slack.
    pub fn contains(&self, other: &Rect, eps: f64) -> bool {
        other.x0 >= self.x0 - eps
            && other.y0 >= self.y0 - eps
            && other.x1 <= self.x1 + eps
            && other.y1 <= self.y1 + eps
    }

    /// Shrink each side independently; an inverted axis collapses to its midline.
    fn shrink(self, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        let (mut x0, mut y0) = (self.x0 + left, self.y0 + top);
        let (mut x1, mut y1) = (self.x1 - right, self.y1 - bottom);
        if x1 < x0 {
            x0 = (x0 + x1) / 2.0;
            x1 = x0;
        }
        if y1 < y0 {
            y0 = (y0 + y1) / 2.0;
            y1 = y0;
        }
        Rect::new(x0, y0, x1, y1)
    }

    /// Pull every edge inside `bounds`.
    fn clamp_to(self, bounds: &Rect) -> Rect {
        let x = |v: f64| v.max(bounds.x0).min(bounds.x1);
        let y = |v: f64| v.max(bounds.y0).min(bounds.y1);
        Rect::new(x(self.x0), y(self.y0), x(self.x1), y(self.y1))
    }

    fn round(self) -> Rect {
        Rect::new(
            self.x0.round(),
            self.y0.round(),
            self.x1.round(),
            self.y1.round(),
        )
    }

    fn is_wide(&self) -> bool {
        self.width() >= self.height()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingMode {
    #[default]
    Squarify,
    Resquarify,
    /// Children stacked top to bottom.
    Slice,
    /// Children side by side, left to right.
    Dice,
    /// Slice at odd depths, dice at even depths.
    SliceDice,
}

impl FromStr for TilingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "squarify" => Ok(TilingMode::Squarify),
            "resquarify" => Ok(TilingMode::Resquarify),
            "slice" => Ok(TilingMode::Slice),
            "dice" => Ok(TilingMode::Dice),
            "slice_dice" | "slicedice" => Ok(TilingMode::SliceDice),
            other => Err(format!("unknown tiling mode `{other}`")),
        }
    }
}

impl fmt::Display for TilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TilingMode::Squarify => "squarify",
            TilingMode::Resquarify => "resquarify",
            TilingMode::Slice => "slice",
            TilingMode::Dice => "dice",
            TilingMode::SliceDice => "slice-dice",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub tiling: TilingMode,
    /// Snap every coordinate to whole units after layout.
    pub round: bool,
    /// Gap between adjacent siblings.
    pub padding_inner: f64,
    /// Inset between a parent's edge and its children.
    pub padding_outer: f64,
    /// Overrides `padding_outer` on the top edge when positive.
    pub padding_top: f64,
    /// Target aspect ratio for squarified rows; values below 1 act as 1.
    pub ratio: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            tiling: TilingMode::Squarify,
            round: false,
            padding_inner: 0.0,
            padding_outer: 0.0,
            padding_top: 0.0,
            ratio: 1.0,
        }
    }
}

impl LayoutOptions {
    fn validate(&self) -> Result<()> {
        let pads = [
            ("padding_inner", self.padding_inner),
            ("padding_outer", self.padding_outer),
            ("padding_top", self.padding_top),
        ];
        for (name, v) in pads {
            if !v.is_finite() || v < 0.0 {
                return Err(TreemapError::InvalidOptions(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if !self.ratio.is_finite() {
            return Err(TreemapError::InvalidOptions(format!(
                "ratio must be finite, got {}",
                self.ratio
            )));
        }
        Ok(())
    }

    fn effective_ratio(&self) -> f64 {
        self.ratio.max(1.0)
    }
}

/// Assign a rectangle to every node of `tree` inside `area`.
///
/// `previous` is the memory returned by an earlier call; it only matters for
/// [`TilingMode::Resquarify`], which keeps surviving children in the strips
/// recorded there for parents with the same path, or leans towards their
/// orientation when none survive. The returned memory describes this layout
/// and can seed the next one.
pub fn layout(
    tree: &mut Tree,
    area: Rect,
    options: &LayoutOptions,
    previous: Option<&LayoutMemory>,
) -> Result<LayoutMemory> {
    options.validate()?;
    if !area.is_finite() || area.width() <= 0.0 || area.height() <= 0.0 {
        return Err(TreemapError::degenerate(format!(
            "target area {}x{} has no extent",
            area.width(),
            area.height()
        )));
    }
    if tree.is_empty() {
        return Err(TreemapError::invalid("", "tree is empty"));
    }
    let total = tree.root_node().sum;
    if !(total > 0.0) {
        return Err(TreemapError::degenerate(format!(
            "total value of '{}' is zero",
            tree.root_node().path
        )));
    }

    let mut engine = Engine {
        options,
        previous: match options.tiling {
            TilingMode::Resquarify => previous,
            _ => None,
        },
        memory: LayoutMemory::new(options.effective_ratio()),
    };
    let root = tree.root;
    engine.position(tree, root, area, 0.0, area);

    if options.round {
        for node in &mut tree.nodes {
            node.rect = node.rect.round();
        }
    }
    for node in &tree.nodes {
        engine.memory.record_rect(&node.path, node.rect);
    }

    tracing::info!(
        "laid out '{}' ({} nodes, {}) in {:.0}x{:.0}",
        tree.root_node().name,
        tree.len(),
        options.tiling,
        area.width(),
        area.height()
    );
    Ok(engine.memory)
}

/// One strip of siblings sharing a band of the parent rectangle.
struct Strip {
    members: Vec<NodeId>,
    value: f64,
    orientation: Orientation,
}

struct Engine<'a> {
    options: &'a LayoutOptions,
    previous: Option<&'a LayoutMemory>,
    memory: LayoutMemory,
}

impl Engine<'_> {
    fn position(&mut self, tree: &mut Tree, id: NodeId, rect: Rect, pad: f64, bounds: Rect) {
        // Slivers thinner than the padding collapse onto their midline, which
        // may sit in the gutter; keep them inside the parent.
        let rect = rect.shrink(pad, pad, pad, pad).clamp_to(&bounds);
        tree.get_mut(id).rect = rect;
        if tree.get(id).is_leaf() {
            return;
        }

        let o = self.options;
        let p = o.padding_inner / 2.0;
        let top = if o.padding_top > 0.0 {
            o.padding_top
        } else {
            o.padding_outer
        };
        let content = rect.shrink(
            o.padding_outer - p,
            top - p,
            o.padding_outer - p,
            o.padding_outer - p,
        );

        for (child, r) in self.tile(tree, id, content) {
            self.position(tree, child, r, p, rect);
        }
    }

    fn tile(&mut self, tree: &Tree, parent: NodeId, rect: Rect) -> Vec<(NodeId, Rect)> {
        let node = tree.get(parent);
        let mut out = Vec::with_capacity(node.children.len());
        if !(node.sum > 0.0) {
            let origin = Rect::new(rect.x0, rect.y0, rect.x0, rect.y0);
            out.extend(node.children.iter().map(|c| (*c, origin)));
            return out;
        }

        match self.options.tiling {
            TilingMode::Slice => slice(tree, &node.children, node.sum, rect, &mut out),
            TilingMode::Dice => dice(tree, &node.children, node.sum, rect, &mut out),
            TilingMode::SliceDice if node.depth % 2 == 1 => {
                slice(tree, &node.children, node.sum, rect, &mut out)
            }
            TilingMode::SliceDice => dice(tree, &node.children, node.sum, rect, &mut out),
            TilingMode::Squarify | TilingMode::Resquarify => {
                let strips = match self.seeded_rows(tree, parent, rect) {
                    Some(strips) => {
                        tracing::debug!("seeded {} strips for '{}'", strips.len(), node.path);
                        strips
                    }
                    None => {
                        let bias = self.bias_rows(tree, parent, rect);
                        let ratio = self.options.effective_ratio();
                        squarify_strips(tree, &node.children, rect, ratio, bias)
                    }
                };
                place_strips(tree, &strips, node.sum, rect, &mut out);
                let rows = strips
                    .iter()
                    .map(|s| Row {
                        orientation: s.orientation,
                        members: s.members.iter().map(|m| tree.get(*m).path.clone()).collect(),
                    })
                    .collect();
                self.memory.record_rows(&node.path, rows);
            }
        }
        out
    }

    /// Strips seeded from the rows recorded for this parent. Surviving
    /// children keep their previous row, order and orientation; children
    /// the parent did not have before are squarified into the space left
    /// after them. `None` when no recorded child survives.
    fn seeded_rows(&self, tree: &Tree, parent: NodeId, rect: Rect) -> Option<Vec<Strip>> {
        let previous = self.previous?;
        let node = tree.get(parent);
        if previous.ratio() != self.options.effective_ratio() {
            return None;
        }
        if !same_shape(previous.rect(&node.path), rect) {
            return None;
        }
        let rows = previous.rows(&node.path)?;
        let by_path: HashMap<&str, NodeId> = node
            .children
            .iter()
            .map(|c| (tree.get(*c).path.as_str(), *c))
            .collect();

        let mut placed = HashSet::with_capacity(node.children.len());
        let mut strips = Vec::with_capacity(rows.len() + 1);
        for row in rows {
            let members: Vec<NodeId> = row
                .members
                .iter()
                .filter_map(|path| by_path.get(path.as_str()).copied())
                .filter(|child| placed.insert(*child))
                .collect();
            if members.is_empty() {
                continue;
            }
            let value = members.iter().map(|c| tree.get(*c).sum).sum();
            strips.push(Strip {
                members,
                value,
                orientation: row.orientation,
            });
        }
        if strips.is_empty() {
            return None;
        }

        let added: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|c| !placed.contains(c))
            .collect();
        if !added.is_empty() {
            let mut remaining = rect;
            let mut value_left = node.sum;
            for strip in &strips {
                remaining = advance(remaining, strip.orientation, strip.value, value_left, false).1;
                value_left -= strip.value;
            }
            let ratio = self.options.effective_ratio();
            strips.extend(squarify_strips(tree, &added, remaining, ratio, None));
        }
        Some(strips)
    }

    fn bias_rows(&self, tree: &Tree, parent: NodeId, rect: Rect) -> Option<&[Row]> {
        let previous = self.previous?;
        let path = &tree.get(parent).path;
        if !same_shape(previous.rect(path), rect) {
            return None;
        }
        previous.rows(path)
    }
}

fn same_shape(previous: Option<Rect>, current: Rect) -> bool {
    previous.map_or(true, |r| r.is_wide() == current.is_wide())
}

/// Worst aspect ratio of a strip of length `side` holding areas with the
/// given min, max and sum.
fn worst_ratio(min: f64, max: f64, sum: f64, side: f64, ratio: f64) -> f64 {
    if sum <= 0.0 || side <= 0.0 || min <= 0.0 {
        return f64::INFINITY;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let a = ratio * side_sq * max / sum_sq;
    let b = sum_sq / (ratio * side_sq * min);
    a.max(b)
}

fn natural_orientation(rect: &Rect) -> Orientation {
    if rect.width() < rect.height() {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

fn strip_orientation(rect: &Rect, bias: Option<&[Row]>, index: usize) -> Orientation {
    let natural = natural_orientation(rect);
    let Some(prev) = bias.and_then(|rows| rows.get(index)) else {
        return natural;
    };
    let (w, h) = (rect.width(), rect.height());
    let (long, short) = (w.max(h), w.min(h));
    if short > 0.0 && long / short <= STRIP_BIAS_TOLERANCE {
        prev.orientation
    } else {
        natural
    }
}

/// Greedy row growth: a child joins the current strip unless it makes the
/// strip's worst aspect ratio worse. Zero-valued children always join.
fn squarify_strips(
    tree: &Tree,
    children: &[NodeId],
    rect: Rect,
    ratio: f64,
    bias: Option<&[Row]>,
) -> Vec<Strip> {
    let mut strips = Vec::new();
    let mut remaining = rect;
    let mut value_left: f64 = children.iter().map(|c| tree.get(*c).sum).sum();
    let mut i0 = 0usize;

    while i0 < children.len() {
        let orientation = strip_orientation(&remaining, bias, strips.len());
        let side = match orientation {
            Orientation::Horizontal => remaining.width(),
            Orientation::Vertical => remaining.height(),
        };
        let scale = if value_left > 0.0 {
            remaining.area() / value_left
        } else {
            0.0
        };

        let mut i1 = i0;
        let mut row_sum = 0.0;
        let mut row_min = f64::INFINITY;
        let mut row_max = 0.0_f64;
        let mut current = f64::INFINITY;
        while i1 < children.len() {
            let area = tree.get(children[i1]).sum * scale;
            if area <= 0.0 {
                i1 += 1;
                continue;
            }
            let next = worst_ratio(
                row_min.min(area),
                row_max.max(area),
                row_sum + area,
                side,
                ratio,
            );
            if row_sum > 0.0 && next > current {
                break;
            }
            row_sum += area;
            row_min = row_min.min(area);
            row_max = row_max.max(area);
            current = next;
            i1 += 1;
        }

        let members = children[i0..i1].to_vec();
        let value: f64 = members.iter().map(|c| tree.get(*c).sum).sum();
        let last = i1 == children.len();
        remaining = advance(remaining, orientation, value, value_left, last).1;
        value_left -= value;
        strips.push(Strip {
            members,
            value,
            orientation,
        });
        i0 = i1;
    }
    strips
}

/// Split `rect` into the band for a strip of `value` and what is left.
fn advance(
    rect: Rect,
    orientation: Orientation,
    value: f64,
    value_left: f64,
    last: bool,
) -> (Rect, Rect) {
    let frac = if last || value_left <= 0.0 {
        1.0
    } else {
        (value / value_left).min(1.0)
    };
    match orientation {
        Orientation::Horizontal => {
            let y = if last { rect.y1 } else { rect.y0 + rect.height() * frac };
            (
                Rect::new(rect.x0, rect.y0, rect.x1, y),
                Rect::new(rect.x0, y, rect.x1, rect.y1),
            )
        }
        Orientation::Vertical => {
            let x = if last { rect.x1 } else { rect.x0 + rect.width() * frac };
            (
                Rect::new(rect.x0, rect.y0, x, rect.y1),
                Rect::new(x, rect.y0, rect.x1, rect.y1),
            )
        }
    }
}

fn place_strips(
    tree: &Tree,
    strips: &[Strip],
    total: f64,
    rect: Rect,
    out: &mut Vec<(NodeId, Rect)>,
) {
    let mut remaining = rect;
    let mut value_left = total;
    for (i, strip) in strips.iter().enumerate() {
        let last = i + 1 == strips.len();
        let (band, rest) = advance(remaining, strip.orientation, strip.value, value_left, last);
        match strip.orientation {
            Orientation::Horizontal => dice(tree, &strip.members, strip.value, band, out),
            Orientation::Vertical => slice(tree, &strip.members, strip.value, band, out),
        }
        remaining = rest;
        value_left -= strip.value;
    }
}

/// Lay `children` side by side along x, widths proportional to their sums.
fn dice(tree: &Tree, children: &[NodeId], total: f64, rect: Rect, out: &mut Vec<(NodeId, Rect)>) {
    let k = if total > 0.0 { rect.width() / total } else { 0.0 };
    let mut x = rect.x0;
    for (i, child) in children.iter().enumerate() {
        let x1 = if k > 0.0 && i + 1 == children.len() {
            rect.x1
        } else {
            x + tree.get(*child).sum * k
        };
        out.push((*child, Rect::new(x, rect.y0, x1, rect.y1)));
        x = x1;
    }
}

/// Stack `children` along y, heights proportional to their sums.
fn slice(tree: &Tree, children: &[NodeId], total: f64, rect: Rect, out: &mut Vec<(NodeId, Rect)>) {
    let k = if total > 0.0 { rect.height() / total } else { 0.0 };
    let mut y = rect.y0;
    for (i, child) in children.iter().enumerate() {
        let y1 = if k > 0.0 && i + 1 == children.len() {
            rect.y1
        } else {
            y + tree.get(*child).sum * k
        };
        out.push((*child, Rect::new(rect.x0, y, rect.x1, y1)));
        y = y1;
    }
}

use serde::{Deserialize, Serialize};

use crate::treemap::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl Default for NodeId {
    fn default() -> Self {
        NodeId(0)
    }
}

/// A leaf value as it appears in the source documents. Some published
/// datasets quote their numbers, so both forms are accepted here and
/// validated when the hierarchy is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

/// One node of the input document: `{ name, category?, value?, children? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,
}

impl RawNode {
    pub fn group(name: impl Into<String>, children: Vec<RawNode>) -> Self {
        Self {
            name: name.into(),
            category: None,
            value: None,
            children: Some(children),
        }
    }

    pub fn leaf(name: impl Into<String>, category: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
            value: Some(RawValue::Number(value)),
            children: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Dotted path of ancestor names, unique within the tree.
    pub path: String,
    pub name: String,
    pub category: Option<String>,
    /// Own value; only set on leaves.
    pub value: Option<f64>,
    /// Aggregate of all descendant leaf values.
    pub sum: f64,
    pub depth: u32,
    pub height: u32,
    pub children: Vec<NodeId>,
    pub rect: Rect,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tree {
    pub root: NodeId,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn root_node(&self) -> &TreeNode {
        self.get(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Children of the root, in sorted order. These are the legend categories.
    pub fn top_level(&self) -> &[NodeId] {
        match self.nodes.get(self.root.0 as usize) {
            Some(root) => &root.children,
            None => &[],
        }
    }

    /// Depth-first walk in sorted child order, parents before children.
    pub fn descendants(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        let mut stack = Vec::with_capacity(32);
        if !self.nodes.is_empty() {
            stack.push(self.root);
        }
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = self.get(id);
            stack.extend(node.children.iter().rev().copied());
            Some(node)
        })
    }

    /// Nodes without children, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.descendants().filter(|n| n.is_leaf())
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        let mut cur = self.get(id).parent;
        std::iter::from_fn(move || {
            let node = self.get(cur?);
            cur = node.parent;
            Some(node)
        })
    }

    /// The depth-1 node above `id` (or `id` itself at depth 0 or 1).
    pub fn top_ancestor(&self, id: NodeId) -> NodeId {
        let node = self.get(id);
        if node.depth <= 1 {
            return id;
        }
        self.ancestors(id)
            .find(|n| n.depth == 1)
            .map(|n| n.id)
            .unwrap_or(id)
    }
}

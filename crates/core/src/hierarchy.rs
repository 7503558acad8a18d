use std::collections::HashSet;

use crate::error::{Result, TreemapError};
use crate::model::{NodeId, RawNode, RawValue, Tree, TreeNode};
use crate::treemap::Rect;

/// Build an annotated tree from a raw document.
///
/// Every node gets a dotted path, an aggregate `sum` and its depth and
/// height. Children are then ordered by descending height, ties broken by
/// descending sum; that order drives both tiling and the legend.
pub fn build(raw: &RawNode) -> Result<Tree> {
    let mut nodes: Vec<TreeNode> = Vec::with_capacity(128);
    let mut seen: HashSet<String> = HashSet::new();
    let root = insert(raw, None, 0, &mut nodes, &mut seen)?;

    let mut tree = Tree { root, nodes };
    let total = tree.root_node().sum;
    if !total.is_finite() {
        return Err(TreemapError::invalid(
            tree.root_node().path.clone(),
            "aggregate value overflows",
        ));
    }
    sort_children(&mut tree);
    tracing::debug!(
        "built hierarchy '{}' with {} nodes, total {}",
        tree.root_node().name,
        tree.len(),
        total
    );
    Ok(tree)
}

fn insert(
    raw: &RawNode,
    parent: Option<NodeId>,
    depth: u32,
    nodes: &mut Vec<TreeNode>,
    seen: &mut HashSet<String>,
) -> Result<NodeId> {
    let path = match parent {
        Some(pid) => format!("{}.{}", nodes[pid.0 as usize].path, raw.name),
        None => raw.name.clone(),
    };
    if !seen.insert(path.clone()) {
        return Err(TreemapError::invalid(path, "duplicate node path"));
    }

    let id = NodeId(nodes.len() as u64);
    nodes.push(TreeNode {
        id,
        parent,
        path: path.clone(),
        name: raw.name.clone(),
        category: raw.category.clone(),
        value: None,
        sum: 0.0,
        depth,
        height: 0,
        children: Vec::new(),
        rect: Rect::default(),
    });

    match raw.children.as_deref() {
        Some(children) if !children.is_empty() => {
            if raw.value.is_some() {
                tracing::debug!("ignoring own value of internal node '{}'", path);
            }
            let mut sum = 0.0;
            let mut height = 0;
            let mut ids = Vec::with_capacity(children.len());
            for child in children {
                let cid = insert(child, Some(id), depth + 1, nodes, seen)?;
                let c = &nodes[cid.0 as usize];
                sum += c.sum;
                height = height.max(c.height + 1);
                ids.push(cid);
            }
            let node = &mut nodes[id.0 as usize];
            node.children = ids;
            node.sum = sum;
            node.height = height;
        }
        _ => {
            let value = match raw.value.as_ref() {
                Some(v) => leaf_value(v, &path)?,
                None if parent.is_none() => {
                    return Err(TreemapError::invalid(path, "tree is empty"));
                }
                None if raw.children.is_some() => {
                    return Err(TreemapError::invalid(path, "group has no children"));
                }
                None => return Err(TreemapError::invalid(path, "leaf has no value")),
            };
            let node = &mut nodes[id.0 as usize];
            node.value = Some(value);
            node.sum = value;
        }
    }
    Ok(id)
}

fn leaf_value(value: &RawValue, path: &str) -> Result<f64> {
    let v = match value {
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
            TreemapError::invalid(path, format!("value `{s}` is not a number"))
        })?,
    };
    if !v.is_finite() {
        return Err(TreemapError::invalid(path, "value is not finite"));
    }
    if v < 0.0 {
        return Err(TreemapError::invalid(path, format!("negative value {v}")));
    }
    Ok(v)
}

fn sort_children(tree: &mut Tree) {
    for i in 0..tree.nodes.len() {
        if tree.nodes[i].children.len() < 2 {
            continue;
        }
        let mut children = std::mem::take(&mut tree.nodes[i].children);
        children.sort_by(|a, b| {
            let (a, b) = (tree.get(*a), tree.get(*b));
            b.height.cmp(&a.height).then(b.sum.total_cmp(&a.sum))
        });
        tree.nodes[i].children = children;
    }
}

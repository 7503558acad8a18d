use crate::model::TreeNode;

/// Round to an integer and group digits with commas: `1234567.8` → `1,234,568`.
pub fn human_count(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let n = v.round();
    let digits = format!("{:.0}", n.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Hover text for a tile, one field per line.
pub fn tooltip(node: &TreeNode) -> String {
    format!(
        "Name: {}\nCategory: {}\nValue: {}",
        node.name,
        node.category.as_deref().unwrap_or(""),
        human_count(node.sum)
    )
}

/// Break a tile label before each capital that starts a word-like run,
/// e.g. `"Harry Potter and the Deathly Hallows: Part 2"` splits before
/// `Potter`, `Deathly`, `Hallows:` and `Part`.
pub fn split_label(name: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, &(pos, ch)) in chars.iter().enumerate() {
        if pos == 0 || !ch.is_ascii_uppercase() {
            continue;
        }
        let breaks_here = chars
            .get(i + 1)
            .map_or(false, |&(_, next)| !next.is_ascii_uppercase());
        if breaks_here {
            parts.push(&name[start..pos]);
            start = pos;
        }
    }
    parts.push(&name[start..]);
    parts
}

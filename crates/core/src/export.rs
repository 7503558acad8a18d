use std::fmt::{self, Write as _};

use crate::config::RenderConfig;
use crate::human::{split_label, tooltip};
use crate::model::*;
use crate::session::View;

pub fn to_csv(tree: &Tree, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["path", "name", "category", "value", "x0", "y0", "x1", "y1"])?;
    for n in tree.leaves() {
        writer.write_record([
            n.path.clone(),
            n.name.clone(),
            n.category.clone().unwrap_or_default(),
            n.sum.to_string(),
            n.rect.x0.to_string(),
            n.rect.y0.to_string(),
            n.rect.x1.to_string(),
            n.rect.y1.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(tree: &Tree) -> serde_json::Value {
    serde_json::json!({
        "root": tree.root_node().path,
        "value": tree.root_node().sum,
        "categories": tree.top_level().iter().map(|id| {
            let n = tree.get(*id);
            serde_json::json!({ "path": n.path, "name": n.name, "value": n.sum, "rect": n.rect })
        }).collect::<Vec<_>>(),
        "leaves": tree.leaves().map(|n| serde_json::json!({
            "path": n.path,
            "name": n.name,
            "category": n.category,
            "value": n.sum,
            "rect": n.rect,
        })).collect::<Vec<_>>()
    })
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Node path as an XML name usable in `id` and `url(#..)`: ASCII letters,
/// digits, `.` and `-` pass through, every other byte becomes `_xx`.
fn dom_id(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("_{b:02x}"));
        }
    }
    out
}

/// Render a complete SVG document: caption, tiles with hover titles and
/// wrapped labels, then the legend grid under the map.
pub fn to_svg(view: &View, config: &RenderConfig) -> Result<String, fmt::Error> {
    let mut svg = String::with_capacity(64 * 1024);
    write_svg(&mut svg, view, config)?;
    Ok(svg)
}

pub fn write_svg(out: &mut impl fmt::Write, view: &View, config: &RenderConfig) -> fmt::Result {
    let area = config.treemap_area();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="map" width="{}" height="{}">"#,
        config.width, config.height
    )?;
    writeln!(
        out,
        r#"<clipPath id="clip-map"><rect x="0" y="0" width="{}" height="{}"/></clipPath>"#,
        area.width(),
        area.height()
    )?;
    writeln!(
        out,
        r#"<text id="title" x="{}" y="{}" text-anchor="middle" font-size="42">{}</text>"#,
        config.width / 2.0,
        config.margin.top / 2.5,
        escape(&view.request.title)
    )?;
    writeln!(
        out,
        r#"<text id="description" x="{}" y="{}" text-anchor="middle" font-size="18">{}</text>"#,
        config.width / 2.0,
        config.margin.top / 2.5 + 30.0,
        escape(&view.request.description)
    )?;

    writeln!(
        out,
        r#"<g transform="translate({}, {})" clip-path="url(#clip-map)">"#,
        config.margin.left, config.margin.top
    )?;
    for n in view.tree.leaves() {
        write_tile(out, view, n)?;
    }
    writeln!(out, "</g>")?;

    write_legend(out, view, config)?;
    writeln!(out, "</svg>")
}

fn write_tile(out: &mut impl fmt::Write, view: &View, n: &TreeNode) -> fmt::Result {
    let id = dom_id(&n.path);
    let fill = view
        .palette
        .node_color(&view.tree, n.id)
        .map(|c| c.to_string())
        .unwrap_or_else(|| "#cccccc".to_string());
    let (w, h) = (n.rect.width(), n.rect.height());

    writeln!(out, r#"<g transform="translate({}, {})">"#, n.rect.x0, n.rect.y0)?;
    writeln!(
        out,
        r#"<rect id="tile-{id}" class="tile" data-name="{}" data-category="{}" data-value="{}" width="{w}" height="{h}" fill="{fill}"><title>{}</title></rect>"#,
        escape(&n.name),
        escape(n.category.as_deref().unwrap_or("")),
        n.sum,
        escape(&tooltip(n))
    )?;
    writeln!(
        out,
        r#"<clipPath id="clip-{id}"><rect width="{w}" height="{h}"/></clipPath>"#
    )?;
    write!(out, r#"<text clip-path="url(#clip-{id})" font-size="10">"#)?;
    for (line, part) in split_label(&n.name).iter().enumerate() {
        write!(
            out,
            r#"<tspan x="4" y="{}">{}</tspan>"#,
            13 + line * 10,
            escape(part)
        )?;
    }
    writeln!(out, "</text>\n</g>")
}

fn write_legend(out: &mut impl fmt::Write, view: &View, config: &RenderConfig) -> fmt::Result {
    writeln!(
        out,
        r#"<g id="legend" transform="translate({}, {})">"#,
        config.width / 4.0,
        config.height - config.margin.bottom + 20.0
    )?;
    let swatch = config.legend.swatch;
    for entry in &view.legend {
        writeln!(
            out,
            r#"<rect class="legend-item" x="{}" y="{}" width="{swatch}" height="{swatch}" fill="{}"/>"#,
            entry.x, entry.y, entry.color
        )?;
        writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="start" font-size="10">{}</text>"#,
            entry.x + swatch + 5.0,
            entry.y + 10.0,
            escape(&entry.label)
        )?;
    }
    writeln!(out, "</g>")
}

//! Downloads for a category popup: the peers' absolute counts as CSV and
//! the stripplot panel as a standalone SVG.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::data::Unit;
use crate::labels;
use crate::normalize::title_fragment;
use crate::site::escape_html;
use crate::stripplot::{format_pct, Scale, StripplotPanel, SVG_HEIGHT, SVG_WIDTH};

const BACKGROUND: &str = "#F9F1E3";
const PEER_COLOR: &str = "#b9ab95";
const SELECTED_COLOR: &str = "#d1495b";
const TOTAL_COLOR: &str = "#2e6f95";

/// Absolute variables of `category` on the first unit, sorted by key
fn absolute_columns<'a>(units: &[&'a Unit], category: &str) -> Vec<&'a str> {
    let mut vars: Vec<&str> = units
        .first()
        .and_then(|u| u.category(category))
        .map(|block| block.absolute_variables().collect())
        .unwrap_or_default();
    vars.sort_unstable();
    vars
}

/// Cell text for a raw JSON value; missing and null become `0`
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.is_finite() => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Write the selected unit followed by its peers as CSV
pub fn write_csv<W: Write>(writer: W, category: &str, selected: &Unit, peers: &[&Unit]) -> Result<()> {
    let units: Vec<&Unit> = std::iter::once(selected).chain(peers.iter().copied()).collect();
    let vars = absolute_columns(&units, category);

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut header = vec!["Unidad", "Región/Estado"];
    header.extend(vars.iter().map(|v| labels::title(v)));
    wtr.write_record(&header)?;

    for unit in units {
        let block = unit.category(category);
        let mut row = vec![
            unit.name().to_string(),
            unit.parent().unwrap_or_default().to_string(),
        ];
        row.extend(vars.iter().map(|v| cell(block.and_then(|b| b.vars.get(*v)))));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn csv_string(category: &str, selected: &Unit, peers: &[&Unit]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, category, selected, peers)?;
    Ok(String::from_utf8(buf)?)
}

/// `{prefix}_{CategoryTitle}_{UnitName}_{YYYY-MM-DD}.{ext}`
fn download_filename(prefix: &str, category: &str, unit: &Unit, date: NaiveDate, ext: &str) -> String {
    let unit_name = unit.name().replace(['/', '\\'], "-");
    format!(
        "{}_{}_{}_{}.{}",
        prefix,
        title_fragment(labels::title(category)),
        unit_name,
        date.format("%Y-%m-%d"),
        ext
    )
}

pub fn csv_filename(category: &str, unit: &Unit, date: NaiveDate) -> String {
    download_filename("datos", category, unit, date, "csv")
}

pub fn svg_filename(category: &str, unit: &Unit, date: NaiveDate) -> String {
    download_filename("imagen", category, unit, date, "svg")
}

const HEADER_HEIGHT: f64 = 70.0;
const PLOT_TITLE_HEIGHT: f64 = 20.0;

/// The panel as an SVG document: title, subtitle and legend on top, one
/// strip per variable below
pub fn render_svg(panel: &StripplotPanel) -> String {
    let scale = Scale::strip();
    let plot_height = PLOT_TITLE_HEIGHT + SVG_HEIGHT;
    let height = HEADER_HEIGHT + plot_height * panel.plots.len() as f64;
    let mut svg = String::new();

    // fmt::Write into a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{height}" viewBox="0 0 {w} {height}" font-family="sans-serif">"#,
        w = SVG_WIDTH,
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{BACKGROUND}"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="10" y="20" font-size="13" font-weight="700">{}</text>"#,
        escape_html(&panel.title)
    );
    if !panel.subtitle.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="10" y="38" font-size="11">{}</text>"#,
            escape_html(&panel.subtitle)
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="10" y="56" font-size="11" fill="{SELECTED_COLOR}">■ {}</text>"#,
        escape_html(&panel.legend.selected)
    );
    if let Some(peers) = &panel.legend.peers {
        let _ = writeln!(
            svg,
            r#"<text x="150" y="56" font-size="11" fill="{TOTAL_COLOR}">■ {}</text>"#,
            escape_html(peers)
        );
    }

    for (i, plot) in panel.plots.iter().enumerate() {
        let top = HEADER_HEIGHT + plot_height * i as f64;
        let _ = writeln!(svg, r#"<g transform="translate(0,{top})">"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="14" font-size="12" font-weight="600">{}</text>"#,
            scale.range.0,
            escape_html(&plot.title)
        );
        let _ = writeln!(svg, r#"<g transform="translate(0,{PLOT_TITLE_HEIGHT})">"#);
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="15" width="{}" height="40" fill="rgba(0, 0, 0, 0.03)" rx="2"/>"#,
            scale.range.0,
            scale.span()
        );
        for (value, label) in [(0.0, "0%"), (1.0, "100%")] {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="72" font-size="10" text-anchor="middle">{label}</text>"#,
                scale.map(value)
            );
        }
        for peer in &plot.peers {
            let x = scale.map(peer.value);
            let _ = writeln!(
                svg,
                r#"<line x1="{x}" y1="15" x2="{x}" y2="55" stroke="{PEER_COLOR}" stroke-width="2"><title>{}</title></line>"#,
                escape_html(&plot.peer_tooltip(peer))
            );
        }
        if let (Some(value), Some(tooltip), Some(label)) =
            (plot.selected, plot.selected_tooltip(), plot.selected_label())
        {
            let x = scale.map(value);
            let _ = writeln!(
                svg,
                r#"<line x1="{x}" y1="15" x2="{x}" y2="55" stroke="{SELECTED_COLOR}" stroke-width="2"><title>{}</title></line>"#,
                escape_html(&tooltip)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{x}" y="10" text-anchor="{}" fill="{SELECTED_COLOR}" font-size="12" font-weight="500">{label}</text>"#,
                plot.selected_anchor.as_str()
            );
        }
        if let Some(total) = plot.total {
            let x = scale.map(total.pct);
            let _ = writeln!(
                svg,
                r#"<line x1="{x}" y1="15" x2="{x}" y2="55" stroke="{TOTAL_COLOR}" stroke-width="2"/>"#
            );
            let _ = writeln!(
                svg,
                r#"<text x="{x}" y="10" text-anchor="{}" fill="{TOTAL_COLOR}" font-size="12" font-weight="500">{}</text>"#,
                plot.total_anchor.as_str(),
                format_pct(total.pct, 0)
            );
        }
        svg.push_str("</g>\n</g>\n");
    }
    svg.push_str("</svg>\n");
    svg
}

/// Write the CSV download into `dir`, returning its path
pub fn export_csv(
    dir: &Path,
    category: &str,
    selected: &Unit,
    peers: &[&Unit],
    date: NaiveDate,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(csv_filename(category, selected, date));
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, category, selected, peers)?;
    info!(path = %path.display(), rows = peers.len() + 1, "exported csv");
    Ok(path)
}

/// Write the SVG download into `dir`, returning its path
pub fn export_svg(dir: &Path, panel: &StripplotPanel, selected: &Unit, date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(svg_filename(&panel.category, selected, date));
    fs::write(&path, render_svg(panel))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), plots = panel.plots.len(), "exported svg");
    Ok(path)
}

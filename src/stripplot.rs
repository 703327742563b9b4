//! Layout of the comparison chart shown for a category.
//!
//! One strip per percentage variable: a tick per peer, a tick for the
//! selected unit and a tick for the peers' weighted total. This module only
//! computes positions and labels; the terminal popup and the SVG export
//! draw from the same [`StripplotPanel`].

use crate::data::{Level, Unit};
use crate::labels;
use crate::normalize::capitalize_first;
use crate::stats::{comparison_peers, peer_total, sorted_percentage_variables, PeerTotal};

pub const SVG_WIDTH: f64 = 300.0;
pub const SVG_HEIGHT: f64 = 100.0;

/// Linear map from a value domain onto pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl Scale {
    /// Shares in [0, 1] across the strip area
    pub fn strip() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (20.0, 280.0),
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn span(&self) -> f64 {
        self.range.1 - self.range.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::strip()
    }
}

/// Horizontal alignment of a value annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Start,
    #[default]
    Middle,
    End,
}

impl Anchor {
    /// SVG `text-anchor` value
    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }

    /// Anchors for the selected and total annotations so the two labels
    /// grow away from each other
    pub fn pair(selected_x: f64, total_x: f64) -> (Anchor, Anchor) {
        if selected_x < total_x {
            (Anchor::End, Anchor::Start)
        } else if selected_x > total_x {
            (Anchor::Start, Anchor::End)
        } else {
            (Anchor::Middle, Anchor::Middle)
        }
    }
}

/// `0.123` → `"12.3%"` with `decimals = 1`
pub fn format_pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerMark {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stripplot {
    /// Percentage variable, e.g. `RADIO_PCT`
    pub variable: String,
    pub title: String,
    pub selected_name: String,
    pub selected: Option<f64>,
    pub peers: Vec<PeerMark>,
    /// Weighted peer total; `None` at country level
    pub total: Option<PeerTotal>,
    pub selected_anchor: Anchor,
    pub total_anchor: Anchor,
}

impl Stripplot {
    /// Annotation text above the selected tick
    pub fn selected_label(&self) -> Option<String> {
        self.selected.map(|v| format_pct(v, 0))
    }

    pub fn total_label(&self) -> Option<String> {
        self.total.map(|t| format_pct(t.pct, 0))
    }

    pub fn selected_tooltip(&self) -> Option<String> {
        self.selected
            .map(|v| format!("{}\n{}", self.selected_name, format_pct(v, 1)))
    }

    pub fn peer_tooltip(&self, peer: &PeerMark) -> String {
        let total = self.total.map(|t| t.pct).unwrap_or_default();
        format!(
            "{}\nValor: {}\nTotal en pares: {}",
            peer.name,
            format_pct(peer.value, 1),
            format_pct(total, 1)
        )
    }
}

/// Colour key under the subtitle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Legend {
    pub selected: String,
    /// Absent at country level
    pub peers: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripplotPanel {
    pub category: String,
    pub title: String,
    pub subtitle: String,
    pub level: Level,
    pub unit_key: String,
    pub unit_name: String,
    pub legend: Legend,
    pub plots: Vec<Stripplot>,
}

fn legend(level: Level, selected: &Unit) -> Legend {
    let peers = match level {
        Level::Country => None,
        Level::LargeUnits | Level::SmallUnits => {
            let parent = selected.parent().unwrap_or_default();
            let parent = if selected.level_tag() == Some(Level::LargeUnits) {
                capitalize_first(parent)
            } else {
                parent.to_string()
            };
            Some(format!("en {parent}"))
        }
    };
    Legend {
        selected: format!("en {}", selected.name()),
        peers,
    }
}

/// Lay out every strip of `category` for `selected`, comparing against its
/// same-parent peers within `units`
pub fn build_panel(level: Level, units: &[Unit], selected: &Unit, category: &str) -> StripplotPanel {
    let peers = comparison_peers(level, units, selected);
    let scale = Scale::strip();

    let plots = sorted_percentage_variables(selected, category)
        .into_iter()
        .map(|var| {
            let selected_value = selected.value(category, var);
            let total = match level {
                Level::Country => None,
                _ => Some(peer_total(peers.iter().copied(), category, var)),
            };

            let (selected_anchor, total_anchor) = match (selected_value, total) {
                (Some(v), Some(t)) => Anchor::pair(scale.map(v), scale.map(t.pct)),
                _ => (Anchor::Middle, Anchor::Middle),
            };

            Stripplot {
                variable: var.to_string(),
                title: labels::variable_title(var).to_string(),
                selected_name: selected.name().to_string(),
                selected: selected_value,
                peers: peers
                    .iter()
                    .filter_map(|p| {
                        p.value(category, var).map(|value| PeerMark {
                            name: p.name().to_string(),
                            value,
                        })
                    })
                    .collect(),
                total,
                selected_anchor,
                total_anchor,
            }
        })
        .collect();

    StripplotPanel {
        category: category.to_string(),
        title: labels::title(category).to_string(),
        subtitle: labels::subtitle(category).to_string(),
        level,
        unit_key: selected.key().to_string(),
        unit_name: selected.name().to_string(),
        legend: legend(level, selected),
        plots,
    }
}

//! Peer comparisons for a selected unit.
//!
//! The reference value drawn next to a unit is not a mean of its peers'
//! percentages: it is re-derived from the peers' absolute counts over the
//! sum of their news-organisation counts.

use crate::data::{Level, Unit};

/// Marks a variable as a share in [0, 1] with an absolute twin
pub const PCT_SUFFIX: &str = "_PCT";

pub fn is_percentage_variable(var: &str) -> bool {
    var.ends_with(PCT_SUFFIX)
}

/// `"RADIO_PCT"` → `"RADIO"`; other names pass through
pub fn absolute_variable(pct_var: &str) -> &str {
    pct_var.strip_suffix(PCT_SUFFIX).unwrap_or(pct_var)
}

/// Count-weighted aggregate over a peer set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeerTotal {
    /// `count / denominator`, or 0 when nothing contributed
    pub pct: f64,
    /// Peers that had both values
    pub contributors: usize,
    pub count: f64,
    pub denominator: f64,
}

impl PeerTotal {
    /// False when no peer contributed, in which case `pct` carries no meaning
    pub fn is_available(&self) -> bool {
        self.contributors > 0
    }
}

/// Aggregate `pct_var` of `category` over `peers`.
///
/// Each peer contributes its absolute count and its NEWS_ORG_COUNT, only
/// when both are numbers and the denominator is positive.
pub fn peer_total<'a, I>(peers: I, category: &str, pct_var: &str) -> PeerTotal
where
    I: IntoIterator<Item = &'a Unit>,
{
    let var = absolute_variable(pct_var);
    let mut total = PeerTotal::default();

    for peer in peers {
        let Some(count) = peer.value(category, var) else {
            continue;
        };
        let Some(denominator) = peer.denominator().filter(|d| *d > 0.0) else {
            continue;
        };
        total.count += count;
        total.denominator += denominator;
        total.contributors += 1;
    }

    if total.denominator > 0.0 {
        total.pct = total.count / total.denominator;
    }
    total
}

pub fn peer_total_pct<'a, I>(peers: I, category: &str, pct_var: &str) -> f64
where
    I: IntoIterator<Item = &'a Unit>,
{
    peer_total(peers, category, pct_var).pct
}

/// Units sharing the selected unit's PARENT, excluding itself
pub fn peer_units<'a>(units: &'a [Unit], selected: &Unit) -> Vec<&'a Unit> {
    units
        .iter()
        .filter(|u| u.parent() == selected.parent() && u.key() != selected.key())
        .collect()
}

/// Peers shown for a selection; countries are never compared
pub fn comparison_peers<'a>(level: Level, units: &'a [Unit], selected: &Unit) -> Vec<&'a Unit> {
    match level {
        Level::Country => Vec::new(),
        Level::LargeUnits | Level::SmallUnits => peer_units(units, selected),
    }
}

/// Percentage variables of a category, highest value of `unit` first.
/// Missing values sort as 0; ties keep document order.
pub fn sorted_percentage_variables<'a>(unit: &'a Unit, category: &str) -> Vec<&'a str> {
    let Some(block) = unit.category(category) else {
        return Vec::new();
    };
    let mut vars: Vec<&str> = block.percentage_variables().collect();
    vars.sort_by(|a, b| {
        let va = block.get(a).unwrap_or(0.0);
        let vb = block.get(b).unwrap_or(0.0);
        vb.total_cmp(&va)
    });
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_dataset;
    use crate::testdata::sample_dataset;

    const CI: &str = "CONTRATO INDEFINIDO_PCT";

    fn units(json: &str) -> Vec<Unit> {
        let mut bytes = format!(r#"{{"x": {{"large_units": {json}}}}}"#).into_bytes();
        let ds = parse_dataset(&mut bytes).unwrap();
        ds.country("x").unwrap().large_units.clone()
    }

    #[test]
    fn test_absolute_variable() {
        assert_eq!(absolute_variable("RADIO_PCT"), "RADIO");
        assert_eq!(absolute_variable("RADIO"), "RADIO");
        assert!(is_percentage_variable("TIKTOK_PCT"));
        assert!(!is_percentage_variable("PCT_TIKTOK"));
    }

    #[test]
    fn test_total_is_count_weighted() {
        let peers = units(
            r#"[
                {"BASIC_INFO": {"KEY": "a", "NEWS_ORG_COUNT": 10}, "C": {"V": 1, "V_PCT": 0.1}},
                {"BASIC_INFO": {"KEY": "b", "NEWS_ORG_COUNT": 100}, "C": {"V": 90, "V_PCT": 0.9}}
            ]"#,
        );
        let total = peer_total(&peers, "C", "V_PCT");
        assert_eq!(total.contributors, 2);
        assert!((total.pct - 91.0 / 110.0).abs() < 1e-12);
        // the unweighted mean would be 0.5
        assert!((total.pct - 0.5).abs() > 0.3);
    }

    #[test]
    fn test_invalid_peers_are_excluded_not_zeroed() {
        let peers = units(
            r#"[
                {"BASIC_INFO": {"KEY": "a", "NEWS_ORG_COUNT": 10}, "C": {"V": 5}},
                {"BASIC_INFO": {"KEY": "b", "NEWS_ORG_COUNT": "many"}, "C": {"V": 90}},
                {"BASIC_INFO": {"KEY": "c", "NEWS_ORG_COUNT": 0}, "C": {"V": 3}},
                {"BASIC_INFO": {"KEY": "d", "NEWS_ORG_COUNT": 40}, "C": {"V": "?"}},
                {"BASIC_INFO": {"KEY": "e", "NEWS_ORG_COUNT": 40}}
            ]"#,
        );
        let total = peer_total(&peers, "C", "V_PCT");
        assert_eq!(total.contributors, 1);
        assert_eq!(total.count, 5.0);
        assert_eq!(total.denominator, 10.0);
        assert_eq!(total.pct, 0.5);
    }

    #[test]
    fn test_no_contributors_yields_zero() {
        let peers = units(r#"[{"BASIC_INFO": {"KEY": "a"}, "C": {"V": 5}}]"#);
        let total = peer_total(&peers, "C", "V_PCT");
        assert_eq!(total.pct, 0.0);
        assert!(!total.is_available());

        let empty: Vec<Unit> = Vec::new();
        assert_eq!(peer_total_pct(&empty, "C", "V_PCT"), 0.0);
    }

    #[test]
    fn test_peers_share_parent() {
        let ds = sample_dataset();
        let ar = ds.country("argentina").unwrap();
        let rio_cuarto = &ar.small_units[0];
        let keys: Vec<&str> = peer_units(&ar.small_units, rio_cuarto)
            .iter()
            .map(|u| u.key())
            .collect();
        assert_eq!(keys, vec!["AR-14-161", "AR-14-140"]);
    }

    #[test]
    fn test_country_level_has_no_peers() {
        let ds = sample_dataset();
        let ar = ds.country("argentina").unwrap();
        assert!(comparison_peers(Level::Country, &ar.country, &ar.country[0]).is_empty());
        assert_eq!(
            comparison_peers(Level::LargeUnits, &ar.large_units, &ar.large_units[0]).len(),
            3
        );
    }

    #[test]
    fn test_region_peer_total_from_fixture() {
        let ds = sample_dataset();
        let ar = ds.country("argentina").unwrap();
        let cordoba = &ar.large_units[0];
        let peers = comparison_peers(Level::LargeUnits, &ar.large_units, cordoba);
        // Buenos Aires 40/50 and Tierra del Fuego 1/10; Misiones has no usable count
        let total = peer_total(peers.iter().copied(), "HIRING", CI);
        assert_eq!(total.contributors, 2);
        assert!((total.pct - 41.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_sorted_percentage_variables() {
        let ds = sample_dataset();
        let ar = ds.country("argentina").unwrap();
        let cordoba = &ar.large_units[0];
        assert_eq!(
            sorted_percentage_variables(cordoba, "HIRING"),
            vec!["TRABAJO INDEPENDIENTE_PCT", "CONTRATO INDEFINIDO_PCT"]
        );
        assert_eq!(
            sorted_percentage_variables(cordoba, "PLATFORMS"),
            vec!["RADIO_PCT", "TIKTOK_PCT"]
        );
        assert!(sorted_percentage_variables(cordoba, "THEMES").is_empty());
    }

    #[test]
    fn test_sort_ties_keep_document_order() {
        let ds = sample_dataset();
        let argentina = &ds.country("argentina").unwrap().country[0];
        assert_eq!(
            sorted_percentage_variables(argentina, "HIRING"),
            vec!["CONTRATO INDEFINIDO_PCT", "TRABAJO INDEPENDIENTE_PCT"]
        );
    }
}

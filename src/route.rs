//! Hash-route resolution.
//!
//! A location such as `/argentina/cordoba/rio cuarto` is matched against
//! the dataset to yield a (country, level, unit) selection. Resolution is
//! best effort: an unknown country or an unmatched name never errors, the
//! caller decides what to do through [`Resolution`].

use tracing::debug;

use crate::config::SiteConfig;
use crate::data::{CountryRecord, Dataset, Level, Unit};
use crate::normalize::{filename_slug, route_key};

/// Deepest route: country / large unit / small unit
pub const MAX_SEGMENTS: usize = 3;

/// Split a location into its non-empty segments. A leading `#` is ignored.
pub fn split_path(path: &str) -> Vec<&str> {
    path.trim()
        .trim_start_matches('#')
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// A resolved location. `unit` is `None` when the route named a country
/// and level but no unit matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    /// Country key as stored in the dataset
    pub country: &'a str,
    pub record: &'a CountryRecord,
    pub level: Level,
    pub unit: Option<&'a Unit>,
}

impl<'a> Selection<'a> {
    /// Units at the selection's level
    pub fn level_units(&self) -> &'a [Unit] {
        self.record.units(self.level)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// The country matched; the new state is this selection
    Resolved(Selection<'a>),
    /// Nothing to do (empty path, or more segments than levels)
    Unchanged,
    /// First segment names no known country
    CountryNotFound,
}

/// Resolves locations against a read-only dataset
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    dataset: &'a Dataset,
}

impl<'a> Resolver<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    pub fn resolve(&self, path: &str) -> Resolution<'a> {
        let segments = split_path(path);
        let resolution = match segments.as_slice() {
            [] => Resolution::Unchanged,
            [country] => self.with_country(country, |record| {
                // A single country-level unit is selected automatically
                let unit = match record.country.as_slice() {
                    [only] => Some(only),
                    _ => None,
                };
                (Level::Country, unit)
            }),
            [country, region] => self.with_country(country, |record| {
                let region = route_key(region);
                let unit = record
                    .large_units
                    .iter()
                    .find(|u| route_key(u.name()) == region);
                (Level::LargeUnits, unit)
            }),
            [country, region, city] => self.with_country(country, |record| {
                let region = route_key(region);
                let city = route_key(city);
                let unit = record.small_units.iter().find(|u| {
                    route_key(u.name()) == city
                        && u.parent().is_some_and(|p| route_key(p) == region)
                });
                (Level::SmallUnits, unit)
            }),
            _ => {
                debug!(path, segments = segments.len(), "route has too many segments, ignored");
                Resolution::Unchanged
            }
        };

        if let Resolution::Resolved(sel) = &resolution {
            debug!(
                path,
                country = sel.country,
                level = %sel.level,
                unit = sel.unit.map(Unit::key),
                "route resolved"
            );
        }
        resolution
    }

    /// Find a country whose key matches the segment, ignoring case and accents
    pub fn find_country(&self, segment: &str) -> Option<(&'a str, &'a CountryRecord)> {
        let wanted = route_key(segment);
        self.dataset
            .countries()
            .find(|(key, _)| route_key(key) == wanted)
    }

    fn with_country(
        &self,
        segment: &str,
        pick: impl FnOnce(&'a CountryRecord) -> (Level, Option<&'a Unit>),
    ) -> Resolution<'a> {
        match self.find_country(segment) {
            Some((country, record)) => {
                let (level, unit) = pick(record);
                Resolution::Resolved(Selection {
                    country,
                    record,
                    level,
                    unit,
                })
            }
            None => {
                debug!(country = segment, "unknown country in route");
                Resolution::CountryNotFound
            }
        }
    }
}

/// Current selection as owned keys. Navigation produces a new state
/// instead of mutating shared globals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub country: Option<String>,
    pub level: Option<Level>,
    pub unit_key: Option<String>,
}

impl UiState {
    /// State after a navigation: resolved routes replace the whole state,
    /// everything else keeps it
    pub fn apply(&self, resolution: &Resolution<'_>) -> UiState {
        match resolution {
            Resolution::Resolved(sel) => UiState::from(sel),
            Resolution::Unchanged | Resolution::CountryNotFound => self.clone(),
        }
    }

    /// Borrow the state back out of the dataset
    pub fn selection<'a>(&self, dataset: &'a Dataset) -> Option<Selection<'a>> {
        let (country, record) = dataset.country_entry(self.country.as_deref()?)?;
        let level = self.level?;
        let unit = self
            .unit_key
            .as_deref()
            .and_then(|key| record.find_by_key(level, key));
        Some(Selection {
            country,
            record,
            level,
            unit,
        })
    }
}

impl From<&Selection<'_>> for UiState {
    fn from(sel: &Selection<'_>) -> Self {
        Self {
            country: Some(sel.country.to_string()),
            level: Some(sel.level),
            unit_key: sel.unit.map(|u| u.key().to_string()),
        }
    }
}

/// Title and description for the page head / share previews
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
}

impl PageMeta {
    pub fn default_for(site: &SiteConfig) -> Self {
        Self {
            title: site.default_title.clone(),
            description: site.default_description.clone(),
        }
    }

    /// Metadata for a selection. Countries always get their own title,
    /// lower levels only once a unit is selected.
    pub fn for_selection(selection: Option<&Selection<'_>>, site: &SiteConfig) -> Self {
        let Some(sel) = selection else {
            return Self::default_for(site);
        };

        let country = site.country_name(sel.country);
        let place = match (sel.level, sel.unit) {
            (Level::Country, _) => country,
            (Level::LargeUnits, Some(unit)) => format!("{}, {}", unit.name(), country),
            (Level::SmallUnits, Some(unit)) => format!(
                "{}, {}, {}",
                unit.name(),
                unit.parent().unwrap_or_default(),
                country
            ),
            _ => return Self::default_for(site),
        };

        Self {
            title: format!("{}: {}", site.title_prefix, place),
            description: format!("Visualización de datos para {place}"),
        }
    }
}

/// The location the UI emits once a selection is finalised
pub fn hash_path(selection: &Selection<'_>) -> String {
    match (selection.level, selection.unit) {
        (Level::LargeUnits, Some(unit)) => {
            format!("/{}/{}", selection.country, route_key(unit.name()))
        }
        (Level::SmallUnits, Some(unit)) => format!(
            "/{}/{}/{}",
            selection.country,
            route_key(unit.parent().unwrap_or_default()),
            route_key(unit.name())
        ),
        _ => format!("/{}", selection.country),
    }
}

/// Static page filename for a (country, level, unit) triple:
/// `{country}[-{region}][-{city}].html`
pub fn static_filename(country: &str, level: Level, unit: Option<&Unit>) -> String {
    let country = filename_slug(country);
    match (level, unit) {
        (Level::LargeUnits, Some(unit)) => {
            format!("{}-{}.html", country, filename_slug(unit.name()))
        }
        (Level::SmallUnits, Some(unit)) => format!(
            "{}-{}-{}.html",
            country,
            filename_slug(unit.parent().unwrap_or_default()),
            filename_slug(unit.name())
        ),
        _ => format!("{country}.html"),
    }
}

/// Public URL of the static share page for a selection
pub fn share_url(site: &SiteConfig, selection: Option<&Selection<'_>>) -> String {
    let filename = selection
        .map(|s| static_filename(s.country, s.level, s.unit))
        .unwrap_or_else(|| "index.html".to_string());
    format!(
        "{}/{}/{}",
        site.base_url(),
        site.pages_dir.display(),
        filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::sample_dataset;

    fn unit_key(res: &Resolution<'_>) -> Option<String> {
        match res {
            Resolution::Resolved(sel) => sel.unit.map(|u| u.key().to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("#/argentina//córdoba/"), vec!["argentina", "córdoba"]);
        assert!(split_path("").is_empty());
        assert!(split_path("#/").is_empty());
    }

    #[test]
    fn test_empty_path_is_unchanged() {
        let ds = sample_dataset();
        assert_eq!(Resolver::new(&ds).resolve(""), Resolution::Unchanged);
        assert_eq!(Resolver::new(&ds).resolve("#"), Resolution::Unchanged);
    }

    #[test]
    fn test_country_with_single_unit_selects_it() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/ARGENTINA");
        let Resolution::Resolved(sel) = res else {
            panic!("expected resolution");
        };
        assert_eq!(sel.country, "argentina");
        assert_eq!(sel.level, Level::Country);
        assert_eq!(sel.unit.map(Unit::key), Some("AR"));
    }

    #[test]
    fn test_country_without_single_unit_leaves_unit_empty() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/méxico");
        let Resolution::Resolved(sel) = res else {
            panic!("expected resolution");
        };
        assert_eq!(sel.country, "mexico");
        assert_eq!(sel.level, Level::Country);
        assert!(sel.unit.is_none());
    }

    #[test]
    fn test_large_unit_is_case_and_accent_insensitive() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);
        let a = resolver.resolve("/argentina/córdoba");
        let b = resolver.resolve("/ARGENTINA/CORDOBA");
        assert_eq!(unit_key(&a), Some("AR-14".to_string()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_whitespace_is_ignored_in_names() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/mexico/ciudaddemexico");
        assert_eq!(unit_key(&res), Some("9".to_string()));
        let res = Resolver::new(&ds).resolve("/mexico/Ciudad de México");
        assert_eq!(unit_key(&res), Some("9".to_string()));
    }

    #[test]
    fn test_unmatched_region_resolves_without_unit() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/argentina/mendoza");
        let Resolution::Resolved(sel) = res else {
            panic!("expected resolution");
        };
        assert_eq!(sel.level, Level::LargeUnits);
        assert!(sel.unit.is_none());
    }

    #[test]
    fn test_small_unit_needs_name_and_parent() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);

        let ok = resolver.resolve("/argentina/cordoba/rio cuarto");
        assert_eq!(unit_key(&ok), Some("AR-14-098".to_string()));

        // La Plata exists, but under Buenos Aires
        let wrong_parent = resolver.resolve("/argentina/cordoba/laplata");
        let Resolution::Resolved(sel) = wrong_parent else {
            panic!("expected resolution");
        };
        assert_eq!(sel.level, Level::SmallUnits);
        assert!(sel.unit.is_none());
    }

    #[test]
    fn test_unknown_country_keeps_previous_state() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);
        let state = UiState::default().apply(&resolver.resolve("/argentina/cordoba"));
        assert_eq!(state.unit_key.as_deref(), Some("AR-14"));

        let res = resolver.resolve("/atlantis");
        assert_eq!(res, Resolution::CountryNotFound);
        assert_eq!(state.apply(&res), state);
    }

    #[test]
    fn test_too_many_segments_is_unchanged() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/argentina/cordoba/rio cuarto/centro");
        assert_eq!(res, Resolution::Unchanged);
    }

    #[test]
    fn test_resolved_route_clears_previous_unit() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);
        let state = UiState::default().apply(&resolver.resolve("/argentina/cordoba"));
        let next = state.apply(&resolver.resolve("/argentina/mendoza"));
        assert_eq!(next.level, Some(Level::LargeUnits));
        assert_eq!(next.unit_key, None);
    }

    #[test]
    fn test_repeated_navigation_is_idempotent() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);
        let once = UiState::default().apply(&resolver.resolve("/argentina/cordoba/villa maria"));
        let twice = once.apply(&resolver.resolve("/argentina/cordoba/villa maria"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_state_round_trips_to_selection() {
        let ds = sample_dataset();
        let res = Resolver::new(&ds).resolve("/argentina/cordoba/villamaria");
        let Resolution::Resolved(sel) = res else {
            panic!("expected resolution");
        };
        let state = UiState::from(&sel);
        assert_eq!(state.selection(&ds), Some(sel));
    }

    #[test]
    fn test_hash_path_and_filename_round_trip_for_every_unit() {
        let ds = sample_dataset();
        let resolver = Resolver::new(&ds);

        for (country, record) in ds.countries() {
            for level in [Level::LargeUnits, Level::SmallUnits] {
                for unit in record.units(level) {
                    let original = Selection {
                        country,
                        record,
                        level,
                        unit: Some(unit),
                    };
                    let path = hash_path(&original);
                    let Resolution::Resolved(back) = resolver.resolve(&path) else {
                        panic!("{path} did not resolve");
                    };
                    assert_eq!(back.unit.map(Unit::key), Some(unit.key()), "{path}");
                    assert_eq!(
                        static_filename(back.country, back.level, back.unit),
                        static_filename(country, level, Some(unit))
                    );
                }
            }
        }
    }

    #[test]
    fn test_names_with_slashes_round_trip() {
        let mut json = r#"{
          "chile": {
            "large_units": [
              {"BASIC_INFO": {"KEY": "CL-AI", "NAME": "Aysén/Aisén", "PARENT": "chile", "LEVEL": "large_units"}}
            ],
            "small_units": [
              {"BASIC_INFO": {"KEY": "CL-AI-1", "NAME": "Río Ibáñez / Puerto", "PARENT": "Aysén/Aisén", "LEVEL": "small_units"}}
            ]
          }
        }"#
        .as_bytes()
        .to_vec();
        let ds = crate::data::parse_dataset(&mut json).unwrap();
        let resolver = Resolver::new(&ds);
        let record = ds.country("chile").unwrap();

        let region = Selection {
            country: "chile",
            record,
            level: Level::LargeUnits,
            unit: record.large_units.first(),
        };
        assert_eq!(hash_path(&region), "/chile/aysenaisen");
        assert_eq!(unit_key(&resolver.resolve(&hash_path(&region))).as_deref(), Some("CL-AI"));

        let city = Selection {
            level: Level::SmallUnits,
            unit: record.small_units.first(),
            ..region
        };
        let path = hash_path(&city);
        assert_eq!(path, "/chile/aysenaisen/rioibanezpuerto");
        assert_eq!(unit_key(&resolver.resolve(&path)).as_deref(), Some("CL-AI-1"));
        assert_eq!(
            static_filename("chile", Level::SmallUnits, city.unit),
            "chile-aysenaisen-rio-ibanez--puerto.html"
        );
    }

    #[test]
    fn test_static_filenames() {
        let ds = sample_dataset();
        let ar = ds.country("argentina").unwrap();
        assert_eq!(static_filename("argentina", Level::Country, None), "argentina.html");
        assert_eq!(
            static_filename("argentina", Level::LargeUnits, Some(&ar.large_units[3])),
            "argentina-tierra-del-fuego.html"
        );
        assert_eq!(
            static_filename("argentina", Level::SmallUnits, Some(&ar.small_units[1])),
            "argentina-cordoba-villa-maria.html"
        );
    }

    #[test]
    fn test_hash_path_uses_route_keys() {
        let ds = sample_dataset();
        let Resolution::Resolved(sel) = Resolver::new(&ds).resolve("/mexico/ciudad de mexico/alvaro obregon")
        else {
            panic!("expected resolution");
        };
        assert_eq!(hash_path(&sel), "/mexico/ciudaddemexico/alvaroobregon");
    }

    #[test]
    fn test_page_meta() {
        let ds = sample_dataset();
        let site = SiteConfig::default();
        let resolver = Resolver::new(&ds);

        let Resolution::Resolved(city) = resolver.resolve("/argentina/cordoba/rio cuarto") else {
            panic!("expected resolution");
        };
        let meta = PageMeta::for_selection(Some(&city), &site);
        assert_eq!(meta.title, "Desiertos: Río Cuarto, Córdoba, Argentina");
        assert_eq!(
            meta.description,
            "Visualización de datos para Río Cuarto, Córdoba, Argentina"
        );

        let Resolution::Resolved(region) = resolver.resolve("/mexico/ciudaddemexico") else {
            panic!("expected resolution");
        };
        assert_eq!(
            PageMeta::for_selection(Some(&region), &site).title,
            "Desiertos: Ciudad de México, México"
        );

        let Resolution::Resolved(country) = resolver.resolve("/mexico") else {
            panic!("expected resolution");
        };
        let meta = PageMeta::for_selection(Some(&country), &site);
        assert_eq!(meta.title, "Desiertos: México");
        assert_eq!(meta.description, "Visualización de datos para México");

        let Resolution::Resolved(missing) = resolver.resolve("/argentina/mendoza") else {
            panic!("expected resolution");
        };
        assert_eq!(
            PageMeta::for_selection(Some(&missing), &site),
            PageMeta::default_for(&site)
        );
        assert_eq!(PageMeta::for_selection(None, &site).title, "DESIERTOS");
    }

    #[test]
    fn test_share_url() {
        let ds = sample_dataset();
        let site = SiteConfig::default();
        let Resolution::Resolved(sel) = Resolver::new(&ds).resolve("/argentina/cordoba") else {
            panic!("expected resolution");
        };
        assert_eq!(
            share_url(&site, Some(&sel)),
            "https://coldfoot.studio/desiertos-latinoamerica/experiments/d3-viz/static-pages/argentina-cordoba.html"
        );
        assert!(share_url(&site, None).ends_with("/static-pages/index.html"));
    }
}

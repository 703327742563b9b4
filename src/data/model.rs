use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::stats::PCT_SUFFIX;

/// Keys on a unit that are metadata rather than category blocks
pub const RESERVED_KEYS: [&str; 4] = ["BASIC_INFO", "BBOX", "CENTROID", "NARRATIVE"];

/// Granularity tier of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "country")]
    Country,
    #[serde(rename = "large_units")]
    LargeUnits,
    #[serde(rename = "small_units")]
    SmallUnits,
}

impl Level {
    /// Menu order, coarsest first
    pub const ALL: [Level; 3] = [Level::Country, Level::LargeUnits, Level::SmallUnits];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Country => "country",
            Level::LargeUnits => "large_units",
            Level::SmallUnits => "small_units",
        }
    }

    /// Spanish label shown in the level selector
    pub fn label(self) -> &'static str {
        match self {
            Level::Country => "País",
            Level::LargeUnits => "Unidades grandes",
            Level::SmallUnits => "Unidades pequeñas",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "country" => Ok(Level::Country),
            "large_units" => Ok(Level::LargeUnits),
            "small_units" => Ok(Level::SmallUnits),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

/// Identity block of a unit
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BasicInfo {
    #[serde(rename = "KEY", deserialize_with = "string_or_number")]
    pub key: String,
    #[serde(rename = "NAME", default)]
    pub name: String,
    #[serde(rename = "PARENT", default)]
    pub parent: Option<String>,
    #[serde(rename = "LEVEL", default)]
    pub level: Option<String>,
    /// Aggregation denominator, kept raw: only JSON numbers count
    #[serde(rename = "NEWS_ORG_COUNT", default)]
    pub news_org_count: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "KEY must be a string or number, got {other}"
        ))),
    }
}

/// A named group of variables (e.g. HIRING) on a unit
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBlock {
    pub key: String,
    pub vars: Map<String, Value>,
}

impl CategoryBlock {
    /// Numeric value of a variable; missing, non-numeric and NaN values are `None`
    pub fn get(&self, var: &str) -> Option<f64> {
        self.vars
            .get(var)
            .and_then(Value::as_f64)
            .filter(|v| !v.is_nan())
    }

    pub fn percentage_variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.vars
            .keys()
            .map(String::as_str)
            .filter(|k| k.ends_with(PCT_SUFFIX))
    }

    pub fn absolute_variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.vars
            .keys()
            .map(String::as_str)
            .filter(|k| !k.ends_with(PCT_SUFFIX))
    }
}

/// A country, region ("large unit") or locality ("small unit")
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawUnit")]
pub struct Unit {
    pub info: BasicInfo,
    /// Category blocks in document order
    pub categories: Vec<CategoryBlock>,
    pub bbox: Option<Value>,
    pub centroid: Option<Value>,
    pub narrative: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawUnit {
    #[serde(rename = "BASIC_INFO")]
    basic_info: BasicInfo,
    #[serde(rename = "BBOX", default)]
    bbox: Option<Value>,
    #[serde(rename = "CENTROID", default)]
    centroid: Option<Value>,
    #[serde(rename = "NARRATIVE", default)]
    narrative: Option<Map<String, Value>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<RawUnit> for Unit {
    fn from(raw: RawUnit) -> Self {
        let categories = raw
            .rest
            .into_iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| match value {
                Value::Object(vars) => Some(CategoryBlock { key, vars }),
                _ => None,
            })
            .collect();

        Self {
            info: raw.basic_info,
            categories,
            bbox: raw.bbox.filter(|v| !v.is_null()),
            centroid: raw.centroid.filter(|v| !v.is_null()),
            narrative: raw.narrative,
        }
    }
}

impl Unit {
    pub fn key(&self) -> &str {
        &self.info.key
    }

    /// NAME, falling back to KEY when the name is blank
    pub fn name(&self) -> &str {
        if self.info.name.trim().is_empty() {
            &self.info.key
        } else {
            &self.info.name
        }
    }

    pub fn parent(&self) -> Option<&str> {
        self.info.parent.as_deref()
    }

    /// The LEVEL tag carried in BASIC_INFO, if it names a known level
    pub fn level_tag(&self) -> Option<Level> {
        self.info.level.as_deref().and_then(|l| l.parse().ok())
    }

    /// NEWS_ORG_COUNT when it is a JSON number
    pub fn denominator(&self) -> Option<f64> {
        self.info
            .news_org_count
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|v| !v.is_nan())
    }

    pub fn category(&self, key: &str) -> Option<&CategoryBlock> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn category_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.iter().map(|c| c.key.as_str())
    }

    pub fn value(&self, category: &str, var: &str) -> Option<f64> {
        self.category(category).and_then(|c| c.get(var))
    }

    /// Name shown in the unit picker: regions by name, everything else with its parent
    pub fn display_name(&self, level: Level) -> String {
        match (level, self.parent()) {
            (Level::LargeUnits, _) | (_, None) => self.name().to_string(),
            (_, Some(parent)) => format!("{} - {}", self.name(), parent),
        }
    }

    /// Centroid as (lon, lat)
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.centroid.as_ref().and_then(point_from_value)
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat)
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let value = self.bbox.as_ref()?;
        let arr = value.as_array()?;
        match arr.as_slice() {
            [a, b, c, d] => Some((a.as_f64()?, b.as_f64()?, c.as_f64()?, d.as_f64()?)),
            [min, max] => {
                let (x0, y0) = point_from_value(min)?;
                let (x1, y1) = point_from_value(max)?;
                Some((x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))
            }
            _ => None,
        }
    }

    /// A narrative field rendered as text
    pub fn narrative_field(&self, field: &str) -> Option<String> {
        self.narrative
            .as_ref()
            .and_then(|n| n.get(field))
            .and_then(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
    }
}

fn point_from_value(value: &Value) -> Option<(f64, f64)> {
    match value {
        Value::Array(coords) if coords.len() >= 2 => {
            Some((coords[0].as_f64()?, coords[1].as_f64()?))
        }
        Value::Object(obj) => {
            let lon = ["lon", "lng", "x"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_f64))?;
            let lat = ["lat", "y"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_f64))?;
            Some((lon, lat))
        }
        _ => None,
    }
}

/// All units of one country, per level
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub country: Vec<Unit>,
    #[serde(default)]
    pub large_units: Vec<Unit>,
    #[serde(default)]
    pub small_units: Vec<Unit>,
}

impl CountryRecord {
    pub fn units(&self, level: Level) -> &[Unit] {
        match level {
            Level::Country => &self.country,
            Level::LargeUnits => &self.large_units,
            Level::SmallUnits => &self.small_units,
        }
    }

    pub fn find_by_key(&self, level: Level, key: &str) -> Option<&Unit> {
        self.units(level).iter().find(|u| u.key() == key)
    }

    /// Category keys in menu order, taken from the first unit of the level
    pub fn category_keys(&self, level: Level) -> Vec<&str> {
        self.units(level)
            .first()
            .map(|u| u.category_keys().collect())
            .unwrap_or_default()
    }
}

/// The whole dataset, keyed by country identifier. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    countries: BTreeMap<String, CountryRecord>,
}

impl Dataset {
    pub fn new(countries: BTreeMap<String, CountryRecord>) -> Self {
        Self { countries }
    }

    pub fn country(&self, key: &str) -> Option<&CountryRecord> {
        self.countries.get(key)
    }

    /// Country entry with the key borrowed from the dataset
    pub fn country_entry(&self, key: &str) -> Option<(&str, &CountryRecord)> {
        self.countries
            .get_key_value(key)
            .map(|(k, record)| (k.as_str(), record))
    }

    pub fn countries(&self) -> impl Iterator<Item = (&str, &CountryRecord)> {
        self.countries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn country_keys(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Total number of units across all countries and levels
    pub fn unit_count(&self) -> usize {
        self.countries
            .values()
            .map(|r| r.country.len() + r.large_units.len() + r.small_units.len())
            .sum()
    }
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use tracing::info;

use crate::map::{LineString, MapRenderer};

/// Property names that may carry a feature's country, in lookup order
const COUNTRY_PROPERTIES: [&str; 5] = ["country", "country_name", "name", "ADMIN", "NAME"];

/// Load country outlines from a GeoJSON file. Features are tagged with
/// their country name so the selected country can be highlighted.
pub fn load_outlines(renderer: &mut MapRenderer, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read outlines {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("Failed to parse outlines {}", path.display()))?;

    let mut lines = 0;
    let mut add = |line: LineString, country: Option<&str>| {
        renderer.add_outline(line, country);
        lines += 1;
    };

    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                process_feature(feature, &mut add);
            }
        }
        GeoJson::Feature(feature) => process_feature(feature, &mut add),
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut |line| add(line, None));
        }
    }

    info!(path = %path.display(), lines, "outlines loaded");
    Ok(())
}

fn feature_country(feature: &Feature) -> Option<&str> {
    let props = feature.properties.as_ref()?;
    COUNTRY_PROPERTIES
        .iter()
        .find_map(|key| props.get(*key).and_then(|v| v.as_str()))
}

fn process_feature<F>(feature: &Feature, add: &mut F)
where
    F: FnMut(LineString, Option<&str>),
{
    let country = feature_country(feature);
    if let Some(ref geometry) = feature.geometry {
        process_geometry_lines(geometry, &mut |line| add(line, country));
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    let to_line = |coords: &[Vec<f64>]| -> LineString {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse outline of Latin America for when no outline file is configured
pub fn generate_simple_outline(renderer: &mut MapRenderer) {
    // South America
    renderer.add_outline(
        vec![
            (-80.0, 10.0), (-75.0, 11.0), (-70.0, 12.0), (-60.0, 8.0),
            (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0),
            (-40.0, -22.0), (-48.0, -25.0), (-55.0, -34.0), (-58.0, -38.0),
            (-65.0, -42.0), (-68.0, -50.0), (-69.0, -55.0), (-75.0, -52.0),
            (-75.0, -45.0), (-73.0, -40.0), (-71.5, -30.0), (-70.0, -20.0),
            (-76.0, -14.0), (-81.0, -5.0), (-80.0, 0.0), (-77.0, 4.0),
            (-80.0, 10.0),
        ],
        None,
    );

    // Mexico and Central America
    renderer.add_outline(
        vec![
            (-117.0, 32.5), (-114.8, 32.5), (-111.0, 31.3), (-106.5, 31.8),
            (-103.0, 29.0), (-99.5, 27.0), (-97.1, 25.9), (-97.5, 22.0),
            (-96.0, 19.0), (-94.5, 18.2), (-91.0, 18.6), (-90.4, 21.0),
            (-87.0, 21.5), (-87.5, 18.0), (-88.5, 16.0), (-84.0, 15.8),
            (-83.2, 11.0), (-81.5, 9.0), (-77.5, 8.6), (-80.0, 7.3),
            (-85.7, 10.0), (-87.5, 13.0), (-91.5, 14.0), (-94.0, 16.0),
            (-98.0, 16.2), (-102.0, 18.0), (-105.5, 20.5), (-105.5, 23.0),
            (-109.0, 26.0), (-112.5, 29.5), (-114.8, 31.5),
        ],
        None,
    );

    // Baja California
    renderer.add_outline(
        vec![
            (-117.0, 32.5), (-116.0, 30.0), (-114.0, 28.0), (-112.5, 25.5),
            (-109.9, 22.9), (-110.5, 24.5), (-112.0, 27.0), (-114.8, 31.5),
        ],
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Viewport;

    #[test]
    fn test_load_tagged_outlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outlines.geojson");
        fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"ADMIN": "Argentina"},
                 "geometry": {"type": "Polygon", "coordinates": [[[-70, -20], [-60, -30], [-65, -40], [-70, -20]], [[-66, -30], [-65, -31], [-66, -30]]]}},
                {"type": "Feature", "properties": {"name": "Chile"},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[-75, -20], [-72, -40]], [[-73, -45], [-74, -50]]]}}
            ]}"#,
        )
        .unwrap();

        let mut renderer = MapRenderer::new();
        load_outlines(&mut renderer, &path).unwrap();
        assert!(renderer.has_outlines());

        let vp = Viewport::latin_america(80, 80);
        let layers = renderer.render(40, 20, &vp, Some("argentina"), None);
        assert!(!layers.highlight.is_blank());
        assert!(!layers.outlines.is_blank());
    }

    #[test]
    fn test_invalid_geojson_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.geojson");
        fs::write(&path, "not json").unwrap();
        let mut renderer = MapRenderer::new();
        let err = load_outlines(&mut renderer, &path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse outlines"));
    }

    #[test]
    fn test_simple_outline_is_drawn() {
        let mut renderer = MapRenderer::new();
        generate_simple_outline(&mut renderer);
        let vp = Viewport::latin_america(80, 80);
        let layers = renderer.render(40, 20, &vp, None, None);
        assert!(!layers.outlines.is_blank());
        assert!(layers.highlight.is_blank());
    }
}

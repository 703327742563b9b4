use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_marker};
use crate::map::projection::Viewport;
use crate::map::spatial::SpatialGrid;
use crate::normalize::route_key;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Cell size of the marker grid in degrees
const MARKER_CELL_DEGREES: f64 = 1.0;
/// Zoom above which every marker gets a name label
const LABEL_ZOOM: f64 = 6.0;

/// Border line, tagged with the route key of its country when known
struct Outline {
    country: Option<String>,
    line: LineString,
}

/// A unit drawn on the map at its centroid
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub key: String,
    pub name: String,
}

#[derive(Clone)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_markers: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_markers: true,
            show_labels: true,
        }
    }
}

/// One braille canvas per colour plus text labels in character coordinates
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    /// Border of the selected country
    pub highlight: BrailleCanvas,
    pub markers: BrailleCanvas,
    pub selected: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

/// Draws country outlines and unit markers
pub struct MapRenderer {
    outlines: Vec<Outline>,
    markers: SpatialGrid<Marker>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            outlines: Vec::new(),
            markers: SpatialGrid::new(MARKER_CELL_DEGREES),
            settings: DisplaySettings::default(),
        }
    }

    pub fn add_outline(&mut self, line: LineString, country: Option<&str>) {
        self.outlines.push(Outline {
            country: country.map(route_key),
            line,
        });
    }

    pub fn has_outlines(&self) -> bool {
        !self.outlines.is_empty()
    }

    /// Replace the marker set (the units of the level being browsed)
    pub fn set_markers(&mut self, markers: impl IntoIterator<Item = (f64, f64, Marker)>) {
        self.markers.clear();
        for (lon, lat, marker) in markers {
            self.markers.insert(lon, lat, marker);
        }
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Marker closest to a geographic point
    pub fn marker_at(&self, lon: f64, lat: f64, radius_degrees: f64) -> Option<&Marker> {
        self.markers.nearest(lon, lat, radius_degrees)
    }

    /// Render every layer for a `width` x `height` character area
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        country: Option<&str>,
        selected_key: Option<&str>,
    ) -> MapLayers {
        let mut layers = MapLayers {
            outlines: BrailleCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
            markers: BrailleCanvas::new(width, height),
            selected: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        };

        if self.settings.show_outlines {
            let country = country.map(route_key);
            for outline in &self.outlines {
                let canvas = if country.is_some() && outline.country == country {
                    &mut layers.highlight
                } else {
                    &mut layers.outlines
                };
                draw_linestring(canvas, &outline.line, viewport);
            }
        }

        if self.settings.show_markers {
            let radius = if viewport.zoom > 20.0 { 2 } else { 1 };
            for (lon, lat, marker) in self.markers.iter() {
                let (px, py) = viewport.project(lon, lat);
                if !viewport.is_visible(px, py) {
                    continue;
                }

                let is_selected = selected_key == Some(marker.key.as_str());
                if is_selected {
                    draw_marker(&mut layers.selected, px, py, 3);
                } else {
                    draw_circle(&mut layers.markers, px, py, radius);
                }

                let wants_label =
                    is_selected || (self.settings.show_labels && viewport.zoom >= LABEL_ZOOM);
                if wants_label && px >= 0 && py >= 0 {
                    let char_x = (px / 2) as u16;
                    let char_y = (py / 4) as u16;
                    if let Some(label_x) = char_x.checked_add(2) {
                        layers.labels.push((label_x, char_y, marker.name.clone()));
                    }
                }
            }
        }

        layers
    }

    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }

    pub fn toggle_markers(&mut self) {
        self.settings.show_markers = !self.settings.show_markers;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring, skipping segments that wrap across the screen or lie outside it
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width
                && viewport.line_might_be_visible((prev_x, prev_y), (px, py))
            {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

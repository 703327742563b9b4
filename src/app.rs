use chrono::Utc;
use desiertos::config::Config;
use desiertos::data::{Dataset, Level, Unit};
use desiertos::export;
use desiertos::map::{MapRenderer, Marker, Viewport};
use desiertos::route::{hash_path, share_url, PageMeta, Resolution, Resolver, Selection, UiState};
use desiertos::stats::comparison_peers;
use desiertos::stripplot::{build_panel, StripplotPanel};
use ratatui::layout::Rect;
use tracing::{info, warn};

use crate::ui;

/// Zoom used when a unit has a centroid but no bounding box
const UNIT_FOCUS_ZOOM: f64 = 12.0;
/// Pick radius around a click, in braille pixels
const PICK_RADIUS_PX: i32 = 6;

/// Which pane receives list keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Countries,
    Levels,
    Units,
    Categories,
    Map,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Countries,
        Focus::Levels,
        Focus::Units,
        Focus::Categories,
        Focus::Map,
    ];

    fn step(self, delta: isize) -> Focus {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }

    pub fn next(self) -> Focus {
        self.step(1)
    }

    pub fn prev(self) -> Focus {
        self.step(-1)
    }
}

/// Application state
pub struct App {
    pub dataset: Dataset,
    pub config: Config,
    pub state: UiState,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub focus: Focus,
    pub country_cursor: usize,
    pub level_cursor: usize,
    pub unit_cursor: usize,
    pub category_cursor: usize,
    /// Open stripplot popup
    pub popup: Option<StripplotPanel>,
    /// Route being typed after `:` or `#`
    pub prompt: Option<String>,
    /// Last feedback line for the status bar
    pub message: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    /// Map area inside its border, in terminal cells
    map_area: Rect,
}

impl App {
    pub fn new(dataset: Dataset, config: Config, width: u16, height: u16) -> Self {
        let map_area = ui::panes(Rect::new(0, 0, width, height)).map_inner();
        // Braille gives 2x4 resolution per character
        let viewport =
            Viewport::latin_america(map_area.width as usize * 2, map_area.height as usize * 4);

        Self {
            dataset,
            config,
            state: UiState::default(),
            viewport,
            map_renderer: MapRenderer::new(),
            focus: Focus::Countries,
            country_cursor: 0,
            level_cursor: 0,
            unit_cursor: 0,
            category_cursor: 0,
            popup: None,
            prompt: None,
            message: None,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            map_area,
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::panes(Rect::new(0, 0, width, height)).map_inner();
        self.viewport.width = self.map_area.width as usize * 2;
        self.viewport.height = self.map_area.height as usize * 4;
    }

    pub fn selection(&self) -> Option<Selection<'_>> {
        self.state.selection(&self.dataset)
    }

    pub fn country_keys(&self) -> Vec<&str> {
        self.dataset.country_keys().collect()
    }

    /// Units of the current country and level
    pub fn units(&self) -> &[Unit] {
        match (self.state.country.as_deref(), self.state.level) {
            (Some(country), Some(level)) => self
                .dataset
                .country(country)
                .map(|r| r.units(level))
                .unwrap_or_default(),
            _ => &[],
        }
    }

    /// Category menu: the selected unit's blocks, else the level's
    pub fn categories(&self) -> Vec<&str> {
        match self.selection() {
            Some(Selection {
                unit: Some(unit), ..
            }) => unit.category_keys().collect(),
            Some(sel) => sel.record.category_keys(sel.level),
            None => Vec::new(),
        }
    }

    pub fn hash(&self) -> Option<String> {
        self.selection().map(|sel| hash_path(&sel))
    }

    pub fn page_meta(&self) -> PageMeta {
        PageMeta::for_selection(self.selection().as_ref(), &self.config.site)
    }

    pub fn map_title(&self) -> String {
        match self.state.country.as_deref() {
            Some(country) => format!("Mapa: {}", self.config.site.country_name(country)),
            None => "Mapa".to_string(),
        }
    }

    /// Resolve a route and adopt the resulting state
    pub fn navigate(&mut self, path: &str) {
        let resolution = Resolver::new(&self.dataset).resolve(path);
        let note = match &resolution {
            Resolution::Resolved(Selection { unit: Some(u), .. }) => u.name().to_string(),
            Resolution::Resolved(sel) => format!("{} sin unidad", sel.level.label()),
            Resolution::Unchanged => format!("Ruta ignorada: {path}"),
            Resolution::CountryNotFound => format!("País desconocido: {path}"),
        };
        let next = self.state.apply(&resolution);

        if let Resolution::CountryNotFound | Resolution::Unchanged = resolution {
            warn!(path, "route not applied");
        }
        self.message = Some(note);
        if next != self.state {
            self.state = next;
            self.sync_selection();
        }
    }

    /// Align cursors, markers and viewport with `state`
    fn sync_selection(&mut self) {
        self.popup = None;
        let Some(sel) = self.state.selection(&self.dataset) else {
            self.map_renderer.set_markers(std::iter::empty());
            return;
        };

        self.country_cursor = self
            .dataset
            .country_keys()
            .position(|k| k == sel.country)
            .unwrap_or(0);
        self.level_cursor = Level::ALL.iter().position(|l| *l == sel.level).unwrap_or(0);

        let units = sel.level_units();
        self.unit_cursor = sel
            .unit
            .and_then(|u| units.iter().position(|x| x.key() == u.key()))
            .unwrap_or(0);
        self.category_cursor = 0;

        self.map_renderer.set_markers(units.iter().filter_map(|u| {
            let (lon, lat) = u.centroid()?;
            Some((
                lon,
                lat,
                Marker {
                    key: u.key().to_string(),
                    name: u.name().to_string(),
                },
            ))
        }));

        match sel.unit {
            Some(unit) => fit_unit(&mut self.viewport, unit),
            None => fit_units(&mut self.viewport, units),
        }
    }

    pub fn select_country(&mut self, idx: usize) {
        let country = self.dataset.country_keys().nth(idx).map(str::to_string);
        if let Some(country) = country {
            self.navigate(&format!("/{country}"));
        }
    }

    /// Switch level within the current country; the unit is cleared
    pub fn select_level(&mut self, idx: usize) {
        let (Some(level), Some(country)) = (Level::ALL.get(idx).copied(), self.state.country.clone())
        else {
            return;
        };
        if level == Level::Country {
            self.navigate(&format!("/{country}"));
            return;
        }
        self.state = UiState {
            country: Some(country),
            level: Some(level),
            unit_key: None,
        };
        self.message = Some(level.label().to_string());
        self.sync_selection();
    }

    /// Select a unit of the current level by emitting its route
    pub fn select_unit(&mut self, idx: usize) {
        let path = self.selection().and_then(|sel| {
            let unit = sel.level_units().get(idx)?;
            Some(hash_path(&Selection {
                unit: Some(unit),
                ..sel
            }))
        });
        if let Some(path) = path {
            self.navigate(&path);
        }
    }

    /// Open the stripplot popup for the category under the cursor
    pub fn open_category(&mut self) {
        let panel = self.selection().and_then(|sel| {
            let unit = sel.unit?;
            let category = *self.categories().get(self.category_cursor)?;
            Some(build_panel(sel.level, sel.level_units(), unit, category))
        });
        match panel {
            Some(panel) => {
                info!(category = %panel.category, unit = %panel.unit_key, "opened stripplot");
                self.popup = Some(panel);
            }
            None => self.message = Some("Elige una unidad primero".to_string()),
        }
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn export_csv(&mut self) {
        let (Some(panel), Some(sel)) = (&self.popup, self.selection()) else {
            return;
        };
        let Some(unit) = sel.unit else {
            return;
        };
        let peers = comparison_peers(sel.level, sel.level_units(), unit);
        let result = export::export_csv(
            &self.config.export.dir,
            &panel.category,
            unit,
            &peers,
            Utc::now().date_naive(),
        );
        self.message = Some(match result {
            Ok(path) => format!("CSV: {}", path.display()),
            Err(e) => format!("Error: {e:#}"),
        });
    }

    pub fn export_svg(&mut self) {
        let (Some(panel), Some(Selection { unit: Some(unit), .. })) = (&self.popup, self.selection())
        else {
            return;
        };
        let result = export::export_svg(&self.config.export.dir, panel, unit, Utc::now().date_naive());
        self.message = Some(match result {
            Ok(path) => format!("SVG: {}", path.display()),
            Err(e) => format!("Error: {e:#}"),
        });
    }

    pub fn share(&mut self) {
        let url = share_url(&self.config.site, self.selection().as_ref());
        info!(%url, "share url");
        self.message = Some(url);
    }

    pub fn open_prompt(&mut self) {
        self.prompt = Some(String::new());
    }

    pub fn submit_prompt(&mut self) {
        if let Some(path) = self.prompt.take() {
            self.navigate(&path);
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    fn list_len(&self) -> usize {
        match self.focus {
            Focus::Countries => self.dataset.len(),
            Focus::Levels => Level::ALL.len(),
            Focus::Units => self.units().len(),
            Focus::Categories => self.categories().len(),
            Focus::Map => 0,
        }
    }

    /// Move the cursor of the focused list
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.list_len();
        let cursor = match self.focus {
            Focus::Countries => &mut self.country_cursor,
            Focus::Levels => &mut self.level_cursor,
            Focus::Units => &mut self.unit_cursor,
            Focus::Categories => &mut self.category_cursor,
            Focus::Map => return,
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    /// Enter on the focused list
    pub fn activate(&mut self) {
        match self.focus {
            Focus::Countries => self.select_country(self.country_cursor),
            Focus::Levels => self.select_level(self.level_cursor),
            Focus::Units => self.select_unit(self.unit_cursor),
            Focus::Categories => self.open_category(),
            Focus::Map => {}
        }
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Terminal cell to braille pixel inside the map, if the cell is on the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        Some((((col - area.x) as i32) * 2, ((row - area.y) as i32) * 4))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Frame the current selection again, or the whole region
    pub fn reset_view(&mut self) {
        match self.state.selection(&self.dataset) {
            Some(Selection { unit: Some(unit), .. }) => fit_unit(&mut self.viewport, unit),
            Some(sel) => fit_units(&mut self.viewport, sel.level_units()),
            None => {
                self.viewport =
                    Viewport::latin_america(self.viewport.width, self.viewport.height);
            }
        }
    }

    pub fn start_drag(&mut self, x: u16, y: u16) {
        self.last_mouse = Some((x, y));
        self.dragged = false;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
            self.dragged = true;
        }
        self.last_mouse = Some((x, y));
    }

    /// Button released: a press without drag is a click
    pub fn end_drag(&mut self, x: u16, y: u16) {
        if self.last_mouse.is_some() && !self.dragged {
            self.pick_at(x, y);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    /// Select the unit whose marker is nearest to a screen cell
    pub fn pick_at(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.map_pixel(col, row) else {
            return;
        };
        let (lon, lat) = self.viewport.unproject(px, py);
        let (edge_lon, _) = self.viewport.unproject(px + PICK_RADIUS_PX, py);
        let radius = (edge_lon - lon).abs();

        let idx = self.map_renderer.marker_at(lon, lat, radius).and_then(|marker| {
            self.units().iter().position(|u| u.key() == marker.key)
        });
        if let Some(idx) = idx {
            self.focus = Focus::Units;
            self.select_unit(idx);
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

fn fit_unit(viewport: &mut Viewport, unit: &Unit) {
    if let Some((min_lon, min_lat, max_lon, max_lat)) = unit.bbox() {
        viewport.fit_bounds(min_lon, min_lat, max_lon, max_lat);
    } else if let Some((lon, lat)) = unit.centroid() {
        viewport.focus(lon, lat, UNIT_FOCUS_ZOOM);
    }
}

/// Frame every centroid and bounding box of a unit list
fn fit_units(viewport: &mut Viewport, units: &[Unit]) {
    let points = units.iter().flat_map(|u| {
        let bbox = u
            .bbox()
            .map(|(x0, y0, x1, y1)| [(x0, y0), (x1, y1)])
            .into_iter()
            .flatten();
        u.centroid().into_iter().chain(bbox)
    });

    let bounds = points.fold(None, |acc: Option<(f64, f64, f64, f64)>, (lon, lat)| {
        Some(match acc {
            None => (lon, lat, lon, lat),
            Some((x0, y0, x1, y1)) => (x0.min(lon), y0.min(lat), x1.max(lon), y1.max(lat)),
        })
    });

    if let Some((min_lon, min_lat, max_lon, max_lat)) = bounds {
        if min_lon == max_lon && min_lat == max_lat {
            viewport.focus(min_lon, min_lat, UNIT_FOCUS_ZOOM);
        } else {
            viewport.fit_bounds(min_lon, min_lat, max_lon, max_lat);
        }
    }
}

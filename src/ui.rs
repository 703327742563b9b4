use crate::app::{App, Focus};
use desiertos::braille::BrailleCanvas;
use desiertos::data::Level;
use desiertos::labels;
use desiertos::map::MapLayers;
use desiertos::stripplot::{Anchor, Scale, Stripplot, StripplotPanel};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Widget},
    Frame,
};

const PEER_COLOR: Color = Color::Gray;
const SELECTED_COLOR: Color = Color::Red;
const TOTAL_COLOR: Color = Color::Cyan;

/// Screen regions, shared with the app so mouse input maps onto the same layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub countries: Rect,
    pub levels: Rect,
    pub units: Rect,
    pub map: Rect,
    pub menu: Rect,
    pub status: Rect,
}

impl Panes {
    /// Map area inside its border
    pub fn map_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.map)
    }
}

pub fn panes(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Lists, map, menu
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(28),
            Constraint::Min(20),
            Constraint::Length(34),
        ])
        .split(rows[0]);

    let lists = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Min(3),
        ])
        .split(columns[0]);

    Panes {
        countries: lists[0],
        levels: lists[1],
        units: lists[2],
        map: columns[1],
        menu: columns[2],
        status: rows[1],
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let panes = panes(frame.area());

    render_lists(frame, app, &panes);
    render_map(frame, app, panes.map);
    render_menu(frame, app, panes.menu);
    render_status_bar(frame, app, panes.status);

    if let Some(panel) = &app.popup {
        let area = centered(frame.area(), 80, 85);
        frame.render_widget(Clear, area);
        frame.render_widget(PanelWidget { panel }, area);
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// A list where `current` is the active selection and `cursor` the keyboard position
fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<String>,
    current: Option<usize>,
    cursor: usize,
    focused: bool,
) {
    let items: Vec<ListItem> = items
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let style = if Some(i) == current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let highlight = if focused {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(pane_block(title, focused))
        .highlight_style(highlight)
        .highlight_symbol("› ");

    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_lists(frame: &mut Frame, app: &App, panes: &Panes) {
    let countries = app.country_keys();
    let current_country = app
        .state
        .country
        .as_deref()
        .and_then(|c| countries.iter().position(|k| *k == c));
    let country_names = countries
        .iter()
        .map(|k| app.config.site.country_name(k))
        .collect();
    render_list(
        frame,
        panes.countries,
        "País",
        country_names,
        current_country,
        app.country_cursor,
        app.focus == Focus::Countries,
    );

    let current_level = app
        .state
        .level
        .and_then(|l| Level::ALL.iter().position(|x| *x == l));
    render_list(
        frame,
        panes.levels,
        "Nivel",
        Level::ALL.iter().map(|l| l.label().to_string()).collect(),
        current_level,
        app.level_cursor,
        app.focus == Focus::Levels,
    );

    let level = app.state.level.unwrap_or(Level::Country);
    let units = app.units();
    let current_unit = app
        .state
        .unit_key
        .as_deref()
        .and_then(|key| units.iter().position(|u| u.key() == key));
    render_list(
        frame,
        panes.units,
        "Unidad",
        units.iter().map(|u| u.display_name(level)).collect(),
        current_unit,
        app.unit_cursor,
        app.focus == Focus::Units,
    );
}

fn render_menu(frame: &mut Frame, app: &App, area: Rect) {
    let items = app
        .categories()
        .iter()
        .map(|key| labels::title(key).to_string())
        .collect();
    render_list(
        frame,
        area,
        "Categorías",
        items,
        None,
        app.category_cursor,
        app.focus == Focus::Categories,
    );
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.map_title();
    let block = pane_block(&title, app.focus == Focus::Map);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        app.state.country.as_deref(),
        app.state.unit_key.as_deref(),
    );

    frame.render_widget(MapWidget { layers }, inner);
}

/// Draw every non-blank braille cell of a canvas in one colour
fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (row_idx, row_str) in canvas.rows().enumerate() {
        if row_idx >= area.height as usize {
            break;
        }
        let y = area.y + row_idx as u16;

        for (col_idx, ch) in row_str.chars().enumerate() {
            if col_idx >= area.width as usize {
                break;
            }
            // Skip empty braille characters (U+2800)
            if ch == '\u{2800}' {
                continue;
            }
            let x = area.x + col_idx as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

/// Write text clipped to the area's right edge
fn put_str(buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: Style) {
    if y >= area.y + area.height {
        return;
    }
    for (i, ch) in text.chars().enumerate() {
        let px = x + i as u16;
        if px >= area.x + area.width {
            break;
        }
        buf[(px, y)].set_char(ch).set_style(style);
    }
}

/// Braille map with marker labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        render_layer(&self.layers.outlines, Color::DarkGray, area, buf);
        render_layer(&self.layers.highlight, Color::Cyan, area, buf);
        render_layer(&self.layers.markers, Color::Yellow, area, buf);
        render_layer(&self.layers.selected, SELECTED_COLOR, area, buf);

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let label: String = text.chars().take(24).collect();
            put_str(buf, area, area.x + *lx, area.y + *ly, &label, label_style);
        }
    }
}

/// Stripplot popup: title, subtitle, legend, then one braille track per variable
struct PanelWidget<'a> {
    panel: &'a StripplotPanel,
}

/// Rows used by one strip: title, annotations, two braille rows, axis
const STRIP_ROWS: u16 = 5;

impl PanelWidget<'_> {
    fn render_strip(&self, plot: &Stripplot, area: Rect, buf: &mut Buffer) {
        let width = area.width as usize;
        let pixels = width * 2;
        if pixels < 4 {
            return;
        }
        let scale = Scale {
            domain: (0.0, 1.0),
            range: (1.0, (pixels - 2) as f64),
        };
        let column = |value: f64| (scale.map(value.clamp(0.0, 1.0)).round() as u16) / 2;

        put_str(
            buf,
            area,
            area.x,
            area.y,
            &plot.title,
            Style::default().add_modifier(Modifier::BOLD),
        );

        // Annotations
        let mut annotate = |value: f64, label: String, anchor: Anchor, color: Color| {
            let len = label.chars().count() as u16;
            let col = column(value);
            let start = match anchor {
                Anchor::Start => col,
                Anchor::Middle => col.saturating_sub(len / 2),
                Anchor::End => (col + 1).saturating_sub(len),
            };
            put_str(buf, area, area.x + start, area.y + 1, &label, Style::default().fg(color));
        };
        if let (Some(value), Some(label)) = (plot.selected, plot.selected_label()) {
            annotate(value, label, plot.selected_anchor, SELECTED_COLOR);
        }
        if let (Some(total), Some(label)) = (plot.total, plot.total_label()) {
            annotate(total.pct, label, plot.total_anchor, TOTAL_COLOR);
        }

        // Tracks
        let track = Rect::new(area.x, area.y + 2, area.width, 2);
        let tick = |value: f64| {
            let mut canvas = BrailleCanvas::new(width, 2);
            let x = scale.map(value.clamp(0.0, 1.0)).round() as usize;
            for y in 0..8 {
                canvas.set_pixel(x, y);
            }
            canvas
        };
        let mut peers = BrailleCanvas::new(width, 2);
        for peer in &plot.peers {
            let x = scale.map(peer.value.clamp(0.0, 1.0)).round() as usize;
            for y in 1..7 {
                peers.set_pixel(x, y);
            }
        }
        render_layer(&peers, PEER_COLOR, track, buf);
        if let Some(total) = plot.total {
            render_layer(&tick(total.pct), TOTAL_COLOR, track, buf);
        }
        if let Some(value) = plot.selected {
            render_layer(&tick(value), SELECTED_COLOR, track, buf);
        }

        let axis = Style::default().fg(Color::DarkGray);
        put_str(buf, area, area.x, area.y + 4, "0%", axis);
        put_str(buf, area, (area.x + area.width).saturating_sub(4), area.y + 4, "100%", axis);
    }
}

impl Widget for PanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(Span::styled(
                format!(" {} ", self.panel.title),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .title_bottom(" e: CSV  i: SVG  s: compartir  Esc: cerrar ");
        let inner = block.inner(area);
        block.render(area, buf);

        let mut y = inner.y;
        if !self.panel.subtitle.is_empty() {
            put_str(buf, inner, inner.x, y, &self.panel.subtitle, Style::default());
            y += 1;
        }

        let mut legend = vec![Span::styled(
            format!("■ {}", self.panel.legend.selected),
            Style::default().fg(SELECTED_COLOR),
        )];
        if let Some(peers) = &self.panel.legend.peers {
            legend.push(Span::raw("   "));
            legend.push(Span::styled(format!("■ {peers}"), Style::default().fg(TOTAL_COLOR)));
        }
        if y < inner.y + inner.height {
            Line::from(legend).render(Rect::new(inner.x, y, inner.width, 1), buf);
        }
        y += 2;

        if self.panel.plots.is_empty() {
            put_str(buf, inner, inner.x, y, "Sin variables para esta categoría", Style::default());
            return;
        }

        for plot in &self.panel.plots {
            if y + STRIP_ROWS > inner.y + inner.height {
                break;
            }
            self.render_strip(plot, Rect::new(inner.x, y, inner.width, STRIP_ROWS), buf);
            y += STRIP_ROWS + 1;
        }
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let line = if let Some(input) = &app.prompt {
        Line::from(vec![
            Span::styled(" ruta: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{input}_")),
            Span::styled("  Enter: ir  Esc: cancelar", dim),
        ])
    } else {
        let mut spans = vec![
            Span::styled(" ", dim),
            Span::styled(
                app.hash().unwrap_or_else(|| "/".to_string()),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(" | ", dim),
            Span::styled(app.page_meta().title, Style::default().fg(Color::Cyan)),
            Span::styled(" | ", dim),
            Span::styled(app.zoom_level(), Style::default().fg(Color::Magenta)),
            Span::styled(" ", dim),
            Span::styled(app.center_coords(), dim),
        ];
        if let Some(message) = &app.message {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
        }
        spans.push(Span::styled(
            " | Tab:foco Enter:elegir ::ruta s:compartir +/-:zoom r:reset b/m/L:capas q:salir",
            dim,
        ));
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

mod app;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use app::{App, Focus};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use desiertos::config::Config;
use desiertos::data::{self, Dataset, Unit};
use desiertos::export;
use desiertos::logging::{init_logging, LogTarget};
use desiertos::route::{hash_path, static_filename, PageMeta, Resolution, Resolver, Selection};
use desiertos::site;
use desiertos::stats::comparison_peers;
use desiertos::stripplot::build_panel;
use ratatui::DefaultTerminal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "desiertos", version, about = "Explore the local news deserts dataset")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dataset JSON, overrides the configured path
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the terminal explorer, optionally at a route
    View { route: Option<String> },
    /// Print what a route resolves to
    Resolve { path: String },
    /// Generate static share pages
    Pages {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate narrative pages for regions
    Narratives {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export a category's absolute values as CSV
    Csv {
        route: String,
        category: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export a category's stripplots as SVG
    Svg {
        route: String,
        category: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data.dataset = data;
    }
    let command = cli.command.unwrap_or(Command::View { route: None });

    let target = match command {
        Command::View { .. } => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    let _guard = init_logging(&config.log, target)?;

    let result = dispatch(command, config);
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

fn dispatch(command: Command, mut config: Config) -> Result<()> {
    let dataset = load_dataset(&config.data.dataset)?;

    match command {
        Command::View { route } => view(dataset, config, route),
        Command::Resolve { path } => {
            resolve(&dataset, &config, &path);
            Ok(())
        }
        Command::Pages { out } => {
            let out = out.unwrap_or_else(|| config.site.pages_dir.clone());
            let report = site::write_share_pages(&dataset, &config.site, &out)?;
            println!("{} pages written to {}", report.pages, report.dir.display());
            Ok(())
        }
        Command::Narratives { out } => {
            let out = out.unwrap_or_else(|| config.narrative.output_dir.clone());
            let report =
                site::write_narrative_pages(&dataset, &config.site, &config.narrative, &out)?;
            println!("{} pages written to {}", report.pages, report.dir.display());
            Ok(())
        }
        Command::Csv {
            route,
            category,
            out,
        } => {
            if let Some(out) = out {
                config.export.dir = out;
            }
            let sel = selected_unit(&dataset, &route)?;
            let unit = sel.unit.context("Route selects no unit")?;
            check_category(unit, &category)?;
            let peers = comparison_peers(sel.level, sel.level_units(), unit);
            let path = export::export_csv(
                &config.export.dir,
                &category,
                unit,
                &peers,
                Utc::now().date_naive(),
            )?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Svg {
            route,
            category,
            out,
        } => {
            if let Some(out) = out {
                config.export.dir = out;
            }
            let sel = selected_unit(&dataset, &route)?;
            let unit = sel.unit.context("Route selects no unit")?;
            check_category(unit, &category)?;
            let panel = build_panel(sel.level, sel.level_units(), unit, &category);
            let path =
                export::export_svg(&config.export.dir, &panel, unit, Utc::now().date_naive())?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    data::load_dataset(path)
        .with_context(|| format!("Failed to load dataset {}", path.display()))
}

fn selected_unit<'a>(dataset: &'a Dataset, route: &str) -> Result<Selection<'a>> {
    match Resolver::new(dataset).resolve(route) {
        Resolution::Resolved(sel) => Ok(sel),
        Resolution::Unchanged => bail!("Route {route:?} selects nothing"),
        Resolution::CountryNotFound => bail!("Unknown country in route {route:?}"),
    }
}

fn check_category(unit: &Unit, category: &str) -> Result<()> {
    if unit.category(category).is_none() {
        bail!("{} has no category {category}", unit.name());
    }
    Ok(())
}

fn resolve(dataset: &Dataset, config: &Config, path: &str) {
    let resolution = Resolver::new(dataset).resolve(path);
    let sel = match &resolution {
        Resolution::Resolved(sel) => Some(sel),
        Resolution::Unchanged => {
            println!("unchanged");
            None
        }
        Resolution::CountryNotFound => {
            println!("country not found");
            None
        }
    };
    let meta = PageMeta::for_selection(sel, &config.site);

    if let Some(sel) = sel {
        println!("country:     {}", sel.country);
        println!("level:       {}", sel.level);
        match sel.unit {
            Some(unit) => println!("unit:        {} ({})", unit.name(), unit.key()),
            None => println!("unit:        -"),
        }
        println!("hash:        #{}", hash_path(sel));
        println!("page:        {}", static_filename(sel.country, sel.level, sel.unit));
    }
    println!("title:       {}", meta.title);
    println!("description: {}", meta.description);
}

fn view(dataset: Dataset, config: Config, route: Option<String>) -> Result<()> {
    let outlines = config.data.outlines.clone();

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(dataset, config, size.width, size.height);

    let loaded = match &outlines {
        Some(path) => match data::load_outlines(&mut app.map_renderer, path) {
            Ok(()) => true,
            Err(e) => {
                error!("{e:#}");
                false
            }
        },
        None => false,
    };
    if !loaded || !app.map_renderer.has_outlines() {
        data::generate_simple_outline(&mut app.map_renderer);
    }

    if let Some(route) = route {
        app.navigate(&route);
    }
    info!("terminal ui started");

    let result = run(&mut terminal, &mut app);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Route prompt swallows everything until Enter or Esc
    if let Some(prompt) = app.prompt.as_mut() {
        match key.code {
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Esc => app.prompt = None,
            KeyCode::Backspace => {
                prompt.pop();
            }
            KeyCode::Char(c) => prompt.push(c),
            _ => {}
        }
        return;
    }

    if app.popup.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => app.close_popup(),
            KeyCode::Char('e') => app.export_csv(),
            KeyCode::Char('i') => app.export_svg(),
            KeyCode::Char('s') => app.share(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Char(':') | KeyCode::Char('#') => app.open_prompt(),
        KeyCode::Enter => app.activate(),
        KeyCode::Char('s') => app.share(),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_outlines(),
        KeyCode::Char('m') | KeyCode::Char('M') => app.map_renderer.toggle_markers(),
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),

        // Pan with hjkl or arrow keys on the map, otherwise walk the list
        KeyCode::Left | KeyCode::Char('h') if app.focus == Focus::Map => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') if app.focus == Focus::Map => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') if app.focus == Focus::Map => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') if app.focus == Focus::Map => app.pan(0, 6),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::PageDown => app.move_cursor(10),

        _ => {}
    }
}

/// Handle mouse events for panning, zooming and picking
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan, click without drag to pick
        MouseEventKind::Down(MouseButton::Left) => app.start_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

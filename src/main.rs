use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use disaster_overview::app::App;
use disaster_overview::config::{Cli, Preferences};
use disaster_overview::map::MapRenderer;
use disaster_overview::{data, logging, ui};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_path()) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let preferences = load_preferences(&cli)?;
    let renderer = load_map(&cli);

    // Initialize terminal
    let mut terminal = ratatui::init();
    let result = execute!(std::io::stdout(), EnableMouseCapture)
        .context("enabling mouse capture")
        .and_then(|_| run(&mut terminal, &cli, renderer, preferences));

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Stored preferences with any `--language` override applied and saved
fn load_preferences(cli: &Cli) -> Result<Preferences> {
    let path = cli.preferences_path();
    let mut preferences = Preferences::load_or_default(&path);

    if let Some(language) = &cli.language {
        preferences.set_language(language)?;
        if let Err(e) = preferences.save(&path) {
            warn!(error = %e, "could not save preferences");
        }
    }
    Ok(preferences)
}

fn load_map(cli: &Cli) -> MapRenderer {
    let mut renderer = MapRenderer::new();
    if cli.data_dir.exists() {
        let loaded = data::load_all_geojson(&mut renderer, &cli.data_dir);
        info!(files = loaded, dir = %cli.data_dir.display(), "map data loaded");
    }

    // Fall back to simple world if no data loaded
    if !renderer.has_data() {
        info!("no coastline data, using built-in outline");
        data::generate_simple_world(&mut renderer);
    }
    renderer
}

/// Handle mouse events for selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll(mouse.column, mouse.row, true),
        MouseEventKind::ScrollDown => app.scroll(mouse.column, mouse.row, false),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc | KeyCode::Char('x') => app.clear_selection(),
        KeyCode::Tab => app.cycle_focus(),

        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Left | KeyCode::Char('h') => app.horizontal(-1),
        KeyCode::Right | KeyCode::Char('l') => app.horizontal(1),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate(),
        KeyCode::Char('o') => app.toggle_at_cursor(),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_projection(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),
        KeyCode::Char('R') => app.refresh(Utc::now()),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map.borrow_mut().renderer.toggle_borders(),
        KeyCode::Char('p') | KeyCode::Char('P') => app.map.borrow_mut().renderer.toggle_points(),
        KeyCode::Char('L') => app.map.borrow_mut().renderer.toggle_labels(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, cli: &Cli, renderer: MapRenderer, preferences: Preferences) -> Result<()> {
    terminal.clear()?;
    let size = terminal.size()?;
    let mut app = App::new(
        renderer,
        preferences.preferred_language,
        size.width,
        size.height,
        Instant::now(),
    )?;
    if cli.globe {
        app.toggle_projection();
    }
    info!(language = %app.language, "dashboard started");

    // Main loop
    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("dashboard closed");
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use pick_the_appliance::app::App;
use pick_the_appliance::config::{Args, GameConfig};
use pick_the_appliance::game::{default_stations, RoundController};
use pick_the_appliance::{data, logging, ui};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args)?;

    let config = GameConfig::from(&args);
    let controller = RoundController::from_config(default_stations(), config.clone())
        .context("setting up the game")?;
    info!(rounds = config.max_rounds, seed = ?config.seed, "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &args, &config, controller);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events: clicks pick stations, drag pans, wheel zooms
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    // A modal alert takes the keyboard until it is dismissed
    if app.alert().is_some() {
        match code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Esc => app.dismiss_alert(),
            KeyCode::Char('q') => app.quit(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pick a station by its legend number
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.pick_station(index);
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('f') | KeyCode::Char('0') => app.refit(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.restart(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map.toggle_basemap(),
        KeyCode::Char('L') => app.map.toggle_labels(),

        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    args: &Args,
    config: &GameConfig,
    controller: RoundController,
) -> Result<()> {
    let size = terminal.size()?;
    let loader = data::spawn_loader(args.basemap.clone());
    let mut app = App::new(size.width, size.height, controller, loader, config.startup_timeout);

    // Main loop
    loop {
        app.poll_startup(Instant::now());

        // Draw
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

    info!(score = app.controller.score(), rounds = app.controller.history().len(), "exiting");
    Ok(())
}

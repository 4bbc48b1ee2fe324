use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use tracing::{error, info};

use crate::data::MapEvent;
use crate::error::GameError;
use crate::game::{GameEvent, Phase, RoundController};
use crate::map::{MapRenderer, Viewport};
use crate::ui;

/// A modal message. Fatal alerts end the program when dismissed.
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub text: String,
    pub fatal: bool,
}

/// Where startup is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Startup {
    /// Waiting for the loader, gives up at the deadline
    Loading,
    Ready,
    Failed,
}

/// Application state
pub struct App {
    pub map: MapRenderer,
    pub controller: RoundController,
    pub startup: Startup,
    pub status: String,
    pub alerts: VecDeque<Alert>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current left-button press has moved (a drag, not a click)
    dragged: bool,
    /// Inner map rectangle in terminal cells
    map_area: Rect,
    loader: Option<Receiver<MapEvent>>,
    startup_timeout: Duration,
    deadline: Instant,
}

impl App {
    pub fn new(
        width: u16,
        height: u16,
        controller: RoundController,
        loader: Receiver<MapEvent>,
        startup_timeout: Duration,
    ) -> Self {
        let mut app = Self {
            map: MapRenderer::new(Viewport::world(0, 0)),
            controller,
            startup: Startup::Loading,
            status: "Loading map...".to_string(),
            alerts: VecDeque::new(),
            should_quit: false,
            last_mouse: None,
            dragged: false,
            map_area: Rect::default(),
            loader: Some(loader),
            startup_timeout,
            deadline: Instant::now() + startup_timeout,
        };
        app.resize(width, height);
        app
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_area = ui::map_inner(Rect::new(0, 0, width, height));
        // Braille gives 2x4 resolution per character
        self.map
            .resize(self.map_area.width as usize * 2, self.map_area.height as usize * 4);
    }

    pub fn map_area(&self) -> Rect {
        self.map_area
    }

    /// Check on the map loader; starts the first round once it is ready
    pub fn poll_startup(&mut self, now: Instant) {
        let Some(loader) = &self.loader else {
            return;
        };

        match loader.try_recv() {
            Ok(MapEvent::Ready(lines)) => {
                self.loader = None;
                self.map.basemap = lines;
                self.startup = Startup::Ready;
                info!(basemap_lines = self.map.basemap.len(), "map ready");
                let events = self.controller.start_round(&mut self.map);
                self.apply(events);
            }
            Ok(MapEvent::Failed(reason)) => self.fail(GameError::MapInit(reason)),
            Err(TryRecvError::Disconnected) => {
                self.fail(GameError::MapInit("map loader stopped unexpectedly".into()))
            }
            Err(TryRecvError::Empty) if now >= self.deadline => {
                self.fail(GameError::MapNotReady(self.startup_timeout))
            }
            Err(TryRecvError::Empty) => {}
        }
    }

    fn fail(&mut self, err: GameError) {
        error!(error = %err, "startup failed");
        self.loader = None;
        self.startup = Startup::Failed;
        self.status = err.to_string();
        self.alerts.push_back(Alert {
            text: err.to_string(),
            fatal: true,
        });
    }

    /// Route controller events to the status line and alert queue
    fn apply(&mut self, events: Vec<GameEvent>) {
        for event in events {
            if let Some(status) = event.status() {
                self.status = status;
            }
            if let Some(text) = event.alert() {
                self.alerts.push_back(Alert { text, fatal: false });
            }
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    /// Close the current alert
    pub fn dismiss_alert(&mut self) {
        if let Some(alert) = self.alerts.pop_front() {
            if alert.fatal {
                self.quit();
            }
        }
    }

    /// Pick a station by index. Ignored while an alert is up.
    pub fn pick_station(&mut self, index: usize) {
        if self.alert().is_some() || self.startup != Startup::Ready {
            return;
        }
        let events = self.controller.handle_station_click(&mut self.map, index);
        self.apply(events);
    }

    /// Left click at terminal cell (col, row)
    pub fn click(&mut self, col: u16, row: u16) {
        if self.alert().is_some() {
            self.dismiss_alert();
            return;
        }
        if let Some((cx, cy)) = self.to_map_cell(col, row) {
            if let Some(index) = self.map.hit_test(cx, cy) {
                self.pick_station(index);
            }
        }
    }

    /// Start a new game after the current one
    pub fn restart(&mut self) {
        if self.startup != Startup::Ready {
            return;
        }
        self.alerts.clear();
        let events = self.controller.restart(&mut self.map);
        self.apply(events);
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn is_game_over(&self) -> bool {
        self.controller.phase() == Phase::GameOver
    }

    pub fn score_text(&self) -> String {
        format!("Score: {}", self.controller.score())
    }

    pub fn round_text(&self) -> String {
        match self.controller.round() {
            0 => "Round -".to_string(),
            n => format!("Round {}/{}", n, self.controller.max_rounds()),
        }
    }

    /// Terminal cell to a cell inside the map area
    fn to_map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let area = self.map_area;
        let inside = col >= area.x
            && col < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| (col - area.x, row - area.y))
    }

    /// Terminal cell to Braille pixel coords in the map area
    fn to_map_pixel(&self, col: u16, row: u16) -> (i32, i32) {
        let px = (col.saturating_sub(self.map_area.x) as i32) * 2;
        let py = (row.saturating_sub(self.map_area.y) as i32) * 4;
        (px, py)
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.to_map_pixel(col, row);
        self.map.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = self.to_map_pixel(col, row);
        self.map.viewport.zoom_out_at(px, py);
    }

    /// Back to the view of the current round's markers
    pub fn refit(&mut self) {
        self.map.refit();
    }

    /// Left button pressed
    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag: pans the map
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
            }
            // One cell is 2x4 Braille pixels
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Left button released: a press without a drag is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let was_click = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if was_click {
            self.click(col, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::data::builtin_outline;
    use crate::game::default_stations;
    use crate::map::MarkerKind;
    use std::sync::mpsc;

    fn controller(rounds: u32) -> RoundController {
        RoundController::from_config(
            default_stations(),
            GameConfig {
                max_rounds: rounds,
                seed: Some(99),
                ..GameConfig::default()
            },
        )
        .unwrap()
    }

    fn ready_app(rounds: u32) -> App {
        let (tx, rx) = mpsc::channel();
        tx.send(MapEvent::Ready(builtin_outline())).unwrap();
        let mut app = App::new(120, 40, controller(rounds), rx, Duration::from_millis(1500));
        app.poll_startup(Instant::now());
        app
    }

    /// Terminal cell of a station marker
    fn station_cell(app: &App, index: usize) -> (u16, u16) {
        let marker = app
            .map
            .markers()
            .iter()
            .find(|m| m.kind == MarkerKind::Station(index))
            .unwrap();
        let (px, py) = app.map.viewport.project_point(marker.pos);
        let area = app.map_area();
        (area.x + (px / 2) as u16, area.y + (py / 4) as u16)
    }

    #[test]
    fn test_ready_starts_first_round() {
        let app = ready_app(5);
        assert_eq!(app.startup, Startup::Ready);
        assert_eq!(app.controller.phase(), Phase::AwaitingFirstPick);
        assert!(app.status.starts_with("Round 1/5"));
        assert!(app.alert().is_none());
        assert!(app.map.has_data());
        assert_eq!(app.round_text(), "Round 1/5");
    }

    #[test]
    fn test_timeout_is_fatal() {
        let (_tx, rx) = mpsc::channel();
        let mut app = App::new(120, 40, controller(5), rx, Duration::from_millis(1500));
        app.poll_startup(Instant::now());
        assert_eq!(app.startup, Startup::Loading);

        app.poll_startup(Instant::now() + Duration::from_secs(2));
        assert_eq!(app.startup, Startup::Failed);
        let alert = app.alert().unwrap().clone();
        assert!(alert.fatal);
        assert!(alert.text.contains("not ready"));

        // nothing to play, and dismissing exits
        app.pick_station(0);
        assert_eq!(app.controller.phase(), Phase::NotStarted);
        app.dismiss_alert();
        assert!(app.should_quit);
    }

    #[test]
    fn test_loader_failure_is_fatal() {
        let (tx, rx) = mpsc::channel();
        tx.send(MapEvent::Failed("bad basemap".into())).unwrap();
        let mut app = App::new(120, 40, controller(5), rx, Duration::from_millis(1500));
        app.poll_startup(Instant::now());
        assert_eq!(app.startup, Startup::Failed);
        assert_eq!(
            app.alert().unwrap().text,
            "map failed to initialize: bad basemap"
        );
        app.click(0, 0);
        assert!(app.should_quit);
    }

    #[test]
    fn test_keyboard_round() {
        let mut app = ready_app(5);
        app.pick_station(0);
        assert_eq!(app.controller.state().selections.len(), 1);
        assert!(app.alert().unwrap().text.starts_with("Selected"));

        // blocked until the alert is dismissed
        app.pick_station(1);
        assert_eq!(app.controller.state().selections.len(), 1);

        app.dismiss_alert();
        app.pick_station(1);
        assert_eq!(app.controller.round(), 2);
        assert_eq!(app.controller.history().len(), 1);
        let text = &app.alert().unwrap().text;
        assert!(text.starts_with("Correct!") || text.starts_with("No Radar!!"));
        assert!(app.status.starts_with("Round 2/5"));
    }

    #[test]
    fn test_mouse_click_picks_station() {
        let mut app = ready_app(5);
        let (col, row) = station_cell(&app, 2);
        app.press(col, row);
        app.release(col, row);
        assert_eq!(app.controller.state().selections.len(), 1);
        assert_eq!(app.controller.state().selections[0].station, 2);

        // a click while the alert is showing only dismisses it
        app.press(col, row);
        app.release(col, row);
        assert!(app.alert().is_none());
        assert_eq!(app.controller.state().selections.len(), 1);
    }

    #[test]
    fn test_drag_does_not_click() {
        let mut app = ready_app(5);
        let (col, row) = station_cell(&app, 2);
        let before = app.map.viewport.center_lon;
        app.press(col, row);
        app.handle_drag(col + 3, row);
        app.release(col + 3, row);
        assert!(app.controller.state().selections.is_empty());
        assert!(app.map.viewport.center_lon < before);

        app.refit();
        assert!((app.map.viewport.center_lon - before).abs() < 1e-12);
    }

    #[test]
    fn test_game_over_and_restart() {
        let mut app = ready_app(1);
        app.pick_station(0);
        app.dismiss_alert();
        app.pick_station(1);
        assert!(app.is_game_over());
        // evaluation alert, then game over alert
        assert_eq!(app.alerts.len(), 2);
        assert!(app.alerts[1].text.starts_with("Game Over!"));

        app.restart();
        assert!(app.alerts.is_empty());
        assert_eq!(app.score_text(), "Score: 0");
        assert_eq!(app.controller.phase(), Phase::AwaitingFirstPick);
    }
}

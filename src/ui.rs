use crate::app::{App, Startup};
use crate::braille::BrailleCanvas;
use crate::map::{GlyphKind, MapLayers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

/// Width of the station list on the right
const LEGEND_WIDTH: u16 = 36;
const ALERT_WIDTH: u16 = 60;

/// Split the screen into (map panel, legend, status bar)
fn split(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + legend
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(LEGEND_WIDTH)])
        .split(rows[0]);
    (cols[0], cols[1], rows[1])
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Pick the Appliance ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Inner map rectangle for a terminal of the given size. Mouse hit-testing
/// uses the same layout as rendering.
pub fn map_inner(area: Rect) -> Rect {
    let (map, _, _) = split(area);
    map_block().inner(map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let (map, legend, status) = split(frame.area());

    render_map(frame, app, map);
    render_legend(frame, app, legend);
    render_status_bar(frame, app, status);

    if let Some(alert) = app.alert() {
        render_alert(frame, &alert.text, alert.fatal);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.startup == Startup::Loading {
        let loading = Paragraph::new(Line::styled("Loading map...", Style::default().fg(Color::DarkGray)));
        frame.render_widget(loading, inner);
        return;
    }

    // Braille gives 2x4 resolution per character
    let mut viewport = app.map.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map.render(inner.width as usize, inner.height as usize, &viewport);
    frame.render_widget(MapWidget { layers }, inner);
}

/// Custom widget that renders the braille map with markers and labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..canvas.height().min(area.height as usize) {
            for col in 0..canvas.width().min(area.width as usize) {
                if let Some(ch) = canvas.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn glyph_style(kind: GlyphKind) -> Style {
        match kind {
            GlyphKind::Emergency => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            GlyphKind::Station => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            GlyphKind::Faded => Style::default().fg(Color::DarkGray),
        }
    }

    fn label_style(kind: GlyphKind) -> Style {
        match kind {
            GlyphKind::Emergency => Style::default().fg(Color::Red),
            GlyphKind::Station => Style::default().fg(Color::White),
            GlyphKind::Faded => Style::default().fg(Color::DarkGray),
        }
    }

    fn put_str(text: &str, x: u16, y: u16, style: Style, area: Rect, buf: &mut Buffer) {
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
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: basemap, emergency ring, labels, popup, glyphs.
        // Glyphs go last so no marker is ever hidden.
        Self::render_layer(&self.layers.basemap, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.overlay, Color::Red, area, buf);

        let visible = self
            .layers
            .glyphs
            .iter()
            .filter(|g| g.col < area.width && g.row < area.height);

        for glyph in visible.clone() {
            if let Some(label) = &glyph.label {
                let x = (area.x + glyph.col).saturating_add(2);
                Self::put_str(label, x, area.y + glyph.row, Self::label_style(glyph.kind), area, buf);
            }
        }

        if let Some((col, row, text)) = &self.layers.popup {
            // Above the marker unless it sits on the top row
            let y = if *row > 0 { area.y + row - 1 } else { area.y + row + 1 };
            let text = format!(" {text} ");
            let len = text.chars().count() as u16;
            let x = (area.x + col)
                .saturating_sub(len / 2)
                .max(area.x)
                .min((area.x + area.width).saturating_sub(len).max(area.x));
            let style = Style::default().fg(Color::Black).bg(Color::Yellow);
            Self::put_str(&text, x, y, style, area, buf);
        }

        for glyph in visible {
            buf[(area.x + glyph.col, area.y + glyph.row)]
                .set_char(glyph.ch)
                .set_style(Self::glyph_style(glyph.kind));
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" Stations ", Style::default().fg(Color::Cyan)));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(app.round_text(), Style::default().fg(Color::Magenta)),
            Span::raw("  "),
            Span::styled(
                app.score_text(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::raw(""),
    ];

    for (index, station) in app.controller.stations().iter().enumerate() {
        let picked = app.controller.is_selected(index);
        let (mark, style) = if picked {
            ("○", Style::default().fg(Color::DarkGray))
        } else {
            ("●", Style::default().fg(Color::White))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", index + 1), Style::default().fg(Color::Cyan)),
            Span::styled(format!("{mark} "), style),
            Span::styled(station.name.clone(), style),
        ]));
    }

    if let Some(last) = app.controller.history().last() {
        lines.push(Line::raw(""));
        let (verdict, color) = if last.correct {
            ("correct", Color::Green)
        } else {
            ("wrong", Color::Red)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("Round {}: ", last.round), Style::default().fg(Color::DarkGray)),
            Span::styled(verdict, Style::default().fg(color)),
            Span::styled(format!(" {:+}", last.points), Style::default().fg(color)),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map.settings;
    let status = Line::from(vec![
        Span::styled(format!(" {} ", app.status), Style::default().fg(Color::White)),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if settings.show_basemap { "[B]asemap " } else { "[b]asemap " },
            Style::default().fg(if settings.show_basemap { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_labels { "[L]abels " } else { "[l]abels " },
            Style::default().fg(if settings.show_labels { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            "| 1-9:pick hjkl:pan +/-:zoom f:fit n:new q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

/// Centered modal over everything else
fn render_alert(frame: &mut Frame, text: &str, fatal: bool) {
    let area = frame.area();
    let width = ALERT_WIDTH.min(area.width);
    // Two for the border, one for the hint, plus wrapped text
    let text_rows = (text.chars().count() as u16 / width.saturating_sub(4).max(1)) + 1;
    let height = (text_rows + 4).min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let (title, color, hint) = if fatal {
        (" Error ", Color::Red, "Enter to exit")
    } else {
        (" Alert ", Color::Yellow, "Enter to continue")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD)));

    let body = Paragraph::new(vec![
        Line::raw(text.to_string()),
        Line::raw(""),
        Line::styled(hint, Style::default().fg(Color::DarkGray)),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::data::{builtin_outline, MapEvent};
    use crate::game::{default_stations, RoundController};
    use crate::map::MarkerKind;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn app_sized(seed: u64, width: u16, height: u16, ready: bool) -> App {
        let controller = RoundController::from_config(
            default_stations(),
            GameConfig {
                seed: Some(seed),
                ..GameConfig::default()
            },
        )
        .unwrap();
        let (tx, rx) = mpsc::channel();
        if ready {
            tx.send(MapEvent::Ready(builtin_outline())).unwrap();
        }
        let mut app = App::new(width, height, controller, rx, Duration::from_secs(60));
        app.poll_startup(Instant::now());
        app
    }

    fn app(ready: bool) -> App {
        app_sized(5, 120, 40, ready)
    }

    fn draw_buffer(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn draw(app: &App) -> String {
        draw_buffer(app, 120, 40)
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_map_inner_leaves_room_for_legend() {
        let inner = map_inner(Rect::new(0, 0, 120, 40));
        assert_eq!(inner, Rect::new(1, 1, 120 - LEGEND_WIDTH - 2, 40 - 1 - 2));
    }

    #[test]
    fn test_render_loading() {
        let screen = draw(&app(false));
        assert!(screen.contains("Loading map..."));
        assert!(screen.contains("Score: 0"));
    }

    #[test]
    fn test_render_round() {
        let screen = draw(&app(true));
        assert!(screen.contains("Round 1/5"));
        assert!(screen.contains("Berwick Fire Station"));
        assert!(screen.contains('▲'));
        // emergency popup is open
        assert!(screen.contains("Fire Emergency!"));
    }

    #[test]
    fn test_every_station_visible_under_popup() {
        for (width, height) in [(120, 40), (100, 30), (160, 50)] {
            for seed in 0..20 {
                let app = app_sized(seed, width, height, true);
                let buf = draw_buffer(&app, width, height);
                let area = app.map_area();
                for marker in app.map.markers() {
                    let MarkerKind::Station(index) = marker.kind else {
                        continue;
                    };
                    let (px, py) = app.map.viewport.project_point(marker.pos);
                    let cell = &buf[(area.x + (px / 2) as u16, area.y + (py / 4) as u16)];
                    assert_eq!(
                        cell.symbol(),
                        "●",
                        "seed {seed} {width}x{height}: station {index} hidden"
                    );
                }
            }
        }
    }

    #[test]
    fn test_render_alert_after_pick() {
        let mut app = app(true);
        app.pick_station(6);
        let screen = draw(&app);
        assert!(screen.contains(" Alert "));
        assert!(screen.contains("Enter to continue"));
        assert!(screen.contains('○'));
    }
}

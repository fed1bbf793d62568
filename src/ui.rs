use crate::app::{App, Pane};
use crate::braille::BrailleCanvas;
use crate::feed::{format_time_ago, ALERT_ROW_HEIGHT};
use crate::map::{MapLayers, Marker};
use crate::registry::Severity;
use crate::status::ConnectionStatus;
use crate::summary::{DetailModel, MetricCardModel, NOT_AVAILABLE};
use crate::tree::{TreeRow, AFFORDANCE_COLS, INDENT_COLS};
use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

const TREE_WIDTH: u16 = 30;
const FEED_WIDTH: u16 = 38;
const METRICS_HEIGHT: u16 = 4;
const DETAIL_HEIGHT: u16 = 6;
const CLOSE_LABEL: &str = "[x]";

/// Screen regions of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub metrics: Rect,
    pub tree: Rect,
    pub map: Rect,
    pub feed: Rect,
    /// Present only while something is selected
    pub detail: Option<Rect>,
    pub status: Rect,
}

impl DashboardLayout {
    pub fn compute(area: Rect, detail_visible: bool) -> Self {
        let detail_height = if detail_visible { DETAIL_HEIGHT } else { 0 };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),              // Header
                Constraint::Length(METRICS_HEIGHT), // Metric cards
                Constraint::Min(3),                 // Tree | map | feed
                Constraint::Length(detail_height),  // Detail
                Constraint::Length(1),              // Status bar
            ])
            .split(area);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(TREE_WIDTH),
                Constraint::Min(10),
                Constraint::Length(FEED_WIDTH),
            ])
            .split(rows[2]);

        Self {
            header: rows[0],
            metrics: rows[1],
            tree: main[0],
            map: main[1],
            feed: main[2],
            detail: detail_visible.then_some(rows[3]),
            status: rows[4],
        }
    }

    pub fn tree_inner(&self) -> Rect {
        inner(self.tree)
    }

    pub fn map_inner(&self) -> Rect {
        inner(self.map)
    }

    pub fn feed_inner(&self) -> Rect {
        inner(self.feed)
    }

    /// The detail section's close control, on its top border
    pub fn close_button(&self) -> Option<Rect> {
        let detail = self.detail?;
        let width = CLOSE_LABEL.len() as u16;
        (detail.width > width + 2).then(|| {
            Rect::new(detail.x + detail.width - width - 2, detail.y, width, 1)
        })
    }
}

/// Area inside a one-cell border
fn inner(area: Rect) -> Rect {
    area.inner(Margin::new(1, 1))
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Low => Color::Green,
        Severity::Medium => Color::Yellow,
        Severity::High => Color::LightRed,
        Severity::Critical => Color::Red,
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = app.layout();

    render_header(frame, app, layout.header);
    render_metrics(frame, app, layout.metrics);
    render_tree(frame, app, layout.tree);
    render_map(frame, app, layout.map);
    render_feed(frame, app, layout.feed);
    if let Some(area) = layout.detail {
        render_detail(frame, app, area);
    }
    render_status_bar(frame, app, layout.status);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status_color = match app.connection {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Updating => Color::Yellow,
        ConnectionStatus::Disconnected => Color::DarkGray,
    };
    let header = Line::from(vec![
        Span::styled(
            " Global Disaster Overview ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("● ", Style::default().fg(status_color)),
        Span::styled(app.connection.label(), Style::default().fg(status_color)),
        Span::styled(
            format!(
                " | updated {} | lang {}",
                app.feed.last_update().format("%H:%M:%S"),
                app.language
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_metrics(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.summary.borrow();
    let cards = &summary.model().cards;
    if cards.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (card, slot) in cards.iter().zip(slots.iter()) {
        frame.render_widget(metric_card(card), *slot);
    }
}

fn metric_card(card: &MetricCardModel) -> Paragraph<'_> {
    let color = severity_color(card.severity);
    let lines = vec![
        Line::from(vec![
            Span::styled(card.value.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw(format!(" {}", card.unit)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{} {}", card.trend_arrow, card.change),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(format!("  conf {}", card.confidence), Style::default().fg(Color::DarkGray)),
        ]),
    ];
    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", card.title)),
    )
}

fn render_tree(frame: &mut Frame, app: &App, area: Rect) {
    let block = pane_block("Locations", app.focus == Pane::Tree);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selected = app.selection.current().and_then(|s| s.location_id());
    let rows = app.tree.rows();
    let offset = app.tree.scroll_offset(inner.height as usize);

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(inner.height as usize)
        .map(|(idx, row)| {
            let node = row.node;
            let (indent, affordance) = tree_prefix(row);
            let mut style = Style::default();
            if selected == Some(node.id.as_str()) {
                style = style.add_modifier(Modifier::BOLD).fg(Color::White);
            }
            if app.focus == Pane::Tree && idx == app.tree.cursor() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(vec![
                Span::raw(indent),
                Span::styled(affordance, Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", node.kind.glyph()), Style::default().fg(severity_color(node.severity))),
                Span::styled(node.name.clone(), style),
                Span::styled(
                    format!(" {}", node.active_incidents),
                    Style::default().fg(severity_color(node.severity)),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Indent and affordance text, laid out on the columns `TreeNavigator::hit` tests
fn tree_prefix(row: &TreeRow) -> (String, String) {
    let indent = " ".repeat(row.depth * INDENT_COLS as usize);
    let glyph = match (row.expandable, row.expanded) {
        (false, _) => "",
        (true, true) => "▾",
        (true, false) => "▸",
    };
    (indent, format!("{glyph:<width$}", width = AFFORDANCE_COLS as usize))
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let map = app.map.borrow();
    let title = match map.focus() {
        Some(focus) => format!(
            "Map · {} · {:.0} km · tilt {:.0}°",
            map.mode().label(),
            focus.zoom_km,
            focus.tilt_deg
        ),
        None => format!("Map · {}", map.mode().label()),
    };
    let block = pane_block(&title, app.focus == Pane::Map);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(MapWidget { layers: map.render() }, inner);
}

/// Custom widget that renders braille map layers with point markers overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for cy in 0..canvas.height().min(area.height as usize) {
            for cx in 0..canvas.width().min(area.width as usize) {
                if let Some(ch) = canvas.cell(cx, cy) {
                    buf[(area.x + cx as u16, area.y + cy as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }

    fn render_marker(marker: &Marker, area: Rect, buf: &mut Buffer) {
        if marker.x >= area.width || marker.y >= area.height {
            return;
        }
        let color = severity_color(marker.severity);
        let (x, y) = (area.x + marker.x, area.y + marker.y);
        let glyph = if marker.focused { '◉' } else { '●' };
        buf[(x, y)].set_char(glyph).set_fg(color);

        let Some(label) = &marker.label else {
            return;
        };
        let room = area.width.saturating_sub(marker.x + 2) as usize;
        let mut style = Style::default().fg(Color::White);
        if marker.focused {
            style = style.add_modifier(Modifier::BOLD);
        }
        for (i, ch) in label.chars().take(room.min(24)).enumerate() {
            buf[(x + 2 + i as u16, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.rim, Color::Blue, area, buf);
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.focus, Color::Red, area, buf);
        for marker in &self.layers.markers {
            Self::render_marker(marker, area, buf);
        }
    }
}

fn render_feed(frame: &mut Frame, app: &App, area: Rect) {
    let block = pane_block("Live Alerts", app.focus == Pane::Feed);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let now = Utc::now();
    let selected = app.selection.current().and_then(|s| s.alert_id());
    let visible = (inner.height as usize / ALERT_ROW_HEIGHT).max(1);
    let offset = app.feed.scroll_offset(inner.height as usize);

    let mut lines = Vec::new();
    for (idx, alert) in app.feed.alerts().iter().enumerate().skip(offset).take(visible) {
        let color = severity_color(alert.severity);
        let mut title_style = Style::default().fg(Color::White);
        if selected == Some(alert.id.as_str()) {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        if app.focus == Pane::Feed && idx == app.feed.cursor() {
            title_style = title_style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{} {} ", alert.kind.glyph(), alert.kind.label()), Style::default().fg(color)),
            Span::styled(alert.severity.as_str().to_uppercase(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", format_time_ago(alert.occurred_at, now)), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(Span::styled(alert.title.clone(), title_style)));
        lines.push(Line::from(Span::styled(alert.location.clone(), Style::default().fg(Color::Gray))));
        lines.push(Line::from(Span::styled(
            format!(
                "{} affected · {}% conf",
                crate::summary::format_population(Some(alert.affected_population)),
                alert.confidence
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn detail_lines(detail: &DetailModel, map_note: String) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    let color = severity_color(detail.severity);
    vec![
        Line::from(vec![
            Span::styled("Type ", label),
            Span::raw(detail.kind.clone()),
            Span::styled("   Severity ", label),
            Span::styled(detail.severity.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled("   Active events ", label),
            Span::raw(detail.active_events.clone()),
        ]),
        Line::from(vec![
            Span::styled("Affected ", label),
            Span::raw(detail.affected_population.clone()),
            Span::styled("   Confidence ", label),
            Span::raw(detail.confidence.clone()),
        ]),
        Line::from(vec![
            Span::styled("Coordinates ", label),
            Span::raw(detail.coordinates.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())),
        ]),
        Line::from(Span::styled(map_note, label)),
    ]
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.summary.borrow();
    let Some(detail) = summary.model().detail.as_ref() else {
        return;
    };
    let map_note = match app.map.borrow().focus() {
        Some(focus) => format!("Map focus {:.2}, {:.2}", focus.lat, focus.lon),
        None => "No map position for this selection".to_string(),
    };

    let block = pane_block(&detail.title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(detail_lines(detail, map_note)), inner);

    if let Some(close) = app.layout().close_button() {
        frame.render_widget(
            Paragraph::new(Span::styled(CLOSE_LABEL, Style::default().fg(Color::Red))),
            close,
        );
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let map = app.map.borrow();
    let settings = &map.renderer.settings;
    let toggle = |on: bool, on_label: &'static str, off_label: &'static str| {
        Span::styled(
            if on { on_label } else { off_label },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_points, "[P]oints ", "[p]oints "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | tab:pane jk:move enter:select o:expand g:globe esc:close q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapRenderer;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_layout_detail_toggle() {
        let area = Rect::new(0, 0, 160, 50);
        let closed = DashboardLayout::compute(area, false);
        let open = DashboardLayout::compute(area, true);

        assert!(closed.detail.is_none() && closed.close_button().is_none());
        assert_eq!(open.detail.map(|d| d.height), Some(DETAIL_HEIGHT));
        assert_eq!(closed.map.height - open.map.height, DETAIL_HEIGHT);
        assert_eq!(open.tree.width, TREE_WIDTH);
        assert_eq!(open.feed.width, FEED_WIDTH);

        let close = open.close_button().unwrap();
        assert_eq!(close.y, open.detail.unwrap().y);
    }

    #[test]
    fn test_tree_glyph_sits_on_expander_columns() {
        let app = App::new(MapRenderer::new(), "en".into(), 160, 50, Instant::now()).unwrap();
        for row in app.tree.rows() {
            let (indent, affordance) = tree_prefix(&row);
            assert_eq!(affordance.chars().count(), AFFORDANCE_COLS as usize);
            let glyph_col = indent.chars().count() as u16;
            match row.affordance_cols() {
                Some((start, end)) => {
                    assert_eq!(glyph_col, start);
                    assert_eq!(glyph_col + AFFORDANCE_COLS, end);
                    assert!(affordance.starts_with(['▾', '▸']));
                }
                None => assert!(affordance.trim().is_empty()),
            }
        }
    }

    #[test]
    fn test_render_smoke() {
        let mut app = App::new(MapRenderer::new(), "en".into(), 160, 50, Instant::now()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(160, 50)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Global Disaster Overview"));
        assert!(text.contains("Locations"));
        assert!(text.contains("Live Alerts"));
        assert!(!text.contains(CLOSE_LABEL));

        assert!(app.tree.select_id("riyadh", &mut app.selection));
        app.resize(160, 50);
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains(CLOSE_LABEL));
        assert!(text.contains("Riyadh"));
    }
}

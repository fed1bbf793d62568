use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use tracing::info;

use crate::feed::AlertFeed;
use crate::map::{Lod, MapRenderer, MapView};
use crate::registry::{standard_metrics, standard_points, LocationRegistry, RegistryError};
use crate::selection::{ListenerHandle, Selected, SelectionCoordinator};
use crate::status::{ConnectionStatus, StatusTicker};
use crate::summary::SummaryPanel;
use crate::tree::TreeNavigator;
use crate::ui::DashboardLayout;

/// Pane holding keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Tree,
    Map,
    Feed,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Tree => Pane::Map,
            Pane::Map => Pane::Feed,
            Pane::Feed => Pane::Tree,
        }
    }
}

/// Application state
pub struct App {
    pub tree: TreeNavigator,
    pub feed: AlertFeed,
    pub selection: SelectionCoordinator,
    pub summary: Rc<RefCell<SummaryPanel>>,
    pub map: Rc<RefCell<MapView>>,
    ticker: StatusTicker,
    pub connection: ConnectionStatus,
    pub focus: Pane,
    pub language: String,
    /// Terminal area the layout is computed for
    screen: Rect,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    last_mouse: Option<(u16, u16)>,
}

impl App {
    /// Dashboard over the built-in mock data, sized to a `width` x `height` terminal
    pub fn new(
        renderer: MapRenderer,
        language: String,
        width: u16,
        height: u16,
        now: Instant,
    ) -> Result<Self, RegistryError> {
        let mut selection = SelectionCoordinator::new();
        let summary = Rc::new(RefCell::new(SummaryPanel::new(standard_metrics())));
        let map = Rc::new(RefCell::new(MapView::new(renderer, standard_points()?, 0, 0)));

        let summary_handle: ListenerHandle = summary.clone();
        let map_handle: ListenerHandle = map.clone();
        selection.register(summary_handle);
        selection.register(map_handle);

        let mut ticker = StatusTicker::default();
        ticker.start(now);

        let mut app = Self {
            tree: TreeNavigator::new(LocationRegistry::standard()?),
            feed: AlertFeed::standard(Utc::now()),
            selection,
            summary,
            map,
            connection: ticker.status(now),
            ticker,
            focus: Pane::Tree,
            language,
            screen: Rect::new(0, 0, width, height),
            should_quit: false,
            last_mouse: None,
        };
        app.sync_layout();
        Ok(app)
    }

    pub fn layout(&self) -> DashboardLayout {
        DashboardLayout::compute(self.screen, self.summary.borrow().has_detail())
    }

    /// Keep the map sized to its pane; the detail section resizes it
    fn sync_layout(&mut self) {
        let inner = self.layout().map_inner();
        self.map
            .borrow_mut()
            .resize(inner.width as usize, inner.height as usize);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        self.sync_layout();
    }

    /// Per-frame update
    pub fn tick(&mut self, now: Instant) {
        let status = self.ticker.status(now);
        if status != self.connection {
            info!(status = status.label(), "connection status changed");
            self.connection = status;
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.ticker.stop();
        self.connection = ConnectionStatus::Disconnected;
        self.should_quit = true;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn select(&mut self, value: Selected) {
        self.selection.select(value);
        self.sync_layout();
    }

    /// Close the detail section
    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
        self.sync_layout();
    }

    /// Up/down in the focused pane; pans when the map has focus
    pub fn move_cursor(&mut self, delta: isize) {
        match self.focus {
            Pane::Tree => self.tree.move_cursor(delta),
            Pane::Feed => self.feed.move_cursor(delta),
            Pane::Map => self.pan(0, delta as i32 * 6),
        }
    }

    /// Left/right: collapse/expand in the tree, pan on the map
    pub fn horizontal(&mut self, delta: i32) {
        match self.focus {
            Pane::Tree => {
                let expanded = self
                    .tree
                    .cursor_node()
                    .is_some_and(|node| self.tree.is_expanded(&node.id));
                if expanded == (delta < 0) {
                    self.tree.toggle_at_cursor();
                }
            }
            Pane::Map => self.pan(delta * 10, 0),
            Pane::Feed => {}
        }
    }

    pub fn toggle_at_cursor(&mut self) {
        if self.focus == Pane::Tree {
            self.tree.toggle_at_cursor();
        }
    }

    /// Enter: select what the cursor is on (the map picks at its centre)
    pub fn activate(&mut self) {
        match self.focus {
            Pane::Tree => self.tree.select_at_cursor(&mut self.selection),
            Pane::Feed => self.feed.select_at_cursor(&mut self.selection),
            Pane::Map => {
                let picked = {
                    let map = self.map.borrow();
                    let (cols, rows) = map.size();
                    map.pick(cols as i32, rows as i32 * 2)
                };
                if let Some(point) = picked {
                    self.select(Selected::Point(point));
                }
                return;
            }
        }
        self.sync_layout();
    }

    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.feed.refresh(now);
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.borrow_mut().pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.borrow_mut().zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.borrow_mut().zoom_out();
    }

    pub fn toggle_projection(&mut self) {
        self.map.borrow_mut().toggle_projection();
    }

    pub fn reset_view(&mut self) {
        self.map.borrow_mut().reset();
    }

    /// Terminal cell → braille pixel in the map pane
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.layout().map_inner();
        contains(inner, col, row).then(|| {
            (
                (col - inner.x) as i32 * 2,
                (row - inner.y) as i32 * 4,
            )
        })
    }

    /// Left click at a terminal cell
    pub fn click(&mut self, col: u16, row: u16) {
        let layout = self.layout();

        if layout.close_button().is_some_and(|r| contains(r, col, row)) {
            self.clear_selection();
            return;
        }

        let tree = layout.tree_inner();
        if contains(tree, col, row) {
            self.focus = Pane::Tree;
            self.tree.click(
                (row - tree.y) as usize,
                col - tree.x,
                tree.height as usize,
                &mut self.selection,
            );
            self.sync_layout();
            return;
        }

        let feed = layout.feed_inner();
        if contains(feed, col, row) {
            self.focus = Pane::Feed;
            self.feed
                .click((row - feed.y) as usize, feed.height as usize, &mut self.selection);
            self.sync_layout();
            return;
        }

        if let Some((px, py)) = self.map_pixel(col, row) {
            self.focus = Pane::Map;
            let picked = self.map.borrow().pick(px, py);
            match picked {
                Some(point) => self.select(Selected::Point(point)),
                // Empty map: start a drag
                None => self.last_mouse = Some((col, row)),
            }
        }
    }

    /// Mouse drag; the map surface follows the pointer
    pub fn drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            // Less sensitive when zoomed out
            let zoom = self.map.borrow().zoom_level();
            let scale = if zoom < 2.0 {
                2
            } else if zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
            self.last_mouse = Some((col, row));
        }
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Scroll wheel: zoom the map towards the pointer, scroll lists elsewhere
    pub fn scroll(&mut self, col: u16, row: u16, up: bool) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            let mut map = self.map.borrow_mut();
            if up {
                map.zoom_in_at(px, py);
            } else {
                map.zoom_out_at(px, py);
            }
            return;
        }
        let delta = if up { -1 } else { 1 };
        let layout = self.layout();
        if contains(layout.tree_inner(), col, row) {
            self.tree.move_cursor(delta);
        } else if contains(layout.feed_inner(), col, row) {
            self.feed.move_cursor(delta);
        }
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.map.borrow().zoom_level())
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let (lon, lat) = self.map.borrow().center();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Get current LOD level as a string
    pub fn lod_level(&self) -> &'static str {
        match Lod::from_zoom(self.map.borrow().zoom_level()) {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapFocus;
    use crate::registry::{GeoCoord, Severity};
    use std::time::Duration;

    fn app() -> App {
        App::new(MapRenderer::new(), "en".into(), 160, 50, Instant::now()).unwrap()
    }

    fn select_location(app: &mut App, id: &str) {
        assert!(app.tree.select_id(id, &mut app.selection));
        app.sync_layout();
    }

    #[test]
    fn test_starts_live_without_selection() {
        let app = app();
        assert_eq!(app.connection, ConnectionStatus::Connected);
        assert!(app.selection.current().is_none());
        assert!(app.layout().detail.is_none());
        assert!(app.map.borrow().focus().is_none());
    }

    #[test]
    fn test_riyadh_select_then_close() {
        let mut app = app();
        select_location(&mut app, "riyadh");

        {
            let summary = app.summary.borrow();
            let detail = summary.model().detail.as_ref().unwrap();
            assert_eq!(detail.severity, Severity::High);
            assert_eq!(detail.active_events, "2");
        }
        assert!(app.map.borrow().focus().is_some());

        let close = app.layout().close_button().unwrap();
        app.click(close.x, close.y);
        assert!(app.selection.current().is_none());
        assert!(!app.summary.borrow().has_detail());
        assert!(app.layout().detail.is_none());
    }

    #[test]
    fn test_unmatched_location_keeps_summary() {
        let mut app = app();
        select_location(&mut app, "manila");
        assert!(app.summary.borrow().has_detail());
        assert!(app.map.borrow().focus().is_none());
    }

    #[test]
    fn test_detail_shrinks_map() {
        let mut app = app();
        let before = app.map.borrow().size();
        select_location(&mut app, "dubai");
        let after = app.map.borrow().size();
        assert_eq!(before.0, after.0);
        assert!(after.1 < before.1);
    }

    #[test]
    fn test_tree_click_routes() {
        let mut app = app();
        let tree = app.layout().tree_inner();
        // Row 0 is "global"; its expander sits in the first two columns
        app.click(tree.x, tree.y);
        assert!(!app.tree.is_expanded("global"));
        assert!(app.selection.current().is_none());

        app.click(tree.x + 6, tree.y);
        assert_eq!(app.selection.current().and_then(|s| s.location_id()), Some("global"));
        assert_eq!(app.focus, Pane::Tree);
    }

    #[test]
    fn test_feed_click_selects_alert() {
        let mut app = app();
        let feed = app.layout().feed_inner();
        app.click(feed.x + 1, feed.y + 1);
        assert_eq!(app.selection.current().and_then(|s| s.alert_id()), Some("alert-001"));
        assert_eq!(app.focus, Pane::Feed);
    }

    #[test]
    fn test_map_click_picks_point() {
        let mut app = app();
        select_location(&mut app, "riyadh");
        let inner = app.layout().map_inner();
        let (px, py) = app
            .map
            .borrow()
            .projector()
            .project_point(46.72, 24.71)
            .unwrap();
        app.click(inner.x + (px / 2) as u16, inner.y + (py / 4) as u16);
        match app.selection.current() {
            Some(Selected::Point(point)) => assert_eq!(point.id, "Riyadh"),
            other => panic!("expected a point, got {other:?}"),
        }
    }

    #[test]
    fn test_map_enter_picks_centre_point() {
        let mut app = app();
        app.map.borrow_mut().set_focus(Some(MapFocus::at(GeoCoord::new(46.72, 24.71))));
        app.focus = Pane::Map;
        assert!(app.layout().detail.is_none());

        app.activate();
        match app.selection.current() {
            Some(Selected::Point(point)) => assert_eq!(point.id, "Riyadh"),
            other => panic!("expected a point, got {other:?}"),
        }
        assert!(app.layout().detail.is_some());
        assert!(app.summary.borrow().has_detail());
    }

    #[test]
    fn test_ticker_pulse_and_quit() {
        let start = Instant::now();
        let mut app = App::new(MapRenderer::new(), "en".into(), 160, 50, start).unwrap();
        app.tick(start + StatusTicker::PERIOD + Duration::from_millis(200));
        assert_eq!(app.connection, ConnectionStatus::Updating);
        app.tick(start + StatusTicker::PERIOD + Duration::from_secs(2));
        assert_eq!(app.connection, ConnectionStatus::Connected);
        app.quit();
        assert!(app.should_quit);
        assert_eq!(app.connection, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_tab_cycles_panes() {
        let mut app = app();
        app.cycle_focus();
        assert_eq!(app.focus, Pane::Map);
        app.cycle_focus();
        app.cycle_focus();
        assert_eq!(app.focus, Pane::Tree);
    }
}

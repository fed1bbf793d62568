use std::collections::HashMap;

use tracing::debug;

use crate::map::globe::GlobeViewport;
use crate::map::projection::{Projector, Viewport};
use crate::map::renderer::{MapLayers, MapRenderer};
use crate::map::spatial::SpatialGrid;
use crate::registry::{GeoCoord, HazardPoint};
use crate::selection::{Selected, SelectionListener};

/// Pick tolerance around a marker, in braille pixels
pub const PICK_RADIUS_PX: f64 = 6.0;

const EARTH_CIRCUMFERENCE_KM: f64 = 40_075.0;

/// Where the map is pointed: a coordinate plus camera distance and tilt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFocus {
    pub lon: f64,
    pub lat: f64,
    /// Visible span in kilometres
    pub zoom_km: f64,
    /// Camera tilt; shown in the status line, the terminal view is top-down
    pub tilt_deg: f64,
}

impl MapFocus {
    pub const ZOOM_KM: f64 = 900.0;
    pub const TILT_DEG: f64 = 35.0;

    pub fn at(coord: GeoCoord) -> Self {
        Self {
            lon: coord.lon,
            lat: coord.lat,
            zoom_km: Self::ZOOM_KM,
            tilt_deg: Self::TILT_DEG,
        }
    }

    /// Normalised zoom where 1.0 shows the whole world
    pub fn zoom_level(&self) -> f64 {
        (EARTH_CIRCUMFERENCE_KM / (self.zoom_km.max(1.0) * 4.0)).clamp(1.0, 100.0)
    }
}

/// Case-insensitive name → coordinate table built from the hazard points
#[derive(Debug, Default)]
pub struct CoordinateIndex {
    entries: HashMap<String, GeoCoord>,
}

impl CoordinateIndex {
    /// One key per point: its name, or its id when the name is blank
    pub fn build(points: &[HazardPoint]) -> Self {
        let entries = points
            .iter()
            .map(|point| {
                let key = if point.name.trim().is_empty() { &point.id } else { &point.name };
                (key.trim().to_lowercase(), point.coord())
            })
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> Option<GeoCoord> {
        self.entries.get(&key.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Explicit coordinates win, then the selection's name
pub fn resolve_focus(selected: &Selected, index: &CoordinateIndex) -> Option<MapFocus> {
    selected
        .coordinates()
        .or_else(|| index.lookup(selected.lookup_name()))
        .map(MapFocus::at)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Flat,
    Globe,
}

impl ProjectionMode {
    pub fn label(self) -> &'static str {
        match self {
            ProjectionMode::Flat => "Mercator",
            ProjectionMode::Globe => "Globe",
        }
    }
}

/// The map collaborator: hazard points in, focus from the selection, picks out
pub struct MapView {
    pub renderer: MapRenderer,
    points: SpatialGrid<HazardPoint>,
    index: CoordinateIndex,
    focus: Option<MapFocus>,
    mode: ProjectionMode,
    viewport: Viewport,
    globe: GlobeViewport,
    /// Map area in characters
    cols: usize,
    rows: usize,
}

impl MapView {
    pub fn new(renderer: MapRenderer, points: Vec<HazardPoint>, cols: usize, rows: usize) -> Self {
        let index = CoordinateIndex::build(&points);
        let points = points.into_iter().map(|p| (p.lon, p.lat, p)).collect();
        let viewport = Viewport::world(cols * 2, rows * 4);
        let globe = GlobeViewport::from_mercator(&viewport);
        Self {
            renderer,
            points,
            index,
            focus: None,
            mode: ProjectionMode::Flat,
            viewport,
            globe,
            cols,
            rows,
        }
    }

    pub fn points(&self) -> &[HazardPoint] {
        self.points.items()
    }

    pub fn index(&self) -> &CoordinateIndex {
        &self.index
    }

    pub fn focus(&self) -> Option<MapFocus> {
        self.focus
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Replace the focus; a new focus recenters the view on it
    pub fn set_focus(&mut self, focus: Option<MapFocus>) {
        self.focus = focus;
        if let Some(f) = focus {
            let zoom = f.zoom_level();
            self.viewport.center_on(f.lon, f.lat, zoom);
            self.globe.center_on(f.lon, f.lat, zoom);
        }
    }

    pub fn toggle_projection(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Flat => {
                self.globe = GlobeViewport::from_mercator(&self.viewport);
                ProjectionMode::Globe
            }
            ProjectionMode::Globe => {
                self.viewport = self.globe.to_mercator();
                ProjectionMode::Flat
            }
        };
        debug!(mode = self.mode.label(), "projection toggled");
    }

    /// Resize to a map area of `cols` x `rows` characters
    pub fn resize(&mut self, cols: usize, rows: usize) {
        if (cols, rows) == (self.cols, self.rows) {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.viewport.width = cols * 2;
        self.viewport.height = rows * 4;
        self.globe.set_size(cols * 2, rows * 4);
    }

    /// Pan by braille pixels (rotates the globe)
    pub fn pan(&mut self, dx: i32, dy: i32) {
        match self.mode {
            ProjectionMode::Flat => self.viewport.pan(dx, dy),
            ProjectionMode::Globe => self.globe.rotate_drag(-dx, -dy),
        }
    }

    pub fn zoom_in(&mut self) {
        match self.mode {
            ProjectionMode::Flat => self.viewport.zoom_in(),
            ProjectionMode::Globe => self.globe.zoom_in(),
        }
    }

    pub fn zoom_out(&mut self) {
        match self.mode {
            ProjectionMode::Flat => self.viewport.zoom_out(),
            ProjectionMode::Globe => self.globe.zoom_out(),
        }
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        match self.mode {
            ProjectionMode::Flat => self.viewport.zoom_in_at(px, py),
            ProjectionMode::Globe => self.globe.zoom_in_at(px, py),
        }
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        match self.mode {
            ProjectionMode::Flat => self.viewport.zoom_out_at(px, py),
            ProjectionMode::Globe => self.globe.zoom_out_at(px, py),
        }
    }

    pub fn zoom_level(&self) -> f64 {
        self.projector().zoom_factor()
    }

    /// Geographic centre of the current view
    pub fn center(&self) -> (f64, f64) {
        match self.mode {
            ProjectionMode::Flat => (self.viewport.center_lon, self.viewport.center_lat),
            ProjectionMode::Globe => self.globe.center(),
        }
    }

    pub fn projector(&self) -> &dyn Projector {
        match self.mode {
            ProjectionMode::Flat => &self.viewport,
            ProjectionMode::Globe => &self.globe,
        }
    }

    /// Nearest hazard point within the pick radius of braille pixel (px, py)
    pub fn pick(&self, px: i32, py: i32) -> Option<HazardPoint> {
        let projector = self.projector();
        let (lon, lat) = projector.unproject_point(px, py)?;
        // Degree radius is a superset; exact test happens in pixel space
        let radius_deg = PICK_RADIUS_PX * projector.degrees_per_pixel() * 2.0;

        self.points
            .query_radius(lon, lat, radius_deg)
            .into_iter()
            .filter_map(|idx| self.points.get(idx))
            .filter_map(|point| {
                let (x, y) = projector.project_point(point.lon, point.lat)?;
                let dist = (((x - px).pow(2) + (y - py).pow(2)) as f64).sqrt();
                (dist <= PICK_RADIUS_PX).then_some((dist, point))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, point)| point.clone())
    }

    pub fn render(&self) -> MapLayers {
        self.renderer.render(
            self.cols,
            self.rows,
            self.projector(),
            self.points.items(),
            self.focus.map(|f| (f.lon, f.lat)),
        )
    }

    /// Back to the world view, keeping the focus marker
    pub fn reset(&mut self) {
        self.viewport = Viewport::world(self.cols * 2, self.rows * 4);
        self.globe = GlobeViewport::from_mercator(&self.viewport);
    }
}

impl SelectionListener for MapView {
    fn selection_changed(&mut self, selection: Option<&Selected>, _revision: u64) {
        let focus = selection.and_then(|s| resolve_focus(s, &self.index));
        if let (Some(s), None) = (selection, focus) {
            debug!(name = s.name(), "no coordinates for selection");
        }
        self.set_focus(focus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{standard_alerts, standard_points, LocationKind, LocationNode, Severity};
    use chrono::Utc;

    fn view() -> MapView {
        MapView::new(MapRenderer::new(), standard_points().unwrap(), 60, 20)
    }

    fn location(name: &str) -> Selected {
        Selected::Location(LocationNode::new(&name.to_lowercase(), name, LocationKind::City, Severity::High, 2))
    }

    #[test]
    fn test_index_is_case_insensitive() {
        let index = CoordinateIndex::build(&standard_points().unwrap());
        let dubai = index.lookup("DUBAI").unwrap();
        assert_eq!((dubai.lon, dubai.lat), (55.27, 25.20));
        assert!(index.lookup("united arab emirates").is_some());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_blank_name_keys_by_id() {
        let mut point = HazardPoint::new("Qatif", "Qatif", 50.0, 26.56, Severity::Low, 0, 0.5).unwrap();
        point.name = String::new();
        let index = CoordinateIndex::build(&[point]);
        assert!(index.lookup("qatif").is_some());
        assert!(index.lookup("").is_none());
    }

    #[test]
    fn test_alert_title_without_point_gives_no_focus() {
        let index = CoordinateIndex::build(&standard_points().unwrap());
        let flood = standard_alerts(Utc::now())
            .into_iter()
            .find(|a| a.title == "Flash Flood Warning")
            .unwrap();
        assert!(flood.location.starts_with("Dubai"));
        assert_eq!(resolve_focus(&Selected::Alert(flood.clone()), &index), None);

        let mut map = view();
        map.selection_changed(Some(&location("Dubai")), 1);
        map.selection_changed(Some(&Selected::Alert(flood)), 2);
        assert_eq!(map.focus(), None);
    }

    #[test]
    fn test_explicit_coordinates_win() {
        let index = CoordinateIndex::build(&standard_points().unwrap());
        let node = LocationNode::new("dubai", "Dubai", LocationKind::City, Severity::Medium, 1)
            .with_coordinates(10.0, 20.0);
        let focus = resolve_focus(&Selected::Location(node), &index).unwrap();
        assert_eq!((focus.lon, focus.lat), (10.0, 20.0));
        assert_eq!(focus.zoom_km, 900.0);
        assert_eq!(focus.tilt_deg, 35.0);
    }

    #[test]
    fn test_selection_focuses_dubai() {
        let mut map = view();
        map.selection_changed(Some(&location("Dubai")), 1);
        let focus = map.focus().unwrap();
        assert_eq!((focus.lon, focus.lat), (55.27, 25.20));
        let (lon, lat) = map.center();
        assert!((lon - 55.27).abs() < 1e-9 && (lat - 25.20).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_name_clears_focus() {
        let mut map = view();
        map.selection_changed(Some(&location("Dubai")), 1);
        map.selection_changed(Some(&location("Manila")), 2);
        assert_eq!(map.focus(), None);

        map.selection_changed(Some(&location("Riyadh")), 3);
        map.selection_changed(None, 4);
        assert_eq!(map.focus(), None);
    }

    #[test]
    fn test_zoom_level_from_km() {
        let focus = MapFocus::at(GeoCoord::new(0.0, 0.0));
        assert!((focus.zoom_level() - 11.13).abs() < 0.01);
    }

    #[test]
    fn test_pick_near_and_far() {
        let mut map = view();
        map.set_focus(Some(MapFocus::at(GeoCoord::new(46.72, 24.71))));
        let (px, py) = map.projector().project_point(46.72, 24.71).unwrap();

        let picked = map.pick(px + 2, py + 1).unwrap();
        assert_eq!(picked.id, "Riyadh");
        assert_eq!(map.pick(px + 40, py + 40), None);
    }

    #[test]
    fn test_toggle_projection_keeps_center() {
        let mut map = view();
        map.set_focus(Some(MapFocus::at(GeoCoord::new(55.27, 25.2))));
        map.toggle_projection();
        assert_eq!(map.mode(), ProjectionMode::Globe);
        let (lon, lat) = map.center();
        assert!((lon - 55.27).abs() < 1e-6 && (lat - 25.2).abs() < 1e-6);
        assert!(map.projector().rim().is_some());
    }
}

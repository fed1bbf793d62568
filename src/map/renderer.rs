use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, draw_marker, draw_ring};
use crate::map::projection::Projector;
use crate::registry::{HazardPoint, Severity};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for map data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_points: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_points: true,
            show_labels: true,
        }
    }
}

/// A hazard point placed on screen, in character cells of the map area
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub x: u16,
    pub y: u16,
    pub severity: Severity,
    pub label: Option<String>,
    pub focused: bool,
}

/// One frame of map output, split by layer so each can be coloured on its own
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub rim: BrailleCanvas,
    pub focus: BrailleCanvas,
    pub markers: Vec<Marker>,
}

/// Map renderer with multi-resolution coastline data
#[derive(Default)]
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let tiers = [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low];
        let skip = match lod {
            Lod::High => 0,
            Lod::Medium => 1,
            Lod::Low => 2,
        };
        tiers
            .into_iter()
            .skip(skip)
            .find(|tier| !tier.is_empty())
            .map(|tier| tier.as_slice())
            .unwrap_or_default()
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// Render every layer for a map area of `width` x `height` characters.
    /// `focus` is the geographic point to mark with a crosshair.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        projector: &dyn Projector,
        points: &[HazardPoint],
        focus: Option<(f64, f64)>,
    ) -> MapLayers {
        let lod = Lod::from_zoom(projector.zoom_factor());
        let mut layers = MapLayers {
            coastlines: BrailleCanvas::new(width, height),
            borders: BrailleCanvas::new(width, height),
            rim: BrailleCanvas::new(width, height),
            focus: BrailleCanvas::new(width, height),
            markers: Vec::new(),
        };

        if let Some((cx, cy, radius)) = projector.rim() {
            draw_ring(&mut layers.rim, cx, cy, radius);
        }

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(&mut layers.coastlines, line, projector);
            }
        }

        // Borders get noisy at world view
        if self.settings.show_borders && lod != Lod::Low {
            for line in self.borders(lod) {
                draw_linestring(&mut layers.borders, line, projector);
            }
        }

        if let Some((lon, lat)) = focus {
            if let Some((px, py)) = projector.project_point(lon, lat) {
                draw_marker(&mut layers.focus, px, py, 6);
            }
        }

        if self.settings.show_points {
            layers.markers = self.place_markers(width, height, projector, points, focus);
        }

        layers
    }

    fn place_markers(
        &self,
        width: usize,
        height: usize,
        projector: &dyn Projector,
        points: &[HazardPoint],
        focus: Option<(f64, f64)>,
    ) -> Vec<Marker> {
        let mut markers: Vec<Marker> = points
            .iter()
            .filter_map(|point| {
                let (px, py) = projector.project_point(point.lon, point.lat)?;
                if px < 0 || py < 0 {
                    return None;
                }
                let (x, y) = ((px / 2) as usize, (py / 4) as usize);
                if x >= width || y >= height {
                    return None;
                }
                let focused = focus.is_some_and(|(lon, lat)| {
                    (lon - point.lon).abs() < 1e-6 && (lat - point.lat).abs() < 1e-6
                });
                Some(Marker {
                    x: x as u16,
                    y: y as u16,
                    severity: point.severity,
                    label: self.settings.show_labels.then(|| point.name.clone()),
                    focused,
                })
            })
            .collect();

        // Most severe drawn last so it wins shared cells
        markers.sort_by_key(|m| (m.severity, m.focused));
        markers
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Check if any coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    pub fn toggle_points(&mut self) {
        self.settings.show_points = !self.settings.show_points;
    }
}

/// Draw a linestring with viewport culling.
/// Hidden vertices (globe far side) break the line.
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, projector: &dyn Projector) {
    if line.len() < 2 {
        return;
    }
    let (width, _) = projector.pixel_size();
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let Some((px, py)) = projector.project_point(lon, lat) else {
            prev = None;
            continue;
        };

        if let Some((prev_x, prev_y)) = prev {
            // Long jumps are antimeridian wraps on the flat map
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < width && projector.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::globe::GlobeViewport;
    use crate::map::projection::Viewport;

    fn point(id: &str, lon: f64, lat: f64, severity: Severity) -> HazardPoint {
        HazardPoint::new(id, id, lon, lat, severity, 1000, 0.9).unwrap()
    }

    #[test]
    fn test_lod_from_zoom() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(4.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(11.0), Lod::High);
    }

    #[test]
    fn test_coastline_fallback() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        renderer.add_coastline(vec![(0.0, 0.0), (10.0, 10.0)], Lod::Low);
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines(Lod::High).len(), 1);
    }

    #[test]
    fn test_render_draws_coastline() {
        let mut renderer = MapRenderer::new();
        renderer.add_coastline(vec![(-20.0, 0.0), (20.0, 0.0)], Lod::Low);
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 40);
        let layers = renderer.render(40, 10, &vp, &[], None);
        assert!(!layers.coastlines.is_blank());
        assert!(layers.borders.is_blank());
        assert!(layers.rim.is_blank());
    }

    #[test]
    fn test_markers_sorted_and_focused() {
        let renderer = MapRenderer::new();
        let vp = Viewport::new(50.0, 25.0, 8.0, 80, 40);
        let points = [
            point("dubai", 55.27, 25.2, Severity::Medium),
            point("riyadh", 46.72, 24.71, Severity::High),
        ];
        let layers = renderer.render(40, 10, &vp, &points, Some((55.27, 25.2)));

        assert_eq!(layers.markers.len(), 2);
        assert_eq!(layers.markers[1].severity, Severity::High);
        assert!(layers.markers.iter().any(|m| m.focused && m.severity == Severity::Medium));
        assert!(!layers.focus.is_blank());
    }

    #[test]
    fn test_globe_hides_far_side_points() {
        let renderer = MapRenderer::new();
        let globe = GlobeViewport::new(0.0, 0.0, 30.0, 80, 40);
        let points = [point("far", 180.0, 0.0, Severity::Critical)];
        let layers = renderer.render(40, 10, &globe, &points, None);
        assert!(layers.markers.is_empty());
        assert!(!layers.rim.is_blank());
    }

    #[test]
    fn test_hidden_points_layer() {
        let mut renderer = MapRenderer::new();
        renderer.toggle_points();
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 40);
        let points = [point("p", 0.0, 0.0, Severity::Low)];
        assert!(renderer.render(40, 10, &vp, &points, None).markers.is_empty());
    }
}

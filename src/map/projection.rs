use std::f64::consts::PI;

/// Common surface of the flat and globe viewports
pub trait Projector {
    /// Geographic → braille pixel; `None` when the point cannot be shown
    fn project_point(&self, lon: f64, lat: f64) -> Option<(i32, i32)>;
    /// Braille pixel → geographic; `None` off the map surface
    fn unproject_point(&self, px: i32, py: i32) -> Option<(f64, f64)>;
    /// Zoom normalised so the whole-world view is 1.0
    fn zoom_factor(&self) -> f64;
    /// Approximate degrees spanned by one pixel near the view centre
    fn degrees_per_pixel(&self) -> f64;
    /// Canvas size in braille pixels
    fn pixel_size(&self) -> (usize, usize);

    /// Globe disk (centre x, centre y, radius) when the projection has one
    fn rim(&self) -> Option<(i32, i32, i32)> {
        None
    }

    /// Rough bounding box check for a segment
    fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let (width, height) = self.pixel_size();
        p1.0.max(p2.0) >= 0
            && p1.0.min(p2.0) < width as i32
            && p1.1.max(p2.1) >= 0
            && p1.1.min(p2.1) < height as i32
    }
}

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 100.0;
const ZOOM_STEP: f64 = 1.5;

/// Web Mercator normalised y for a latitude
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Flat (Web Mercator) viewport
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (clamped to ±85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom,
            width,
            height,
        }
    }

    /// Whole-world view, nudged north where most land is
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Jump to a location at a given zoom
    pub fn center_on(&mut self, lon: f64, lat: f64, zoom: f64) {
        self.center_lon = lon;
        self.center_lat = lat.clamp(-85.0, 85.0);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the geographic point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Pan back so the same point sits under the cursor
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Pixel → (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;
        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// (lon, lat) → pixel
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat.clamp(-85.0, 85.0));

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);
        let scale = self.zoom * self.width as f64;

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;
        (px, py)
    }
}

impl Projector for Viewport {
    fn project_point(&self, lon: f64, lat: f64) -> Option<(i32, i32)> {
        Some(self.project(lon, lat))
    }

    fn unproject_point(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        let (lon, lat) = self.unproject(px, py);
        (-180.0..=180.0).contains(&lon).then_some((lon, lat))
    }

    fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    fn degrees_per_pixel(&self) -> f64 {
        360.0 / (self.zoom * self.width.max(1) as f64)
    }

    fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

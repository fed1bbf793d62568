use glam::DVec3;

use crate::map::projection::{Projector, Viewport, MAX_ZOOM, MIN_ZOOM};

/// Sphere radius at zoom 1.0, as a fraction of canvas width
const RADIUS_PER_WIDTH: f64 = 0.35;
const ZOOM_STEP: f64 = 1.5;

/// Globe viewport: orthographic projection of a rotating sphere.
/// Orientation is an orthonormal basis (forward/right/up).
#[derive(Clone, Debug)]
pub struct GlobeViewport {
    /// Points from the sphere centre at the camera
    forward: DVec3,
    /// East on screen
    right: DVec3,
    /// North on screen
    up: DVec3,
    /// Sphere radius in braille pixels (controls zoom)
    pub radius: f64,
    pub width: usize,
    pub height: usize,
}

impl GlobeViewport {
    /// Globe looking at (lon, lat) with the given radius
    pub fn new(center_lon: f64, center_lat: f64, radius: f64, width: usize, height: usize) -> Self {
        let (forward, right, up) = basis(center_lon, center_lat);
        Self { forward, right, up, radius, width, height }
    }

    /// Same centre and proportional zoom as a flat viewport
    pub fn from_mercator(vp: &Viewport) -> Self {
        Self::new(vp.center_lon, vp.center_lat, radius_for(vp.width, vp.zoom), vp.width, vp.height)
    }

    pub fn to_mercator(&self) -> Viewport {
        let (lon, lat) = self.center();
        Viewport::new(lon, lat, self.effective_zoom(), self.width, self.height)
    }

    /// Look straight down at (lon, lat) at a normalised zoom
    pub fn center_on(&mut self, lon: f64, lat: f64, zoom: f64) {
        let (forward, right, up) = basis(lon, lat);
        self.forward = forward;
        self.right = right;
        self.up = up;
        self.radius = radius_for(self.width, zoom.clamp(MIN_ZOOM, MAX_ZOOM));
    }

    /// (lon, lat) the globe is looking at
    pub fn center(&self) -> (f64, f64) {
        let lat = self.forward.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = self.forward.y.atan2(self.forward.x).to_degrees();
        (lon, lat)
    }

    /// Project to screen; back-facing points yield `None`
    pub fn project(&self, lon: f64, lat: f64) -> Option<(i32, i32)> {
        let p = lonlat_to_vec3(lon, lat);
        if p.dot(self.forward) < 0.0 {
            return None;
        }
        let px = (self.width as f64 / 2.0 + p.dot(self.right) * self.radius) as i32;
        let py = (self.height as f64 / 2.0 - p.dot(self.up) * self.radius) as i32;
        Some((px, py))
    }

    /// Screen → (lon, lat); `None` outside the disk
    pub fn unproject(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        let sx = (px as f64 - self.width as f64 / 2.0) / self.radius;
        let sy = -(py as f64 - self.height as f64 / 2.0) / self.radius;
        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }
        let p = self.right * sx + self.up * sy + self.forward * (1.0 - r2).sqrt();
        let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = p.y.atan2(p.x).to_degrees();
        Some((lon, lat))
    }

    /// Rotate by a pixel drag delta; the surface follows the cursor
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        let radius = self.radius.max(1.0);
        self.yaw(-(dx as f64) / radius);
        self.pitch(dy as f64 / radius);
    }

    fn yaw(&mut self, angle: f64) {
        if angle.abs() < 1e-10 {
            return;
        }
        let (sin_a, cos_a) = angle.sin_cos();
        let forward = self.forward * cos_a + self.right * sin_a;
        let right = self.right * cos_a - self.forward * sin_a;
        self.forward = forward.normalize();
        self.right = right.normalize();
    }

    fn pitch(&mut self, angle: f64) {
        if angle.abs() < 1e-10 {
            return;
        }
        let (sin_a, cos_a) = angle.sin_cos();
        let forward = self.forward * cos_a + self.up * sin_a;
        let up = self.up * cos_a - self.forward * sin_a;
        self.forward = forward.normalize();
        self.up = up.normalize();
    }

    pub fn zoom_in(&mut self) {
        self.scale_radius(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.scale_radius(1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the point under (px, py) roughly fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let target = self.unproject(px, py);
        self.scale_radius(factor);

        let Some((lon, lat)) = target else {
            return;
        };
        let target = lonlat_to_vec3(lon, lat);
        let want_x = (px as f64 - self.width as f64 / 2.0) / self.radius;
        let want_y = -(py as f64 - self.height as f64 / 2.0) / self.radius;
        self.yaw(-(want_x - target.dot(self.right)));
        self.pitch(-(want_y - target.dot(self.up)));
    }

    fn scale_radius(&mut self, factor: f64) {
        let min_r = radius_for(self.width, 1.0);
        let max_r = radius_for(self.width, MAX_ZOOM);
        self.radius = (self.radius * factor).clamp(min_r, max_r);
    }

    /// Zoom normalised to match Mercator's zoom = 1 at world view
    pub fn effective_zoom(&self) -> f64 {
        self.radius / (self.width.max(1) as f64 * RADIUS_PER_WIDTH)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        // A zero-width globe has no zoom to carry over
        let zoom = if self.width == 0 { 1.0 } else { self.effective_zoom() };
        self.width = width;
        self.height = height;
        self.radius = radius_for(width, zoom);
    }
}

impl Projector for GlobeViewport {
    fn project_point(&self, lon: f64, lat: f64) -> Option<(i32, i32)> {
        self.project(lon, lat)
    }

    fn unproject_point(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        self.unproject(px, py)
    }

    fn zoom_factor(&self) -> f64 {
        self.effective_zoom()
    }

    fn degrees_per_pixel(&self) -> f64 {
        (1.0 / self.radius.max(1.0)).to_degrees()
    }

    fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn rim(&self) -> Option<(i32, i32, i32)> {
        Some((
            (self.width / 2) as i32,
            (self.height / 2) as i32,
            self.radius as i32,
        ))
    }
}

fn radius_for(width: usize, zoom: f64) -> f64 {
    width as f64 * RADIUS_PER_WIDTH * zoom
}

/// Orthonormal camera basis looking at (lon, lat), north up
fn basis(lon: f64, lat: f64) -> (DVec3, DVec3, DVec3) {
    let forward = lonlat_to_vec3(lon, lat);
    let (lon_rad, lat_rad) = (lon.to_radians(), lat.to_radians());
    // Derivative of forward w.r.t. latitude points north
    let raw_up = DVec3::new(
        -lat_rad.sin() * lon_rad.cos(),
        -lat_rad.sin() * lon_rad.sin(),
        lat_rad.cos(),
    );
    let right = raw_up.cross(forward).normalize();
    let up = forward.cross(right).normalize();
    (forward, right, up)
}

/// lon/lat (degrees) → unit sphere vector
#[inline(always)]
fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let (lon_rad, lat_rad) = (lon.to_radians(), lat.to_radians());
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

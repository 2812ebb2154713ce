use glam::DVec2;

use crate::config::ProjectionConfig;

/// Frame the configured scale is expressed in
const REFERENCE_WIDTH: f64 = 480.0;
const REFERENCE_HEIGHT: f64 = 460.0;

/// Albers equal-area conic projection (unit sphere, radians out)
#[derive(Clone, Debug)]
pub struct Albers {
    n: f64,
    c: f64,
    rho0: f64,
    /// Longitude rotation in degrees, added before projecting
    rotate: f64,
}

impl Albers {
    pub fn new(parallels: [f64; 2], rotate: f64) -> Self {
        let sy0 = parallels[0].to_radians().sin();
        let n = (sy0 + parallels[1].to_radians().sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        Self {
            n,
            c,
            rho0: c.sqrt() / n,
            rotate,
        }
    }

    /// Project lon/lat degrees; y grows northwards
    pub fn forward(&self, lon: f64, lat: f64) -> DVec2 {
        let lambda = wrap_lon(lon + self.rotate).to_radians();
        self.forward_rotated(lambda, lat.to_radians())
    }

    fn forward_rotated(&self, lambda: f64, phi: f64) -> DVec2 {
        let rho = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let theta = lambda * self.n;
        DVec2::new(rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    /// Project a point already in the rotated frame (used for the map center)
    pub fn forward_centered(&self, lon: f64, lat: f64) -> DVec2 {
        self.forward_rotated(lon.to_radians(), lat.to_radians())
    }

    /// Inverse of [`Albers::forward`]
    pub fn inverse(&self, p: DVec2) -> (f64, f64) {
        let rho0_y = self.rho0 - p.y;
        let mut lambda = p.x.atan2(rho0_y.abs()) * rho0_y.signum();
        if rho0_y * self.n < 0.0 {
            lambda -= std::f64::consts::PI * p.x.signum() * rho0_y.signum();
        }
        let sin_phi = (self.c - (p.x * p.x + rho0_y * rho0_y) * self.n * self.n) / (2.0 * self.n);
        let lon = (lambda / self.n).to_degrees() - self.rotate;
        let lat = sin_phi.clamp(-1.0, 1.0).asin().to_degrees();
        (wrap_lon(lon), lat)
    }
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    projection: Albers,
    /// Projected map center (pan state)
    center: DVec2,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Configured scale at the reference frame
    base_scale: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(config: &ProjectionConfig, width: usize, height: usize) -> Self {
        let projection = Albers::new(config.parallels, config.rotate);
        let center = projection.forward_centered(config.center[0], config.center[1]);
        Self {
            projection,
            center,
            zoom: 1.0,
            base_scale: config.scale,
            width,
            height,
        }
    }

    /// Pixels per projected unit
    fn scale(&self) -> f64 {
        let fit = (self.width as f64 / REFERENCE_WIDTH).min(self.height as f64 / REFERENCE_HEIGHT);
        self.base_scale * self.zoom * fit.max(f64::EPSILON)
    }

    /// Project a geographic coordinate to fractional pixel coordinates
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let p = (self.projection.forward(lon, lat) - self.center) * self.scale();
        DVec2::new(p.x + self.width as f64 / 2.0, self.height as f64 / 2.0 - p.y)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat);
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let p = DVec2::new(
            (px as f64 - self.width as f64 / 2.0) / scale,
            (self.height as f64 / 2.0 - py as f64) / scale,
        );
        self.projection.inverse(p + self.center)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        self.center += DVec2::new(dx as f64, -(dy as f64)) / scale;
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(40.0);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(0.25);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(0.25, 40.0);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

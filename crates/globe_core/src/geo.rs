use glam::{DVec3, Vec3};

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoCoordinate {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Read a GeoJSON position (`[lon, lat, ...]`).
    ///
    /// Returns `None` for positions with fewer than two ordinates or with
    /// non-finite values, so they never reach the projection.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Self::new(*lat, *lon)),
            _ => None,
        }
    }

    pub fn to_sphere(self, radius: f32) -> Vec3 {
        project(self.lat_deg, self.lon_deg, radius)
    }
}

/// Project a geographic coordinate onto a sphere centred at the origin.
///
/// Latitude 0 / longitude 0 lands on +X, the north pole on +Y and
/// longitude 90°E on +Z. Evaluated in f64 and narrowed once at the end.
pub fn project(lat_deg: f64, lon_deg: f64, radius: f32) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = f64::from(radius);
    DVec3::new(
        r * lat.cos() * lon.cos(),
        r * lat.sin(),
        r * lat.cos() * lon.sin(),
    )
    .as_vec3()
}

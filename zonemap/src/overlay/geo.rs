use glam::Vec2;
use serde_json::Value;

use super::roads::{Position, parse_position};

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Bounds of finite positions. `None` if there are none or they span
    /// zero width or height.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut bounds: Option<GeoBounds> = None;
        for &[lon, lat] in positions {
            if !lon.is_finite() || !lat.is_finite() {
                continue;
            }
            let b = bounds.get_or_insert(GeoBounds {
                min_lon: lon,
                min_lat: lat,
                max_lon: lon,
                max_lat: lat,
            });
            b.min_lon = b.min_lon.min(lon);
            b.min_lat = b.min_lat.min(lat);
            b.max_lon = b.max_lon.max(lon);
            b.max_lat = b.max_lat.max(lat);
        }
        bounds.filter(|b| b.max_lon > b.min_lon && b.max_lat > b.min_lat)
    }

    /// Bounds of a polygon given as a GeoJSON Feature, Polygon or
    /// MultiPolygon geometry, Polygon coordinates, or a bare ring of
    /// `[lon, lat]` pairs.
    pub fn from_polygon_json(value: &Value) -> Option<Self> {
        let mut positions = Vec::new();
        collect_positions(polygon_coordinates(value)?, &mut positions);
        Self::from_positions(&positions)
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

fn polygon_coordinates(value: &Value) -> Option<&Value> {
    if value.is_array() {
        return Some(value);
    }
    match value.get("type")?.as_str()? {
        "Feature" => polygon_coordinates(value.get("geometry")?),
        "Polygon" | "MultiPolygon" => value.get("coordinates"),
        _ => None,
    }
}

/// Collects every position in arbitrarily nested coordinate arrays.
fn collect_positions(value: &Value, out: &mut Vec<Position>) {
    if let Some(position) = parse_position(value) {
        out.push(position);
        return;
    }
    if let Some(items) = value.as_array() {
        for item in items {
            collect_positions(item, out);
        }
    }
}

/// Maps overlay coordinates onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Linear map of `bounds` onto a `width`x`height` canvas, north up.
    Geographic {
        bounds: GeoBounds,
        width: u32,
        height: u32,
    },
    /// Coordinates are already canvas pixels.
    Pixel,
}

impl Projection {
    pub fn project(&self, position: Position) -> Vec2 {
        let [lon, lat] = position;
        match *self {
            Projection::Geographic {
                bounds,
                width,
                height,
            } => {
                let x = (lon - bounds.min_lon) / bounds.width() * width as f64;
                let y = (bounds.max_lat - lat) / bounds.height() * height as f64;
                Vec2::new(x as f32, y as f32)
            }
            Projection::Pixel => Vec2::new(lon as f32, lat as f32),
        }
    }
}

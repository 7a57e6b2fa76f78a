//! Road network overlay projected onto the canvas.

mod geo;
mod roads;

#[cfg(test)]
mod tests;

pub use geo::{GeoBounds, Projection};
pub use roads::{Position, RoadClass, RoadFeature, RoadGeometry, RoadNetwork, RoadStyle};

use glam::Vec2;
use raster::{PixelBuffer, drawing};
use serde_json::Value;

/// Road features ready to draw over a canvas of fixed size.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadOverlay {
    network: RoadNetwork,
    projection: Projection,
}

impl RoadOverlay {
    /// Builds an overlay for a `width`x`height` canvas.
    ///
    /// The projection comes from the polygon bounds. Without a usable
    /// polygon, road coordinates are treated as canvas pixels.
    pub fn new(network: RoadNetwork, polygon: Option<&Value>, width: u32, height: u32) -> Self {
        let bounds = polygon.and_then(|p| {
            let bounds = GeoBounds::from_polygon_json(p);
            if bounds.is_none() {
                tracing::warn!("Polygon geometry is unusable, drawing roads in pixel coordinates");
            }
            bounds
        });

        let projection = match bounds {
            Some(bounds) => Projection::Geographic {
                bounds,
                width,
                height,
            },
            None => {
                tracing::debug!("No geographic bounds, drawing roads in pixel coordinates");
                Projection::Pixel
            }
        };

        Self {
            network,
            projection,
        }
    }

    /// Parses both inputs leniently; see [`RoadNetwork::from_json`].
    pub fn from_json(roads: &Value, polygon: Option<&Value>, width: u32, height: u32) -> Self {
        Self::new(RoadNetwork::from_json(roads), polygon, width, height)
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Draws every road, minor classes first. Line widths are multiplied by
    /// `width_scale`.
    pub fn draw(&self, frame: &mut PixelBuffer, width_scale: f32) {
        let mut features: Vec<&RoadFeature> = self.network.features().collect();
        features.sort_by_key(|f| f.class.draw_rank());

        for feature in features {
            let style = feature.class.style();
            for line in feature.geometry.lines() {
                let points: Vec<Vec2> = line
                    .iter()
                    .map(|&position| self.projection.project(position))
                    .collect();
                drawing::draw_polyline(frame, &points, style.color, style.width * width_scale);
            }
        }
    }
}

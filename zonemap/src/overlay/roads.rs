use std::collections::BTreeMap;

use raster::Rgba;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OSM-style road classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(strum_macros::Display, strum_macros::EnumString, strum_macros::EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    Footway,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadStyle {
    pub color: Rgba,
    pub width: f32,
}

impl RoadClass {
    /// Parses an OSM `highway` tag, treating `*_link` ramps as their parent
    /// class and synonyms like `living_street` as residential.
    pub fn from_tag(tag: &str) -> RoadClass {
        let tag = tag.trim();
        let base = tag.strip_suffix("_link").unwrap_or(tag);
        match base.to_ascii_lowercase().as_str() {
            "living_street" | "unclassified" => RoadClass::Residential,
            "path" | "pedestrian" | "cycleway" | "steps" => RoadClass::Footway,
            other => other.parse().unwrap_or(RoadClass::Other),
        }
    }

    pub fn style(&self) -> RoadStyle {
        let (color, width) = match self {
            RoadClass::Motorway => (Rgba::new(225, 29, 72, 255), 6.0),
            RoadClass::Trunk => (Rgba::new(234, 88, 12, 255), 5.0),
            RoadClass::Primary => (Rgba::new(245, 158, 11, 255), 4.5),
            RoadClass::Secondary => (Rgba::new(250, 204, 21, 255), 4.0),
            RoadClass::Tertiary => (Rgba::new(163, 163, 163, 255), 3.0),
            RoadClass::Residential => (Rgba::new(115, 115, 115, 255), 2.0),
            RoadClass::Service => (Rgba::new(163, 163, 163, 255), 1.5),
            RoadClass::Footway => (Rgba::new(120, 113, 108, 255), 1.0),
            RoadClass::Other => (Rgba::new(140, 140, 140, 255), 1.5),
        };
        RoadStyle { color, width }
    }

    /// Draw order: minor roads first, motorways on top.
    pub fn draw_rank(&self) -> u8 {
        match self {
            RoadClass::Footway => 0,
            RoadClass::Service | RoadClass::Other => 1,
            RoadClass::Residential => 2,
            RoadClass::Tertiary => 3,
            RoadClass::Secondary => 4,
            RoadClass::Primary => 5,
            RoadClass::Trunk => 6,
            RoadClass::Motorway => 7,
        }
    }
}

/// `[lon, lat]` pair.
pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum RoadGeometry {
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
}

impl RoadGeometry {
    pub fn lines(&self) -> Vec<&[Position]> {
        match self {
            RoadGeometry::LineString(line) => vec![line.as_slice()],
            RoadGeometry::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
        }
    }

    fn from_json(value: &Value) -> Option<RoadGeometry> {
        let coordinates = value.get("coordinates")?;
        match value.get("type")?.as_str()? {
            "LineString" => Some(RoadGeometry::LineString(parse_line(coordinates)?)),
            "MultiLineString" => {
                let lines = coordinates
                    .as_array()?
                    .iter()
                    .map(parse_line)
                    .collect::<Option<Vec<_>>>()?;
                if lines.is_empty() {
                    return None;
                }
                Some(RoadGeometry::MultiLineString(lines))
            }
            _ => None,
        }
    }
}

pub(crate) fn parse_position(value: &Value) -> Option<Position> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let lon = pair[0].as_f64()?;
    let lat = pair[1].as_f64()?;
    (lon.is_finite() && lat.is_finite()).then_some([lon, lat])
}

fn parse_line(value: &Value) -> Option<Vec<Position>> {
    let line = value
        .as_array()?
        .iter()
        .map(parse_position)
        .collect::<Option<Vec<_>>>()?;
    (!line.is_empty()).then_some(line)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadFeature {
    pub class: RoadClass,
    pub geometry: RoadGeometry,
}

impl RoadFeature {
    /// Parses a GeoJSON feature. The class comes from the `highway`,
    /// `road_class` or `class` property, falling back to `category`.
    pub fn from_json(value: &Value, category: &str) -> Option<RoadFeature> {
        let geometry = RoadGeometry::from_json(value.get("geometry")?)?;
        let properties = value.get("properties");
        let tag = ["highway", "road_class", "class"]
            .iter()
            .find_map(|key| properties?.get(*key)?.as_str());

        let class = RoadClass::from_tag(tag.unwrap_or(category));
        Some(RoadFeature { class, geometry })
    }
}

/// Road features grouped by category, as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadNetwork {
    pub categories: BTreeMap<String, Vec<RoadFeature>>,
    /// Features dropped because they were malformed or non-finite.
    pub skipped: usize,
}

impl RoadNetwork {
    /// Accepts an object of category to FeatureCollection (or bare feature
    /// array), or a single top-level FeatureCollection. Never fails: bad
    /// features are counted in `skipped`.
    pub fn from_json(value: &Value) -> RoadNetwork {
        let mut network = RoadNetwork::default();

        if is_feature_collection(value) {
            network.add_category("roads", value);
        } else if let Some(object) = value.as_object() {
            for (category, features) in object {
                network.add_category(category, features);
            }
        } else {
            tracing::warn!("Road network is neither an object nor a FeatureCollection");
        }

        if network.skipped > 0 {
            tracing::warn!("Skipped {} malformed road features", network.skipped);
        }
        network
    }

    fn add_category(&mut self, category: &str, value: &Value) {
        let features = if is_feature_collection(value) {
            value.get("features").and_then(Value::as_array)
        } else {
            value.as_array()
        };
        let Some(features) = features else {
            self.skipped += 1;
            return;
        };

        let parsed = self.categories.entry(category.to_string()).or_default();
        for feature in features {
            match RoadFeature::from_json(feature, category) {
                Some(feature) => parsed.push(feature),
                None => self.skipped += 1,
            }
        }
    }

    pub fn features(&self) -> impl Iterator<Item = &RoadFeature> {
        self.categories.values().flatten()
    }

    pub fn feature_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_count() == 0
    }
}

fn is_feature_collection(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("FeatureCollection")
}

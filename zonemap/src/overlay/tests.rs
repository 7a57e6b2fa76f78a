use glam::Vec2;
use raster::{PixelBuffer, Rgba};
use serde_json::{Value, json};

use super::*;

fn sample_roads() -> Value {
    json!({
        "major": {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "highway": "primary" },
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[10.0, 50.0], [10.1, 50.1]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "highway": "motorway_link" },
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [
                            [[10.0, 50.05], [10.1, 50.05]],
                            [[10.05, 50.0], [10.05, 50.1]]
                        ]
                    }
                }
            ]
        },
        "residential": [
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.02, 50.02], [10.08, 50.02]]
                }
            },
            {
                "type": "Feature",
                "properties": { "highway": "service" },
                "geometry": { "type": "Point", "coordinates": [10.0, 50.0] }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[10.0, "north"], [10.1, 50.1]]
                }
            }
        ]
    })
}

fn polygon() -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[10.0, 50.0], [10.1, 50.0], [10.1, 50.1], [10.0, 50.1], [10.0, 50.0]]]
        }
    })
}

fn close(a: Vec2, b: Vec2) -> bool {
    a.distance(b) < 1e-3
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn road_classes_from_tags() {
    assert_eq!(RoadClass::from_tag("primary"), RoadClass::Primary);
    assert_eq!(RoadClass::from_tag("Primary_link"), RoadClass::Primary);
    assert_eq!(RoadClass::from_tag("living_street"), RoadClass::Residential);
    assert_eq!(RoadClass::from_tag("cycleway"), RoadClass::Footway);
    assert_eq!(RoadClass::from_tag("bridleway"), RoadClass::Other);
}

#[test]
fn network_groups_by_category_and_skips_bad_features() {
    let network = RoadNetwork::from_json(&sample_roads());

    assert_eq!(network.categories.len(), 2);
    assert_eq!(network.categories["major"].len(), 2);
    assert_eq!(network.categories["residential"].len(), 1);
    assert_eq!(network.skipped, 2);

    let major = &network.categories["major"];
    assert_eq!(major[0].class, RoadClass::Primary);
    assert_eq!(major[1].class, RoadClass::Motorway);
    assert!(matches!(major[1].geometry, RoadGeometry::MultiLineString(ref lines) if lines.len() == 2));

    // No property: the category names the class.
    assert_eq!(network.categories["residential"][0].class, RoadClass::Residential);
}

#[test]
fn top_level_feature_collection_is_accepted() {
    let value = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "road_class": "secondary" },
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [5.0, 5.0]] }
        }]
    });
    let network = RoadNetwork::from_json(&value);
    assert_eq!(network.feature_count(), 1);
    assert_eq!(network.features().next().unwrap().class, RoadClass::Secondary);
}

#[test]
fn garbage_network_is_empty() {
    assert!(RoadNetwork::from_json(&json!("roads")).is_empty());
    let network = RoadNetwork::from_json(&json!({ "major": 42 }));
    assert!(network.is_empty());
    assert_eq!(network.skipped, 1);
}

// =============================================================================
// Projection
// =============================================================================

#[test]
fn polygon_bounds_from_supported_shapes() {
    let expected = GeoBounds {
        min_lon: 10.0,
        min_lat: 50.0,
        max_lon: 10.1,
        max_lat: 50.1,
    };
    assert_eq!(GeoBounds::from_polygon_json(&polygon()), Some(expected));
    assert_eq!(
        GeoBounds::from_polygon_json(&polygon()["geometry"]),
        Some(expected)
    );
    let ring = json!([[10.0, 50.0], [10.1, 50.0], [10.1, 50.1]]);
    assert_eq!(GeoBounds::from_polygon_json(&ring), Some(expected));

    assert_eq!(GeoBounds::from_polygon_json(&json!({ "type": "Point" })), None);
    assert_eq!(GeoBounds::from_polygon_json(&json!([[1.0, 1.0]])), None);
}

#[test]
fn projection_maps_corners_north_up() {
    let overlay = RoadOverlay::from_json(&sample_roads(), Some(&polygon()), 400, 300);
    let projection = overlay.projection();
    assert!(matches!(projection, Projection::Geographic { .. }));

    assert!(close(projection.project([10.0, 50.1]), Vec2::new(0.0, 0.0)));
    assert!(close(projection.project([10.1, 50.0]), Vec2::new(400.0, 300.0)));
    assert!(close(projection.project([10.05, 50.05]), Vec2::new(200.0, 150.0)));
}

#[test]
fn bad_polygon_falls_back_to_pixels() {
    let overlay = RoadOverlay::from_json(&sample_roads(), Some(&json!("nope")), 400, 300);
    assert_eq!(overlay.projection(), Projection::Pixel);
    assert!(close(overlay.projection().project([10.0, 10.0]), Vec2::new(10.0, 10.0)));

    let open_ring = json!({ "type": "Polygon", "coordinates": [] });
    let overlay = RoadOverlay::from_json(&sample_roads(), Some(&open_ring), 400, 300);
    assert_eq!(overlay.projection(), Projection::Pixel);
}

#[test]
fn missing_polygon_ignores_road_extent() {
    // The roads alone span a usable lon/lat box; it is not used.
    let overlay = RoadOverlay::from_json(&sample_roads(), None, 100, 100);
    assert_eq!(overlay.projection(), Projection::Pixel);
    assert!(close(overlay.projection().project([12.0, 34.0]), Vec2::new(12.0, 34.0)));
}

// =============================================================================
// Drawing
// =============================================================================

#[test]
fn draw_paints_roads_with_class_style() {
    let overlay = RoadOverlay::from_json(&sample_roads(), Some(&polygon()), 400, 300);
    let mut frame = PixelBuffer::new_filled(400, 300, Rgba::WHITE);
    overlay.draw(&mut frame, 1.0);

    // The motorway crosses the centre and is drawn last.
    assert_eq!(frame.get(200, 150), RoadClass::Motorway.style().color);
    // Residential road along lat 50.02.
    assert_eq!(frame.get(100, 240), RoadClass::Residential.style().color);
    assert_eq!(frame.get(5, 290), Rgba::WHITE);
}

use crate::types::{CameraConfig, Point};
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;

/// Loads the spot geometry document. This is the one input the process
/// cannot run without, so any structural problem is an error for the
/// caller to treat as fatal.
pub fn load(path: &str) -> Result<BTreeMap<u32, CameraConfig>, failure::Error> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format_err!("Failed to read spots config {}: {}", path, e))?;
    parse(&raw)
}

fn parse(raw: &str) -> Result<BTreeMap<u32, CameraConfig>, failure::Error> {
    let document: Value = serde_json::from_str(raw)?;
    let entries = document
        .as_object()
        .ok_or_else(|| format_err!("Spots config must be a JSON object keyed by camera"))?;
    let mut cameras = BTreeMap::new();
    for (key, entry) in entries {
        let id = camera_id(key)?;
        let polygons = parse_polygons(&entry["polygons"], key)?;
        let map_spots = parse_points(&entry["map_spots"], key)?;
        if polygons.len() != map_spots.len() {
            // Tolerated: extra map spots are never drawn, extra polygons
            // render no marker. Neither list is resized.
            warn!(
                "Camera {} has {} polygons but {} map spots",
                key,
                polygons.len(),
                map_spots.len()
            );
        }
        cameras.insert(
            id,
            CameraConfig {
                id,
                polygons,
                map_spots,
            },
        );
    }
    Ok(cameras)
}

fn camera_id(key: &str) -> Result<u32, failure::Error> {
    key.strip_prefix("cam")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| format_err!("Camera key {:?} is not of the form \"cam<N>\"", key))
}

fn parse_polygons(value: &Value, camera: &str) -> Result<Vec<Vec<Point>>, failure::Error> {
    // A missing list means the camera has no spots marked out yet.
    if value.is_null() {
        return Ok(vec![]);
    }
    let list = value
        .as_array()
        .ok_or_else(|| format_err!("Camera {}: polygons must be a list", camera))?;
    let mut polygons = Vec::with_capacity(list.len());
    for (index, polygon) in list.iter().enumerate() {
        let points = parse_points(polygon, camera)?;
        if points.len() < 3 {
            return Err(format_err!(
                "Camera {}: polygon {} has {} vertices, need at least 3",
                camera,
                index,
                points.len()
            ));
        }
        polygons.push(points);
    }
    Ok(polygons)
}

fn parse_points(value: &Value, camera: &str) -> Result<Vec<Point>, failure::Error> {
    if value.is_null() {
        return Ok(vec![]);
    }
    value
        .as_array()
        .ok_or_else(|| format_err!("Camera {}: expected a list of points", camera))?
        .iter()
        .map(|point| parse_point(point, camera))
        .collect()
}

fn parse_point(value: &Value, camera: &str) -> Result<Point, failure::Error> {
    let pair = value
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| format_err!("Camera {}: point must be an [x, y] pair", camera))?;
    let x = pair[0]
        .as_f64()
        .ok_or_else(|| format_err!("Camera {}: non-numeric x coordinate", camera))?;
    let y = pair[1]
        .as_f64()
        .ok_or_else(|| format_err!("Camera {}: non-numeric y coordinate", camera))?;
    Ok(Point::new(x, y))
}

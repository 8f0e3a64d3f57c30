use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

/// Axis-aligned bounding box in source-image pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// The box center is the authoritative location of a detection for
    /// spot-containment testing.
    pub fn center(&self) -> Point {
        Point::new((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub score: f64,
    pub bbox: BoundingBox,
}

/// One camera's spot geometry. Polygons live in the camera's image space,
/// map spots in lot-diagram space; the two lists share an index space.
/// Their lengths are intended to match but are allowed to differ.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub id: u32,
    pub polygons: Vec<Vec<Point>>,
    pub map_spots: Vec<Point>,
}

/// Per-camera occupancy vectors, one bool per spot, rebuilt every cycle.
pub type StatusMap = BTreeMap<u32, Vec<bool>>;

/// The rendered lot map plus its caption, as published after a full cycle.
#[derive(Debug)]
pub struct Frame {
    pub png: Vec<u8>,
    pub caption: String,
}

pub type Display = Arc<Mutex<Option<Frame>>>;

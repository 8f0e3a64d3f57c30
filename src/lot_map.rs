use crate::types::{CameraConfig, Point, StatusMap};
use image::{Pixel, Rgba, RgbaImage};
use std::collections::BTreeMap;

const MARKER_WIDTH: i64 = 12;
const MARKER_HEIGHT: i64 = 28;
const MARKER_RADIUS: i64 = 5;
const OCCUPIED: Rgba<u8> = Rgba([220, 40, 40, 180]);
const FREE: Rgba<u8> = Rgba([40, 220, 40, 180]);

/// Stamps the status map onto a copy of the lot diagram: one rounded
/// marker per spot at its map-spot coordinate, red when occupied, green
/// when free. A spot index with no corresponding map spot is skipped.
pub fn render(
    base: &RgbaImage,
    status: &StatusMap,
    cameras: &BTreeMap<u32, CameraConfig>,
) -> RgbaImage {
    let mut canvas = base.clone();
    for (id, occupancy) in status {
        let map_spots = match cameras.get(id) {
            Some(camera) => &camera.map_spots,
            None => continue,
        };
        for (index, &occupied) in occupancy.iter().enumerate() {
            let spot = match map_spots.get(index) {
                Some(spot) => spot,
                None => continue,
            };
            draw_marker(&mut canvas, spot, if occupied { OCCUPIED } else { FREE });
        }
    }
    canvas
}

/// Alpha-blends a rounded rectangle centered on the spot coordinate.
/// Pixels falling off the diagram are clipped.
fn draw_marker(canvas: &mut RgbaImage, center: &Point, color: Rgba<u8>) {
    let left = center.x as i64 - MARKER_WIDTH / 2;
    let top = center.y as i64 - MARKER_HEIGHT / 2;
    for dy in 0..MARKER_HEIGHT {
        for dx in 0..MARKER_WIDTH {
            if !in_rounded_rect(dx, dy) {
                continue;
            }
            let (x, y) = (left + dx, top + dy);
            if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
                continue;
            }
            canvas.get_pixel_mut(x as u32, y as u32).blend(&color);
        }
    }
}

fn in_rounded_rect(dx: i64, dy: i64) -> bool {
    // Clamp to the inner rectangle; a pixel is in the marker iff it is
    // within the corner radius of that rectangle.
    let nearest_x = dx.max(MARKER_RADIUS).min(MARKER_WIDTH - 1 - MARKER_RADIUS);
    let nearest_y = dy.max(MARKER_RADIUS).min(MARKER_HEIGHT - 1 - MARKER_RADIUS);
    let (ox, oy) = (dx - nearest_x, dy - nearest_y);
    ox * ox + oy * oy <= MARKER_RADIUS * MARKER_RADIUS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_base(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    fn one_camera(map_spots: Vec<Point>) -> BTreeMap<u32, CameraConfig> {
        let mut cameras = BTreeMap::new();
        cameras.insert(
            1,
            CameraConfig {
                id: 1,
                polygons: vec![],
                map_spots,
            },
        );
        cameras
    }

    #[test]
    fn occupied_spot_draws_red_marker() {
        let cameras = one_camera(vec![Point::new(50.0, 50.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![true]);
        let rendered = render(&white_base(100, 100), &status, &cameras);
        let pixel = rendered.get_pixel(50, 50);
        assert!(pixel.0[0] > pixel.0[1], "marker should be red: {:?}", pixel);
        assert_ne!(pixel, &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn free_spot_draws_green_marker() {
        let cameras = one_camera(vec![Point::new(50.0, 50.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![false]);
        let rendered = render(&white_base(100, 100), &status, &cameras);
        let pixel = rendered.get_pixel(50, 50);
        assert!(pixel.0[1] > pixel.0[0], "marker should be green: {:?}", pixel);
    }

    #[test]
    fn pixels_outside_marker_are_untouched() {
        let cameras = one_camera(vec![Point::new(50.0, 50.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![true]);
        let rendered = render(&white_base(100, 100), &status, &cameras);
        assert_eq!(rendered.get_pixel(30, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(rendered.get_pixel(50, 10), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn indices_beyond_map_spots_are_skipped() {
        // Two spots reported but only one map spot configured.
        let cameras = one_camera(vec![Point::new(20.0, 20.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![true, true]);
        let rendered = render(&white_base(100, 100), &status, &cameras);
        let marked = rendered.get_pixel(20, 20);
        assert!(marked.0[0] > marked.0[1]);
    }

    #[test]
    fn markers_near_the_border_are_clipped() {
        let cameras = one_camera(vec![Point::new(0.0, 0.0), Point::new(99.0, 99.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![true, false]);
        // Must not panic while drawing partially off-diagram markers.
        render(&white_base(100, 100), &status, &cameras);
    }

    #[test]
    fn unconfigured_camera_in_status_is_ignored() {
        let mut status = StatusMap::new();
        status.insert(9, vec![true]);
        let rendered = render(&white_base(40, 40), &status, &BTreeMap::new());
        assert_eq!(rendered.get_pixel(20, 20), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn base_diagram_is_not_mutated() {
        let base = white_base(60, 60);
        let cameras = one_camera(vec![Point::new(30.0, 30.0)]);
        let mut status = StatusMap::new();
        status.insert(1, vec![true]);
        render(&base, &status, &cameras);
        assert_eq!(base.get_pixel(30, 30), &Rgba([255, 255, 255, 255]));
    }
}

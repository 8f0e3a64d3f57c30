use crate::camera::ImageSource;
use crate::detector::{self, Detector};
use crate::occupancy;
use crate::types::{CameraConfig, Detection, StatusMap};
use log::{info, warn};
use std::collections::BTreeMap;

/// What one camera contributed to a cycle: `None` if its image could not
/// be acquired, otherwise the filtered vehicle detections (possibly empty,
/// including when the detection service itself failed).
type Observation = Option<Vec<Detection>>;

/// One full pass over all configured cameras. Every per-camera fault is
/// absorbed here: a camera that cannot be read reports all spots free and
/// the cycle moves on, so the status map always covers every configured
/// camera with a vector sized to its polygon list.
pub async fn run_cycle(
    source: &ImageSource,
    detector: &Detector,
    cameras: &BTreeMap<u32, CameraConfig>,
) -> StatusMap {
    let mut observations = BTreeMap::new();
    for (id, camera) in cameras {
        observations.insert(*id, observe_camera(source, detector, camera).await);
    }
    let status = assemble_status(cameras, &observations);
    info!(
        "Cycle complete: {} spots occupied across {} cameras",
        status.values().flatten().filter(|&&o| o).count(),
        status.len()
    );
    status
}

async fn observe_camera(
    source: &ImageSource,
    detector: &Detector,
    camera: &CameraConfig,
) -> Observation {
    if camera.polygons.is_empty() {
        // Nothing to report; skip the network round trips entirely.
        return Some(vec![]);
    }
    let image = match source.fetch_snapshot(camera.id).await {
        Ok(image) => image,
        Err(e) => {
            warn!("Could not fetch camera {} image: {}", camera.id, e);
            return None;
        }
    };
    let raw = match detector.detect(&image).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Detection failed for camera {}: {}", camera.id, e);
            vec![]
        }
    };
    Some(detector::filter_vehicles(&raw))
}

/// Pure assembly step: pairs each camera's configuration with its
/// observation. Zero configured polygons always yield an empty vector;
/// a missing or failed observation yields all-false at polygon length.
fn assemble_status(
    cameras: &BTreeMap<u32, CameraConfig>,
    observations: &BTreeMap<u32, Observation>,
) -> StatusMap {
    cameras
        .iter()
        .map(|(id, camera)| {
            let vector = if camera.polygons.is_empty() {
                vec![]
            } else {
                match observations.get(id).and_then(|o| o.as_ref()) {
                    Some(vehicles) => occupancy::resolve_occupancy(vehicles, &camera.polygons),
                    None => vec![false; camera.polygons.len()],
                }
            };
            (*id, vector)
        })
        .collect()
}

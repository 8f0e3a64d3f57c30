use crate::types::{BoundingBox, Detection};
use futures::TryFutureExt;
use image::{DynamicImage, ImageFormat};
use log::warn;
use serde_json::Value;
use std::env;
use std::time::Duration;

const DEFAULT_URL: &str = "https://api-inference.huggingface.co/models/facebook/detr-resnet-50";

/// Labels that count as a parked vehicle.
const VEHICLE_LABELS: [&str; 4] = ["car", "truck", "bus", "motorcycle"];

/// Detections at or below this confidence are ignored.
const MIN_SCORE: f64 = 0.7;

/// Client for the remote object-detection service: PNG bytes in, a list of
/// labeled, scored boxes out.
pub struct Detector {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl Detector {
    pub fn from_env() -> Result<Detector, failure::Error> {
        let token = env::var("DETECTOR_API_TOKEN")
            .map_err(|_| format_err!("DETECTOR_API_TOKEN environment variable unset"))?;
        let url = env::var("DETECTOR_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Ok(Detector {
            client: reqwest::Client::new(),
            url,
            token,
        })
    }

    /// One inference call for the whole image. Returns the raw payload
    /// records; the service's error payloads are not a list and map to an
    /// empty result.
    pub async fn detect(&self, image: &DynamicImage) -> Result<Vec<Value>, failure::Error> {
        let mut png = Vec::new();
        image.write_to(&mut png, ImageFormat::Png)?;
        let payload: Value = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "image/png")
            .timeout(Duration::from_secs(30))
            .body(png)
            .send()
            .map_err(|e| format_err!("Detection request failed: {}", e))
            .await?
            .error_for_status()?
            .json()
            .await?;
        match payload {
            Value::Array(records) => Ok(records),
            other => {
                warn!("Detection service returned a non-list payload: {}", other);
                Ok(vec![])
            }
        }
    }
}

/// Reduces raw detection records to well-formed vehicle detections above
/// the confidence threshold. The upstream service is not trusted: records
/// missing a field or of the wrong shape are dropped, never an error.
pub fn filter_vehicles(raw: &[Value]) -> Vec<Detection> {
    raw.iter()
        .filter_map(parse_detection)
        .filter(|d| VEHICLE_LABELS.contains(&d.label.as_str()) && d.score > MIN_SCORE)
        .collect()
}

fn parse_detection(record: &Value) -> Option<Detection> {
    let label = record["label"].as_str()?;
    let score = record["score"].as_f64()?;
    let bbox = &record["box"];
    Some(Detection {
        label: label.to_string(),
        score,
        bbox: BoundingBox {
            xmin: bbox["xmin"].as_f64()?,
            ymin: bbox["ymin"].as_f64()?,
            xmax: bbox["xmax"].as_f64()?,
            ymax: bbox["ymax"].as_f64()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(label: &str, score: f64) -> Value {
        json!({
            "label": label,
            "score": score,
            "box": {"xmin": 10, "ymin": 20, "xmax": 30, "ymax": 40},
        })
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(filter_vehicles(&[]).is_empty());
    }

    #[test]
    fn non_vehicle_labels_are_dropped() {
        let raw = vec![record("person", 0.99), record("bench", 0.95)];
        assert!(filter_vehicles(&raw).is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        let raw = vec![record("car", 0.9), record("car", 0.5), record("car", 0.7)];
        let vehicles = filter_vehicles(&raw);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].score, 0.9);
    }

    #[test]
    fn all_vehicle_labels_pass() {
        let raw = vec![
            record("car", 0.8),
            record("truck", 0.8),
            record("bus", 0.8),
            record("motorcycle", 0.8),
        ];
        assert_eq!(filter_vehicles(&raw).len(), 4);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let raw = vec![
            json!("error: model is loading"),
            json!({"error": "rate limited"}),
            json!({"label": "car", "score": 0.9}),
            json!({"label": "car", "score": 0.9, "box": {"xmin": 1, "ymin": 2, "xmax": 3}}),
            json!({"label": "car", "score": "0.9", "box": {"xmin": 1, "ymin": 2, "xmax": 3, "ymax": 4}}),
            record("car", 0.9),
        ];
        let vehicles = filter_vehicles(&raw);
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].bbox.center(), crate::types::Point::new(20.0, 30.0));
    }

    #[test]
    fn integer_coordinates_parse_as_floats() {
        let vehicles = filter_vehicles(&[record("truck", 0.75)]);
        assert_eq!(vehicles[0].bbox.xmin, 10.0);
        assert_eq!(vehicles[0].bbox.ymax, 40.0);
    }
}

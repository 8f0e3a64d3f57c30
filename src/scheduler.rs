use crate::camera::ImageSource;
use crate::detector::Detector;
use crate::lot_map;
use crate::status;
use crate::types::{CameraConfig, Display, Frame, StatusMap};
use chrono::Local;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{error, info};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::delay_for;

const CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Operator requests, delivered from the HTTP surface.
#[derive(Debug)]
pub enum Trigger {
    CheckNow,
    SetAuto(bool),
}

/// Everything a cycle needs; loaded once at startup and immutable after.
pub struct Context {
    pub cameras: BTreeMap<u32, CameraConfig>,
    pub source: ImageSource,
    pub detector: Detector,
    pub lot_map: RgbaImage,
}

/// Owns all mutable display state. Runs a cycle on demand and, when
/// periodic updates are enabled, every 60 seconds; each completed cycle
/// replaces the published frame in one step, so an interrupted cycle
/// leaves the previous frame on display.
pub async fn run(mut rx: Receiver<Trigger>, context: Context, display: Display) {
    let mut auto = false;
    info!("Scheduler ready; waiting for operator triggers");
    loop {
        let trigger = if auto {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(trigger) => trigger,
                    None => break,
                },
                _ = delay_for(CHECK_INTERVAL) => Trigger::CheckNow,
            }
        } else {
            match rx.recv().await {
                Some(trigger) => trigger,
                None => break,
            }
        };
        let check = match trigger {
            Trigger::CheckNow => true,
            Trigger::SetAuto(enabled) => {
                info!(
                    "Periodic updates {}",
                    if enabled { "enabled" } else { "disabled" }
                );
                auto = enabled;
                // Enabling starts with an immediate check.
                enabled
            }
        };
        if !check {
            continue;
        }
        info!("Checking parking status");
        let status = status::run_cycle(&context.source, &context.detector, &context.cameras).await;
        let caption = if auto {
            format!("Live status as of {}", Local::now().format("%I:%M:%S %p"))
        } else {
            format!("Status at {}", Local::now().format("%I:%M:%S %p"))
        };
        match encode_frame(&context, &status, caption) {
            Ok(frame) => *display.lock().await = Some(frame),
            Err(e) => error!("Failed to render lot map: {}", e),
        }
    }
    info!("Trigger channel closed; scheduler exiting");
}

fn encode_frame(
    context: &Context,
    status: &StatusMap,
    caption: String,
) -> Result<Frame, failure::Error> {
    let rendered = lot_map::render(&context.lot_map, status, &context.cameras);
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(rendered).write_to(&mut png, ImageFormat::Png)?;
    Ok(Frame { png, caption })
}

mod camera;
mod config;
mod detector;
mod geometry;
mod lot_map;
mod occupancy;
mod scheduler;
mod server;
mod status;
mod types;

use env_logger::Env;
use log::{error, info};
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc::channel;
use tokio::sync::Mutex;

#[macro_use]
extern crate failure;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting lot-watcher");

    let spots_file = env::var("SPOTS_FILE").unwrap_or_else(|_| "parking_spots.json".to_string());
    let cameras = match config::load(&spots_file) {
        Ok(cameras) => cameras,
        Err(e) => {
            error!("Failed to load spots config: {}", e);
            std::process::exit(1);
        }
    };
    let lot_map_path = env::var("LOT_MAP_PATH").unwrap_or_else(|_| "lot_map.png".to_string());
    let lot_map = match image::open(&lot_map_path) {
        Ok(diagram) => diagram.to_rgba8(),
        Err(e) => {
            error!("Failed to load lot diagram {}: {}", lot_map_path, e);
            std::process::exit(1);
        }
    };
    let detector = match detector::Detector::from_env() {
        Ok(detector) => detector,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let (tx, rx) = channel(8);
    let display: types::Display = Arc::new(Mutex::new(None));
    let context = scheduler::Context {
        cameras,
        source: camera::ImageSource::from_env(),
        detector,
        lot_map,
    };
    let scheduler_task = tokio::spawn(scheduler::run(rx, context, display.clone()));
    let server_task = tokio::spawn(server::run(tx, display));
    tokio::select! {
        result = scheduler_task => {
            if let Err(e) = result {
                error!("Scheduler task failed: {}", e);
            }
        }
        result = server_task => {
            if let Err(e) = result {
                error!("Server task failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; shutting down");
        }
    }
    info!("Exiting main");
}

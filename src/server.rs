use crate::scheduler::Trigger;
use crate::types::Display;
use bytes::Bytes;
use log::{error, info};
use std::env;
use tokio::sync::mpsc::Sender;
use warp::http::{Response, StatusCode};
use warp::Filter;

#[derive(Debug)]
struct TriggerError;

impl warp::reject::Reject for TriggerError {}

/// Operator surface: the lot map page, the rendered PNG, a manual
/// "check now" trigger, and the periodic-updates toggle.
pub async fn run(tx: Sender<Trigger>, display: Display) {
    let port = env::var("LISTEN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8402u16);

    let with_tx = warp::any().map(move || tx.clone());
    let with_display = {
        let display = display.clone();
        warp::any().map(move || display.clone())
    };

    let index = warp::get()
        .and(warp::path::end())
        .and(with_display.clone())
        .and_then(index_page);
    let map_png = warp::get()
        .and(warp::path!("map.png"))
        .and(with_display)
        .and_then(map_png);
    let check = warp::post()
        .and(warp::path!("check"))
        .and(with_tx.clone())
        .and_then(check_now);
    let auto = warp::post()
        .and(warp::path!("auto"))
        .and(warp::body::bytes())
        .and(with_tx)
        .and_then(set_auto);

    info!("Listening on port {}", port);
    warp::serve(index.or(map_png).or(check).or(auto))
        .run(([0, 0, 0, 0], port))
        .await;
}

async fn index_page(display: Display) -> Result<impl warp::Reply, warp::Rejection> {
    let body = match display.lock().await.as_ref() {
        Some(frame) => format!(
            "<html><body><h1>Lot status</h1><p>Green = available, red = occupied.</p>\
             <img src=\"/map.png\"><p>{}</p></body></html>",
            frame.caption
        ),
        None => "<html><body><h1>Lot status</h1>\
                 <p>No check has run yet. POST /check to fetch current availability.</p>\
                 </body></html>"
            .to_string(),
    };
    Ok(warp::reply::html(body))
}

async fn map_png(display: Display) -> Result<Response<Vec<u8>>, warp::Rejection> {
    match display.lock().await.as_ref() {
        Some(frame) => Response::builder()
            .header("Content-Type", "image/png")
            .body(frame.png.clone())
            .map_err(|_| warp::reject::custom(TriggerError)),
        None => Err(warp::reject::not_found()),
    }
}

async fn check_now(mut tx: Sender<Trigger>) -> Result<impl warp::Reply, warp::Rejection> {
    info!("Manual check requested");
    send(&mut tx, Trigger::CheckNow).await?;
    Ok(warp::reply::with_status("Check scheduled\n", StatusCode::ACCEPTED))
}

async fn set_auto(
    body: Bytes,
    mut tx: Sender<Trigger>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let enabled = match std::str::from_utf8(&body).map(str::trim) {
        Ok("on") => true,
        Ok("off") => false,
        _ => {
            return Ok(warp::reply::with_status(
                "Expected body \"on\" or \"off\"\n",
                StatusCode::BAD_REQUEST,
            ))
        }
    };
    send(&mut tx, Trigger::SetAuto(enabled)).await?;
    Ok(warp::reply::with_status("Updated\n", StatusCode::ACCEPTED))
}

async fn send(tx: &mut Sender<Trigger>, trigger: Trigger) -> Result<(), warp::Rejection> {
    tx.send(trigger).await.map_err(|e| {
        error!("Scheduler is gone; dropping trigger: {}", e);
        warp::reject::custom(TriggerError)
    })
}

use futures::TryFutureExt;
use image::DynamicImage;
use scraper::{Html, Selector};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.mistall.com/v3/frame/5113";

/// Fetches camera snapshots. The cameras serve an HTML page with the
/// current frame embedded as a base64 data URL; everything that can go
/// wrong between the GET and the decoded raster is one uniform
/// "unavailable" error for the caller.
pub struct ImageSource {
    client: reqwest::Client,
    base_url: String,
}

impl ImageSource {
    pub fn from_env() -> ImageSource {
        let base_url =
            env::var("CAMERA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        ImageSource {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn fetch_snapshot(&self, camera: u32) -> Result<DynamicImage, failure::Error> {
        let url = format!("{}/Cam{}", self.base_url, camera);
        let body = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .timeout(Duration::from_secs(10))
            .send()
            .map_err(|e| format_err!("Request for {} failed: {}", url, e))
            .await?
            .error_for_status()?
            .text()
            .await?;
        decode_embedded_image(&body)
    }
}

/// Pulls the first `<img>` with a `data:image` source out of the camera
/// page and decodes it.
fn decode_embedded_image(html: &str) -> Result<DynamicImage, failure::Error> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("img").unwrap();
    let src = document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.starts_with("data:image"))
        .ok_or_else(|| format_err!("No embedded snapshot in camera page"))?;
    let payload = src
        .splitn(2, ',')
        .nth(1)
        .ok_or_else(|| format_err!("Malformed data URL in camera page"))?;
    let data = base64::decode(payload)?;
    Ok(image::load_from_memory(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn page_with_snapshot() -> String {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(8, 6))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        format!(
            "<html><body><h1>Cam 1</h1><img src=\"data:image/png;base64,{}\"></body></html>",
            base64::encode(&png)
        )
    }

    #[test]
    fn decodes_embedded_snapshot() {
        let image = decode_embedded_image(&page_with_snapshot()).unwrap();
        assert_eq!(image.to_rgba8().dimensions(), (8, 6));
    }

    #[test]
    fn skips_non_data_images() {
        let html = format!(
            "<html><body><img src=\"/logo.png\">{}</body></html>",
            page_with_snapshot()
        );
        assert!(decode_embedded_image(&html).is_ok());
    }

    #[test]
    fn page_without_snapshot_is_unavailable() {
        assert!(decode_embedded_image("<html><body>offline</body></html>").is_err());
        assert!(decode_embedded_image("<html><img src=\"http://x/y.png\"></html>").is_err());
    }

    #[test]
    fn garbage_payload_is_unavailable() {
        let html = "<html><img src=\"data:image/png;base64,!!not-base64!!\"></html>";
        assert!(decode_embedded_image(html).is_err());
    }
}

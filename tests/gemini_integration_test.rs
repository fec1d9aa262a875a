use fruit_inspect::config::Config;
use fruit_inspect::remote::GeminiClient;
use image::{Rgb, RgbImage};
use std::sync::Arc;

#[tokio::test]
async fn gemini_inspection_integration() {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {}
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return;
        }
    }

    let client = GeminiClient::from_config(&Config::default()).expect("client setup failed");

    // 赤い円（りんごに見立てる）
    let image = Arc::new(RgbImage::from_fn(128, 128, |x, y| {
        let (dx, dy) = (x as i32 - 64, y as i32 - 64);
        if dx * dx + dy * dy < 48 * 48 {
            Rgb([200, 30, 40])
        } else {
            Rgb([245, 245, 245])
        }
    }));

    let text = client.request_text(Arc::clone(&image)).await.expect("request failed");
    assert!(!text.trim().is_empty());

    let verdict = client.analyze(image).await.expect("verdict missing");
    assert!((0.0..=100.0).contains(&verdict.confidence_score));
}

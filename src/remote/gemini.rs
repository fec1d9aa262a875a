//! Gemini API連携
//!
//! 画像（JPEG + Base64）と検査プロンプトを1回だけ送り、応答テキストを判定に変換する。
//! 通信・HTTPエラーは None（AI判定なし）として呼び出し側に返す。

use super::encode_jpeg_base64;
use crate::config::Config;
use crate::error::{InspectError, Result};
use fruit_inspect_common::{build_inspection_prompt, parse_remote_response, RemoteVerdict};
use image::RgbImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// AI判定クライアント
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    jpeg_quality: u8,
    max_image_size: u32,
    prompt: String,
}

// APIキーはログに出さない
impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_image_size", &self.max_image_size)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// 設定から生成（APIキーが無ければ MissingApiKey）
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| InspectError::Config(format!("HTTPクライアント生成エラー: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            jpeg_quality: config.jpeg_quality,
            max_image_size: config.max_image_size,
            prompt: build_inspection_prompt(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    /// 画像を判定して RemoteVerdict を返す（失敗時は None）
    ///
    /// JSONとして読めない応答はキーワード判定で補うので、通信に成功すれば必ず Some
    pub async fn analyze(&self, image: Arc<RgbImage>) -> Option<RemoteVerdict> {
        match self.request_text(image).await {
            Ok(text) => {
                let verdict = parse_remote_response(&text);
                tracing::debug!(
                    "AI判定: {} ({}), 信頼度 {:.0}, {:?}",
                    verdict.condition_category,
                    verdict.fruit_type,
                    verdict.confidence_score,
                    verdict.origin
                );
                Some(verdict)
            }
            Err(e) => {
                tracing::warn!("AI判定を利用できません。ローカル解析のみで判定します: {}", e);
                None
            }
        }
    }

    /// 1回だけリクエストを送り、応答テキストを返す
    ///
    /// 縮小とJPEGエンコードはブロッキングスレッドで行う
    pub async fn request_text(&self, image: Arc<RgbImage>) -> Result<String> {
        let (quality, max_side) = (self.jpeg_quality, self.max_image_size);
        let data = tokio::task::spawn_blocking(move || encode_jpeg_base64(&image, quality, max_side))
            .await
            .map_err(|e| InspectError::Task(e.to_string()))??;

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: self.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let response = self
            .http
            .post(self.url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| InspectError::RemoteUnavailable(format!("送信エラー: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InspectError::RemoteUnavailable(format!("HTTP {}", status)));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| InspectError::RemoteUnavailable(format!("応答の読み取りエラー: {}", e)))?;

        let text = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| InspectError::RemoteUnavailable("応答が空です".into()))?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api_key: Some("file-key".into()),
            endpoint: "http://127.0.0.1:9/v1beta/models/".into(),
            model: "gemini-test".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_format() {
        let mut client = GeminiClient::from_config(&test_config()).unwrap();
        client.api_key = "abc".into();
        assert_eq!(
            client.url(),
            "http://127.0.0.1:9/v1beta/models/gemini-test:generateContent?key=abc"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let mut client = GeminiClient::from_config(&test_config()).unwrap();
        client.api_key = "very-secret-key".into();

        let printed = format!("{:?}", client);
        assert!(!printed.contains("very-secret-key"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("gemini-test"));
    }

    #[tokio::test]
    async fn test_request_text_unreachable_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = test_config();
        config.endpoint = format!("http://{}/v1beta/models", listener.local_addr().unwrap());
        drop(listener);

        let client = GeminiClient::from_config(&config).unwrap();
        let image = Arc::new(RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 10])));

        let result = client.request_text(image).await;
        assert!(matches!(result, Err(InspectError::RemoteUnavailable(_))));
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "prompt".into() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".into(),
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/jpeg");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GeminiResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(response.candidates.is_empty());
    }
}

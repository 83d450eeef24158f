//! Google Generative Language API client (Gemini text, Imagen images).

use crate::config::GenerationConfig;
use crate::generator::{
    GeneratedImage, GenerationError, ImageGenerator, TextGenerator, image_prompt, text_prompt,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Blocking client for both generation endpoints.
pub struct GeminiClient {
    client: Client,
    text_endpoint: String,
    image_endpoint: String,
    sampling: Sampling,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct Sampling {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(api_key: &str, config: &GenerationConfig) -> Result<Self, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| GenerationError::Http("invalid API key header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| GenerationError::Http(format!("failed to build HTTP client: {e}")))?;
        let base = config.api_base.trim_end_matches('/');
        Ok(Self {
            client,
            text_endpoint: format!("{base}/models/{}:generateContent", config.text_model),
            image_endpoint: format!("{base}/models/{}:predict", config.image_model),
            sampling: Sampling {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, GenerationError> {
        let resp = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .map_err(|e| GenerationError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(GenerationError::Status { status, body });
        }
        Ok(resp)
    }
}

impl TextGenerator for GeminiClient {
    fn generate_text(&self, topic: &str, seed: &str) -> Result<String, GenerationError> {
        let prompt = text_prompt(topic, seed);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: self.sampling,
        };
        debug!(endpoint = %self.text_endpoint, topic, "requesting post text");
        let parsed: GenerateContentResponse = self
            .post(&self.text_endpoint, &body)?
            .json()
            .map_err(|e| GenerationError::Unusable(format!("malformed text response: {e}")))?;
        extract_text(parsed)
    }
}

impl ImageGenerator for GeminiClient {
    fn generate_image(&self, topic: &str) -> Result<GeneratedImage, GenerationError> {
        let prompt = image_prompt(topic);
        let body = PredictRequest {
            instances: vec![Instance { prompt: &prompt }],
            parameters: PredictParameters { sample_count: 1 },
        };
        debug!(endpoint = %self.image_endpoint, topic, "requesting hero image");
        let parsed: PredictResponse = self
            .post(&self.image_endpoint, &body)?
            .json()
            .map_err(|e| GenerationError::Unusable(format!("malformed image response: {e}")))?;
        extract_image(parsed)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerationError::Unusable(
            "text response missing content".into(),
        ));
    }
    Ok(text)
}

fn extract_image(response: PredictResponse) -> Result<GeneratedImage, GenerationError> {
    let encoded = response
        .predictions
        .into_iter()
        .find_map(|p| p.bytes_base64_encoded)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GenerationError::Unusable("image response missing image data".into()))?;
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| GenerationError::Unusable(format!("image data is not base64: {e}")))?;
    GeneratedImage::from_bytes(bytes)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: Sampling,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_from_config() {
        let config = GenerationConfig {
            api_base: "https://api.example.com/v1beta/".into(),
            ..GenerationConfig::default()
        };
        let client = GeminiClient::new("key", &config).unwrap();
        assert_eq!(
            client.text_endpoint,
            "https://api.example.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            client.image_endpoint,
            "https://api.example.com/v1beta/models/imagen-3.0-generate-002:predict"
        );
    }

    #[test]
    fn text_request_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: Sampling {
                temperature: 0.5,
                top_p: 0.75,
                top_k: 40,
                max_output_tokens: 1500,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1500);
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["topP"], 0.75);
    }

    #[test]
    fn image_request_shape() {
        let body = PredictRequest {
            instances: vec![Instance { prompt: "a cat" }],
            parameters: PredictParameters { sample_count: 1 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["instances"][0]["prompt"], "a cat");
        assert_eq!(json["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Summary.\n\n"},{"text":"Body."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Summary.\n\nBody.");
    }

    #[test]
    fn extract_text_missing_content() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(GenerationError::Unusable(_))
        ));

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn extract_image_decodes_base64() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let json = format!(
            r#"{{"predictions":[{{"mimeType":"image/png","bytesBase64Encoded":"{}"}}]}}"#,
            BASE64.encode(&png)
        );
        let response: PredictResponse = serde_json::from_str(&json).unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image.bytes, png);
        assert_eq!(image.extension, "png");
    }

    #[test]
    fn extract_image_rejects_bad_base64() {
        let response: PredictResponse =
            serde_json::from_str(r#"{"predictions":[{"bytesBase64Encoded":"%%%"}]}"#).unwrap();
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::Unusable(_))
        ));
    }

    #[test]
    fn extract_image_missing_predictions() {
        let response: PredictResponse = serde_json::from_str(r#"{"predictions":[]}"#).unwrap();
        assert!(extract_image(response).is_err());
    }
}

//! HTTP calls to the individual OCR providers and normalisation of their
//! response bodies.
//!
//! Every call returns an explicit `Result`; deciding what to do with a failed
//! provider is left to the gateway.

use crate::error::OcrError;
use crate::gateway::{Recognition, RecognitionMode};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// A 200 response whose body parsed as a JSON object
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Body exactly as received
    pub body: String,
    pub json: Value,
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: AnnotateImage<'a>,
    features: [Feature; 1],
}

#[derive(Serialize)]
struct AnnotateImage<'a> {
    source: ImageSource<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Provider A: free aggregator endpoint, image passed as a query parameter
pub async fn free_ocr(
    client: &Client,
    base_url: &str,
    image_url: &str,
) -> Result<ProviderResponse, OcrError> {
    let endpoint = format!("{}/v1/ocr/image", base_url);
    tracing::debug!("GET {} for {}", endpoint, image_url);

    let response = client
        .get(&endpoint)
        .query(&[("url", image_url)])
        .send()
        .await
        .map_err(OcrError::from_reqwest)?;

    read_json(response).await
}

/// Provider B: ocr.space, form-encoded POST
pub async fn ocr_space(
    client: &Client,
    base_url: &str,
    api_key: &str,
    image_url: &str,
) -> Result<ProviderResponse, OcrError> {
    let endpoint = format!("{}/parse/image", base_url);
    let filetype = file_type(image_url);
    tracing::debug!("POST {} for {} (filetype {})", endpoint, image_url, filetype);

    let form = [
        ("url", image_url),
        ("apikey", api_key),
        ("language", "eng"),
        ("isOverlayRequired", "false"),
        ("filetype", filetype.as_str()),
    ];

    let response = client
        .post(&endpoint)
        .form(&form)
        .send()
        .await
        .map_err(OcrError::from_reqwest)?;

    read_json(response).await
}

/// Provider C: Cloud Vision `images:annotate`
pub async fn vision_annotate(
    client: &Client,
    base_url: &str,
    api_key: &str,
    image_url: &str,
    mode: RecognitionMode,
) -> Result<ProviderResponse, OcrError> {
    let endpoint = format!("{}/v1/images:annotate", base_url);
    tracing::debug!("POST {} for {} ({})", endpoint, image_url, mode.as_str());

    let payload = AnnotateRequest {
        requests: [AnnotateImageRequest {
            image: AnnotateImage {
                source: ImageSource {
                    image_uri: image_url,
                },
            },
            features: [Feature {
                kind: mode.as_str(),
            }],
        }],
    };

    let response = client
        .post(&endpoint)
        .query(&[("key", api_key)])
        .header(CONTENT_TYPE, "application/json;charset=utf-8")
        .json(&payload)
        .send()
        .await
        .map_err(OcrError::from_reqwest)?;

    read_json(response).await
}

async fn read_json(response: reqwest::Response) -> Result<ProviderResponse, OcrError> {
    let status = response.status();
    if status != StatusCode::OK {
        return Err(OcrError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(OcrError::from_reqwest)?;
    let json: Value =
        serde_json::from_str(&body).map_err(|e| OcrError::Decode(e.to_string()))?;
    if !json.is_object() {
        return Err(OcrError::Decode("expected a JSON object".to_string()));
    }

    Ok(ProviderResponse { body, json })
}

/// `textAnnotations[0].description` when it is a non-empty string
fn first_description(value: &Value) -> Option<&str> {
    value
        .get("textAnnotations")?
        .as_array()?
        .first()?
        .get("description")?
        .as_str()
        .filter(|text| !text.is_empty())
}

/// Normalise a free aggregator response
pub fn parse_free_ocr(response: ProviderResponse) -> Recognition {
    match first_description(&response.json) {
        Some(text) => Recognition::Text(text.to_string()),
        None => Recognition::Unrecognized(response.body),
    }
}

/// Normalise an ocr.space response; unknown shapes are passed through raw
pub fn parse_ocr_space(response: ProviderResponse) -> Recognition {
    let first = response
        .json
        .get("ParsedResults")
        .and_then(Value::as_array)
        .and_then(|results| results.first());

    match first {
        Some(parsed) => Recognition::Text(
            parsed
                .get("ParsedText")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        None => Recognition::Unrecognized(response.body),
    }
}

/// Normalise a Cloud Vision response
pub fn parse_vision(response: &ProviderResponse) -> Result<Recognition, OcrError> {
    let first = match response
        .json
        .get("responses")
        .and_then(Value::as_array)
        .and_then(|responses| responses.first())
    {
        Some(first) => first,
        None => return Ok(Recognition::NoText),
    };

    if first.as_object().map_or(true, |object| object.is_empty()) {
        return Ok(Recognition::NoText);
    }

    if let Some(message) = first
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
    {
        return Err(OcrError::Api {
            message: message.to_string(),
        });
    }

    Ok(match first_description(first) {
        Some(text) => Recognition::Text(text.to_string()),
        None => Recognition::NoText,
    })
}

/// Uppercased extension of the image URL, as ocr.space expects it
pub fn file_type(image_url: &str) -> String {
    let from_path = url::Url::parse(image_url).ok().and_then(|parsed| {
        let segment = parsed.path_segments()?.last()?.to_string();
        let (_, extension) = segment.rsplit_once('.')?;
        Some(extension.to_string())
    });

    from_path
        .unwrap_or_else(|| image_url.rsplit('.').next().unwrap_or_default().to_string())
        .to_uppercase()
}

// src/detector_client.rs
//
// Async HTTP client for the hazard detector backend. Ships one
// base64-encoded JPEG frame per request and turns the response into
// typed hazards at this boundary: anything malformed is dropped here,
// so ranking and debouncing never see untyped values.

use crate::frame_source::Frame;
use crate::geometry::GeometryEstimator;
use crate::text_cues;
use crate::types::{Detection, DetectorConfig, Direction, Distance, DistanceCategory, Hazard, Severity};

use anyhow::{bail, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

// ============================================================================
// REQUEST TYPE
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AnalyzeFrameRequest {
    pub request_id: String,
    pub timestamp_ms: f64,
    pub width: u32,
    pub height: u32,
    pub base64_image: String,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Wire response. Every field is optional; the backend variants differ
/// in which ones they fill.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeFrameResponse {
    pub warning: Option<String>,
    pub dangers: Vec<RawDanger>,
    pub is_danger: Option<bool>,
    pub message: Option<String>,
    pub raw_caption: Option<String>,
    pub latency_ms: Option<f64>,
}

/// One wire danger, completely untyped. Fields are validated one by one
/// in `hazard_from_raw`; a bad field degrades, a missing label drops
/// the element.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDanger {
    pub label: Value,
    pub confidence: Value,
    /// Category string ("VERY CLOSE", "near", ...)
    pub distance: Value,
    /// Numeric meters (or a numeric string)
    pub distance_m: Value,
    pub direction: Value,
    pub severity: Value,
    /// [x1, y1, x2, y2] in frame pixels
    pub bbox: Value,
}

/// Everything the pipeline consumes from one detector round trip
#[derive(Debug)]
pub struct FrameAnalysis {
    pub hazards: Vec<Hazard>,
    pub caption: Option<String>,
    pub latency_ms: Option<f64>,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct DetectorClient {
    endpoint: String,
    http_client: reqwest::Client,
    geometry: GeometryEstimator,
}

impl DetectorClient {
    pub fn new(config: &DetectorConfig, geometry: GeometryEstimator) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.request_timeout_sec))
            .build()
            .context("Failed to build HTTP client")?;

        let endpoint = format!("{}/analyze_frame", config.server_url.trim_end_matches('/'));

        Ok(Self {
            endpoint,
            http_client,
            geometry,
        })
    }

    /// Send one frame and return the typed hazards it produced.
    pub async fn analyze_frame(&self, frame: &Frame) -> Result<FrameAnalysis> {
        let request = AnalyzeFrameRequest {
            request_id: format!("frame_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f")),
            timestamp_ms: frame.timestamp_ms,
            width: frame.width,
            height: frame.height,
            base64_image: base64::engine::general_purpose::STANDARD.encode(&frame.jpeg),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("Failed to reach detector server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Detector server error {}: {}", status, body);
        }

        let parsed: AnalyzeFrameResponse = response
            .json()
            .await
            .context("Failed to parse detector response")?;

        Ok(parse_response(
            parsed,
            frame.width,
            frame.height,
            &self.geometry,
        ))
    }
}

// ============================================================================
// RESPONSE → HAZARDS
// ============================================================================

/// Convert a wire response into hazards. Malformed danger elements are
/// dropped; a response that flags danger but carries only caption text
/// goes through the textual cue fallback.
pub fn parse_response(
    response: AnalyzeFrameResponse,
    frame_width: u32,
    frame_height: u32,
    geometry: &GeometryEstimator,
) -> FrameAnalysis {
    let mut hazards: Vec<Hazard> = response
        .dangers
        .iter()
        .filter_map(|raw| hazard_from_raw(raw, frame_width, frame_height, geometry))
        .collect();

    if hazards.is_empty() {
        let flagged = response.is_danger.unwrap_or(false) || response.warning.is_some();
        let text = response
            .warning
            .as_deref()
            .or(response.raw_caption.as_deref())
            .or(response.message.as_deref());
        if flagged {
            if let Some(text) = text {
                hazards.push(text_cues::hazard_from_caption(text));
            }
        }
    }

    FrameAnalysis {
        hazards,
        caption: response.raw_caption.or(response.message),
        latency_ms: response.latency_ms,
    }
}

fn hazard_from_raw(
    raw: &RawDanger,
    frame_width: u32,
    frame_height: u32,
    geometry: &GeometryEstimator,
) -> Option<Hazard> {
    let label = raw.label.as_str()?.trim();
    if label.is_empty() {
        return None;
    }
    let label = label.to_string();

    // A valid bbox lets geometry fill whatever the wire left out
    let detection = parse_bbox(&raw.bbox).map(|bbox| Detection {
        label: label.clone(),
        confidence: parse_f32(&raw.confidence),
        bbox,
    });

    let wire_distance = parse_f32(&raw.distance_m)
        .map(Distance::Meters)
        .or_else(|| {
            raw.distance
                .as_str()
                .and_then(DistanceCategory::parse)
                .map(Distance::Category)
        })
        .or_else(|| parse_f32(&raw.distance).map(Distance::Meters));

    let distance = wire_distance.map(|d| geometry.coerce(d)).or_else(|| {
        detection
            .as_ref()
            .map(|det| geometry.estimate(det, frame_width, frame_height).0)
    });

    let direction = raw
        .direction
        .as_str()
        .and_then(Direction::parse)
        .or_else(|| {
            detection
                .as_ref()
                .map(|det| geometry.direction(&det.bbox, frame_width))
        })
        .unwrap_or(Direction::Front);

    let severity = raw
        .severity
        .as_str()
        .and_then(Severity::parse)
        .unwrap_or(Severity::Low);

    Some(Hazard {
        label,
        distance,
        direction,
        severity,
    })
}

/// Lenient float: JSON number or numeric string, finite only
fn parse_f32(value: &Value) -> Option<f32> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn parse_bbox(value: &Value) -> Option<[f32; 4]> {
    let array = value.as_array()?;
    if array.len() != 4 {
        return None;
    }

    let mut bbox = [0.0f32; 4];
    for (slot, v) in bbox.iter_mut().zip(array) {
        *slot = parse_f32(v)?;
    }

    // Degenerate boxes carry no usable geometry
    if bbox[0] >= bbox[2] || bbox[1] >= bbox[3] {
        return None;
    }
    Some(bbox)
}

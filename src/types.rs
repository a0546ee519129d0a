// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub sampling: SamplingConfig,
    pub alerts: AlertConfig,
    pub ranking: RankingConfig,
    pub geometry: GeometryConfig,
    pub frames: FrameSourceConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub server_url: String,
    pub request_timeout_sec: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            request_timeout_sec: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Minimum spacing between processed ticks, in seconds
    pub frame_interval_sec: f64,
    /// Sleep between polls of the frame slot, in seconds
    pub poll_interval_sec: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            frame_interval_sec: 6.0,
            poll_interval_sec: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Suppression window for near-identical warnings, in seconds
    pub min_repeat_interval_sec: f64,
    /// Two distances closer than this (in the active distance units)
    /// count as the same danger
    pub distance_tolerance: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_repeat_interval_sec: 8.0,
            distance_tolerance: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Scale applied to the severity weight so severity dominates
    /// moderate distance differences
    pub severity_scale: f32,
    /// Distance value assigned to each category, nearest first
    pub category_ordinals: [f32; 4],
    /// Distance value assumed when a hazard carries no distance at all
    pub default_distance_value: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            severity_scale: 10.0,
            category_ordinals: [0.0, 1.0, 2.0, 3.0],
            default_distance_value: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    Categories,
    Meters,
}

/// One step of a relative-height → category table. Steps are checked
/// top-down; the first one whose threshold is met wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStep {
    pub min_rel_height: f32,
    pub category: DistanceCategory,
}

/// One step of a bbox-area → category table (small hazardous objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaStep {
    pub min_area: f32,
    pub category: DistanceCategory,
}

/// One step of a relative-height → meters table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterStep {
    pub min_rel_height: f32,
    pub meters: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub mode: DistanceMode,
    /// Labels ranged by bbox area instead of height: dangerous while
    /// still small on screen
    pub small_object_labels: Vec<String>,
    pub height_steps: Vec<CategoryStep>,
    pub area_steps: Vec<AreaStep>,
    /// Per-label height tables overriding the default one
    pub label_height_overrides: BTreeMap<String, Vec<CategoryStep>>,
    pub meter_steps: Vec<MeterStep>,
    /// Meters reported when no meter step matches
    pub far_meters: f32,
    /// Upper meter bound of VERY_CLOSE / CLOSE / NEAR, used to coerce a
    /// wire meters value into a category
    pub category_meter_bounds: [f32; 3],
    /// Nominal meters per category, used to coerce a wire category into
    /// meters
    pub category_nominal_meters: [f32; 4],
}

impl Default for GeometryConfig {
    fn default() -> Self {
        let step = |min_rel_height, category| CategoryStep {
            min_rel_height,
            category,
        };

        let mut label_height_overrides = BTreeMap::new();
        label_height_overrides.insert(
            "fire".to_string(),
            vec![
                step(0.50, DistanceCategory::VeryClose),
                step(0.35, DistanceCategory::Close),
                step(0.22, DistanceCategory::Near),
            ],
        );

        Self {
            mode: DistanceMode::Categories,
            small_object_labels: vec![
                "knife".to_string(),
                "cable".to_string(),
                "tool".to_string(),
                "scissors".to_string(),
            ],
            height_steps: vec![
                step(0.45, DistanceCategory::VeryClose),
                step(0.30, DistanceCategory::Close),
                step(0.18, DistanceCategory::Near),
            ],
            area_steps: vec![
                AreaStep {
                    min_area: 50_000.0,
                    category: DistanceCategory::VeryClose,
                },
                AreaStep {
                    min_area: 25_000.0,
                    category: DistanceCategory::Close,
                },
                AreaStep {
                    min_area: 12_000.0,
                    category: DistanceCategory::Near,
                },
            ],
            label_height_overrides,
            meter_steps: vec![
                MeterStep {
                    min_rel_height: 0.60,
                    meters: 0.5,
                },
                MeterStep {
                    min_rel_height: 0.45,
                    meters: 1.0,
                },
                MeterStep {
                    min_rel_height: 0.30,
                    meters: 1.5,
                },
                MeterStep {
                    min_rel_height: 0.20,
                    meters: 2.0,
                },
                MeterStep {
                    min_rel_height: 0.15,
                    meters: 3.0,
                },
                MeterStep {
                    min_rel_height: 0.10,
                    meters: 4.0,
                },
            ],
            far_meters: 5.0,
            category_meter_bounds: [1.0, 2.0, 3.5],
            category_nominal_meters: [0.5, 1.5, 2.5, 5.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSourceConfig {
    pub input_dir: String,
    pub fps: f64,
    /// Nominal frame dimensions reported alongside the JPEG bytes.
    /// Only consulted when a response carries bbox-only detections.
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSourceConfig {
    fn default() -> Self {
        Self {
            input_dir: "frames".to_string(),
            fps: 2.0,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// "log" prints utterances, "espeak" shells out to espeak-ng
    pub engine: String,
    pub voice: String,
    /// Words per minute
    pub rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: "log".to_string(),
            voice: "en".to_string(),
            rate: 170,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// DOMAIN TYPES
// ============================================================================

/// One raw object report from the detector for one frame
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub confidence: Option<f32>,
    /// [x1, y1, x2, y2] in frame pixel coordinates
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Left,
    Front,
    Right,
    Behind,
}

impl Direction {
    /// Parse a wire direction. Unknown strings return None; callers
    /// default to Front.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "front" | "ahead" => Some(Direction::Front),
            "behind" | "behind you" | "back" => Some(Direction::Behind),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Front => "front",
            Direction::Right => "right",
            Direction::Behind => "behind",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceCategory {
    VeryClose,
    Close,
    Near,
    Far,
}

impl DistanceCategory {
    /// 0 = nearest, 3 = farthest
    pub fn ordinal(&self) -> usize {
        match self {
            DistanceCategory::VeryClose => 0,
            DistanceCategory::Close => 1,
            DistanceCategory::Near => 2,
            DistanceCategory::Far => 3,
        }
    }

    /// Parse a wire category like "VERY CLOSE", "very_close" or "near"
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "veryclose" => Some(DistanceCategory::VeryClose),
            "close" => Some(DistanceCategory::Close),
            "near" => Some(DistanceCategory::Near),
            "far" => Some(DistanceCategory::Far),
            _ => None,
        }
    }

    pub fn spoken(&self) -> &'static str {
        match self {
            DistanceCategory::VeryClose => "very close",
            DistanceCategory::Close => "close",
            DistanceCategory::Near => "near",
            DistanceCategory::Far => "far",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceCategory::VeryClose => "VERY CLOSE",
            DistanceCategory::Close => "CLOSE",
            DistanceCategory::Near => "NEAR",
            DistanceCategory::Far => "FAR",
        }
    }
}

/// A hazard's distance, in exactly one of the two representations.
/// One tick's hazards always share a representation; the parse boundary
/// coerces wire values into the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Distance {
    Category(DistanceCategory),
    Meters(f32),
}

impl Distance {
    /// Collapse to a comparable distance value: meters as-is, categories
    /// through the configured ordinal table
    pub fn units(&self, category_ordinals: &[f32; 4]) -> f32 {
        match self {
            Distance::Meters(m) => *m,
            Distance::Category(c) => category_ordinals[c.ordinal()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }

    pub fn weight(&self) -> f32 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
        }
    }
}

/// A detection enriched with distance and direction, ready for ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hazard {
    pub label: String,
    pub distance: Option<Distance>,
    pub direction: Direction,
    pub severity: Severity,
}

/// A rendered warning plus the hazard it came from. The hazard is kept
/// for similarity comparison; it is never re-parsed from the text.
#[derive(Debug, Clone)]
pub struct Warning {
    pub text: String,
    pub hazard: Hazard,
}

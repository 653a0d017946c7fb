use crate::error::StageError;
use log::LevelFilter;
use serde::Deserialize;

const DEFAULT_REVEAL_POLICY: RevealPolicy = RevealPolicy::Replay;
const DEFAULT_POINTER_THRESHOLD: f64 = 0.2;
const DEFAULT_POINTER_ROOT_MARGIN: &str = "0px 0px -40px 0px";
const DEFAULT_TOUCH_THRESHOLD: f64 = 0.1;
const DEFAULT_TOUCH_ROOT_MARGIN: &str = "0px 0px -20px 0px";
const DEFAULT_POINTER_COUNTER_MS: f64 = 1_500.0;
const DEFAULT_TOUCH_COUNTER_MS: f64 = 1_000.0;
const DEFAULT_HERO_REVEAL_DELAY_MS: u32 = 300;
const DEFAULT_POINTER_THROTTLE_MS: u32 = 16;
const DEFAULT_SWIPE_THRESHOLD_PX: f64 = 50.0;
const DEFAULT_CTA_SECTION: usize = 4;
const DEFAULT_POINTER_RANGE: f64 = 20.0;
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

const THRESHOLD_BOUNDS: (f64, f64) = (0.0, 1.0);
const COUNTER_MS_BOUNDS: (f64, f64) = (100.0, 10_000.0);
const HERO_REVEAL_DELAY_MS_BOUNDS: (u32, u32) = (0, 5_000);
const POINTER_THROTTLE_MS_BOUNDS: (u32, u32) = (4, 250);
const SWIPE_THRESHOLD_PX_BOUNDS: (f64, f64) = (10.0, 400.0);
const CTA_SECTION_BOUNDS: (usize, usize) = (0, 64);
const POINTER_RANGE_BOUNDS: (f64, f64) = (0.0, 200.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPolicy {
    Replay,
    Sticky,
}

impl RevealPolicy {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "replay" => Some(Self::Replay),
            "sticky" => Some(Self::Sticky),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Pointer,
    Touch,
}

impl DeviceClass {
    pub fn from_coarse_pointer(coarse: bool) -> Self {
        if coarse {
            Self::Touch
        } else {
            Self::Pointer
        }
    }

    pub fn is_touch(self) -> bool {
        matches!(self, Self::Touch)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RevealTuning {
    pub threshold: f64,
    pub root_margin: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    pub reveal_policy: RevealPolicy,
    pub pointer_reveal: RevealTuning,
    pub touch_reveal: RevealTuning,
    pub pointer_counter_ms: f64,
    pub touch_counter_ms: f64,
    pub hero_reveal_delay_ms: u32,
    pub pointer_throttle_ms: u32,
    pub swipe_threshold_px: f64,
    pub cta_section: usize,
    pub pointer_range: f64,
    pub block_context_menu: bool,
    pub log_level: LevelFilter,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            reveal_policy: DEFAULT_REVEAL_POLICY,
            pointer_reveal: RevealTuning {
                threshold: DEFAULT_POINTER_THRESHOLD,
                root_margin: DEFAULT_POINTER_ROOT_MARGIN.to_string(),
            },
            touch_reveal: RevealTuning {
                threshold: DEFAULT_TOUCH_THRESHOLD,
                root_margin: DEFAULT_TOUCH_ROOT_MARGIN.to_string(),
            },
            pointer_counter_ms: DEFAULT_POINTER_COUNTER_MS,
            touch_counter_ms: DEFAULT_TOUCH_COUNTER_MS,
            hero_reveal_delay_ms: DEFAULT_HERO_REVEAL_DELAY_MS,
            pointer_throttle_ms: DEFAULT_POINTER_THROTTLE_MS,
            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
            cta_section: DEFAULT_CTA_SECTION,
            pointer_range: DEFAULT_POINTER_RANGE,
            block_context_menu: false,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStageConfig {
    reveal_policy: Option<String>,
    pointer_threshold: Option<f64>,
    pointer_root_margin: Option<String>,
    touch_threshold: Option<f64>,
    touch_root_margin: Option<String>,
    pointer_counter_ms: Option<f64>,
    touch_counter_ms: Option<f64>,
    hero_reveal_delay_ms: Option<u32>,
    pointer_throttle_ms: Option<u32>,
    swipe_threshold_px: Option<f64>,
    cta_section: Option<usize>,
    pointer_range: Option<f64>,
    block_context_menu: Option<bool>,
    log_level: Option<String>,
}

impl StageConfig {
    pub fn from_json(source: &str) -> Result<Self, StageError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawStageConfig = serde_json::from_str(source)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawStageConfig) -> Self {
        let defaults = Self::default();

        Self {
            reveal_policy: raw
                .reveal_policy
                .as_deref()
                .map(|value| value.trim().to_ascii_lowercase())
                .and_then(|value| RevealPolicy::from_str(&value))
                .unwrap_or(defaults.reveal_policy),
            pointer_reveal: RevealTuning {
                threshold: f64_with_bounds(
                    raw.pointer_threshold,
                    DEFAULT_POINTER_THRESHOLD,
                    THRESHOLD_BOUNDS,
                ),
                root_margin: root_margin_or_default(
                    raw.pointer_root_margin,
                    DEFAULT_POINTER_ROOT_MARGIN,
                ),
            },
            touch_reveal: RevealTuning {
                threshold: f64_with_bounds(
                    raw.touch_threshold,
                    DEFAULT_TOUCH_THRESHOLD,
                    THRESHOLD_BOUNDS,
                ),
                root_margin: root_margin_or_default(raw.touch_root_margin, DEFAULT_TOUCH_ROOT_MARGIN),
            },
            pointer_counter_ms: f64_with_bounds(
                raw.pointer_counter_ms,
                DEFAULT_POINTER_COUNTER_MS,
                COUNTER_MS_BOUNDS,
            ),
            touch_counter_ms: f64_with_bounds(
                raw.touch_counter_ms,
                DEFAULT_TOUCH_COUNTER_MS,
                COUNTER_MS_BOUNDS,
            ),
            hero_reveal_delay_ms: u32_with_bounds(
                raw.hero_reveal_delay_ms,
                DEFAULT_HERO_REVEAL_DELAY_MS,
                HERO_REVEAL_DELAY_MS_BOUNDS,
            ),
            pointer_throttle_ms: u32_with_bounds(
                raw.pointer_throttle_ms,
                DEFAULT_POINTER_THROTTLE_MS,
                POINTER_THROTTLE_MS_BOUNDS,
            ),
            swipe_threshold_px: f64_with_bounds(
                raw.swipe_threshold_px,
                DEFAULT_SWIPE_THRESHOLD_PX,
                SWIPE_THRESHOLD_PX_BOUNDS,
            ),
            cta_section: raw
                .cta_section
                .filter(|value| (CTA_SECTION_BOUNDS.0..=CTA_SECTION_BOUNDS.1).contains(value))
                .unwrap_or(DEFAULT_CTA_SECTION),
            pointer_range: f64_with_bounds(
                raw.pointer_range,
                DEFAULT_POINTER_RANGE,
                POINTER_RANGE_BOUNDS,
            ),
            block_context_menu: raw.block_context_menu.unwrap_or(defaults.block_context_menu),
            log_level: parse_log_level(raw.log_level.as_deref(), DEFAULT_LOG_LEVEL),
        }
    }

    pub fn reveal_tuning(&self, device: DeviceClass) -> &RevealTuning {
        match device {
            DeviceClass::Pointer => &self.pointer_reveal,
            DeviceClass::Touch => &self.touch_reveal,
        }
    }

    pub fn counter_duration_ms(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Pointer => self.pointer_counter_ms,
            DeviceClass::Touch => self.touch_counter_ms,
        }
    }
}

fn f64_with_bounds(value: Option<f64>, default: f64, bounds: (f64, f64)) -> f64 {
    value
        .filter(|value| value.is_finite())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn u32_with_bounds(value: Option<u32>, default: u32, bounds: (u32, u32)) -> u32 {
    value
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn root_margin_or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| is_valid_root_margin(value))
        .unwrap_or_else(|| default.to_string())
}

fn is_valid_root_margin(value: &str) -> bool {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 4 {
        return false;
    }

    parts.iter().all(|part| {
        let number = part
            .strip_suffix("px")
            .or_else(|| part.strip_suffix('%'))
            .unwrap_or(if *part == "0" { "0" } else { "" });
        number.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    })
}

fn parse_log_level(value: Option<&str>, default: LevelFilter) -> LevelFilter {
    match value
        .map(|value| value.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        Some("off") => LevelFilter::Off,
        _ => default,
    }
}

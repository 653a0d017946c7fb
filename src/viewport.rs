pub const VIEWPORT_UNIT_PROPERTY: &str = "--vh";

const FALLBACK_WIDTH: f64 = 1280.0;
const FALLBACK_HEIGHT: f64 = 720.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn from_window(width: Option<f64>, height: Option<f64>) -> Self {
        Self {
            width: usable(width).unwrap_or(FALLBACK_WIDTH),
            height: usable(height).unwrap_or(FALLBACK_HEIGHT),
        }
    }

    pub fn height_unit(self) -> f64 {
        self.height * 0.01
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: FALLBACK_WIDTH,
            height: FALLBACK_HEIGHT,
        }
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}

#[derive(Debug, Default)]
pub struct ViewportMetrics {
    current: Viewport,
    published_unit: Option<f64>,
}

impl ViewportMetrics {
    pub fn current(&self) -> Viewport {
        self.current
    }

    pub fn refresh(&mut self, viewport: Viewport) -> Option<String> {
        self.current = viewport;
        let unit = viewport.height_unit();

        if self.published_unit == Some(unit) {
            return None;
        }

        self.published_unit = Some(unit);
        Some(format!("{unit}px"))
    }
}

pub const NAV_DOT_SELECTOR: &str = ".nav-dot";
pub const CTA_SELECTOR: &str = "#heroButtons .btn-liquid";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
    Jump(usize),
}

impl NavCommand {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" => Some(Self::Next),
            "ArrowUp" => Some(Self::Previous),
            _ => None,
        }
    }

    pub fn resolve(self, current: Option<usize>, section_count: usize) -> Option<usize> {
        let current = current.unwrap_or(0);
        let target = match self {
            Self::Next => current.checked_add(1)?,
            Self::Previous => current.checked_sub(1)?,
            Self::Jump(index) => index,
        };

        (target < section_count).then_some(target)
    }
}

#[derive(Debug)]
pub struct SwipeTracker {
    threshold_px: f64,
    start_y: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            start_y: None,
        }
    }

    pub fn begin(&mut self, y: f64) {
        self.start_y = Some(y);
    }

    pub fn end(&mut self, y: f64) -> Option<NavCommand> {
        let start = self.start_y.take()?;
        let delta = start - y;

        if !delta.is_finite() || delta.abs() <= self.threshold_px {
            return None;
        }

        Some(if delta > 0.0 {
            NavCommand::Next
        } else {
            NavCommand::Previous
        })
    }

    pub fn cancel(&mut self) {
        self.start_y = None;
    }
}

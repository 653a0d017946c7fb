use std::collections::HashMap;

use crate::surface::ElementId;

pub fn ease_out_cubic(progress: f64) -> f64 {
    1.0 - (1.0 - progress).powi(3)
}

pub fn parse_target(raw: Option<&str>) -> u64 {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return 0;
    };

    if let Ok(value) = raw.parse::<u64>() {
        return value;
    }

    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value.floor() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CounterAnimation {
    generation: u64,
    started_at: f64,
    duration_ms: f64,
    target: u64,
    displayed: u64,
}

impl CounterAnimation {
    fn value_at(&self, now: f64) -> (u64, bool) {
        let progress = if self.duration_ms > 0.0 {
            ((now - self.started_at) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            return (self.target, true);
        }

        let eased = ease_out_cubic(progress);
        let value = (eased * self.target as f64).floor() as u64;
        (value.min(self.target), false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterFrame {
    Running(u64),
    Finished(u64),
    Stale,
}

/// Per-element counter runs. Each start bumps the element's generation, so frames
/// scheduled by an earlier run fall through as [`CounterFrame::Stale`].
#[derive(Debug, Default)]
pub struct CounterAnimator {
    generations: HashMap<ElementId, u64>,
    active: HashMap<ElementId, CounterAnimation>,
}

impl CounterAnimator {
    pub fn start(&mut self, element: ElementId, target: u64, now: f64, duration_ms: f64) -> u64 {
        let generation = self.bump(element);
        self.active.insert(
            element,
            CounterAnimation {
                generation,
                started_at: now,
                duration_ms,
                target,
                displayed: 0,
            },
        );
        generation
    }

    pub fn cancel(&mut self, element: ElementId) {
        self.bump(element);
        self.active.remove(&element);
    }

    pub fn frame(&mut self, element: ElementId, generation: u64, now: f64) -> CounterFrame {
        let Some(animation) = self.active.get_mut(&element) else {
            return CounterFrame::Stale;
        };

        if animation.generation != generation {
            return CounterFrame::Stale;
        }

        let (value, finished) = animation.value_at(now);
        // Frame timestamps may arrive out of order; the display never counts backwards.
        let value = value.max(animation.displayed);
        animation.displayed = value;

        if finished {
            self.active.remove(&element);
            CounterFrame::Finished(value)
        } else {
            CounterFrame::Running(value)
        }
    }

    pub fn is_running(&self, element: ElementId) -> bool {
        self.active.contains_key(&element)
    }

    fn bump(&mut self, element: ElementId) -> u64 {
        let generation = self.generations.entry(element).or_insert(0);
        *generation += 1;
        *generation
    }
}

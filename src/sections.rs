pub fn section_for_offset(offset: f64, viewport_height: f64, section_count: usize) -> Option<usize> {
    if section_count == 0 || !viewport_height.is_finite() || viewport_height <= 0.0 {
        return None;
    }

    let raw = (offset / viewport_height).round();
    if raw.is_nan() {
        return None;
    }

    let last = (section_count - 1) as f64;
    Some(raw.clamp(0.0, last) as usize)
}

#[derive(Debug, PartialEq, Eq)]
pub struct DotChange {
    pub section: usize,
    pub cleared: Vec<usize>,
    pub activated: Option<usize>,
}

#[derive(Debug)]
pub struct SectionTracker {
    section_count: usize,
    current: Option<usize>,
}

impl SectionTracker {
    pub fn new(section_count: usize) -> Self {
        Self {
            section_count,
            current: None,
        }
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn sync(&mut self, offset: f64, viewport_height: f64, dot_count: usize) -> Option<DotChange> {
        let index = section_for_offset(offset, viewport_height, self.section_count)?;
        if self.current == Some(index) {
            return None;
        }

        self.current = Some(index);
        Some(DotChange {
            section: index,
            cleared: (0..dot_count).filter(|dot| *dot != index).collect(),
            activated: (index < dot_count).then_some(index),
        })
    }
}

#[derive(Debug, Default)]
pub struct FrameGate {
    scheduled: bool,
}

impl FrameGate {
    pub fn request(&mut self) -> bool {
        if self.scheduled {
            return false;
        }

        self.scheduled = true;
        true
    }

    /// Called once the frame's work has run; until then further requests are folded in.
    pub fn release(&mut self) {
        self.scheduled = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

use crate::surface::Layer;
use crate::viewport::Viewport;

pub const BACK_LAYER_SELECTOR: &str = ".parallax-back";
pub const MID_LAYER_SELECTOR: &str = ".parallax-mid";
pub const FLOAT_SELECTOR: &str = ".float-anim, .float-anim-reverse";

// Scroll factor, simulated depth (px) and compensating scale for each scroll-linked layer.
const SCROLL_LAYERS: [(Layer, f64, f64, f64); 2] =
    [(Layer::Back, 0.4, -2.0, 3.0), (Layer::Mid, 0.2, -1.0, 2.0)];

#[derive(Debug)]
pub struct ParallaxDriver {
    enabled: bool,
    pointer_range: f64,
    pointer: Option<(f64, f64)>,
    pointer_pending: bool,
}

impl ParallaxDriver {
    pub fn new(enabled: bool, pointer_range: f64) -> Self {
        Self {
            enabled,
            pointer_range,
            pointer: None,
            pointer_pending: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scroll_transforms(&self, offset: f64) -> Vec<(Layer, String)> {
        if !self.enabled || !offset.is_finite() {
            return Vec::new();
        }

        SCROLL_LAYERS
            .iter()
            .map(|&(layer, factor, depth, scale)| {
                (
                    layer,
                    format!("translate3d(0, {:.2}px, {depth}px) scale({scale})", offset * factor),
                )
            })
            .collect()
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) -> bool {
        if !self.enabled {
            return false;
        }

        self.pointer = Some((x, y));
        if self.pointer_pending {
            return false;
        }

        self.pointer_pending = true;
        true
    }

    pub fn pointer_tick(&mut self, viewport: Viewport) -> Option<String> {
        self.pointer_pending = false;
        if !self.enabled {
            return None;
        }

        let (x, y) = self.pointer?;
        let (dx, dy) = self.pointer_offset(x, y, viewport);
        Some(format!("translate({dx:.2}px, {dy:.2}px)"))
    }

    fn pointer_offset(&self, x: f64, y: f64, viewport: Viewport) -> (f64, f64) {
        let range = self.pointer_range;
        let dx = (x / viewport.width - 0.5) * range;
        let dy = (y / viewport.height - 0.5) * range;
        let limit = range / 2.0;
        (dx.clamp(-limit, limit), dy.clamp(-limit, limit))
    }
}

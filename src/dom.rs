use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, ScrollBehavior, ScrollIntoViewOptions, Window};

use crate::counter::parse_target;
use crate::input::{CTA_SELECTOR, NAV_DOT_SELECTOR};
use crate::parallax::{BACK_LAYER_SELECTOR, FLOAT_SELECTOR, MID_LAYER_SELECTOR};
use crate::reveal::{Category, ANIMATABLE_SELECTOR};
use crate::surface::{ElementId, Layer, Surface};
use crate::viewport::Viewport;

pub const CONTAINER_ID: &str = "parallaxContainer";
pub const CONFIG_ATTRIBUTE: &str = "data-stage-config";
pub const SCRIPTED_CLASS: &str = "js-enabled";

const SECTION_SELECTOR: &str = "section";
const DECORATION_SELECTOR: &str = ".pulse-glow, .float-anim, .float-anim-reverse";
const ACTIVE_CLASS: &str = "active";
const VISIBLE_CLASS: &str = "visible";
const COUNTED_CLASS: &str = "counted";
const TARGET_ATTRIBUTE: &str = "data-target";

pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(nodes) = document.query_selector_all(selector) else {
        return Vec::new();
    };

    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
    Reflect::get(element, &JsValue::from_str("style"))
        .ok()?
        .dyn_into::<CssStyleDeclaration>()
        .ok()
}

fn set_class(element: &Element, class: &str, on: bool) {
    let classes = element.class_list();
    let _ = if on {
        classes.add_1(class)
    } else {
        classes.remove_1(class)
    };
}

pub fn classify(element: &Element) -> Category {
    let classes = element.class_list();
    Category::classify(
        |class| classes.contains(class),
        || parse_target(element.get_attribute(TARGET_ATTRIBUTE).as_deref()),
    )
}

pub struct DomSurface {
    window: Window,
    root: Option<Element>,
    container: Option<Element>,
    sections: Vec<Element>,
    dots: Vec<Element>,
    cta: Option<Element>,
    animatables: Vec<Element>,
    back_layers: Vec<Element>,
    mid_layers: Vec<Element>,
    floaters: Vec<Element>,
    decorations: Vec<Element>,
}

impl DomSurface {
    pub fn discover(window: Window, document: &Document) -> Self {
        Self {
            root: document.document_element(),
            container: document.get_element_by_id(CONTAINER_ID),
            sections: query_all(document, SECTION_SELECTOR),
            dots: query_all(document, NAV_DOT_SELECTOR),
            cta: document.query_selector(CTA_SELECTOR).ok().flatten(),
            animatables: query_all(document, ANIMATABLE_SELECTOR),
            back_layers: query_all(document, BACK_LAYER_SELECTOR),
            mid_layers: query_all(document, MID_LAYER_SELECTOR),
            floaters: query_all(document, FLOAT_SELECTOR),
            decorations: query_all(document, DECORATION_SELECTOR),
            window,
        }
    }

    pub fn container(&self) -> Option<&Element> {
        self.container.as_ref()
    }

    pub fn dots(&self) -> &[Element] {
        &self.dots
    }

    pub fn cta(&self) -> Option<&Element> {
        self.cta.as_ref()
    }

    pub fn animatables(&self) -> &[Element] {
        &self.animatables
    }

    pub fn element_id(&self, target: &Element) -> Option<ElementId> {
        self.animatables
            .iter()
            .position(|element| element == target)
            .map(ElementId)
    }

    fn layer(&self, layer: Layer) -> &[Element] {
        match layer {
            Layer::Back => &self.back_layers,
            Layer::Mid => &self.mid_layers,
            Layer::Float => &self.floaters,
        }
    }
}

impl Surface for DomSurface {
    fn scroll_offset(&self) -> f64 {
        self.container
            .as_ref()
            .map(|container| f64::from(container.scroll_top()))
            .unwrap_or(0.0)
    }

    fn viewport(&self) -> Viewport {
        Viewport::from_window(
            self.window.inner_width().ok().and_then(|value| value.as_f64()),
            self.window.inner_height().ok().and_then(|value| value.as_f64()),
        )
    }

    fn section_count(&self) -> usize {
        if self.container.is_some() {
            self.sections.len()
        } else {
            0
        }
    }

    fn dot_count(&self) -> usize {
        self.dots.len()
    }

    fn set_root_property(&mut self, name: &str, value: &str) {
        if let Some(style) = self.root.as_ref().and_then(inline_style) {
            let _ = style.set_property(name, value);
        }
    }

    fn set_dot_active(&mut self, index: usize, active: bool) {
        if let Some(dot) = self.dots.get(index) {
            set_class(dot, ACTIVE_CLASS, active);
        }
    }

    fn scroll_to_section(&mut self, index: usize) {
        let Some(section) = self.sections.get(index) else {
            return;
        };

        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        section.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn set_revealed(&mut self, element: ElementId, revealed: bool) {
        if let Some(element) = self.animatables.get(element.0) {
            set_class(element, VISIBLE_CLASS, revealed);
        }
    }

    fn set_counted(&mut self, element: ElementId, counted: bool) {
        if let Some(element) = self.animatables.get(element.0) {
            set_class(element, COUNTED_CLASS, counted);
        }
    }

    fn set_counter_text(&mut self, element: ElementId, text: &str) {
        if let Some(element) = self.animatables.get(element.0) {
            element.set_text_content(Some(text));
        }
    }

    fn apply_layer_transform(&mut self, layer: Layer, transform: &str) {
        for style in self.layer(layer).iter().filter_map(inline_style) {
            let _ = style.set_property("transform", transform);
        }
    }

    fn set_decor_running(&mut self, running: bool) {
        let state = if running { "running" } else { "paused" };
        for style in self.decorations.iter().filter_map(inline_style) {
            let _ = style.set_property("animation-play-state", state);
        }
    }
}

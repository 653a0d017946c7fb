use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Back,
    Mid,
    Float,
}

/// The page as the controller sees it. Every method is infallible: a missing node makes
/// the write a no-op.
pub trait Surface {
    fn scroll_offset(&self) -> f64;

    fn viewport(&self) -> Viewport;

    fn section_count(&self) -> usize;

    fn dot_count(&self) -> usize;

    fn set_root_property(&mut self, name: &str, value: &str);

    fn set_dot_active(&mut self, index: usize, active: bool);

    fn scroll_to_section(&mut self, index: usize);

    fn set_revealed(&mut self, element: ElementId, revealed: bool);

    fn set_counted(&mut self, element: ElementId, counted: bool);

    fn set_counter_text(&mut self, element: ElementId, text: &str);

    fn apply_layer_transform(&mut self, layer: Layer, transform: &str);

    fn set_decor_running(&mut self, running: bool);
}

use log::Level;
use serde_json::json;

use crate::config::{DeviceClass, RevealTuning, StageConfig};
use crate::counter::{CounterAnimator, CounterFrame};
use crate::input::{NavCommand, SwipeTracker};
use crate::parallax::ParallaxDriver;
use crate::reveal::{Category, RevealEffect, RevealEngine};
use crate::sections::{FrameGate, SectionTracker};
use crate::surface::{ElementId, Layer, Surface};
use crate::telemetry::log_event;
use crate::viewport::{ViewportMetrics, VIEWPORT_UNIT_PROPERTY};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameTask {
    SyncScroll,
    Counter { element: ElementId, generation: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    RevealHero,
    PointerParallax,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wakeup {
    Frame(FrameTask),
    After { delay_ms: u32, task: TimerTask },
}

pub struct StageController<S: Surface> {
    surface: S,
    config: StageConfig,
    device: DeviceClass,
    viewport: ViewportMetrics,
    sections: SectionTracker,
    scroll_gate: FrameGate,
    reveal: RevealEngine,
    counters: CounterAnimator,
    parallax: ParallaxDriver,
    swipe: SwipeTracker,
    wakeups: Vec<Wakeup>,
}

impl<S: Surface> StageController<S> {
    pub fn new(surface: S, config: StageConfig, device: DeviceClass) -> Self {
        let sections = SectionTracker::new(surface.section_count());
        let reveal = RevealEngine::new(config.reveal_policy);
        let parallax = ParallaxDriver::new(!device.is_touch(), config.pointer_range);
        let swipe = SwipeTracker::new(config.swipe_threshold_px);

        Self {
            surface,
            config,
            device,
            viewport: ViewportMetrics::default(),
            sections,
            scroll_gate: FrameGate::default(),
            reveal,
            counters: CounterAnimator::default(),
            parallax,
            swipe,
            wakeups: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn current_section(&self) -> Option<usize> {
        self.sections.current()
    }

    pub fn observer_options(&self) -> &RevealTuning {
        self.config.reveal_tuning(self.device)
    }

    pub fn register(&mut self, category: Category) -> ElementId {
        self.reveal.register(category)
    }

    pub fn take_wakeups(&mut self) -> Vec<Wakeup> {
        std::mem::take(&mut self.wakeups)
    }

    pub fn start(&mut self) {
        self.refresh_viewport();
        self.sync_sections();

        log_event(
            Level::Info,
            "stage_started",
            json!({
                "sections": self.sections.section_count(),
                "device": if self.device.is_touch() { "touch" } else { "pointer" },
                "parallax": self.parallax.is_enabled(),
            }),
        );
    }

    pub fn on_load(&mut self) {
        self.refresh_viewport();
        self.wakeups.push(Wakeup::After {
            delay_ms: self.config.hero_reveal_delay_ms,
            task: TimerTask::RevealHero,
        });
        self.sync_sections();
    }

    pub fn on_resize(&mut self) {
        self.refresh_viewport();
        self.sync_sections();
    }

    pub fn on_scroll(&mut self) {
        self.request_scroll_frame();
    }

    pub fn on_intersections<I>(&mut self, entries: I, now: f64)
    where
        I: IntoIterator<Item = (ElementId, bool)>,
    {
        for (element, intersecting) in entries {
            let effects = self.reveal.observe(element, intersecting);
            self.apply_reveal_effects(effects, now);
        }
    }

    pub fn on_key(&mut self, key: &str) -> bool {
        NavCommand::from_key(key).is_some_and(|command| self.navigate(command))
    }

    pub fn on_dot_click(&mut self, index: usize) -> bool {
        self.navigate(NavCommand::Jump(index))
    }

    pub fn on_cta(&mut self) -> bool {
        self.navigate(NavCommand::Jump(self.config.cta_section))
    }

    pub fn on_touch_start(&mut self, y: f64) {
        self.swipe.begin(y);
    }

    pub fn on_touch_end(&mut self, y: f64) -> bool {
        self.swipe
            .end(y)
            .is_some_and(|command| self.navigate(command))
    }

    pub fn on_touch_cancel(&mut self) {
        self.swipe.cancel();
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        if self.parallax.pointer_moved(x, y) {
            self.wakeups.push(Wakeup::After {
                delay_ms: self.config.pointer_throttle_ms,
                task: TimerTask::PointerParallax,
            });
        }
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        self.surface.set_decor_running(!hidden);
        log_event(Level::Debug, "visibility_changed", json!({ "hidden": hidden }));
    }

    pub fn navigate(&mut self, command: NavCommand) -> bool {
        let Some(target) = command.resolve(self.sections.current(), self.sections.section_count())
        else {
            return false;
        };

        self.surface.scroll_to_section(target);
        self.request_scroll_frame();
        log_event(
            Level::Debug,
            "navigate",
            json!({ "command": format!("{command:?}"), "target": target }),
        );
        true
    }

    pub fn run_frame(&mut self, task: FrameTask, now: f64) {
        match task {
            FrameTask::SyncScroll => {
                self.sync_sections();

                let offset = self.surface.scroll_offset();
                for (layer, transform) in self.parallax.scroll_transforms(offset) {
                    self.surface.apply_layer_transform(layer, &transform);
                }
                self.scroll_gate.release();
            }
            FrameTask::Counter {
                element,
                generation,
            } => match self.counters.frame(element, generation, now) {
                CounterFrame::Running(value) => {
                    self.surface.set_counter_text(element, &value.to_string());
                    self.wakeups.push(Wakeup::Frame(task));
                }
                CounterFrame::Finished(value) => {
                    self.surface.set_counter_text(element, &value.to_string());
                    log_event(
                        Level::Debug,
                        "counter_finished",
                        json!({ "element": element.0, "value": value }),
                    );
                }
                CounterFrame::Stale => {}
            },
        }
    }

    pub fn run_timer(&mut self, task: TimerTask) {
        match task {
            TimerTask::RevealHero => {
                let effects = self.reveal.reveal_hero();
                self.apply_reveal_effects(effects, 0.0);
            }
            TimerTask::PointerParallax => {
                if let Some(transform) = self.parallax.pointer_tick(self.viewport.current()) {
                    self.surface.apply_layer_transform(Layer::Float, &transform);
                }
            }
        }
    }

    fn refresh_viewport(&mut self) {
        let viewport = self.surface.viewport();
        if let Some(unit) = self.viewport.refresh(viewport) {
            self.surface.set_root_property(VIEWPORT_UNIT_PROPERTY, &unit);
        }
    }

    fn request_scroll_frame(&mut self) {
        if self.scroll_gate.request() {
            self.wakeups.push(Wakeup::Frame(FrameTask::SyncScroll));
        }
    }

    fn sync_sections(&mut self) {
        let offset = self.surface.scroll_offset();
        let height = self.viewport.current().height;
        let dot_count = self.surface.dot_count();

        let Some(change) = self.sections.sync(offset, height, dot_count) else {
            return;
        };

        for dot in change.cleared {
            self.surface.set_dot_active(dot, false);
        }
        if let Some(dot) = change.activated {
            self.surface.set_dot_active(dot, true);
        }

        log_event(
            Level::Debug,
            "section_changed",
            json!({ "index": change.section, "offset": offset }),
        );
    }

    fn apply_reveal_effects(&mut self, effects: Vec<RevealEffect>, now: f64) {
        for effect in effects {
            match effect {
                RevealEffect::Show(element) => self.surface.set_revealed(element, true),
                RevealEffect::Hide(element) => self.surface.set_revealed(element, false),
                RevealEffect::StartCounter { element, target } => {
                    self.surface.set_counted(element, true);
                    let duration_ms = self.config.counter_duration_ms(self.device);
                    let generation = self.counters.start(element, target, now, duration_ms);
                    self.wakeups.push(Wakeup::Frame(FrameTask::Counter {
                        element,
                        generation,
                    }));
                    log_event(
                        Level::Debug,
                        "counter_started",
                        json!({ "element": element.0, "target": target, "durationMs": duration_ms }),
                    );
                }
                RevealEffect::ResetCounter(element) => {
                    self.counters.cancel(element);
                    self.surface.set_counted(element, false);
                    self.surface.set_counter_text(element, "0");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RevealPolicy;
    use crate::viewport::Viewport;
    use std::collections::HashMap;

    const HEIGHT: f64 = 800.0;

    #[derive(Default)]
    struct RecordingSurface {
        offset: f64,
        sections: usize,
        dots: Vec<bool>,
        root_properties: HashMap<String, String>,
        scrolled_to: Vec<usize>,
        revealed: HashMap<ElementId, bool>,
        counted: HashMap<ElementId, bool>,
        texts: HashMap<ElementId, String>,
        transforms: Vec<(Layer, String)>,
        decor_running: Option<bool>,
        viewport_height: f64,
    }

    impl RecordingSurface {
        fn with_sections(sections: usize) -> Self {
            Self {
                sections,
                dots: vec![false; sections],
                viewport_height: HEIGHT,
                ..Self::default()
            }
        }

        fn active_dots(&self) -> Vec<usize> {
            self.dots
                .iter()
                .enumerate()
                .filter(|(_, active)| **active)
                .map(|(index, _)| index)
                .collect()
        }

        fn text(&self, element: ElementId) -> Option<&str> {
            self.texts.get(&element).map(String::as_str)
        }
    }

    impl Surface for RecordingSurface {
        fn scroll_offset(&self) -> f64 {
            self.offset
        }

        fn viewport(&self) -> Viewport {
            Viewport::from_window(Some(1_000.0), Some(self.viewport_height))
        }

        fn section_count(&self) -> usize {
            self.sections
        }

        fn dot_count(&self) -> usize {
            self.dots.len()
        }

        fn set_root_property(&mut self, name: &str, value: &str) {
            self.root_properties.insert(name.to_string(), value.to_string());
        }

        fn set_dot_active(&mut self, index: usize, active: bool) {
            if let Some(dot) = self.dots.get_mut(index) {
                *dot = active;
            }
        }

        fn scroll_to_section(&mut self, index: usize) {
            self.scrolled_to.push(index);
        }

        fn set_revealed(&mut self, element: ElementId, revealed: bool) {
            self.revealed.insert(element, revealed);
        }

        fn set_counted(&mut self, element: ElementId, counted: bool) {
            self.counted.insert(element, counted);
        }

        fn set_counter_text(&mut self, element: ElementId, text: &str) {
            self.texts.insert(element, text.to_string());
        }

        fn apply_layer_transform(&mut self, layer: Layer, transform: &str) {
            self.transforms.push((layer, transform.to_string()));
        }

        fn set_decor_running(&mut self, running: bool) {
            self.decor_running = Some(running);
        }
    }

    fn controller(sections: usize, device: DeviceClass) -> StageController<RecordingSurface> {
        let mut controller = StageController::new(
            RecordingSurface::with_sections(sections),
            StageConfig::default(),
            device,
        );
        controller.start();
        controller
    }

    fn run_frames(controller: &mut StageController<RecordingSurface>, now: f64) {
        for wakeup in controller.take_wakeups() {
            if let Wakeup::Frame(task) = wakeup {
                controller.run_frame(task, now);
            }
        }
    }

    fn settle_scroll(controller: &mut StageController<RecordingSurface>) {
        if let Some(&target) = controller.surface.scrolled_to.last() {
            controller.surface.offset = target as f64 * HEIGHT;
        }
        controller.on_scroll();
        run_frames(controller, 0.0);
    }

    #[test]
    fn start_publishes_viewport_unit_and_first_dot() {
        let controller = controller(5, DeviceClass::Pointer);

        assert_eq!(
            controller.surface().root_properties.get("--vh").map(String::as_str),
            Some("8px")
        );
        assert_eq!(controller.surface().active_dots(), vec![0]);
        assert_eq!(controller.current_section(), Some(0));
    }

    #[test]
    fn scroll_bursts_coalesce_into_one_frame() {
        let mut controller = controller(5, DeviceClass::Pointer);

        for _ in 0..10 {
            controller.on_scroll();
        }
        assert_eq!(
            controller.take_wakeups(),
            vec![Wakeup::Frame(FrameTask::SyncScroll)]
        );

        controller.surface.offset = 2.0 * HEIGHT;
        controller.run_frame(FrameTask::SyncScroll, 16.0);
        assert_eq!(controller.current_section(), Some(2));

        controller.on_scroll();
        assert_eq!(controller.take_wakeups().len(), 1);
    }

    #[test]
    fn scroll_gate_stays_closed_until_frame_work_is_done() {
        let mut controller = controller(5, DeviceClass::Pointer);

        controller.on_scroll();
        assert!(controller.scroll_gate.is_scheduled());

        controller.surface.offset = HEIGHT;
        controller.surface.transforms.clear();
        controller.run_frame(FrameTask::SyncScroll, 16.0);
        assert!(!controller.scroll_gate.is_scheduled());
        assert_eq!(controller.current_section(), Some(1));
        assert!(!controller.surface().transforms.is_empty());
    }

    #[test]
    fn section_without_a_dot_activates_nothing() {
        let mut controller = controller(5, DeviceClass::Pointer);
        controller.surface.dots.truncate(3);

        assert!(controller.on_dot_click(4));
        settle_scroll(&mut controller);

        assert_eq!(controller.current_section(), Some(4));
        assert!(controller.surface().active_dots().is_empty());
    }

    #[test]
    fn exactly_one_dot_after_each_navigation() {
        let mut controller = controller(5, DeviceClass::Pointer);

        for target in [3, 1, 4, 0] {
            assert!(controller.on_dot_click(target));
            settle_scroll(&mut controller);
            assert_eq!(controller.surface().active_dots(), vec![target]);
        }
    }

    #[test]
    fn steps_at_the_ends_are_no_ops() {
        let mut controller = controller(5, DeviceClass::Pointer);

        assert!(!controller.navigate(NavCommand::Previous));
        assert_eq!(controller.current_section(), Some(0));

        controller.navigate(NavCommand::Jump(4));
        settle_scroll(&mut controller);
        let scrolls = controller.surface().scrolled_to.len();

        assert!(!controller.navigate(NavCommand::Next));
        assert_eq!(controller.surface().scrolled_to.len(), scrolls);
        assert_eq!(controller.current_section(), Some(4));
    }

    #[test]
    fn navigation_does_not_move_the_current_section_by_itself() {
        let mut controller = controller(5, DeviceClass::Pointer);

        assert!(controller.on_key("ArrowDown"));
        assert_eq!(controller.surface().scrolled_to, vec![1]);
        assert_eq!(controller.current_section(), Some(0));

        settle_scroll(&mut controller);
        assert_eq!(controller.current_section(), Some(1));
    }

    #[test]
    fn keys_suppress_default_only_when_they_navigate() {
        let mut controller = controller(3, DeviceClass::Pointer);

        assert!(!controller.on_key("ArrowUp"));
        assert!(!controller.on_key("Enter"));
        assert!(controller.on_key("ArrowDown"));
    }

    #[test]
    fn swipe_needs_to_clear_the_threshold() {
        let mut controller = controller(5, DeviceClass::Touch);

        controller.on_touch_start(500.0);
        assert!(!controller.on_touch_end(460.0));
        assert!(controller.surface().scrolled_to.is_empty());

        controller.on_touch_start(500.0);
        assert!(controller.on_touch_end(440.0));
        assert_eq!(controller.surface().scrolled_to, vec![1]);

        settle_scroll(&mut controller);
        controller.on_touch_start(300.0);
        assert!(controller.on_touch_end(360.0));
        assert_eq!(controller.surface().scrolled_to, vec![1, 0]);
    }

    #[test]
    fn cta_jumps_to_its_section_when_present() {
        let mut controller = controller(6, DeviceClass::Pointer);
        assert!(controller.on_cta());
        assert_eq!(controller.surface().scrolled_to, vec![4]);

        let mut short = self::controller(3, DeviceClass::Pointer);
        assert!(!short.on_cta());
        assert!(short.surface().scrolled_to.is_empty());
    }

    #[test]
    fn missing_sections_disable_navigation() {
        let mut controller = controller(0, DeviceClass::Pointer);

        assert_eq!(controller.current_section(), None);
        assert!(!controller.on_key("ArrowDown"));
        controller.on_scroll();
        run_frames(&mut controller, 0.0);
        assert_eq!(controller.current_section(), None);
    }

    #[test]
    fn stat_counter_runs_to_its_target() {
        let mut controller = controller(5, DeviceClass::Pointer);
        let stat = controller.register(Category::StatNumber { target: 250 });

        controller.on_intersections([(stat, true)], 100.0);
        assert_eq!(controller.surface().revealed.get(&stat), Some(&true));
        assert_eq!(controller.surface().counted.get(&stat), Some(&true));

        run_frames(&mut controller, 100.0);
        assert_eq!(controller.surface().text(stat), Some("0"));

        run_frames(&mut controller, 850.0);
        let midway: u64 = controller
            .surface()
            .text(stat)
            .and_then(|text| text.parse().ok())
            .expect("numeric text");
        assert!(midway > 0 && midway < 250);

        run_frames(&mut controller, 1_600.0);
        assert_eq!(controller.surface().text(stat), Some("250"));
        assert!(controller.take_wakeups().is_empty());
    }

    #[test]
    fn touch_devices_count_faster() {
        let mut controller = controller(5, DeviceClass::Touch);
        let stat = controller.register(Category::StatNumber { target: 40 });

        controller.on_intersections([(stat, true)], 0.0);
        run_frames(&mut controller, 0.0);
        run_frames(&mut controller, 1_000.0);
        assert_eq!(controller.surface().text(stat), Some("40"));
    }

    #[test]
    fn replay_resets_and_restarts_the_counter() {
        let mut controller = controller(5, DeviceClass::Pointer);
        let stat = controller.register(Category::StatNumber { target: 250 });

        controller.on_intersections([(stat, true)], 0.0);
        run_frames(&mut controller, 0.0);
        let stale = controller.take_wakeups();

        controller.on_intersections([(stat, false)], 400.0);
        assert_eq!(controller.surface().text(stat), Some("0"));
        assert_eq!(controller.surface().counted.get(&stat), Some(&false));
        assert_eq!(controller.surface().revealed.get(&stat), Some(&false));

        for wakeup in stale {
            if let Wakeup::Frame(task) = wakeup {
                controller.run_frame(task, 900.0);
            }
        }
        assert_eq!(controller.surface().text(stat), Some("0"));

        controller.on_intersections([(stat, true)], 5_000.0);
        run_frames(&mut controller, 5_000.0);
        assert_eq!(controller.surface().text(stat), Some("0"));
        run_frames(&mut controller, 6_500.0);
        assert_eq!(controller.surface().text(stat), Some("250"));
    }

    #[test]
    fn sticky_policy_keeps_counted_stats() {
        let config = StageConfig {
            reveal_policy: RevealPolicy::Sticky,
            ..StageConfig::default()
        };
        let mut controller = StageController::new(
            RecordingSurface::with_sections(5),
            config,
            DeviceClass::Pointer,
        );
        let stat = controller.register(Category::StatNumber { target: 12 });

        controller.on_intersections([(stat, true)], 0.0);
        run_frames(&mut controller, 0.0);
        run_frames(&mut controller, 2_000.0);
        controller.on_intersections([(stat, false)], 2_100.0);

        assert_eq!(controller.surface().text(stat), Some("12"));
        assert_eq!(controller.surface().revealed.get(&stat), Some(&true));
    }

    #[test]
    fn hero_text_is_revealed_after_load_delay() {
        let mut controller = controller(5, DeviceClass::Pointer);
        let hero = controller.register(Category::HeroText);
        let generic = controller.register(Category::Generic);

        controller.on_load();
        let wakeups = controller.take_wakeups();
        assert!(wakeups.contains(&Wakeup::After {
            delay_ms: 300,
            task: TimerTask::RevealHero,
        }));

        controller.run_timer(TimerTask::RevealHero);
        assert_eq!(controller.surface().revealed.get(&hero), Some(&true));
        assert_eq!(controller.surface().revealed.get(&generic), None);
    }

    #[test]
    fn pointer_parallax_is_throttled_and_applied_to_floaters() {
        let mut controller = controller(5, DeviceClass::Pointer);

        controller.on_pointer_move(0.0, 0.0);
        controller.on_pointer_move(1_000.0, 800.0);
        assert_eq!(
            controller.take_wakeups(),
            vec![Wakeup::After {
                delay_ms: 16,
                task: TimerTask::PointerParallax,
            }]
        );

        controller.run_timer(TimerTask::PointerParallax);
        assert_eq!(
            controller.surface().transforms,
            vec![(Layer::Float, "translate(10.00px, 10.00px)".to_string())]
        );
    }

    #[test]
    fn scroll_frames_move_parallax_layers() {
        let mut controller = controller(5, DeviceClass::Pointer);

        controller.surface.offset = 500.0;
        controller.on_scroll();
        run_frames(&mut controller, 0.0);

        let layers: Vec<Layer> = controller
            .surface()
            .transforms
            .iter()
            .map(|(layer, _)| *layer)
            .collect();
        assert_eq!(layers, vec![Layer::Back, Layer::Mid]);
    }

    #[test]
    fn touch_devices_never_write_parallax() {
        let mut controller = controller(5, DeviceClass::Touch);

        controller.on_pointer_move(10.0, 10.0);
        controller.surface.offset = 1_200.0;
        controller.on_scroll();
        for wakeup in controller.take_wakeups() {
            match wakeup {
                Wakeup::Frame(task) => controller.run_frame(task, 0.0),
                Wakeup::After { task, .. } => controller.run_timer(task),
            }
        }
        controller.run_timer(TimerTask::PointerParallax);

        assert!(controller.surface().transforms.is_empty());
    }

    #[test]
    fn resize_republishes_unit_and_resyncs() {
        let mut controller = controller(5, DeviceClass::Pointer);
        controller.surface.offset = 1_300.0;

        controller.surface.viewport_height = 650.0;
        controller.on_resize();

        assert_eq!(
            controller.surface().root_properties.get("--vh").map(String::as_str),
            Some("6.5px")
        );
        assert_eq!(controller.current_section(), Some(2));
        assert_eq!(controller.surface().active_dots(), vec![2]);
    }

    #[test]
    fn hidden_tab_pauses_decorations() {
        let mut controller = controller(5, DeviceClass::Pointer);

        controller.on_visibility_change(true);
        assert_eq!(controller.surface().decor_running, Some(false));

        controller.on_visibility_change(false);
        assert_eq!(controller.surface().decor_running, Some(true));
    }
}

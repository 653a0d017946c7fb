use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_timers::callback::Timeout;
use js_sys::{Array, Object, Reflect};
use log::Level;
use serde_json::json;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, Document, Element, Event, IntersectionObserver, IntersectionObserverEntry,
    KeyboardEvent, MouseEvent, TouchEvent, Window,
};

use crate::config::{DeviceClass, StageConfig};
use crate::controller::{FrameTask, StageController, TimerTask, Wakeup};
use crate::dom::{classify, DomSurface, CONFIG_ATTRIBUTE, CONTAINER_ID, SCRIPTED_CLASS};
use crate::error::StageError;
use crate::surface::{ElementId, Surface};
use crate::telemetry::log_event;

const COARSE_POINTER_QUERY: &str = "(pointer: coarse)";

type Controller = StageController<DomSurface>;
type ObserverCallback = Closure<dyn FnMut(Array)>;

thread_local! {
    static RUNTIME: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
}

struct Runtime {
    window: Window,
    document: Document,
    controller: RefCell<Controller>,
    listeners: RefCell<Vec<EventListener>>,
    scroll_frame: RefCell<Option<AnimationFrame>>,
    counter_frames: RefCell<HashMap<ElementId, AnimationFrame>>,
    pointer_timer: RefCell<Option<Timeout>>,
    observer: RefCell<Option<(IntersectionObserver, ObserverCallback)>>,
}

impl Runtime {
    fn dispatch<R>(self: &Rc<Self>, event: impl FnOnce(&mut Controller) -> R) -> R {
        let result = event(&mut self.controller.borrow_mut());
        self.flush();
        result
    }

    fn flush(self: &Rc<Self>) {
        let wakeups = self.controller.borrow_mut().take_wakeups();
        for wakeup in wakeups {
            match wakeup {
                Wakeup::Frame(task) => self.schedule_frame(task),
                Wakeup::After { delay_ms, task } => self.schedule_timer(delay_ms, task),
            }
        }
    }

    fn schedule_frame(self: &Rc<Self>, task: FrameTask) {
        let runtime = Rc::clone(self);
        let handle = request_animation_frame(move |timestamp| {
            runtime.release_frame(task);
            runtime.dispatch(|controller| controller.run_frame(task, timestamp));
        });

        match task {
            FrameTask::SyncScroll => {
                *self.scroll_frame.borrow_mut() = Some(handle);
            }
            FrameTask::Counter { element, .. } => {
                self.counter_frames.borrow_mut().insert(element, handle);
            }
        }
    }

    fn release_frame(&self, task: FrameTask) {
        match task {
            FrameTask::SyncScroll => {
                self.scroll_frame.borrow_mut().take();
            }
            FrameTask::Counter { element, .. } => {
                self.counter_frames.borrow_mut().remove(&element);
            }
        }
    }

    fn schedule_timer(self: &Rc<Self>, delay_ms: u32, task: TimerTask) {
        let runtime = Rc::clone(self);
        let timeout = Timeout::new(delay_ms, move || {
            if task == TimerTask::PointerParallax {
                runtime.pointer_timer.borrow_mut().take();
            }
            runtime.dispatch(|controller| controller.run_timer(task));
        });

        match task {
            TimerTask::RevealHero => {
                timeout.forget();
            }
            TimerTask::PointerParallax => {
                *self.pointer_timer.borrow_mut() = Some(timeout);
            }
        }
    }

    fn now(&self) -> f64 {
        self.window
            .performance()
            .map(|performance| performance.now())
            .unwrap_or(0.0)
    }

    fn listen(&self, listener: EventListener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn install_listeners(self: &Rc<Self>) {
        let runtime = Rc::clone(self);
        self.listen(EventListener::new(&self.window, "resize", move |_| {
            runtime.dispatch(Controller::on_resize);
        }));

        let runtime = Rc::clone(self);
        self.listen(EventListener::new(&self.document, "visibilitychange", move |_| {
            let hidden = runtime.document.hidden();
            runtime.dispatch(|controller| controller.on_visibility_change(hidden));
        }));

        let (container, dots, cta, device, block_context_menu) = {
            let controller = self.controller.borrow();
            let surface = controller.surface();
            (
                surface.container().cloned(),
                surface.dots().to_vec(),
                surface.cta().cloned(),
                controller.device(),
                controller.config().block_context_menu,
            )
        };

        if !device.is_touch() {
            let runtime = Rc::clone(self);
            self.listen(EventListener::new(&self.document, "mousemove", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let (x, y) = (f64::from(event.client_x()), f64::from(event.client_y()));
                runtime.dispatch(|controller| controller.on_pointer_move(x, y));
            }));
        }

        if block_context_menu {
            self.listen(EventListener::new_with_options(
                &self.document,
                "contextmenu",
                EventListenerOptions::enable_prevent_default(),
                |event| event.prevent_default(),
            ));
        }

        match container {
            Some(container) if self.controller.borrow().surface().section_count() > 0 => {
                self.install_navigation(&container, dots, cta);
            }
            Some(_) => feature_inactive("section-navigation", "no section elements"),
            None => feature_inactive("section-navigation", "missing #parallaxContainer"),
        }
    }

    fn install_navigation(self: &Rc<Self>, container: &Element, dots: Vec<Element>, cta: Option<Element>) {
        let runtime = Rc::clone(self);
        self.listen(EventListener::new(container, "scroll", move |_| {
            runtime.dispatch(Controller::on_scroll);
        }));

        let runtime = Rc::clone(self);
        self.listen(EventListener::new_with_options(
            &self.document,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                    return;
                };
                if runtime.dispatch(|controller| controller.on_key(&key)) {
                    event.prevent_default();
                }
            },
        ));

        for (index, dot) in dots.iter().enumerate() {
            let runtime = Rc::clone(self);
            self.listen(EventListener::new(dot, "click", move |_| {
                runtime.dispatch(|controller| controller.on_dot_click(index));
            }));
        }

        if let Some(cta) = cta {
            let runtime = Rc::clone(self);
            self.listen(EventListener::new_with_options(
                &cta,
                "click",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    event.prevent_default();
                    runtime.dispatch(Controller::on_cta);
                },
            ));
        }

        let runtime = Rc::clone(self);
        self.listen(EventListener::new(&self.document, "touchstart", move |event| {
            if let Some(y) = touch_screen_y(event, false) {
                runtime.dispatch(|controller| controller.on_touch_start(y));
            }
        }));

        let runtime = Rc::clone(self);
        self.listen(EventListener::new(&self.document, "touchend", move |event| {
            if let Some(y) = touch_screen_y(event, true) {
                runtime.dispatch(|controller| controller.on_touch_end(y));
            }
        }));

        let runtime = Rc::clone(self);
        self.listen(EventListener::new(&self.document, "touchcancel", move |_| {
            runtime.dispatch(Controller::on_touch_cancel);
        }));
    }

    fn handle_load(self: &Rc<Self>) {
        self.dispatch(Controller::on_load);

        if let Err(error) = self.install_reveal_observer() {
            feature_inactive("reveal", &error.to_string());
        }
    }

    fn install_reveal_observer(self: &Rc<Self>) -> Result<(), StageError> {
        let (root, elements, threshold, root_margin) = {
            let controller = self.controller.borrow();
            let tuning = controller.observer_options();
            (
                controller.surface().container().cloned(),
                controller.surface().animatables().to_vec(),
                tuning.threshold,
                tuning.root_margin.clone(),
            )
        };

        if elements.is_empty() {
            return Ok(());
        }

        let runtime = Rc::clone(self);
        let callback = ObserverCallback::new(move |entries: Array| {
            runtime.handle_intersections(&entries);
        });

        let options = Object::new();
        if let Some(root) = root.as_ref() {
            Reflect::set(&options, &JsValue::from_str("root"), root)?;
        }
        Reflect::set(
            &options,
            &JsValue::from_str("rootMargin"),
            &JsValue::from_str(&root_margin),
        )?;
        Reflect::set(
            &options,
            &JsValue::from_str("threshold"),
            &JsValue::from_f64(threshold),
        )?;

        let observer = IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            options.unchecked_ref(),
        )?;
        for element in &elements {
            observer.observe(element);
        }

        *self.observer.borrow_mut() = Some((observer, callback));
        Ok(())
    }

    fn handle_intersections(self: &Rc<Self>, entries: &Array) {
        let now = self.now();
        let changes: Vec<(ElementId, bool)> = {
            let controller = self.controller.borrow();
            entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .filter_map(|entry| {
                    let element = controller.surface().element_id(&entry.target())?;
                    Some((element, entry.is_intersecting()))
                })
                .collect()
        };

        self.dispatch(|controller| controller.on_intersections(changes, now));
    }
}

fn touch_screen_y(event: &Event, changed: bool) -> Option<f64> {
    let event = event.dyn_ref::<TouchEvent>()?;
    let touches = if changed {
        event.changed_touches()
    } else {
        event.touches()
    };
    touches.get(0).map(|touch| f64::from(touch.screen_y()))
}

fn feature_inactive(feature: &str, reason: &str) {
    log_event(
        Level::Warn,
        "stage_feature_inactive",
        json!({ "feature": feature, "reason": reason }),
    );
}

fn prefers_coarse_pointer(window: &Window) -> bool {
    window
        .match_media(COARSE_POINTER_QUERY)
        .ok()
        .flatten()
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

fn read_config(document: &Document) -> StageConfig {
    let Some(raw) = document
        .get_element_by_id(CONTAINER_ID)
        .and_then(|container| container.get_attribute(CONFIG_ATTRIBUTE))
    else {
        return StageConfig::default();
    };

    StageConfig::from_json(&raw).unwrap_or_else(|error| {
        log_event(
            Level::Warn,
            "config_rejected",
            json!({ "error": error.to_string() }),
        );
        StageConfig::default()
    })
}

fn start() -> Result<(), StageError> {
    let window = window().ok_or(StageError::MissingWindow)?;
    let document = window.document().ok_or(StageError::MissingDocument)?;

    if let Some(root) = document.document_element() {
        let _ = root.class_list().add_1(SCRIPTED_CLASS);
    }

    let config = read_config(&document);
    log::set_max_level(config.log_level);
    let device = DeviceClass::from_coarse_pointer(prefers_coarse_pointer(&window));

    let surface = DomSurface::discover(window.clone(), &document);
    let categories: Vec<_> = surface.animatables().iter().map(classify).collect();
    let mut controller = StageController::new(surface, config, device);
    for category in categories {
        controller.register(category);
    }

    let runtime = Rc::new(Runtime {
        window: window.clone(),
        document: document.clone(),
        controller: RefCell::new(controller),
        listeners: RefCell::new(Vec::new()),
        scroll_frame: RefCell::new(None),
        counter_frames: RefCell::new(HashMap::new()),
        pointer_timer: RefCell::new(None),
        observer: RefCell::new(None),
    });

    runtime.dispatch(Controller::start);
    runtime.install_listeners();

    if document.ready_state() == "complete" {
        runtime.handle_load();
    } else {
        let on_load = Rc::clone(&runtime);
        runtime.listen(EventListener::once(&window, "load", move |_| {
            on_load.handle_load();
        }));
    }

    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
    Ok(())
}

pub fn run() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(Level::Debug);

    if let Err(error) = start() {
        log_event(
            Level::Error,
            "stage_failed",
            json!({ "error": error.to_string() }),
        );
    }
}

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use pagekit_core::{
    ClipboardError, CopyRequest, InstallReport, NodeId, PageBehaviors, PageError,
    SubscriptionId,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::Event;
use web_time::Instant;

use crate::console;
use crate::host::{WebHost, describe};
use crate::lifecycle::{TimerArm, still_parsing};
use crate::options::WebOptions;

fn js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Page state shared by every DOM callback.
///
/// Callbacks hold a `Weak` and borrow the runtime for the duration of one
/// core call; timers are re-armed after the borrow is released.
pub(crate) struct Runtime {
    behaviors: PageBehaviors,
    host: WebHost,
    epoch: Instant,
    timer: TimerArm,
    listeners: Vec<EventListener>,
    ready: Option<EventListener>,
}

impl Runtime {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Run `f` against the runtime, log a failure, then re-arm timers.
    fn dispatch<T>(
        weak: &Weak<RefCell<Self>>,
        handler: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, PageError>,
    ) -> Option<T> {
        let this = weak.upgrade()?;
        let result = match this.try_borrow_mut() {
            Ok(mut runtime) => f(&mut *runtime),
            Err(_) => {
                tracing::warn!(handler, "re-entrant event ignored");
                return None;
            }
        };
        Self::rearm(&this);
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(handler, error = %err, "event handler failed");
                None
            }
        }
    }

    fn install(this: &Rc<RefCell<Self>>) -> Result<InstallReport, PageError> {
        let (report, fresh) = {
            let mut guard = this.borrow_mut();
            let runtime = &mut *guard;
            let fresh = runtime.behaviors.report().is_none();
            let now = runtime.now();
            (runtime.behaviors.install(&mut runtime.host, now)?, fresh)
        };
        if fresh && !report.gate.redirected() {
            Self::wire(this)?;
        }
        Self::rearm(this);
        Ok(report)
    }

    /// Attach element listeners for everything the behaviors enhanced.
    fn wire(this: &Rc<RefCell<Self>>) -> Result<(), PageError> {
        let weak = Rc::downgrade(this);
        let mut guard = this.borrow_mut();
        let runtime = &mut *guard;
        let behaviors = &runtime.behaviors;
        let host = &runtime.host;
        let mut listeners = Vec::new();

        for toggle in behaviors.dropdowns().toggles() {
            let weak = weak.clone();
            listeners.push(EventListener::new_with_options(
                host.element(toggle)?,
                "click",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    event.prevent_default();
                    Self::dispatch(&weak, "dropdown", |rt| {
                        rt.behaviors.toggle_dropdown(&mut rt.host, toggle)
                    });
                },
            ));
        }

        if let Some(menu) = behaviors.mobile_menu() {
            let weak = weak.clone();
            listeners.push(EventListener::new(
                host.element(menu.button())?,
                "click",
                move |_| {
                    Self::dispatch(&weak, "mobile-menu", |rt| {
                        rt.behaviors.toggle_mobile_menu(&mut rt.host)
                    });
                },
            ));
        }

        for &form in behaviors.forms().forms() {
            let weak = weak.clone();
            listeners.push(EventListener::new_with_options(
                host.element(form)?,
                "submit",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    let outcome = Self::dispatch(&weak, "validation", |rt| {
                        rt.behaviors.on_submit(&mut rt.host, form)
                    });
                    if outcome.is_some_and(|outcome| outcome.is_blocked()) {
                        event.prevent_default();
                    }
                },
            ));
        }

        for &textarea in behaviors.autoresize().textareas() {
            let weak = weak.clone();
            listeners.push(EventListener::new(
                host.element(textarea)?,
                "input",
                move |_| {
                    Self::dispatch(&weak, "autoresize", |rt| {
                        rt.behaviors.on_input(&mut rt.host, textarea)
                    });
                },
            ));
        }

        for &button in behaviors.copy_buttons().buttons() {
            let weak = weak.clone();
            listeners.push(EventListener::new(
                host.element(button)?,
                "click",
                move |_| {
                    let request = Self::dispatch(&weak, "copy", |rt| {
                        Ok(rt.behaviors.copy_requested(&rt.host, button))
                    });
                    if let Some(Some(request)) = request {
                        Self::start_copy(&weak, request);
                    }
                },
            ));
        }

        tracing::debug!(listeners = listeners.len(), "dom listeners attached");
        runtime.listeners = listeners;
        Ok(())
    }

    pub(crate) fn document_click(
        weak: &Weak<RefCell<Self>>,
        subscription: SubscriptionId,
        event: &Event,
    ) {
        Self::dispatch(weak, "outside-click", |rt| {
            let Some((target, transient)) = rt.host.event_target(event) else {
                return Ok(false);
            };
            let closed = rt
                .behaviors
                .on_document_click(&mut rt.host, subscription, target);
            if transient {
                rt.host.release_transient(target);
            }
            closed
        });
    }

    fn start_copy(weak: &Weak<RefCell<Self>>, request: CopyRequest) {
        let Some(this) = weak.upgrade() else {
            return;
        };
        let promise = this.borrow().host.write_clipboard(&request.text);
        let promise = match promise {
            Ok(promise) => promise,
            Err(err) => {
                Self::report_copy(weak, request.button, Err(err));
                return;
            }
        };
        let weak = weak.clone();
        spawn_local(async move {
            let outcome = JsFuture::from(promise)
                .await
                .map(drop)
                .map_err(|err| ClipboardError::Rejected(describe(&err)));
            Self::report_copy(&weak, request.button, outcome);
        });
    }

    fn report_copy(
        weak: &Weak<RefCell<Self>>,
        button: NodeId,
        outcome: Result<(), ClipboardError>,
    ) {
        Self::dispatch(weak, "copy", |rt| match outcome {
            Ok(()) => {
                let now = rt.now();
                rt.behaviors.copy_succeeded(&mut rt.host, button, now)
            }
            Err(err) => {
                rt.behaviors.copy_failed(button, &err);
                Ok(())
            }
        });
    }

    /// Arm a `Timeout` for the earliest pending deadline unless one is
    /// already armed at or before it.
    fn rearm(this: &Rc<RefCell<Self>>) {
        let Ok(mut runtime) = this.try_borrow_mut() else {
            return;
        };
        let Some(deadline) = runtime.behaviors.next_deadline() else {
            return;
        };
        let now = runtime.now();
        let Some(millis) = runtime.timer.arm(deadline, now) else {
            return;
        };
        let weak = Rc::downgrade(this);
        Timeout::new(millis, move || {
            if let Some(this) = weak.upgrade() {
                Self::fire_timers(&this);
            }
        })
        .forget();
    }

    fn fire_timers(this: &Rc<RefCell<Self>>) {
        let result = {
            let Ok(mut guard) = this.try_borrow_mut() else {
                // The armed deadline stays recorded until a firing gets
                // through, so retry instead of dropping it.
                let weak = Rc::downgrade(this);
                Timeout::new(0, move || {
                    if let Some(this) = weak.upgrade() {
                        Self::fire_timers(&this);
                    }
                })
                .forget();
                return;
            };
            let runtime = &mut *guard;
            runtime.timer.disarm();
            let now = runtime.now();
            runtime.behaviors.advance_to(&mut runtime.host, now)
        };
        if let Err(err) = result {
            tracing::error!(error = %err, "timer failed");
        }
        Self::rearm(this);
    }

    /// Drop retired outside-click listeners outside any event dispatch.
    pub(crate) fn schedule_sweep(weak: Weak<RefCell<Self>>) {
        Timeout::new(0, move || {
            let Some(this) = weak.upgrade() else {
                return;
            };
            let retired = match this.try_borrow_mut() {
                Ok(mut runtime) => runtime.host.take_retired(),
                Err(_) => return,
            };
            drop(retired);
        })
        .forget();
    }

    fn teardown(this: &Rc<RefCell<Self>>) -> Result<(), PageError> {
        let released = {
            let mut guard = this.borrow_mut();
            let runtime = &mut *guard;
            runtime.behaviors.teardown(&mut runtime.host)?;
            runtime.host.clear_nodes();
            runtime.timer.disarm();
            (
                std::mem::take(&mut runtime.listeners),
                runtime.ready.take(),
                runtime.host.take_retired(),
            )
        };
        drop(released);
        Ok(())
    }
}

/// Page enhancements for a server-rendered document.
///
/// ```js
/// const kit = new PageKit({ log_level: "debug" });
/// kit.install();
/// ```
#[wasm_bindgen]
pub struct PageKit {
    runtime: Rc<RefCell<Runtime>>,
}

#[wasm_bindgen]
impl PageKit {
    /// Parse `options` (a plain object mirroring `PageConfig`, plus
    /// `log_level`) and bind to the current window.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsValue>) -> Result<PageKit, JsValue> {
        let options = match options.filter(|value| !value.is_undefined() && !value.is_null()) {
            Some(value) => {
                let json = js_sys::JSON::stringify(&value)?;
                WebOptions::from_json_str(&String::from(json)).map_err(js_error)?
            }
            None => WebOptions::default(),
        };
        let level = options.log_level().map_err(js_error)?;
        if !console::install(level) {
            tracing::debug!("console logging already installed");
        }

        let window = web_sys::window().ok_or_else(|| js_error("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| js_error("window has no document"))?;
        let runtime = Rc::new_cyclic(|weak| {
            RefCell::new(Runtime {
                behaviors: PageBehaviors::new(options.page),
                host: WebHost::new(window, document, weak.clone()),
                epoch: Instant::now(),
                timer: TimerArm::default(),
                listeners: Vec::new(),
                ready: None,
            })
        });
        Ok(Self { runtime })
    }

    /// Enhance the document now, or on `DOMContentLoaded` while it is still
    /// loading. Installing twice is a no-op.
    pub fn install(&self) -> Result<(), JsValue> {
        let document = self.runtime.borrow().host.document().clone();
        if !still_parsing(&document.ready_state()) {
            return Runtime::install(&self.runtime).map(drop).map_err(js_error);
        }

        let weak = Rc::downgrade(&self.runtime);
        let listener = EventListener::once(&document, "DOMContentLoaded", move |_| {
            let Some(this) = weak.upgrade() else {
                return;
            };
            if let Err(err) = Runtime::install(&this) {
                tracing::error!(error = %err, "install failed");
            }
        });
        self.runtime.borrow_mut().ready = Some(listener);
        Ok(())
    }

    /// Remove every listener, cancel pending timers, and restore copy
    /// labels. `install` may be called again afterwards.
    pub fn teardown(&self) -> Result<(), JsValue> {
        Runtime::teardown(&self.runtime).map_err(js_error)
    }

    /// Whether `install` has run (including a redirecting install).
    #[wasm_bindgen(getter)]
    pub fn installed(&self) -> bool {
        self.runtime.borrow().behaviors.report().is_some()
    }
}

/// Construct a [`PageKit`] and install it.
#[wasm_bindgen]
pub fn start(options: Option<JsValue>) -> Result<PageKit, JsValue> {
    let kit = PageKit::new(options)?;
    kit.install()?;
    Ok(kit)
}

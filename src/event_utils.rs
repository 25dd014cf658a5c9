//! Window-level DOM listeners whose lifetime is tied to a Rust value.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use leptos::ev::{self, EventDescriptor};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, Event};

use crate::domain::logging::LogComponent;
use crate::log_warn;

/// `addEventListener` flags.
#[derive(Clone, Copy, Debug)]
pub struct ListenerOptions {
    pub passive: bool,
    pub capture: bool,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self { passive: true, capture: false }
    }
}

/// Listener on `window`; unregistered when dropped.
pub struct WindowListener {
    event_name: String,
    callback: Closure<dyn FnMut(Event)>,
    capture: bool,
}

impl WindowListener {
    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback_and_bool(
                &self.event_name,
                self.callback.as_ref().unchecked_ref(),
                self.capture,
            );
        }
    }
}

/// Register `handler` for a typed window event. `None` outside a browser
/// window or when registration is refused.
pub fn listen_window<E>(
    event: E,
    options: ListenerOptions,
    mut handler: impl FnMut(E::EventType) + 'static,
) -> Option<WindowListener>
where
    E: EventDescriptor + 'static,
    E::EventType: JsCast,
{
    let window = web_sys::window()?;
    let flags = AddEventListenerOptions::new();
    flags.set_passive(options.passive);
    flags.set_capture(options.capture);

    let event_name = event.name().into_owned();
    let callback = Closure::wrap(Box::new(move |ev: Event| handler(ev.unchecked_into::<E::EventType>()))
        as Box<dyn FnMut(Event)>);

    if let Err(e) = window.add_event_listener_with_callback_and_add_event_listener_options(
        &event_name,
        callback.as_ref().unchecked_ref(),
        &flags,
    ) {
        log_warn!(LogComponent::Presentation("event_utils"), "cannot listen to {}: {:?}", event_name, e);
        return None;
    }
    Some(WindowListener { event_name, callback, capture: options.capture })
}

/// Window resize subscription that reports once the size has been stable
/// for the debounce delay. Dropping it removes the listener and cancels a
/// pending report.
pub struct DebouncedResize {
    _listener: WindowListener,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Drop for DebouncedResize {
    fn drop(&mut self) {
        self.pending.borrow_mut().take();
    }
}

pub fn on_window_resize_debounced(delay_ms: u32, handler: impl Fn() + 'static) -> Option<DebouncedResize> {
    let pending: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    let handler = Rc::new(handler);
    let listener = {
        let pending = Rc::clone(&pending);
        listen_window(ev::resize, ListenerOptions::default(), move |_| {
            let handler = Rc::clone(&handler);
            // Replacing the previous timeout cancels it.
            *pending.borrow_mut() = Some(Timeout::new(delay_ms, move || handler()));
        })?
    };
    Some(DebouncedResize { _listener: listener, pending })
}

// requestAnimationFrame driver for the stopwatch.
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use super::stopwatch::{Stopwatch, TextSurface};

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Milliseconds from `performance.now()`, 0 when unavailable.
pub fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Runs a [`Stopwatch`] off animation frames and prints every step to the
/// attached surface. At most one frame chain is pending at any time.
pub struct FrameLoop {
    inner: Rc<FrameInner>,
}

struct FrameInner {
    stopwatch: RefCell<Stopwatch>,
    surface: RefCell<Option<Box<dyn TextSurface>>>,
    closure: RefCell<Option<FrameClosure>>,
    raf_id: Cell<Option<i32>>,
}

impl FrameLoop {
    pub fn new(surface: Option<Box<dyn TextSurface>>) -> Self {
        let inner = Rc::new(FrameInner {
            stopwatch: RefCell::new(Stopwatch::new()),
            surface: RefCell::new(surface),
            closure: RefCell::new(None),
            raf_id: Cell::new(None),
        });
        // Initial "00:00:00"
        inner.print();
        Self { inner }
    }

    pub fn start(&self) {
        let armed = self.inner.stopwatch.borrow_mut().start(performance_now());
        if !armed {
            return;
        }
        if self.inner.closure.borrow().is_none() {
            let weak = Rc::downgrade(&self.inner);
            let closure = Closure::wrap(Box::new(move |timestamp: f64| {
                let Some(inner) = weak.upgrade() else { return };
                inner.raf_id.set(None);
                if !inner.stopwatch.borrow_mut().step(timestamp) {
                    return;
                }
                inner.print();
                inner.request_frame();
            }) as Box<dyn FnMut(f64)>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }
        self.inner.request_frame();
    }

    pub fn stop(&self) {
        self.inner.stopwatch.borrow_mut().stop();
        if let Some(id) = self.inner.raf_id.take() {
            if let Some(win) = web_sys::window() {
                let _ = win.cancel_animation_frame(id);
            }
        }
    }

    pub fn reset(&self) {
        self.inner.stopwatch.borrow_mut().reset();
        self.inner.print();
    }

    pub fn total(&self) -> u64 {
        self.inner.stopwatch.borrow().total()
    }

    pub fn set_surface(&self, surface: Option<Box<dyn TextSurface>>) {
        *self.inner.surface.borrow_mut() = surface;
        self.inner.print();
    }
}

impl FrameInner {
    fn request_frame(&self) {
        if self.raf_id.get().is_some() {
            return;
        }
        let Some(win) = web_sys::window() else { return };
        let closure = self.closure.borrow();
        let Some(cb) = closure.as_ref() else { return };
        if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.raf_id.set(Some(id));
        }
    }

    fn print(&self) {
        let surface = self.surface.borrow();
        self.stopwatch.borrow().print(surface.as_deref());
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("stopwatch", &*self.inner.stopwatch.borrow())
            .field("pending_frame", &self.inner.raf_id.get())
            .finish()
    }
}

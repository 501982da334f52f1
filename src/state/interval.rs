// Fixed-interval callback; cleared when dropped.
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

pub struct IntervalTicker {
    id: Option<i32>,
    _tick: Closure<dyn FnMut()>,
}

impl IntervalTicker {
    pub fn start(period_ms: i32, tick: impl FnMut() + 'static) -> Self {
        let tick = Closure::wrap(Box::new(tick) as Box<dyn FnMut()>);
        let id = web_sys::window().and_then(|win| {
            win.set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                period_ms,
            )
            .ok()
        });
        if id.is_none() {
            log::warn!("setInterval unavailable, ticker of {}ms not armed", period_ms);
        }
        Self { id, _tick: tick }
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        if let (Some(id), Some(win)) = (self.id.take(), web_sys::window()) {
            win.clear_interval_with_handle(id);
        }
    }
}

/// Runs `f` once after `delay_ms`.
pub fn set_timeout(delay_ms: i32, f: impl FnOnce() + 'static) {
    let Some(win) = web_sys::window() else { return };
    let cb = Closure::once_into_js(f);
    if win
        .set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), delay_ms)
        .is_err()
    {
        log::warn!("setTimeout failed");
    }
}

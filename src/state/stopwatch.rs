// Frame-driven stopwatch. Time advances by the delta between consecutive
// frame callbacks, so a paused frame scheduler never produces a jump.
use crate::util::{format_clock, pack_total};

/// Where a timer writes its formatted value.
pub trait TextSurface {
    fn set_text(&self, text: &str);
}

impl TextSurface for yew::Callback<String> {
    fn set_text(&self, text: &str) {
        self.emit(text.to_string());
    }
}

/// Accumulator triple. `centiseconds` keeps the fractional part of frame deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Elapsed {
    pub minutes: u64,
    pub seconds: u64,
    pub centiseconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopwatchState {
    Idle,
    Running,
}

pub const ELAPSED_LABEL: &str = "소요시간: ";

#[derive(Debug, Clone)]
pub struct Stopwatch {
    pub state: StopwatchState,
    times: Elapsed,
    /// Timestamp of the previous frame (ms, same clock as the scheduler).
    last_timestamp: Option<f64>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: StopwatchState::Idle,
            times: Elapsed::default(),
            last_timestamp: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    /// Returns true only when this call moved the stopwatch to Running, i.e.
    /// when the caller has to arm a new frame chain.
    pub fn start(&mut self, now: f64) -> bool {
        if self.last_timestamp.is_none() {
            self.last_timestamp = Some(now);
        }
        if self.is_running() {
            return false;
        }
        self.state = StopwatchState::Running;
        true
    }

    pub fn stop(&mut self) {
        self.state = StopwatchState::Idle;
        self.last_timestamp = None;
    }

    pub fn reset(&mut self) {
        self.times = Elapsed::default();
    }

    /// Advances by one frame. Returns whether the next frame should be requested.
    pub fn step(&mut self, timestamp: f64) -> bool {
        if !self.is_running() {
            return false;
        }
        let last = self.last_timestamp.unwrap_or(timestamp);
        self.accumulate(timestamp - last);
        self.last_timestamp = Some(timestamp);
        true
    }

    fn accumulate(&mut self, diff_ms: f64) {
        // Timestamps are monotonic; a negative delta would only come from a
        // foreign clock and is dropped.
        let t = &mut self.times;
        t.centiseconds += diff_ms.max(0.0) / 10.0;
        let carry = (t.centiseconds / 100.0).floor();
        t.seconds += carry as u64;
        t.centiseconds -= carry * 100.0;
        t.minutes += t.seconds / 60;
        t.seconds %= 60;
    }

    pub fn times(&self) -> Elapsed {
        self.times
    }

    /// Packed total, see [`crate::util::decode_total`].
    pub fn total(&self) -> u64 {
        let t = self.times();
        pack_total(t.minutes, t.seconds, t.centiseconds)
    }

    pub fn clock(&self) -> String {
        format_clock(&self.times())
    }

    pub fn print(&self, surface: Option<&dyn TextSurface>) {
        let Some(surface) = surface else { return };
        surface.set_text(&format!("{}{}", ELAPSED_LABEL, self.clock()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl TextSurface for Recorder {
        fn set_text(&self, text: &str) {
            self.0.borrow_mut().push(text.to_string());
        }
    }

    #[test]
    fn test_starts_idle_at_zero() {
        let sw = Stopwatch::new();
        assert_eq!(sw.state, StopwatchState::Idle);
        assert_eq!(sw.total(), 0);
        assert_eq!(sw.clock(), "00:00:00");
    }

    #[test]
    fn test_step_accumulates_frame_deltas() {
        let mut sw = Stopwatch::new();
        assert!(sw.start(1000.0));
        assert!(sw.step(1250.0));
        assert_eq!(sw.times().centiseconds, 25.0);
        assert!(sw.step(2000.0));
        // 75 cs more -> exactly one second carried
        assert_eq!(sw.times().seconds, 1);
        assert_eq!(sw.times().centiseconds, 0.0);
        assert_eq!(sw.total(), 100);
    }

    #[test]
    fn test_carries_seconds_into_minutes() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        let mut ts = 0.0;
        for _ in 0..61 {
            ts += 1000.0;
            sw.step(ts);
        }
        assert_eq!(sw.times().minutes, 1);
        assert_eq!(sw.times().seconds, 1);
        assert_eq!(sw.total(), 6100);
        assert_eq!(sw.clock(), "01:01:00");
    }

    #[test]
    fn test_long_frame_gap_stays_normalized() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(125_000.0);
        assert_eq!(sw.times().minutes, 2);
        assert_eq!(sw.times().seconds, 5);
        assert_eq!(sw.times().centiseconds, 0.0);
    }

    #[test]
    fn test_hour_long_gap_carries_in_one_step() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(3_600_250.0);
        assert_eq!(sw.times().minutes, 60);
        assert_eq!(sw.times().seconds, 0);
        assert_eq!(sw.times().centiseconds, 25.0);
        assert_eq!(sw.total(), 360_025);
    }

    #[test]
    fn test_step_after_stop_is_noop() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(500.0);
        sw.stop();
        let before = sw.times();
        assert!(!sw.step(5000.0));
        assert_eq!(sw.times(), before);
    }

    #[test]
    fn test_double_start_arms_once_and_keeps_anchor() {
        let mut sw = Stopwatch::new();
        assert!(sw.start(100.0));
        assert!(!sw.start(900.0));
        sw.step(200.0);
        assert_eq!(sw.times().centiseconds, 10.0);
    }

    #[test]
    fn test_reset_in_any_state() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(3000.0);
        sw.reset();
        assert_eq!(sw.total(), 0);
        assert!(sw.is_running());
        sw.step(3500.0);
        assert_eq!(sw.total(), 50);

        sw.stop();
        sw.reset();
        assert_eq!(sw.total(), 0);
        assert!(sw.start(10_000.0));
        sw.step(10_100.0);
        assert_eq!(sw.total(), 10);
    }

    #[test]
    fn test_restart_does_not_count_idle_time() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(1000.0);
        sw.stop();
        sw.start(60_000.0);
        sw.step(60_500.0);
        assert_eq!(sw.total(), 150);
    }

    #[test]
    fn test_print() {
        let mut sw = Stopwatch::new();
        sw.start(0.0);
        sw.step(1230.0);
        let rec = Recorder::default();
        sw.print(Some(&rec));
        sw.print(None);
        assert_eq!(*rec.0.borrow(), vec![format!("{}00:01:23", ELAPSED_LABEL)]);
    }
}

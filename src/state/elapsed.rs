// Wall-clock elapsed timer: recomputed as `now - started_at` on every tick.
use super::stopwatch::TextSurface;
use crate::util::format_duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElapsedClock {
    started_at: Option<f64>,
}

impl ElapsedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns false when already running; the original anchor is kept.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.is_running() {
            return false;
        }
        self.started_at = Some(now_ms);
        true
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> u64 {
        match self.started_at {
            Some(start) => (now_ms - start).max(0.0) as u64,
            None => 0,
        }
    }

    pub fn label(&self, now_ms: f64) -> String {
        format_duration(self.elapsed_ms(now_ms))
    }

    pub fn print(&self, now_ms: f64, surface: Option<&dyn TextSurface>) {
        if let Some(surface) = surface {
            surface.set_text(&self.label(now_ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_reports_zero() {
        let clock = ElapsedClock::new();
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_ms(5_000.0), 0);
        assert_eq!(clock.label(5_000.0), "0");
    }

    #[test]
    fn test_direct_difference() {
        let mut clock = ElapsedClock::new();
        assert!(clock.start(1_000.0));
        assert_eq!(clock.elapsed_ms(1_500.0), 500);
        // a skipped tick does not matter, the value is recomputed
        assert_eq!(clock.label(62_000.0), "1:1");
        assert_eq!(clock.label(3_601_000.0), "1:0:0");
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut clock = ElapsedClock::new();
        clock.start(0.0);
        assert!(!clock.start(10_000.0));
        assert_eq!(clock.elapsed_ms(20_000.0), 20_000);
        clock.stop();
        assert_eq!(clock.elapsed_ms(20_000.0), 0);
    }
}

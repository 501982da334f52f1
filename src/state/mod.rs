pub mod elapsed;
pub mod frame_loop;
pub mod interval;
pub mod stopwatch;
pub mod storage;

pub use elapsed::ElapsedClock;
pub use frame_loop::{performance_now, FrameLoop};
pub use interval::{set_timeout, IntervalTicker};
pub use stopwatch::{Elapsed, TextSurface};

use std::time::Instant;

/// Timing for one turn of the render loop, handed to before-render observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the render loop started
    pub time: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Wall-clock frame source for the windowed render loop.
/// Use this in a loop: `let frame = clock.next()`
pub struct FrameClock {
    frame_number: u64,
    start_time: Instant,
    last_frame_time: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            start_time: now,
            last_frame_time: now,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FrameClock {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        Some(info)
    }
}

/// Deterministic frame source stepping a fixed delta, used by headless runs
#[derive(Debug, Clone)]
pub struct FixedStep {
    frame_number: u64,
    delta: f32,
}

impl FixedStep {
    pub fn new(delta: f32) -> Self {
        Self { frame_number: 0, delta }
    }

    /// 60 Hz stepping
    pub fn display_rate() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl Iterator for FixedStep {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        let info = FrameInfo::new(
            self.frame_number,
            self.frame_number as f32 * self.delta,
            if self.frame_number == 0 { 0.0 } else { self.delta },
        );
        self.frame_number += 1;
        Some(info)
    }
}

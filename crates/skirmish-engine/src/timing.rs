//! Frame timing for the simulation loop.
//!
//! Provides the per-frame delta (wall clock or fixed simulated steps), a
//! fixed-timestep accumulator for physics, and frame pacing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Where frame deltas come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSource {
    /// Measured against the wall clock.
    Realtime,
    /// Every frame lasts exactly this long.
    Simulated(f32),
}

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    source: TimeSource,
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Accumulator for fixed timestep
    accumulator: f32,
    /// Fixed timestep delta (for physics)
    fixed_dt: f32,
    /// Maximum delta time to prevent spiral of death
    max_dt: f32,
    /// Simulated time elapsed
    elapsed: f64,
    /// Frames measured
    frames: u64,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    max_samples: usize,
}

impl FrameTiming {
    /// Most physics steps run in one frame.
    pub const MAX_FIXED_STEPS: u32 = 10;

    /// Create a frame timing manager ticking at `target_fps`.
    #[must_use]
    pub fn new(target_fps: u32, source: TimeSource) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            source,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            last_frame: Instant::now(),
            accumulator: 0.0,
            fixed_dt: 1.0 / 50.0,
            max_dt: 0.25,
            elapsed: 0.0,
            frames: 0,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Set the fixed timestep for physics updates.
    pub fn set_fixed_dt(&mut self, dt: f32) {
        self.fixed_dt = dt.max(0.001);
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulated seconds handed out so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frames handed out so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Delta time for the next frame, clamped to avoid a spiral of death.
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = match self.source {
            TimeSource::Realtime => (now - self.last_frame).as_secs_f32(),
            TimeSource::Simulated(step) => step,
        };
        self.last_frame = now;

        let clamped_dt = dt.clamp(0.0, self.max_dt);
        self.elapsed += f64::from(clamped_dt);
        self.frames += 1;

        self.frame_times.push_back(clamped_dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        clamped_dt
    }

    /// Accumulate time for fixed timestep updates.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < Self::MAX_FIXED_STEPS {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog.
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Sleep for the remainder of the frame budget. No-op for simulated time.
    pub fn sleep_remainder(&self) {
        if self.source != TimeSource::Realtime {
            return;
        }

        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
    }

    /// Average frames per second over recent frames.
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        let avg_frame_time: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;

        if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        }
    }

    /// Reset timing (call after pause or a restart).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.accumulator = 0.0;
        self.frame_times.clear();
    }
}

//! Adaptive frame skipping
//!
//! With a budget of `N > 0`, rendering alternates between an off-screen
//! target (skipping) and the visible default framebuffer. The decision is
//! made once per frame, before the core runs:
//!
//! - toggle when something was drawn since the last toggle, or when `N`
//!   frames have been skipped since it (either condition is enough);
//! - while skipping, render off-screen and count the frame.
//!
//! Presenting always records that a frame was drawn, even while skipping,
//! so the next decision sees that render work happened.

use host_core::gl::FramebufferTarget;
use host_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameSkip {
    skip_count: u32,
    skipping: bool,
    drew: bool,
    wait: u32,
}

impl FrameSkip {
    pub fn new(skip_count: u32) -> Self {
        let mut skip = Self::default();
        skip.set_skip_count(skip_count);
        skip
    }

    /// Set the budget and restart the cycle. A non-zero budget starts in the
    /// skipping phase; zero turns skipping off.
    pub fn set_skip_count(&mut self, skip_count: u32) {
        self.skip_count = skip_count;
        self.skipping = skip_count > 0;
        self.drew = false;
        self.wait = 0;
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    pub fn wait(&self) -> u32 {
        self.wait
    }

    pub fn drew(&self) -> bool {
        self.drew
    }

    /// Decide where this frame renders.
    pub fn begin_frame(&mut self) -> FramebufferTarget {
        if self.skip_count > 0 && (self.drew || self.wait >= self.skip_count) {
            self.skipping = !self.skipping;
            self.drew = false;
            self.wait = 0;
            log(LogCategory::Frame, LogLevel::Trace, || {
                format!("frame skip toggled, skipping={}", self.skipping)
            });
        }

        if self.skipping {
            self.wait += 1;
            FramebufferTarget::Offscreen
        } else {
            FramebufferTarget::Default
        }
    }

    /// Record a present. Returns whether the swap should be visible.
    pub fn present(&mut self) -> bool {
        self.drew = true;
        !self.skipping
    }
}

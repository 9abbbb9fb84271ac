//! Session context owned by the host
//!
//! Everything the run loop mutates lives here and is handed to components by
//! reference. A session starts stopped and is rearmed by every successful load.

use serde::Serialize;

use crate::cartridge::ImageKind;
use crate::controller::Controllers;
use crate::frame_skip::FrameSkip;
use crate::header::RomHeader;
use crate::save_memory::SaveMemory;

/// Milliseconds the fake clock advances per scheduler tick
pub const TICK_MS: u64 = 16;

/// Flags driving the frame scheduler and GL lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunState {
    /// No frame is stepped while set
    pub stopped: bool,
    /// Lazy core start is still pending for this load
    pub first_time: bool,
    /// Next context reset is the first one for this load
    pub first_context_reset: bool,
    pub ticks_ms: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            stopped: true,
            first_time: true,
            first_context_reset: false,
            ticks_ms: 0,
        }
    }
}

/// What was loaded, kept for diagnostics after the staging buffer is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub kind: ImageKind,
    pub len: usize,
    pub crc32: u32,
}

impl ImageInfo {
    pub fn describe(kind: ImageKind, data: &[u8]) -> Self {
        Self {
            kind,
            len: data.len(),
            crc32: crc32fast::hash(data),
        }
    }
}

/// Per-session frame accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Core steps actually executed
    pub stepped: u64,
    /// Presents that reached the screen
    pub presented: u64,
    /// Presents suppressed by frame skipping
    pub skipped: u64,
}

#[derive(Debug)]
pub struct Session {
    pub run: RunState,
    pub controllers: Controllers,
    pub save_memory: SaveMemory,
    pub frame_skip: FrameSkip,
    pub header: Option<RomHeader>,
    pub image: Option<ImageInfo>,
    pub stats: FrameStats,
}

impl Session {
    pub fn new(skip_count: u32) -> Self {
        Self {
            run: RunState::default(),
            controllers: Controllers::new(),
            save_memory: SaveMemory::new(),
            frame_skip: FrameSkip::new(skip_count),
            header: None,
            image: None,
            stats: FrameStats::default(),
        }
    }

    /// Reset runtime variables to startup defaults ahead of a load.
    /// The clock and skip budget carry over; controllers do not.
    pub fn rearm(&mut self) {
        self.run.first_time = true;
        self.run.first_context_reset = false;
        self.header = None;
        self.image = None;
        self.stats = FrameStats::default();
        self.controllers.clear();
        self.frame_skip.set_skip_count(self.frame_skip.skip_count());
    }

    pub fn is_running(&self) -> bool {
        !self.run.stopped
    }
}

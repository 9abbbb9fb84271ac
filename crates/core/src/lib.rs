//! Host-side primitives shared by system adapters.
//!
//! A system adapter sits between a host that owns the window, GPU context and
//! input devices, and an emulator core that advances one frame per call. This
//! crate holds the pieces that are not tied to a particular system: logging,
//! the GPU context manager interface, and the cooperative step outcome.

pub mod gl;
pub mod logging;

use serde::{Deserialize, Serialize};

/// Result of advancing a cooperative core by one frame.
///
/// Cores never run freely: they do one frame of work and return, so the
/// host's tick decides when the next frame happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The frame completed and control returned to the host
    FrameDone,
    /// The core asked to stop; no further steps until a new load
    Halted,
}

impl StepOutcome {
    pub fn is_halted(self) -> bool {
        matches!(self, StepOutcome::Halted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_halted() {
        assert!(StepOutcome::Halted.is_halted());
        assert!(!StepOutcome::FrameDone.is_halted());
    }
}

//! GPU context manager abstraction
//!
//! The host owns the window and the GL context. The adapter only ever talks
//! to it through [`GlContextManager`], in the same order on every frame:
//!
//! ```text
//! bind() -> bind_framebuffer(target) -> core renders -> [swap_buffers()] -> unbind()
//! ```
//!
//! `bind`/`unbind` restore and hand back pipeline state, because other
//! host-side rendering may run between two frames.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the core's rendering output goes for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramebufferTarget {
    /// The visible default framebuffer
    Default,
    /// An off-screen target whose contents are never presented
    Offscreen,
}

/// Parameters handed to the context manager when the context is first set up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextParams {
    pub stencil: bool,
    pub depth: bool,
}

impl Default for ContextParams {
    fn default() -> Self {
        Self {
            stencil: false,
            depth: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("host has no OpenGL support: {0}")]
    Unsupported(String),
    #[error("GL resource creation failed: {0}")]
    Resource(String),
}

/// Host-side GPU context management.
///
/// The host calls back into the adapter's `context_reset`/`context_destroy`
/// whenever its context is recreated or lost; this trait covers the calls
/// flowing the other way.
pub trait GlContextManager {
    /// Register with the host's context machinery
    fn init_context(&mut self, params: &ContextParams) -> Result<(), ContextError>;

    /// The context was (re)created; GPU-resident resources must be re-acquired
    fn context_reset(&mut self) -> Result<(), ContextError>;

    /// One-time global GPU state setup, run after the first reset only
    fn setup_state(&mut self);

    /// Restore the adapter's pipeline state before the core renders
    fn bind(&mut self);

    /// Hand pipeline state back to the host
    fn unbind(&mut self);

    /// Select the framebuffer the core renders into
    fn bind_framebuffer(&mut self, target: FramebufferTarget);

    /// Present the default framebuffer
    fn swap_buffers(&mut self);

    /// Free objects created for the current context while it is still
    /// current. Safe to call when nothing is held.
    fn release_resources(&mut self) {}

    /// Release GPU resources held for the current context
    fn destroy(&mut self) {
        self.release_resources();
    }
}

/// Headless context: no GPU, only call accounting.
#[derive(Debug, Default, Clone)]
pub struct NullContext {
    pub initialized: bool,
    pub resets: u32,
    pub setups: u32,
    pub binds: u32,
    pub unbinds: u32,
    pub swaps: u32,
    pub destroys: u32,
    /// Off-screen targets created and freed, as a GPU-backed manager would
    pub targets_created: u32,
    pub targets_freed: u32,
    pub current_target: Option<FramebufferTarget>,
    /// When set, `init_context` fails as a host without GL would
    pub unsupported: bool,
}

impl NullContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Off-screen targets currently allocated
    pub fn live_targets(&self) -> u32 {
        self.targets_created - self.targets_freed
    }
}

impl GlContextManager for NullContext {
    fn init_context(&mut self, _params: &ContextParams) -> Result<(), ContextError> {
        if self.unsupported {
            return Err(ContextError::Unsupported("null context".to_string()));
        }
        self.initialized = true;
        Ok(())
    }

    fn context_reset(&mut self) -> Result<(), ContextError> {
        self.release_resources();
        self.resets += 1;
        self.targets_created += 1;
        Ok(())
    }

    fn setup_state(&mut self) {
        self.setups += 1;
    }

    fn bind(&mut self) {
        self.binds += 1;
    }

    fn unbind(&mut self) {
        self.unbinds += 1;
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        self.current_target = Some(target);
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }

    fn release_resources(&mut self) {
        if self.live_targets() > 0 {
            self.targets_freed += 1;
        }
    }

    fn destroy(&mut self) {
        self.release_resources();
        self.destroys += 1;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_context_counts_calls() {
        let mut ctx = NullContext::new();
        assert!(ctx.init_context(&ContextParams::default()).is_ok());
        ctx.context_reset().unwrap();
        ctx.bind();
        ctx.bind_framebuffer(FramebufferTarget::Offscreen);
        ctx.unbind();

        assert!(ctx.initialized);
        assert_eq!(ctx.resets, 1);
        assert_eq!(ctx.binds, 1);
        assert_eq!(ctx.unbinds, 1);
        assert_eq!(ctx.current_target, Some(FramebufferTarget::Offscreen));
        assert_eq!(ctx.swaps, 0);
    }

    #[test]
    fn test_null_context_frees_target_on_reset_and_release() {
        let mut ctx = NullContext::new();
        ctx.context_reset().unwrap();
        ctx.context_reset().unwrap();
        assert_eq!(ctx.targets_created, 2);
        assert_eq!(ctx.live_targets(), 1);

        ctx.release_resources();
        ctx.release_resources();
        assert_eq!(ctx.live_targets(), 0);
        assert_eq!(ctx.targets_freed, 2);

        ctx.context_reset().unwrap();
        ctx.destroy();
        assert_eq!(ctx.live_targets(), 0);
        assert_eq!(ctx.destroys, 1);
    }

    #[test]
    fn test_unsupported_context_fails_init() {
        let mut ctx = NullContext {
            unsupported: true,
            ..Default::default()
        };
        let err = ctx.init_context(&ContextParams::default()).unwrap_err();
        assert!(matches!(err, ContextError::Unsupported(_)));
        assert!(!ctx.initialized);
    }

    #[test]
    fn test_default_params_have_no_stencil() {
        let params = ContextParams::default();
        assert!(!params.stencil);
        assert!(params.depth);
    }
}

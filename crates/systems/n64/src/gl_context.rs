//! GL context lifecycle
//!
//! `Uninitialized -> Initialized`, with any number of context resets while
//! initialized. The host may lose and recreate its context at any time; every
//! reset re-primes the graphics plugin, while global GPU state is set up only
//! once per process.

use host_core::gl::{ContextError, ContextParams, GlContextManager};
use host_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;

use crate::core_api::GraphicsPlugin;
use crate::session::RunState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GlState {
    #[default]
    Uninitialized,
    Initialized,
}

#[derive(Debug, Default)]
pub struct GlLifecycle {
    state: GlState,
    setup_done: bool,
    resets: u32,
}

impl GlLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GlState {
        self.state
    }

    /// Context resets handled so far
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Register with the context manager (first call only), then run one
    /// reset so the context is renderable on return.
    pub fn init_gl<G, P>(
        &mut self,
        gl: &mut G,
        gfx: &mut P,
        run: &mut RunState,
    ) -> Result<(), ContextError>
    where
        G: GlContextManager + ?Sized,
        P: GraphicsPlugin + ?Sized,
    {
        if self.state == GlState::Uninitialized {
            gl.init_context(&ContextParams::default()).map_err(|err| {
                log(LogCategory::Gfx, LogLevel::Error, || err.to_string());
                err
            })?;
            self.state = GlState::Initialized;
            log(LogCategory::Gfx, LogLevel::Debug, || {
                "context manager initialized".to_string()
            });
        }

        self.context_reset(gl, gfx, run)
    }

    /// The host (re)created its context
    pub fn context_reset<G, P>(
        &mut self,
        gl: &mut G,
        gfx: &mut P,
        run: &mut RunState,
    ) -> Result<(), ContextError>
    where
        G: GlContextManager + ?Sized,
        P: GraphicsPlugin + ?Sized,
    {
        if self.state == GlState::Uninitialized {
            log(LogCategory::Gfx, LogLevel::Warn, || {
                "context reset before GL init, ignoring".to_string()
            });
            return Ok(());
        }

        gl.context_reset()?;
        if !self.setup_done {
            gl.setup_state();
            self.setup_done = true;
            log(LogCategory::Gfx, LogLevel::Debug, || {
                "global GL state set up".to_string()
            });
        }

        self.resets += 1;
        run.first_context_reset = false;

        if !gfx.init_gfx() {
            log(LogCategory::Gfx, LogLevel::Error, || {
                "graphics plugin failed to initialize".to_string()
            });
            return Err(ContextError::Resource("graphics plugin init".to_string()));
        }

        log(LogCategory::Gfx, LogLevel::Debug, || {
            format!("context reset #{}", self.resets)
        });
        Ok(())
    }

    /// The host is about to drop its context
    pub fn context_destroy<G, P>(&mut self, gl: &mut G, gfx: &mut P)
    where
        G: GlContextManager + ?Sized,
        P: GraphicsPlugin + ?Sized,
    {
        gfx.deinit_gfx();
        gl.release_resources();
        log(LogCategory::Gfx, LogLevel::Debug, || "context destroyed".to_string());
    }

    /// Tear down for unload. The one-time setup latch survives.
    pub fn shutdown<G>(&mut self, gl: &mut G)
    where
        G: GlContextManager + ?Sized,
    {
        if self.state == GlState::Initialized {
            gl.destroy();
            self.state = GlState::Uninitialized;
        }
    }

    /// Whether the host must leave the framebuffer alone
    pub fn framebuffer_locked(run: &RunState) -> bool {
        !run.stopped
    }
}

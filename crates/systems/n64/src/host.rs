//! Host facade and frame scheduler
//!
//! [`Host`] owns the session and the three collaborators (core, GL context
//! manager, graphics plugin) and exposes the entry points an embedding
//! frontend calls: load, one step per host tick, controller updates, skip
//! budget, present, and the GL context callbacks.

use std::path::Path;

use host_core::gl::{GlContextManager, NullContext};
use host_core::logging::{log, LogCategory, LogLevel};
use serde_json::json;

use crate::config::HostConfig;
use crate::controller::{ControllerInput, Controllers, InputError, MAX_CONTROLLERS};
use crate::core_api::{CoreError, CoreIo, GraphicsPlugin, N64Core};
use crate::frame_skip::FrameSkip;
use crate::gl_context::GlLifecycle;
use crate::headless::{HeadlessCore, NullGraphics};
use crate::header::{AvInfo, RomHeader, SystemRegion};
use crate::loader::{LoadError, Loader};
use crate::save_memory::{SaveFlags, SaveMemory};
use crate::session::{FrameStats, ImageInfo, Session, TICK_MS};

/// Host with the headless collaborators
pub type HeadlessHost = Host<HeadlessCore, NullContext, NullGraphics>;

pub struct Host<C, G, P> {
    config: HostConfig,
    core: C,
    gl: G,
    gfx: P,
    session: Session,
    loader: Loader,
    lifecycle: GlLifecycle,
}

/// The session as the core sees it during one step
struct FrameIo<'a, G: ?Sized> {
    controllers: &'a Controllers,
    save_memory: &'a mut SaveMemory,
    frame_skip: &'a mut FrameSkip,
    stats: &'a mut FrameStats,
    gl: &'a mut G,
    ticks_ms: u64,
}

impl<G: GlContextManager + ?Sized> CoreIo for FrameIo<'_, G> {
    fn controller(&self, slot: usize) -> Option<&ControllerInput> {
        self.controllers.get(slot)
    }

    fn save_memory(&mut self) -> &mut SaveMemory {
        &mut *self.save_memory
    }

    fn present(&mut self) {
        present_frame(&mut *self.frame_skip, &mut *self.stats, &mut *self.gl);
    }

    fn ticks_ms(&self) -> u64 {
        self.ticks_ms
    }
}

/// Record a drawn frame; swap only when not skipping
fn present_frame<G: GlContextManager + ?Sized>(
    frame_skip: &mut FrameSkip,
    stats: &mut FrameStats,
    gl: &mut G,
) {
    if frame_skip.present() {
        gl.swap_buffers();
        stats.presented += 1;
    } else {
        stats.skipped += 1;
    }
}

impl HeadlessHost {
    pub fn headless(config: HostConfig) -> Self {
        Host::new(config, HeadlessCore::new(), NullContext::new(), NullGraphics::new())
    }
}

impl<C: N64Core, G: GlContextManager, P: GraphicsPlugin> Host<C, G, P> {
    pub fn new(config: HostConfig, core: C, gl: G, gfx: P) -> Self {
        let session = Session::new(config.skip_count);
        Self {
            config,
            core,
            gl,
            gfx,
            session,
            loader: Loader::new(),
            lifecycle: GlLifecycle::new(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn gfx(&self) -> &P {
        &self.gfx
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn stats(&self) -> FrameStats {
        self.session.stats
    }

    pub fn header(&self) -> Option<&RomHeader> {
        self.session.header.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// Load an image and bring the core up. Returns false on any failure.
    pub fn load_game(&mut self, image: &[u8], load_eep: bool, load_sra: bool, load_fla: bool) -> bool {
        self.try_load_game(image, SaveFlags::new(load_eep, load_sra, load_fla))
            .is_ok()
    }

    /// [`Host::load_game`] with the failure reason.
    ///
    /// On error the session is stopped and nothing stays staged.
    pub fn try_load_game(&mut self, image: &[u8], flags: SaveFlags) -> Result<RomHeader, LoadError> {
        if self.session.is_running() {
            log(LogCategory::Loader, LogLevel::Info, || {
                "replacing running session".to_string()
            });
            self.core.stop();
        }

        match self.bring_up(image, flags) {
            Ok(header) => {
                self.session.run.first_context_reset = true;
                log(LogCategory::Loader, LogLevel::Info, || {
                    format!(
                        "loaded \"{}\" ({:?}, crc1 {:08X})",
                        header.name,
                        header.region(),
                        header.crc1
                    )
                });
                Ok(header)
            }
            Err(err) => {
                self.loader.release();
                self.session.run.stopped = true;
                self.session.header = None;
                self.session.image = None;
                log(LogCategory::Loader, LogLevel::Error, || {
                    format!("mupen64plus: {}", err)
                });
                Err(err)
            }
        }
    }

    fn bring_up(&mut self, image: &[u8], flags: SaveFlags) -> Result<RomHeader, LoadError> {
        if image.is_empty() {
            return Err(LoadError::EmptyImage);
        }

        self.session
            .save_memory
            .format_and_overlay(&self.config.save_dir, flags);

        self.session.rearm();
        let settings = self.config.core_settings();
        self.core.apply_settings(&settings);
        if let Err(err) = self.core.init_audio(self.config.audio_buffer_size) {
            log(LogCategory::Core, LogLevel::Warn, || err.to_string());
        }

        self.lifecycle
            .init_gl(&mut self.gl, &mut self.gfx, &mut self.session.run)
            .map_err(|err| LoadError::GlUnavailable(err.to_string()))?;

        let kind = self.loader.stage(image)?;
        self.session.image = Some(ImageInfo::describe(kind, image));
        self.session.run.stopped = false;

        let header = self.loader.bring_up(&mut self.core, &self.config.system_dir)?;
        self.session.header = Some(header.clone());
        Ok(header)
    }

    /// Run one host tick. A no-op while stopped.
    pub fn step_frame(&mut self) {
        self.session.run.ticks_ms += TICK_MS;
        if self.session.run.stopped {
            return;
        }

        self.gl.bind();

        if self.session.run.first_time {
            self.session.run.first_time = false;
            if let Err(err) = self.start_core() {
                self.halt(&format!("core start failed: {}", err), LogLevel::Error);
                return;
            }
        }

        let target = self.session.frame_skip.begin_frame();
        self.gl.bind_framebuffer(target);

        let outcome = {
            let mut io = FrameIo {
                controllers: &self.session.controllers,
                save_memory: &mut self.session.save_memory,
                frame_skip: &mut self.session.frame_skip,
                stats: &mut self.session.stats,
                gl: &mut self.gl,
                ticks_ms: self.session.run.ticks_ms,
            };
            self.core.step_once(&mut io)
        };
        self.session.stats.stepped += 1;

        match outcome {
            Ok(outcome) if outcome.is_halted() => {
                self.halt("core requested stop", LogLevel::Info)
            }
            Ok(_) => {}
            Err(err) => self.halt(&err.to_string(), LogLevel::Error),
        }

        if self.session.run.stopped {
            return;
        }
        self.gl.unbind();
    }

    /// Deferred one-time start; GL and audio are up by now
    fn start_core(&mut self) -> Result<(), CoreError> {
        let settings = self.config.core_settings();
        self.core
            .connect_plugins(settings.gfx_plugin, settings.rsp_plugin);
        log(LogCategory::Frame, LogLevel::Info, || "EXECUTE".to_string());
        self.core.execute()?;

        self.core.apply_settings(&settings);
        self.gfx
            .change_size(settings.screen_width, settings.screen_height);
        self.gfx.set_filtering(settings.filtering);
        self.core.pre_run();
        Ok(())
    }

    fn halt(&mut self, reason: &str, level: LogLevel) {
        self.session.run.stopped = true;
        log(LogCategory::Frame, level, || {
            format!(
                "session stopped after {} frames: {}",
                self.session.stats.stepped, reason
            )
        });
    }

    /// Write one controller slot; takes effect on the next step
    pub fn update_controls(
        &mut self,
        slot: usize,
        button_mask: u16,
        axis_x: i16,
        axis_y: i16,
    ) -> Result<(), InputError> {
        self.session
            .controllers
            .update(slot, button_mask, axis_x, axis_y)
    }

    pub fn controller_state(&self, slot: usize) -> Option<&ControllerInput> {
        self.session.controllers.get(slot)
    }

    pub fn set_skip_count(&mut self, skip_count: u32) {
        self.session.frame_skip.set_skip_count(skip_count);
        log(LogCategory::Frame, LogLevel::Debug, || {
            format!("frame skip budget set to {}", skip_count)
        });
    }

    pub fn skip_count(&self) -> u32 {
        self.session.frame_skip.skip_count()
    }

    pub fn frame_skip(&self) -> &FrameSkip {
        &self.session.frame_skip
    }

    /// Called by the renderer after drawing a frame
    pub fn swap_present(&mut self) {
        present_frame(
            &mut self.session.frame_skip,
            &mut self.session.stats,
            &mut self.gl,
        );
    }

    /// Host callback: the GL context was (re)created
    pub fn context_reset(&mut self) {
        if let Err(err) = self
            .lifecycle
            .context_reset(&mut self.gl, &mut self.gfx, &mut self.session.run)
        {
            log(LogCategory::Gfx, LogLevel::Error, || {
                format!("context reset failed: {}", err)
            });
        }
    }

    /// Host callback: the GL context is going away
    pub fn context_destroy(&mut self) {
        self.lifecycle.context_destroy(&mut self.gl, &mut self.gfx);
    }

    /// Host callback: whether the framebuffer must be left alone
    pub fn framebuffer_locked(&self) -> bool {
        GlLifecycle::framebuffer_locked(&self.session.run)
    }

    pub fn gl_lifecycle(&self) -> &GlLifecycle {
        &self.lifecycle
    }

    pub fn region(&self) -> SystemRegion {
        self.session
            .header
            .as_ref()
            .map_or(SystemRegion::Ntsc, RomHeader::region)
    }

    pub fn is_pal(&self) -> bool {
        self.region() == SystemRegion::Pal
    }

    pub fn av_info(&self) -> AvInfo {
        AvInfo::new(self.config.screen_width, self.config.screen_height, self.region())
    }

    /// Shut the session down; the next load starts from scratch
    pub fn unload(&mut self) {
        self.core.stop();
        self.core.exit();
        self.core.deinit_audio();
        self.lifecycle.context_destroy(&mut self.gl, &mut self.gfx);
        self.lifecycle.shutdown(&mut self.gl);
        self.loader.release();
        self.session.run.stopped = true;
        self.session.header = None;
        self.session.image = None;
        log(LogCategory::Loader, LogLevel::Info, || "session unloaded".to_string());
    }

    /// Snapshot of run, skip and image state for diagnostics
    pub fn debug_state(&self) -> serde_json::Value {
        let controllers: Vec<ControllerInput> = (0..MAX_CONTROLLERS)
            .filter_map(|slot| self.session.controllers.get(slot).copied())
            .collect();
        json!({
            "run": self.session.run,
            "frame_skip": self.session.frame_skip,
            "stats": self.session.stats,
            "header": self.session.header,
            "image": self.session.image,
            "gl": {
                "state": self.lifecycle.state(),
                "resets": self.lifecycle.resets(),
            },
            "av_info": self.av_info(),
            "controllers": controllers,
        })
    }

    /// Write [`Host::debug_state`] as pretty JSON
    pub fn save_debug_state(&self, path: &Path) -> std::io::Result<()> {
        let contents = serde_json::to_string_pretty(&self.debug_state())?;
        std::fs::write(path, contents)
    }
}

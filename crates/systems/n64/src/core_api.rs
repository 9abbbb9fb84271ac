//! Interfaces to the emulator core and graphics plugin
//!
//! The adapter does not emulate anything itself. It drives a core through an
//! ordered set of bring-up commands, then steps it one frame per host tick.
//! While stepping, the core reaches back into the session only through
//! [`CoreIo`], which keeps every borrow scoped to that one frame.

use host_core::logging::{log, LogCategory, LogLevel};
use host_core::StepOutcome;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controller::ControllerInput;
use crate::header::RomHeader;
use crate::save_memory::SaveMemory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{command} failed: {message}")]
pub struct CoreError {
    pub command: &'static str,
    pub message: String,
}

impl CoreError {
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GfxPluginKind {
    Glide64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RspPluginKind {
    Hle,
}

/// Accessory plugged into a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PakType {
    None,
    #[default]
    MemPak,
    RumblePak,
    Raw,
}

/// Settings pushed to the core at load time and on the first frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreSettings {
    pub screen_width: u32,
    pub screen_height: u32,
    pub filtering: u32,
    pub dithering: u32,
    pub gfx_accuracy: u32,
    pub gfx_plugin: GfxPluginKind,
    pub rsp_plugin: RspPluginKind,
    pub pak_types: [PakType; 4],
    pub controllers_present: [bool; 4],
}

/// What a core may touch while it runs a frame
pub trait CoreIo {
    /// Controller state written by the host before this frame
    fn controller(&self, slot: usize) -> Option<&ControllerInput>;

    fn save_memory(&mut self) -> &mut SaveMemory;

    /// Finish the frame's rendering; presents only when not skipping
    fn present(&mut self);

    /// Millisecond clock advanced by the frame scheduler
    fn ticks_ms(&self) -> u64;
}

/// An emulator core with a cooperative, one-frame-at-a-time contract.
///
/// Bring-up order is fixed: `startup`, then `rom_open` or
/// (`disk_open`, `ddrom_open`), then `read_header`. On the first frame the
/// scheduler calls `connect_plugins`, `execute` and `pre_run` before the
/// first `step_once`.
pub trait N64Core {
    fn startup(&mut self) -> Result<(), CoreError>;

    fn init_audio(&mut self, buffer_size: usize) -> Result<(), CoreError>;

    fn apply_settings(&mut self, settings: &CoreSettings);

    fn rom_open(&mut self, image: &[u8]) -> Result<(), CoreError>;

    fn disk_open(&mut self, image: &[u8]) -> Result<(), CoreError>;

    /// Load the 64DD IPL after a disk image
    fn ddrom_open(&mut self, ipl: &[u8]) -> Result<(), CoreError>;

    fn read_header(&mut self) -> Result<RomHeader, CoreError>;

    fn connect_plugins(&mut self, gfx: GfxPluginKind, rsp: RspPluginKind);

    /// Begin execution; the core must not run until stepped
    fn execute(&mut self) -> Result<(), CoreError>;

    /// Last preparation before the first step
    fn pre_run(&mut self) {}

    /// Advance exactly one frame and return
    fn step_once(&mut self, io: &mut dyn CoreIo) -> Result<StepOutcome, CoreError>;

    fn stop(&mut self) {}

    fn exit(&mut self) {}

    fn deinit_audio(&mut self) {}
}

/// The rasterizer plugin that renders into the host's GL context
pub trait GraphicsPlugin {
    /// (Re)acquire all GPU resources for the current context
    fn init_gfx(&mut self) -> bool;

    /// Release GPU resources before the context goes away
    fn deinit_gfx(&mut self) {}

    fn set_filtering(&mut self, mode: u32);

    fn change_size(&mut self, width: u32, height: u32);
}

/// Severity levels a core attaches to its diagnostic messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreMessageLevel {
    Error,
    Warning,
    Info,
    Status,
    Verbose,
}

impl CoreMessageLevel {
    pub fn log_level(self) -> LogLevel {
        match self {
            CoreMessageLevel::Error => LogLevel::Error,
            CoreMessageLevel::Warning => LogLevel::Warn,
            CoreMessageLevel::Info => LogLevel::Info,
            CoreMessageLevel::Status | CoreMessageLevel::Verbose => LogLevel::Debug,
        }
    }
}

/// Route a core diagnostic through the host log
pub fn forward_core_message(level: CoreMessageLevel, message: &str) {
    log(LogCategory::Core, level.log_level(), || {
        format!("mupen64plus: {}", message)
    });
}

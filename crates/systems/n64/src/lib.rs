//! N64 host adapter.
//!
//! Drives a cooperative, one-frame-at-a-time N64 core inside a host that owns
//! the window, the GL context and the input devices:
//!
//! - **Loader**: stages a cartridge or 64DD disk image and runs the core's
//!   bring-up commands, rolling back to a stopped session on any failure
//! - **Frame scheduler**: one core step per host tick, with a lazy core start
//!   on the first tick after a load
//! - **Frame skip**: routes rendering to an off-screen target under a skip
//!   budget and suppresses those swaps
//! - **GL lifecycle**: survives any number of context resets
//! - **Controllers**: 16-bit button masks and raw axes for four slots
//! - **Save memory**: formats EEPROM/SRAM/FlashRAM/mempaks/disk and overlays
//!   persisted `game.eep`/`game.sra`/`game.fla`
//!
//! ```no_run
//! use host_n64::{HeadlessHost, HostConfig};
//!
//! let rom = std::fs::read("game.z64").unwrap();
//! let mut host = HeadlessHost::headless(HostConfig::default());
//! if host.load_game(&rom, false, false, false) {
//!     for _ in 0..60 {
//!         host.update_controls(0, 0x0010, 0, 0).ok();
//!         host.step_frame();
//!     }
//! }
//! ```

pub mod cartridge;
pub mod config;
pub mod controller;
pub mod core_api;
pub mod frame_skip;
pub mod gl_context;
#[cfg(feature = "opengl")]
pub mod glow_context;
pub mod header;
pub mod headless;
pub mod host;
pub mod loader;
pub mod save_memory;
pub mod session;

pub use cartridge::ImageKind;
pub use config::HostConfig;
pub use controller::{ControllerButtons, ControllerInput, InputError};
pub use core_api::{CoreError, CoreIo, GraphicsPlugin, N64Core};
pub use frame_skip::FrameSkip;
pub use header::{AvInfo, RomHeader, SystemRegion};
pub use headless::{HeadlessCore, NullGraphics};
pub use host::{HeadlessHost, Host};
pub use loader::LoadError;
pub use save_memory::SaveFlags;

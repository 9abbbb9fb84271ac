//! Headless collaborators
//!
//! [`HeadlessCore`] honours the full core contract without emulating a CPU:
//! it validates the bring-up order, decodes the header of what it was given
//! and turns each step into exactly one presented frame. [`NullGraphics`]
//! stands in for the rasterizer plugin. The CLI and the tests drive the host
//! with these.

use host_core::StepOutcome;

use crate::cartridge::normalize;
use crate::controller::ControllerInput;
use crate::core_api::{
    forward_core_message, CoreError, CoreIo, CoreMessageLevel, CoreSettings, GfxPluginKind,
    GraphicsPlugin, N64Core, RspPluginKind,
};
use crate::header::RomHeader;

#[derive(Debug, Default)]
pub struct HeadlessCore {
    started: bool,
    executing: bool,
    rom: Option<Vec<u8>>,
    disk_len: Option<usize>,
    ipl: Option<Vec<u8>>,
    audio_buffer: Option<usize>,
    settings: Option<CoreSettings>,
    plugins: Option<(GfxPluginKind, RspPluginKind)>,
    pre_runs: u32,
    frames: u64,
    halt_after: Option<u64>,
    last_input: ControllerInput,
    last_ticks: u64,
    commands: Vec<&'static str>,
}

impl HeadlessCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a halt once `frames` frames have run
    pub fn set_halt_after(&mut self, frames: Option<u64>) {
        self.halt_after = frames;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Every command received, in order
    pub fn commands(&self) -> &[&'static str] {
        &self.commands
    }

    pub fn settings(&self) -> Option<&CoreSettings> {
        self.settings.as_ref()
    }

    pub fn plugins(&self) -> Option<(GfxPluginKind, RspPluginKind)> {
        self.plugins
    }

    pub fn pre_runs(&self) -> u32 {
        self.pre_runs
    }

    pub fn audio_buffer(&self) -> Option<usize> {
        self.audio_buffer
    }

    pub fn disk_len(&self) -> Option<usize> {
        self.disk_len
    }

    /// Controller 1 as seen on the last frame
    pub fn last_input(&self) -> ControllerInput {
        self.last_input
    }

    pub fn last_ticks(&self) -> u64 {
        self.last_ticks
    }

    fn require_started(&self, command: &'static str) -> Result<(), CoreError> {
        if self.started {
            Ok(())
        } else {
            Err(CoreError::new(command, "core not started"))
        }
    }
}

impl N64Core for HeadlessCore {
    fn startup(&mut self) -> Result<(), CoreError> {
        self.commands.push("startup");
        self.started = true;
        Ok(())
    }

    fn init_audio(&mut self, buffer_size: usize) -> Result<(), CoreError> {
        self.commands.push("init_audio");
        if buffer_size == 0 {
            return Err(CoreError::new("AUDIO_INIT", "zero-length audio buffer"));
        }
        self.audio_buffer = Some(buffer_size);
        Ok(())
    }

    fn apply_settings(&mut self, settings: &CoreSettings) {
        self.commands.push("apply_settings");
        self.settings = Some(settings.clone());
    }

    fn rom_open(&mut self, image: &[u8]) -> Result<(), CoreError> {
        self.commands.push("rom_open");
        self.require_started("ROM_OPEN")?;
        let rom = normalize(image)
            .ok_or_else(|| CoreError::new("ROM_OPEN", "not a cartridge image"))?;
        self.rom = Some(rom);
        self.disk_len = None;
        self.ipl = None;
        Ok(())
    }

    fn disk_open(&mut self, image: &[u8]) -> Result<(), CoreError> {
        self.commands.push("disk_open");
        self.require_started("DISK_OPEN")?;
        self.disk_len = Some(image.len());
        self.rom = None;
        Ok(())
    }

    fn ddrom_open(&mut self, ipl: &[u8]) -> Result<(), CoreError> {
        self.commands.push("ddrom_open");
        if self.disk_len.is_none() {
            return Err(CoreError::new("DDROM_OPEN", "no disk inserted"));
        }
        let ipl = normalize(ipl).ok_or_else(|| CoreError::new("DDROM_OPEN", "invalid IPL"))?;
        self.ipl = Some(ipl);
        Ok(())
    }

    fn read_header(&mut self) -> Result<RomHeader, CoreError> {
        self.commands.push("read_header");
        self.rom
            .as_deref()
            .or(self.ipl.as_deref())
            .and_then(RomHeader::parse)
            .ok_or_else(|| CoreError::new("ROM_GET_HEADER", "no image open"))
    }

    fn connect_plugins(&mut self, gfx: GfxPluginKind, rsp: RspPluginKind) {
        self.commands.push("connect_plugins");
        self.plugins = Some((gfx, rsp));
    }

    fn execute(&mut self) -> Result<(), CoreError> {
        self.commands.push("execute");
        if self.plugins.is_none() {
            return Err(CoreError::new("EXECUTE", "plugins not connected"));
        }
        if self.rom.is_none() && self.ipl.is_none() {
            return Err(CoreError::new("EXECUTE", "no image open"));
        }
        self.executing = true;
        Ok(())
    }

    fn pre_run(&mut self) {
        self.commands.push("pre_run");
        self.pre_runs += 1;
    }

    fn step_once(&mut self, io: &mut dyn CoreIo) -> Result<StepOutcome, CoreError> {
        if !self.executing {
            return Err(CoreError::new("STEP", "core is not executing"));
        }

        self.frames += 1;
        self.last_ticks = io.ticks_ms();
        if let Some(input) = io.controller(0) {
            self.last_input = *input;
        }
        io.present();

        if self.halt_after.is_some_and(|limit| self.frames >= limit) {
            forward_core_message(
                CoreMessageLevel::Info,
                &format!("halting after {} frames", self.frames),
            );
            self.executing = false;
            return Ok(StepOutcome::Halted);
        }
        Ok(StepOutcome::FrameDone)
    }

    fn stop(&mut self) {
        self.commands.push("stop");
        self.executing = false;
    }

    fn exit(&mut self) {
        self.commands.push("exit");
        self.started = false;
        self.rom = None;
        self.disk_len = None;
        self.ipl = None;
        self.plugins = None;
    }

    fn deinit_audio(&mut self) {
        self.commands.push("deinit_audio");
        self.audio_buffer = None;
    }
}

/// Rasterizer stand-in that only counts lifecycle calls
#[derive(Debug, Default, Clone)]
pub struct NullGraphics {
    pub inits: u32,
    pub deinits: u32,
    pub filtering: Option<u32>,
    pub size: Option<(u32, u32)>,
    /// When set, `init_gfx` reports failure
    pub fail_init: bool,
}

impl NullGraphics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsPlugin for NullGraphics {
    fn init_gfx(&mut self) -> bool {
        if self.fail_init {
            return false;
        }
        self.inits += 1;
        true
    }

    fn deinit_gfx(&mut self) {
        self.deinits += 1;
    }

    fn set_filtering(&mut self, mode: u32) {
        self.filtering = Some(mode);
    }

    fn change_size(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controllers;
    use crate::header::test_header;
    use crate::save_memory::SaveMemory;

    struct TestIo {
        controllers: Controllers,
        save_memory: SaveMemory,
        presents: u32,
    }

    impl CoreIo for TestIo {
        fn controller(&self, slot: usize) -> Option<&ControllerInput> {
            self.controllers.get(slot)
        }
        fn save_memory(&mut self) -> &mut SaveMemory {
            &mut self.save_memory
        }
        fn present(&mut self) {
            self.presents += 1;
        }
        fn ticks_ms(&self) -> u64 {
            48
        }
    }

    fn running_core(halt_after: Option<u64>) -> HeadlessCore {
        let mut core = HeadlessCore::new();
        core.set_halt_after(halt_after);
        core.startup().unwrap();
        core.rom_open(&test_header("HEADLESS", b'P')).unwrap();
        core.read_header().unwrap();
        core.connect_plugins(GfxPluginKind::Glide64, RspPluginKind::Hle);
        core.execute().unwrap();
        core
    }

    #[test]
    fn test_rom_open_requires_startup() {
        let mut core = HeadlessCore::new();
        assert!(core.rom_open(&test_header("X", b'E')).is_err());
    }

    #[test]
    fn test_rom_open_normalizes_byte_order() {
        let mut swapped = test_header("SWAPPED", b'E');
        for chunk in swapped.chunks_exact_mut(2) {
            chunk.swap(0, 1);
        }

        let mut core = HeadlessCore::new();
        core.startup().unwrap();
        core.rom_open(&swapped).unwrap();
        assert_eq!(core.read_header().unwrap().name, "SWAPPED");
    }

    #[test]
    fn test_rom_open_rejects_garbage() {
        let mut core = HeadlessCore::new();
        core.startup().unwrap();
        assert!(core.rom_open(&[0u8; 128]).is_err());
        assert!(core.read_header().is_err());
    }

    #[test]
    fn test_disk_header_comes_from_ipl() {
        let mut core = HeadlessCore::new();
        core.startup().unwrap();
        assert!(core.ddrom_open(&test_header("IPL", b'J')).is_err());

        core.disk_open(&[0u8; 16]).unwrap();
        core.ddrom_open(&test_header("64DD IPL", b'J')).unwrap();
        assert_eq!(core.read_header().unwrap().name, "64DD IPL");
        assert_eq!(core.disk_len(), Some(16));
    }

    #[test]
    fn test_execute_requires_plugins() {
        let mut core = HeadlessCore::new();
        core.startup().unwrap();
        core.rom_open(&test_header("X", b'E')).unwrap();
        assert!(core.execute().is_err());
    }

    #[test]
    fn test_step_presents_and_latches_input() {
        let mut core = running_core(None);
        let mut io = TestIo {
            controllers: Controllers::new(),
            save_memory: SaveMemory::new(),
            presents: 0,
        };
        io.controllers.update(0, 0x0011, -100, 50).unwrap();

        assert_eq!(core.step_once(&mut io).unwrap(), StepOutcome::FrameDone);
        assert_eq!(io.presents, 1);
        assert_eq!(core.frames(), 1);
        assert_eq!(core.last_ticks(), 48);
        assert!(core.last_input().buttons.d_up);
        assert!(core.last_input().buttons.start);
        assert_eq!(core.last_input().axis_x, -100);
    }

    #[test]
    fn test_halt_after() {
        let mut core = running_core(Some(2));
        let mut io = TestIo {
            controllers: Controllers::new(),
            save_memory: SaveMemory::new(),
            presents: 0,
        };

        assert_eq!(core.step_once(&mut io).unwrap(), StepOutcome::FrameDone);
        assert_eq!(core.step_once(&mut io).unwrap(), StepOutcome::Halted);
        assert!(core.step_once(&mut io).is_err());
        assert_eq!(core.frames(), 2);
    }

    #[test]
    fn test_null_graphics() {
        let mut gfx = NullGraphics::new();
        assert!(gfx.init_gfx());
        gfx.deinit_gfx();
        gfx.set_filtering(3);
        gfx.change_size(320, 240);
        assert_eq!((gfx.inits, gfx.deinits), (1, 1));
        assert_eq!(gfx.filtering, Some(3));
        assert_eq!(gfx.size, Some((320, 240)));
    }
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use host_core::gl::NullContext;
use host_core::StepOutcome;
use host_n64::cartridge::{DISK_MAGICS, N64_ROM_MAGIC};
use host_n64::core_api::{CoreSettings, GfxPluginKind, RspPluginKind};
use host_n64::loader::IPL_FILE_NAME;
use host_n64::{CoreError, CoreIo, HeadlessCore, Host, HostConfig, N64Core, NullGraphics, RomHeader};

/// Big-endian cartridge image with a readable header
pub fn cartridge_image(name: &str, destination_code: u8) -> Vec<u8> {
    let mut rom = vec![0u8; 0x1000];
    rom[0..4].copy_from_slice(&N64_ROM_MAGIC);
    rom[0x08..0x0C].copy_from_slice(&0x8000_0400u32.to_be_bytes());
    rom[0x10..0x14].copy_from_slice(&0x1234_5678u32.to_be_bytes());
    rom[0x20..0x20 + name.len()].copy_from_slice(name.as_bytes());
    rom[0x3E] = destination_code;
    rom
}

pub fn disk_image() -> Vec<u8> {
    let mut disk = DISK_MAGICS[1].to_le_bytes().to_vec();
    disk.resize(0x2000, 0x5A);
    disk
}

/// Fresh directory under the system temp dir, unique per test and process
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("n64host_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_ipl(system_dir: &Path) {
    fs::write(system_dir.join(IPL_FILE_NAME), cartridge_image("64DD IPL", b'J')).unwrap();
}

/// Headless core that can fail a named command and control its presents
pub struct ScriptedCore {
    pub inner: HeadlessCore,
    pub fail_at: Option<&'static str>,
    /// Frames (1-based) on which the core presents
    pub presents_on: fn(u64) -> bool,
    pub steps: u64,
}

impl ScriptedCore {
    pub fn new() -> Self {
        Self {
            inner: HeadlessCore::new(),
            fail_at: None,
            presents_on: |_| true,
            steps: 0,
        }
    }

    pub fn failing(command: &'static str) -> Self {
        Self {
            fail_at: Some(command),
            ..Self::new()
        }
    }

    fn check(&self, command: &'static str) -> Result<(), CoreError> {
        match self.fail_at {
            Some(failing) if failing == command => {
                Err(CoreError::new(command, "scripted failure"))
            }
            _ => Ok(()),
        }
    }
}

impl N64Core for ScriptedCore {
    fn startup(&mut self) -> Result<(), CoreError> {
        self.check("startup")?;
        self.inner.startup()
    }

    fn init_audio(&mut self, buffer_size: usize) -> Result<(), CoreError> {
        self.inner.init_audio(buffer_size)
    }

    fn apply_settings(&mut self, settings: &CoreSettings) {
        self.inner.apply_settings(settings)
    }

    fn rom_open(&mut self, image: &[u8]) -> Result<(), CoreError> {
        self.check("rom_open")?;
        self.inner.rom_open(image)
    }

    fn disk_open(&mut self, image: &[u8]) -> Result<(), CoreError> {
        self.check("disk_open")?;
        self.inner.disk_open(image)
    }

    fn ddrom_open(&mut self, ipl: &[u8]) -> Result<(), CoreError> {
        self.check("ddrom_open")?;
        self.inner.ddrom_open(ipl)
    }

    fn read_header(&mut self) -> Result<RomHeader, CoreError> {
        self.check("read_header")?;
        self.inner.read_header()
    }

    fn connect_plugins(&mut self, gfx: GfxPluginKind, rsp: RspPluginKind) {
        self.inner.connect_plugins(gfx, rsp)
    }

    fn execute(&mut self) -> Result<(), CoreError> {
        self.check("execute")?;
        self.inner.execute()
    }

    fn step_once(&mut self, io: &mut dyn CoreIo) -> Result<StepOutcome, CoreError> {
        self.check("step")?;
        self.steps += 1;
        if (self.presents_on)(self.steps) {
            io.present();
        }
        Ok(StepOutcome::FrameDone)
    }
}

pub type ScriptedHost = Host<ScriptedCore, NullContext, NullGraphics>;

pub fn scripted_host(config: HostConfig, core: ScriptedCore) -> ScriptedHost {
    Host::new(config, core, NullContext::new(), NullGraphics::new())
}

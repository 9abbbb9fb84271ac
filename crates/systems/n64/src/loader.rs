//! ROM/disk loader
//!
//! An incoming image is copied into a staging buffer, then handed to the core
//! through the fixed bring-up sequence:
//!
//! ```text
//! cartridge: startup -> rom_open  -> (release image) -> read_header
//! disk:      startup -> disk_open -> (release image) -> load IPL -> ddrom_open -> read_header
//! ```
//!
//! Staged buffers are taken out of the loader before use, so each one is
//! dropped as soon as its command returns, on success and failure alike.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use host_core::logging::{log, LogCategory, LogLevel};
use thiserror::Error;

use crate::cartridge::ImageKind;
use crate::core_api::{CoreError, N64Core};
use crate::header::RomHeader;

/// 64DD boot ROM, looked up in the system directory
pub const IPL_FILE_NAME: &str = "64DD_IPL.bin";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("image is empty")]
    EmptyImage,
    #[error("frontend has no OpenGL support: {0}")]
    GlUnavailable(String),
    #[error("failed to initialize core: {0}")]
    CoreStartup(#[source] CoreError),
    #[error("failed to load ROM: {0}")]
    RomOpen(#[source] CoreError),
    #[error("failed to load disk: {0}")]
    DiskOpen(#[source] CoreError),
    #[error("failed to load disk IPL {}: {io}", .path.display())]
    IplMissing {
        path: PathBuf,
        #[source]
        io: io::Error,
    },
    #[error("couldn't allocate {len} byte disk IPL buffer")]
    IplAllocation { len: usize },
    #[error("disk IPL short read: expected {expected} bytes, got {actual}")]
    IplShortRead { expected: usize, actual: usize },
    #[error("failed to load DDROM: {0}")]
    DdRomOpen(#[source] CoreError),
    #[error("failed to query ROM header information: {0}")]
    Header(#[source] CoreError),
}

/// Owns staged copies of images between a load request and the core command
/// that consumes them.
#[derive(Debug, Default)]
pub struct Loader {
    cart_data: Option<Vec<u8>>,
    disk_data: Option<Vec<u8>>,
    ipl_data: Option<Vec<u8>>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and copy `image` into the matching staging buffer
    pub fn stage(&mut self, image: &[u8]) -> Result<ImageKind, LoadError> {
        if image.is_empty() {
            return Err(LoadError::EmptyImage);
        }

        self.release();
        let kind = ImageKind::classify(image);
        match kind {
            ImageKind::Cartridge => self.cart_data = Some(image.to_vec()),
            ImageKind::Disk => self.disk_data = Some(image.to_vec()),
        }

        log(LogCategory::Loader, LogLevel::Debug, || {
            format!("staged {:?} image ({} bytes)", kind, image.len())
        });
        Ok(kind)
    }

    pub fn has_staged(&self) -> bool {
        self.cart_data.is_some() || self.disk_data.is_some() || self.ipl_data.is_some()
    }

    /// Total bytes currently held in staging buffers
    pub fn staged_len(&self) -> usize {
        [&self.cart_data, &self.disk_data, &self.ipl_data]
            .into_iter()
            .flatten()
            .map(Vec::len)
            .sum()
    }

    /// Drop every staged buffer
    pub fn release(&mut self) {
        self.cart_data = None;
        self.disk_data = None;
        self.ipl_data = None;
    }

    /// Run the bring-up sequence against `core`.
    ///
    /// On failure nothing remains staged.
    pub fn bring_up<C>(&mut self, core: &mut C, system_dir: &Path) -> Result<RomHeader, LoadError>
    where
        C: N64Core + ?Sized,
    {
        let result = self.run_commands(core, system_dir);
        if result.is_err() {
            self.release();
        }
        result
    }

    fn run_commands<C>(&mut self, core: &mut C, system_dir: &Path) -> Result<RomHeader, LoadError>
    where
        C: N64Core + ?Sized,
    {
        core.startup().map_err(LoadError::CoreStartup)?;

        if let Some(cart) = self.cart_data.take() {
            log(LogCategory::Loader, LogLevel::Info, || "ROM_OPEN".to_string());
            core.rom_open(&cart).map_err(LoadError::RomOpen)?;
        } else if let Some(disk) = self.disk_data.take() {
            log(LogCategory::Loader, LogLevel::Info, || "DISK_OPEN".to_string());
            core.disk_open(&disk).map_err(LoadError::DiskOpen)?;
            drop(disk);

            self.ipl_data = Some(read_ipl(&system_dir.join(IPL_FILE_NAME))?);
            if let Some(ipl) = self.ipl_data.take() {
                log(LogCategory::Loader, LogLevel::Info, || "DDROM_OPEN".to_string());
                core.ddrom_open(&ipl).map_err(LoadError::DdRomOpen)?;
            }
        }

        log(LogCategory::Loader, LogLevel::Info, || "ROM_GET_HEADER".to_string());
        core.read_header().map_err(LoadError::Header)
    }
}

/// Read the whole IPL file, sizing the buffer from its metadata first
fn read_ipl(path: &Path) -> Result<Vec<u8>, LoadError> {
    let missing = |io| LoadError::IplMissing {
        path: path.to_path_buf(),
        io,
    };

    let mut file = File::open(path).map_err(missing)?;
    let expected = file.metadata().map_err(missing)?.len() as usize;

    let mut ipl = Vec::new();
    ipl.try_reserve_exact(expected)
        .map_err(|_| LoadError::IplAllocation { len: expected })?;

    file.by_ref()
        .take(expected as u64)
        .read_to_end(&mut ipl)
        .map_err(missing)?;
    if ipl.len() != expected {
        return Err(LoadError::IplShortRead {
            expected,
            actual: ipl.len(),
        });
    }

    log(LogCategory::Loader, LogLevel::Debug, || {
        format!("read {} ({} bytes)", path.display(), expected)
    });
    Ok(ipl)
}

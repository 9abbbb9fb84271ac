//! Save-memory regions and the formatter that prepares them for a session.
//!
//! Every load formats all regions first, unconditionally, then optionally
//! overlays blobs persisted by an earlier session (`game.eep`, `game.sra`,
//! `game.fla`). Overlays start at offset 0 and never grow a region: a blob
//! larger than its region is rejected and the formatted contents stay.
//! A missing blob is not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use host_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;
use thiserror::Error;

pub const EEPROM_SIZE: usize = 0x800;
pub const MEMPAK_SIZE: usize = 0x8000;
pub const SRAM_SIZE: usize = 0x8000;
pub const FLASHRAM_SIZE: usize = 0x20000;
/// Full 64DD disk image size
pub const DISK_SIZE: usize = 0x3DE_C800;
pub const MEMPAK_COUNT: usize = 4;

/// Save regions that can be overlaid from a persisted file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SaveKind {
    Eeprom,
    Sram,
    FlashRam,
}

impl SaveKind {
    pub fn file_name(self) -> &'static str {
        match self {
            SaveKind::Eeprom => "game.eep",
            SaveKind::Sram => "game.sra",
            SaveKind::FlashRam => "game.fla",
        }
    }

    pub fn capacity(self) -> usize {
        match self {
            SaveKind::Eeprom => EEPROM_SIZE,
            SaveKind::Sram => SRAM_SIZE,
            SaveKind::FlashRam => FLASHRAM_SIZE,
        }
    }
}

#[derive(Error, Debug)]
pub enum SaveMemoryError {
    #[error("{} is {len} bytes but the region holds {capacity}", .kind.file_name())]
    Oversized {
        kind: SaveKind,
        len: usize,
        capacity: usize,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which persisted blobs to overlay after formatting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveFlags {
    pub eeprom: bool,
    pub sram: bool,
    pub flashram: bool,
}

impl SaveFlags {
    pub fn new(eeprom: bool, sram: bool, flashram: bool) -> Self {
        Self {
            eeprom,
            sram,
            flashram,
        }
    }

    fn requested(self) -> impl Iterator<Item = SaveKind> {
        [
            (self.eeprom, SaveKind::Eeprom),
            (self.sram, SaveKind::Sram),
            (self.flashram, SaveKind::FlashRam),
        ]
        .into_iter()
        .filter_map(|(wanted, kind)| wanted.then_some(kind))
    }
}

/// What happened to one requested overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverlayOutcome {
    /// Bytes copied to the start of the region
    Applied(usize),
    /// No file; the region keeps its formatted contents
    Missing,
    /// File could not be used; the region keeps its formatted contents
    Rejected,
}

/// Per-kind results of one format pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormatReport {
    pub overlays: Vec<(SaveKind, OverlayOutcome)>,
}

impl FormatReport {
    pub fn outcome(&self, kind: SaveKind) -> Option<OverlayOutcome> {
        self.overlays
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| *outcome)
    }
}

/// All battery-backed and pak memory for one session
pub struct SaveMemory {
    pub eeprom: Box<[u8]>,
    pub sram: Box<[u8]>,
    pub flashram: Box<[u8]>,
    pub mempaks: [Box<[u8]>; MEMPAK_COUNT],
    pub disk: Box<[u8]>,
}

impl std::fmt::Debug for SaveMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveMemory")
            .field("eeprom", &self.eeprom.len())
            .field("sram", &self.sram.len())
            .field("flashram", &self.flashram.len())
            .field("mempaks", &self.mempaks.len())
            .field("disk", &self.disk.len())
            .finish()
    }
}

fn zeroed(len: usize) -> Box<[u8]> {
    vec![0u8; len].into_boxed_slice()
}

impl SaveMemory {
    pub fn new() -> Self {
        Self {
            eeprom: zeroed(EEPROM_SIZE),
            sram: zeroed(SRAM_SIZE),
            flashram: zeroed(FLASHRAM_SIZE),
            mempaks: std::array::from_fn(|_| zeroed(MEMPAK_SIZE)),
            disk: zeroed(DISK_SIZE),
        }
    }

    pub fn region(&self, kind: SaveKind) -> &[u8] {
        match kind {
            SaveKind::Eeprom => &self.eeprom,
            SaveKind::Sram => &self.sram,
            SaveKind::FlashRam => &self.flashram,
        }
    }

    fn region_mut(&mut self, kind: SaveKind) -> &mut [u8] {
        match kind {
            SaveKind::Eeprom => &mut self.eeprom,
            SaveKind::Sram => &mut self.sram,
            SaveKind::FlashRam => &mut self.flashram,
        }
    }

    /// Zero every region. Idempotent.
    pub fn format(&mut self) {
        self.eeprom.fill(0);
        self.sram.fill(0);
        self.flashram.fill(0);
        for pak in self.mempaks.iter_mut() {
            pak.fill(0);
        }
        // Reallocate so untouched disk pages stay lazily zeroed
        self.disk = zeroed(DISK_SIZE);
    }

    /// Copy `blob` to the start of the region.
    ///
    /// Fails without touching the region if `blob` does not fit.
    pub fn overlay(&mut self, kind: SaveKind, blob: &[u8]) -> Result<usize, SaveMemoryError> {
        let region = self.region_mut(kind);
        if blob.len() > region.len() {
            return Err(SaveMemoryError::Oversized {
                kind,
                len: blob.len(),
                capacity: region.len(),
            });
        }
        region[..blob.len()].copy_from_slice(blob);
        Ok(blob.len())
    }

    /// Format all regions, then overlay the requested persisted blobs from
    /// `save_dir`.
    pub fn format_and_overlay(&mut self, save_dir: &Path, flags: SaveFlags) -> FormatReport {
        self.format();

        let mut report = FormatReport::default();
        for kind in flags.requested() {
            let outcome = self.overlay_from_dir(save_dir, kind);
            report.overlays.push((kind, outcome));
        }
        report
    }

    fn overlay_from_dir(&mut self, save_dir: &Path, kind: SaveKind) -> OverlayOutcome {
        let path = save_dir.join(kind.file_name());
        let blob = match fs::read(&path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log(LogCategory::Save, LogLevel::Info, || {
                    format!("{} not found, keeping formatted {:?}", path.display(), kind)
                });
                return OverlayOutcome::Missing;
            }
            Err(source) => {
                let err = SaveMemoryError::Io { path, source };
                log(LogCategory::Save, LogLevel::Warn, || err.to_string());
                return OverlayOutcome::Rejected;
            }
        };

        match self.overlay(kind, &blob) {
            Ok(len) => {
                log(LogCategory::Save, LogLevel::Info, || {
                    format!("{} loaded ({} bytes)", kind.file_name(), len)
                });
                OverlayOutcome::Applied(len)
            }
            Err(err) => {
                log(LogCategory::Save, LogLevel::Error, || {
                    format!("ignoring save overlay: {}", err)
                });
                OverlayOutcome::Rejected
            }
        }
    }
}

impl Default for SaveMemory {
    fn default() -> Self {
        Self::new()
    }
}

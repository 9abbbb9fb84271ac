use host_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::controller::MAX_CONTROLLERS;
use crate::core_api::{CoreSettings, GfxPluginKind, PakType, RspPluginKind};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Host adapter configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Initial frame-skip budget; 0 disables skipping
    pub skip_count: u32,
    /// Where `64DD_IPL.bin` lives
    pub system_dir: PathBuf,
    /// Where `game.eep`, `game.sra` and `game.fla` live
    pub save_dir: PathBuf,
    pub audio_buffer_size: usize,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Texture filtering mode (1 = 3-point, 3 = bilinear)
    pub filtering: u32,
    pub dithering: u32,
    pub gfx_accuracy: u32,
    pub pak_types: [PakType; MAX_CONTROLLERS],
    pub controllers_present: [bool; MAX_CONTROLLERS],
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            skip_count: 0,
            system_dir: PathBuf::from("."),
            save_dir: PathBuf::from("."),
            audio_buffer_size: 2048,
            screen_width: 640,
            screen_height: 480,
            filtering: 1,
            dithering: 1,
            gfx_accuracy: 2,
            pak_types: [PakType::MemPak; MAX_CONTROLLERS],
            controllers_present: [true, false, false, false],
        }
    }
}

impl HostConfig {
    /// Load from `path`, falling back to defaults if it is missing or malformed
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log(LogCategory::Loader, LogLevel::Warn, || {
                        format!("failed to parse {}: {}. Using defaults.", path.display(), e)
                    });
                    Self::default()
                }
            },
            Err(e) => {
                log(LogCategory::Loader, LogLevel::Warn, || {
                    format!("can't read {}: {}. Using defaults.", path.display(), e)
                });
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings pushed to the core
    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            filtering: self.filtering,
            dithering: self.dithering,
            gfx_accuracy: self.gfx_accuracy,
            gfx_plugin: GfxPluginKind::Glide64,
            rsp_plugin: RspPluginKind::Hle,
            pak_types: self.pak_types,
            controllers_present: self.controllers_present,
        }
    }
}

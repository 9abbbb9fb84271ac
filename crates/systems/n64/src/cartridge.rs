//! Image classification and cartridge byte-order normalization

use crate::header::HEADER_SIZE;
use serde::Serialize;

/// N64 ROM magic number (big-endian format)
pub const N64_ROM_MAGIC: [u8; 4] = [0x80, 0x37, 0x12, 0x40];

/// First word of a 64DD disk image, as read little-endian from offset 0.
/// Retail and development disks use different system-area signatures.
pub const DISK_MAGICS: [u32; 2] = [0x16D3_48E8, 0x56EE_6322];

/// What kind of media an incoming image is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    Cartridge,
    Disk,
}

impl ImageKind {
    /// Disk iff the first four bytes match a disk magic; anything else,
    /// including images shorter than four bytes, is a cartridge.
    pub fn classify(data: &[u8]) -> Self {
        match data.get(..4) {
            Some(&[a, b, c, d]) if DISK_MAGICS.contains(&u32::from_le_bytes([a, b, c, d])) => {
                ImageKind::Disk
            }
            _ => ImageKind::Cartridge,
        }
    }
}

/// N64 ROM byte order formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum ByteOrder {
    /// Big-endian (native N64 format, .z64)
    BigEndian,
    /// Little-endian (byte-swapped, .n64)
    LittleEndian,
    /// Middle-endian (word-swapped, .v64)
    MiddleEndian,
}

impl ByteOrder {
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data.get(..4)? {
            [0x80, 0x37, 0x12, 0x40] => Some(ByteOrder::BigEndian),
            [0x40, 0x12, 0x37, 0x80] => Some(ByteOrder::LittleEndian),
            [0x37, 0x80, 0x40, 0x12] => Some(ByteOrder::MiddleEndian),
            _ => None,
        }
    }
}

/// Copy `data` into big-endian (.z64) order.
///
/// Returns `None` when the image is too short for a header or the magic is
/// not one of the three cartridge orders.
pub fn normalize(data: &[u8]) -> Option<Vec<u8>> {
    if data.len() < HEADER_SIZE {
        return None;
    }

    let mut rom = data.to_vec();
    match ByteOrder::detect(data)? {
        ByteOrder::BigEndian => {}
        ByteOrder::LittleEndian => {
            for chunk in rom.chunks_exact_mut(4) {
                chunk.swap(0, 3);
                chunk.swap(1, 2);
            }
        }
        ByteOrder::MiddleEndian => {
            for chunk in rom.chunks_exact_mut(2) {
                chunk.swap(0, 1);
            }
        }
    }
    Some(rom)
}

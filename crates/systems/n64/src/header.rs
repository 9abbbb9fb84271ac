//! N64 ROM header and the timing information derived from it

use serde::Serialize;

/// Size of the big-endian header at the start of every cartridge image
pub const HEADER_SIZE: usize = 0x40;

/// Decoded 64-byte ROM header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RomHeader {
    /// PI BSD domain 1 latency, pulse width, page size, release
    pub pi_bsd_dom1: [u8; 4],
    pub clock_rate: u32,
    pub boot_address: u32,
    pub release: u32,
    pub crc1: u32,
    pub crc2: u32,
    /// Image name, trailing NULs and spaces trimmed
    pub name: String,
    pub manufacturer_id: u32,
    pub cartridge_id: u16,
    pub destination_code: u8,
    pub version: u8,
}

fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

impl RomHeader {
    /// Decode the header of a big-endian (.z64 order) image.
    ///
    /// Returns `None` if the image is shorter than the header.
    pub fn parse(image: &[u8]) -> Option<Self> {
        let data = image.get(..HEADER_SIZE)?;

        let name = String::from_utf8_lossy(&data[0x20..0x34])
            .trim_end_matches('\0')
            .trim()
            .to_string();

        Some(Self {
            pi_bsd_dom1: [data[0], data[1], data[2], data[3]],
            clock_rate: be_u32(data, 0x04),
            boot_address: be_u32(data, 0x08),
            release: be_u32(data, 0x0C),
            crc1: be_u32(data, 0x10),
            crc2: be_u32(data, 0x14),
            name,
            manufacturer_id: be_u32(data, 0x38),
            cartridge_id: u16::from_be_bytes([data[0x3C], data[0x3D]]),
            destination_code: data[0x3E],
            version: data[0x3F],
        })
    }

    pub fn region(&self) -> SystemRegion {
        SystemRegion::from_destination_code(self.destination_code)
    }
}

/// Video standard of the target console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SystemRegion {
    Ntsc,
    Pal,
}

impl SystemRegion {
    /// Unknown codes fall back to NTSC.
    pub fn from_destination_code(code: u8) -> Self {
        match code {
            // D, F, I, P, S, U, X, Y
            0x44 | 0x46 | 0x49 | 0x50 | 0x53 | 0x55 | 0x58 | 0x59 => SystemRegion::Pal,
            _ => SystemRegion::Ntsc,
        }
    }

    pub fn fps(self) -> f64 {
        match self {
            SystemRegion::Pal => 50.0,
            SystemRegion::Ntsc => 60.13,
        }
    }
}

/// Geometry and timing the host needs to size its window and audio stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvInfo {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
    pub fps: f64,
    pub sample_rate: f64,
}

impl AvInfo {
    pub const SAMPLE_RATE: f64 = 44100.0;

    pub fn new(width: u32, height: u32, region: SystemRegion) -> Self {
        Self {
            base_width: width,
            base_height: height,
            max_width: width,
            max_height: height,
            aspect_ratio: 4.0 / 3.0,
            fps: region.fps(),
            sample_rate: Self::SAMPLE_RATE,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_header(name: &str, destination_code: u8) -> Vec<u8> {
    let mut data = vec![0u8; HEADER_SIZE];
    data[0..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
    data[0x08..0x0C].copy_from_slice(&0x8000_0400u32.to_be_bytes());
    data[0x10..0x14].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
    data[0x14..0x18].copy_from_slice(&0x0BAD_F00Du32.to_be_bytes());
    let name = name.as_bytes();
    data[0x20..0x20 + name.len()].copy_from_slice(name);
    data[0x3C..0x3E].copy_from_slice(b"SM");
    data[0x3E] = destination_code;
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_fields() {
        let data = test_header("SUPER MARIO 64", b'E');
        let header = RomHeader::parse(&data).unwrap();

        assert_eq!(header.pi_bsd_dom1, [0x80, 0x37, 0x12, 0x40]);
        assert_eq!(header.boot_address, 0x8000_0400);
        assert_eq!(header.crc1, 0xDEAD_BEEF);
        assert_eq!(header.crc2, 0x0BAD_F00D);
        assert_eq!(header.name, "SUPER MARIO 64");
        assert_eq!(header.cartridge_id, u16::from_be_bytes(*b"SM"));
        assert_eq!(header.region(), SystemRegion::Ntsc);
    }

    #[test]
    fn test_parse_short_image() {
        assert!(RomHeader::parse(&[0x80, 0x37, 0x12, 0x40]).is_none());
    }

    #[test]
    fn test_region_codes() {
        for code in [b'D', b'F', b'I', b'P', b'S', b'U', b'X', b'Y'] {
            assert_eq!(SystemRegion::from_destination_code(code), SystemRegion::Pal);
        }
        for code in [b'7', b'A', b'E', b'J', 0x00, 0xFF] {
            assert_eq!(SystemRegion::from_destination_code(code), SystemRegion::Ntsc);
        }
    }

    #[test]
    fn test_av_info() {
        let pal = AvInfo::new(640, 480, SystemRegion::Pal);
        assert_eq!(pal.fps, 50.0);
        assert_eq!(pal.max_width, 640);
        assert!((pal.aspect_ratio - 4.0 / 3.0).abs() < f32::EPSILON);

        let ntsc = AvInfo::new(320, 240, SystemRegion::Ntsc);
        assert_eq!(ntsc.fps, 60.13);
        assert_eq!(ntsc.sample_rate, 44100.0);
    }
}

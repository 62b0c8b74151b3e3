//! Byte codec and per-version ROM layout.
//!
//! The ROM image is treated as an opaque flat byte array; everything in this
//! module is little-endian access at absolute offsets. The two supported
//! game variants share record layouts but not table addresses, so each
//! [`GameVersion`] carries a complete [`RomOffsets`] table.

use crate::{RandomiserError, Result};

/// Offset of the 4-byte game code inside the cartridge header.
pub const GAME_CODE_OFFSET: usize = 0x0C;

const DAWN_GAME_CODE: &[u8; 4] = b"A6RE";
const DUSK_GAME_CODE: &[u8; 4] = b"A3VE";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GameVersion {
    Dawn,
    Dusk,
}

impl GameVersion {
    pub fn name(self) -> &'static str {
        match self {
            GameVersion::Dawn => "Dawn",
            GameVersion::Dusk => "Dusk",
        }
    }
}

/// Identify the game variant from the header game code. Anything other than
/// the two known codes is a fatal, pre-mutation error.
pub fn detect_version(rom: &[u8]) -> Result<GameVersion> {
    if rom.len() < GAME_CODE_OFFSET + 4 {
        return Err(RandomiserError::UnrecognizedFormat([0; 4]));
    }

    let mut code = [0u8; 4];
    code.copy_from_slice(&rom[GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4]);

    match &code {
        c if c == DAWN_GAME_CODE => Ok(GameVersion::Dawn),
        c if c == DUSK_GAME_CODE => Ok(GameVersion::Dusk),
        _ => Err(RandomiserError::UnrecognizedFormat(code)),
    }
}

/// Little-endian unsigned read, `width` in {1, 2, 4}.
pub fn read_uint(rom: &[u8], offset: usize, width: usize) -> Result<u64> {
    debug_assert!(matches!(width, 1 | 2 | 4), "unsupported field width {width}");

    let end = offset
        .checked_add(width)
        .ok_or_else(|| RandomiserError::Decode {
            offset,
            reason: "offset overflow".to_string(),
        })?;
    if end > rom.len() {
        return Err(RandomiserError::Decode {
            offset,
            reason: format!("read of {width} bytes past end of image ({})", rom.len()),
        });
    }

    let mut value = 0u64;
    for (i, byte) in rom[offset..end].iter().enumerate() {
        value |= (*byte as u64) << (8 * i);
    }
    Ok(value)
}

/// Little-endian unsigned write in place. The value must fit in `width`
/// bytes; an oversized value is a bug in the caller, not data, so this
/// asserts rather than truncating.
pub fn write_uint(rom: &mut [u8], offset: usize, width: usize, value: u64) -> Result<()> {
    debug_assert!(matches!(width, 1 | 2 | 4), "unsupported field width {width}");
    assert!(
        value < 1u64 << (8 * width),
        "value 0x{value:X} does not fit in {width} bytes at offset 0x{offset:06X}"
    );

    let end = offset
        .checked_add(width)
        .ok_or_else(|| RandomiserError::Decode {
            offset,
            reason: "offset overflow".to_string(),
        })?;
    if end > rom.len() {
        return Err(RandomiserError::Decode {
            offset,
            reason: format!("write of {width} bytes past end of image ({})", rom.len()),
        });
    }

    for (i, byte) in rom[offset..end].iter_mut().enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
    Ok(())
}

pub fn read_u8(rom: &[u8], offset: usize) -> Result<u8> {
    read_uint(rom, offset, 1).map(|v| v as u8)
}

pub fn read_u16(rom: &[u8], offset: usize) -> Result<u16> {
    read_uint(rom, offset, 2).map(|v| v as u16)
}

pub fn read_u32(rom: &[u8], offset: usize) -> Result<u32> {
    read_uint(rom, offset, 4).map(|v| v as u32)
}

/// An inclusive block-scan range (see `tables::scan_block_table`).
#[derive(Copy, Clone, Debug)]
pub struct TableRange {
    pub start: usize,
    pub end: usize,
}

/// Absolute addresses of every table this tool touches, per game variant.
///
/// The base and enemy tables follow the 0x400-block convention; the rest are
/// flat sequential arrays. Dusk is the same build shifted by 0x800 per table.
#[derive(Clone, Debug)]
pub struct RomOffsets {
    pub version: GameVersion,

    pub base_table: TableRange,
    pub enemy_table: TableRange,

    pub move_table: usize,
    pub move_count: usize,
    /// Inclusive move-id range drawn on for regular move slots.
    pub regular_move_range: (u16, u16),
    /// Inclusive move-id range drawn on for signature move slots.
    pub signature_move_range: (u16, u16),

    pub evolution_table: usize,
    pub fusion_table: usize,
    pub fusion_max: usize,

    pub starter_table: usize,
    pub encounter_table: usize,
    pub encounter_area_count: usize,
    pub item_table: usize,
    pub item_count: usize,

    pub sprite_table: usize,
    pub sprite_max: usize,
    pub battle_string_table: usize,
    pub battle_string_count: usize,
    pub farm_table: usize,
    pub farm_count: usize,

    pub boss_enemy_id: u16,
    pub rookie_reset_offset: usize,

    required_len: usize,
}

impl RomOffsets {
    pub fn for_version(version: GameVersion) -> RomOffsets {
        // Dusk shares Dawn's layout with every table shifted up by 0x800.
        let shift = match version {
            GameVersion::Dawn => 0usize,
            GameVersion::Dusk => 0x800,
        };

        RomOffsets {
            version,
            base_table: TableRange {
                start: 0x0010_0000 + shift,
                end: 0x0010_4800 + shift,
            },
            enemy_table: TableRange {
                start: 0x0011_0000 + shift,
                end: 0x0011_5C00 + shift,
            },
            move_table: 0x0012_0000 + shift,
            move_count: 0x1C0,
            regular_move_range: (0x001, 0x15F),
            signature_move_range: (0x160, 0x1BF),
            evolution_table: 0x0013_0000 + shift,
            fusion_table: 0x0014_0000 + shift,
            fusion_max: 64,
            starter_table: 0x0015_0000 + shift,
            encounter_table: 0x0015_1000 + shift,
            encounter_area_count: 16,
            item_table: 0x0015_2000 + shift,
            item_count: 64,
            sprite_table: 0x0016_0000 + shift,
            sprite_max: 0x200,
            battle_string_table: 0x0017_0000 + shift,
            battle_string_count: 0x161,
            farm_table: 0x0018_0000 + shift,
            farm_count: 9,
            boss_enemy_id: match version {
                GameVersion::Dawn => 0x0061,
                GameVersion::Dusk => 0x0062,
            },
            rookie_reset_offset: 0x0019_0000 + shift,
            required_len: 0x001A_0000 + shift,
        }
    }

    /// Minimum image length containing every table above.
    pub fn required_len(&self) -> usize {
        self.required_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_roundtrip_widths() {
        let mut buf = vec![0u8; 16];
        write_uint(&mut buf, 0, 1, 0xAB).unwrap();
        write_uint(&mut buf, 1, 2, 0xBEEF).unwrap();
        write_uint(&mut buf, 3, 4, 0xDEAD_CAFE).unwrap();

        assert_eq!(read_uint(&buf, 0, 1).unwrap(), 0xAB);
        assert_eq!(read_uint(&buf, 1, 2).unwrap(), 0xBEEF);
        assert_eq!(read_uint(&buf, 3, 4).unwrap(), 0xDEAD_CAFE);
        // Little-endian byte order.
        assert_eq!(&buf[1..3], &[0xEF, 0xBE]);
    }

    #[test]
    fn read_past_end_is_decode_error() {
        let buf = vec![0u8; 4];
        assert!(matches!(
            read_uint(&buf, 3, 2),
            Err(RandomiserError::Decode { offset: 3, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn write_oversized_value_panics() {
        let mut buf = vec![0u8; 4];
        let _ = write_uint(&mut buf, 0, 1, 0x100);
    }

    #[test]
    fn detects_both_versions() {
        let mut rom = vec![0u8; 0x20];
        rom[GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4].copy_from_slice(b"A6RE");
        assert_eq!(detect_version(&rom).unwrap(), GameVersion::Dawn);

        rom[GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4].copy_from_slice(b"A3VE");
        assert_eq!(detect_version(&rom).unwrap(), GameVersion::Dusk);

        rom[GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4].copy_from_slice(b"XXXX");
        assert!(matches!(
            detect_version(&rom),
            Err(RandomiserError::UnrecognizedFormat(_))
        ));
    }
}

//! Table loaders.
//!
//! The base and enemy tables follow one block convention: 0x400-byte blocks,
//! each starting with a 4-byte header to skip, then fixed-stride records
//! until a 0xFFFF id sentinel or the block is exhausted. Sequential tables
//! (moves, fusions, sprites, battle strings, farm plots) are flat arrays
//! with either a fixed count or a sentinel terminator and no header.
//!
//! A record that fails to decode is traced and skipped; downstream passes
//! tolerate sparse maps.

use std::collections::BTreeMap;

use crate::catalog::{all_creature_ids, stage_of};
use crate::records::{
    BaseRecord, BattleStringRecord, EnemyRecord, EvolutionRecord, FarmTerrainRecord, FusionRecord,
    MoveRecord, PairMut, SpriteMapRecord, ID_SENTINEL,
};
use crate::rom::{read_u16, GameVersion, RomOffsets};
use crate::Result;

pub const BLOCK_LEN: usize = 0x400;
pub const BLOCK_HEADER_LEN: usize = 4;

/// Everything loaded from one ROM image. Record maps are ordered so the
/// engine's single shared RNG always sees the same draw sequence.
pub struct RomTables {
    pub version: GameVersion,
    pub base: BTreeMap<u16, BaseRecord>,
    pub enemies: BTreeMap<u16, EnemyRecord>,
    /// Indexed by move id.
    pub moves: Vec<MoveRecord>,
    pub evolutions: BTreeMap<u16, EvolutionRecord>,
    pub fusions: Vec<FusionRecord>,
    /// Result id -> conditions as they were at load time, for the
    /// fusion pass's "unchanged" condition handling.
    pub original_fusion_conditions: BTreeMap<u16, [(u32, u32); 3]>,
    pub sprites: Vec<SpriteMapRecord>,
    pub battle_strings: Vec<BattleStringRecord>,
    pub farm_plots: Vec<FarmTerrainRecord>,
}

impl RomTables {
    /// Split-borrow the base/enemy pair for one creature.
    pub fn pair_mut(&mut self, id: u16) -> Option<PairMut<'_>> {
        let enemy = self.enemies.get_mut(&id);
        let base = self.base.get_mut(&id)?;
        Some(PairMut { base, enemy })
    }

    /// Display name for a creature, falling back to its id.
    pub fn creature_name(&self, id: u16) -> String {
        match self.battle_strings.get(id as usize) {
            Some(s) if !s.text().is_empty() => s.text(),
            _ => format!("#{id:03X}"),
        }
    }
}

/// Generic block scan shared by the base and enemy tables. `end` is an
/// inclusive bound on the last block's start offset.
fn scan_block_table<R>(
    rom: &[u8],
    start: usize,
    end: usize,
    stride: usize,
    decode: impl Fn(&[u8], usize) -> Result<R>,
) -> BTreeMap<u16, R> {
    let mut map = BTreeMap::new();

    let mut block_start = start;
    while block_start <= end {
        let mut cursor = block_start + BLOCK_HEADER_LEN;

        loop {
            // Stop once the next record would spill out of the block.
            if cursor + stride > block_start + BLOCK_LEN {
                break;
            }
            let id = match read_u16(rom, cursor) {
                Ok(id) => id,
                Err(_) => break,
            };
            if id == ID_SENTINEL {
                break;
            }
            match decode(rom, cursor) {
                Ok(record) => {
                    // Last write wins; duplicate ids indicate a malformed ROM.
                    map.insert(id, record);
                }
                Err(err) => {
                    tracing::warn!(offset = cursor, error = %err, "skipping undecodable record");
                }
            }
            cursor += stride;
        }

        block_start += BLOCK_LEN;
    }

    map
}

pub fn load_base_table(rom: &[u8], offsets: &RomOffsets) -> BTreeMap<u16, BaseRecord> {
    scan_block_table(
        rom,
        offsets.base_table.start,
        offsets.base_table.end,
        BaseRecord::STRIDE,
        BaseRecord::decode,
    )
}

pub fn load_enemy_table(rom: &[u8], offsets: &RomOffsets) -> BTreeMap<u16, EnemyRecord> {
    scan_block_table(
        rom,
        offsets.enemy_table.start,
        offsets.enemy_table.end,
        EnemyRecord::STRIDE,
        EnemyRecord::decode,
    )
}

pub fn load_move_table(rom: &[u8], offsets: &RomOffsets) -> Vec<MoveRecord> {
    let mut moves = Vec::with_capacity(offsets.move_count);
    for index in 0..offsets.move_count {
        let offset = offsets.move_table + index * MoveRecord::STRIDE;
        match MoveRecord::decode(rom, offset) {
            Ok(record) => moves.push(record),
            Err(err) => {
                tracing::warn!(offset, error = %err, "skipping undecodable move");
                break;
            }
        }
    }
    moves
}

pub fn load_evolution_table(rom: &[u8], offsets: &RomOffsets) -> BTreeMap<u16, EvolutionRecord> {
    let mut map = BTreeMap::new();
    for id in all_creature_ids() {
        let offset = offsets.evolution_table + id as usize * EvolutionRecord::STRIDE;
        match EvolutionRecord::decode(rom, offset, id) {
            Ok(record) => {
                map.insert(id, record);
            }
            Err(err) => {
                tracing::warn!(offset, id, error = %err, "skipping undecodable evolution block");
            }
        }
    }
    map
}

pub fn load_fusion_table(rom: &[u8], offsets: &RomOffsets) -> Vec<FusionRecord> {
    let mut fusions = Vec::new();
    for index in 0..offsets.fusion_max {
        let offset = offsets.fusion_table + index * FusionRecord::STRIDE;
        let id = match read_u16(rom, offset) {
            Ok(id) => id,
            Err(_) => break,
        };
        if id == ID_SENTINEL {
            break;
        }
        match FusionRecord::decode(rom, offset) {
            Ok(record) => fusions.push(record),
            Err(err) => {
                tracing::warn!(offset, error = %err, "skipping undecodable fusion record");
            }
        }
    }
    fusions
}

pub fn load_sprite_table(rom: &[u8], offsets: &RomOffsets) -> Vec<SpriteMapRecord> {
    let mut sprites = Vec::new();
    for index in 0..offsets.sprite_max {
        let offset = offsets.sprite_table + index * SpriteMapRecord::STRIDE;
        let entity = match read_u16(rom, offset) {
            Ok(entity) => entity,
            Err(_) => break,
        };
        if entity == ID_SENTINEL {
            break;
        }
        match SpriteMapRecord::decode(rom, offset) {
            Ok(record) => sprites.push(record),
            Err(err) => {
                tracing::warn!(offset, error = %err, "skipping undecodable sprite mapping");
            }
        }
    }
    sprites
}

pub fn load_battle_strings(rom: &[u8], offsets: &RomOffsets) -> Vec<BattleStringRecord> {
    let mut strings = Vec::with_capacity(offsets.battle_string_count);
    for index in 0..offsets.battle_string_count {
        let offset = offsets.battle_string_table + index * BattleStringRecord::STRIDE;
        match BattleStringRecord::decode(rom, offset) {
            Ok(record) => strings.push(record),
            Err(err) => {
                tracing::warn!(offset, error = %err, "skipping undecodable battle string");
                break;
            }
        }
    }
    strings
}

pub fn load_farm_table(rom: &[u8], offsets: &RomOffsets) -> Vec<FarmTerrainRecord> {
    let mut plots = Vec::with_capacity(offsets.farm_count);
    for index in 0..offsets.farm_count {
        let offset = offsets.farm_table + index * FarmTerrainRecord::STRIDE;
        match FarmTerrainRecord::decode(rom, offset) {
            Ok(record) => plots.push(record),
            Err(err) => {
                tracing::warn!(offset, error = %err, "skipping undecodable farm plot");
            }
        }
    }
    plots
}

pub fn load_tables(rom: &[u8], offsets: &RomOffsets) -> Result<RomTables> {
    let fusions = load_fusion_table(rom, offsets);
    let mut original_fusion_conditions = BTreeMap::new();
    for fusion in &fusions {
        original_fusion_conditions
            .entry(fusion.result)
            .or_insert(fusion.conditions);
    }

    let tables = RomTables {
        version: offsets.version,
        base: load_base_table(rom, offsets),
        enemies: load_enemy_table(rom, offsets),
        moves: load_move_table(rom, offsets),
        evolutions: load_evolution_table(rom, offsets),
        fusions,
        original_fusion_conditions,
        sprites: load_sprite_table(rom, offsets),
        battle_strings: load_battle_strings(rom, offsets),
        farm_plots: load_farm_table(rom, offsets),
    };

    tracing::debug!(
        base = tables.base.len(),
        enemies = tables.enemies.len(),
        moves = tables.moves.len(),
        evolutions = tables.evolutions.len(),
        fusions = tables.fusions.len(),
        "tables loaded"
    );

    // Every loaded creature should fall inside a known stage range; a miss
    // is worth a trace but not an error.
    for id in tables.base.keys() {
        if stage_of(*id).is_none() {
            tracing::debug!(id, "creature id outside the stage catalog");
        }
    }

    Ok(tables)
}

//! Fixed-layout record models.
//!
//! Each record decodes once at construction, caches its fields, and writes
//! individual fields back to its original absolute offset on mutation. Field
//! offsets are record-type constants; nothing is recomputed from the buffer
//! after construction.

use crate::catalog::{Species, StatType};
use crate::rom::{read_u16, read_u32, read_u8, write_uint};
use crate::{RandomiserError, Result};

/// Terminator id for block-scanned and sentinel-terminated tables.
pub const ID_SENTINEL: u16 = 0xFFFF;
/// "No link" marker in evolution records.
pub const LINK_NONE: u32 = 0xFFFF_FFFF;
/// Bulk-setter element meaning "leave this field unchanged".
pub const KEEP: i32 = -1;

fn widen(value: i32, offset: usize) -> Result<u64> {
    if value < 0 {
        return Err(RandomiserError::Config(format!(
            "negative field value {value} at offset 0x{offset:06X}"
        )));
    }
    Ok(value as u64)
}

/// Per-creature record in the base table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseRecord {
    offset: usize,
    pub id: u16,
    pub level: u8,
    pub species: u8,
    /// hp, mp, atk, def, spirit, speed.
    pub stats: [u16; 6],
    pub aptitude: u8,
    pub exp_curve: u8,
    pub stat_type: u8,
    pub resistances: [u16; 8],
    pub traits: [u8; 4],
    pub support_trait: u8,
    pub signature_move: u16,
    pub moves: [u16; 4],
}

impl BaseRecord {
    pub const STRIDE: usize = 0x34;

    const OFF_ID: usize = 0x00;
    const OFF_LEVEL: usize = 0x02;
    const OFF_SPECIES: usize = 0x03;
    const OFF_STATS: usize = 0x04;
    const OFF_APTITUDE: usize = 0x10;
    const OFF_EXP_CURVE: usize = 0x11;
    const OFF_STAT_TYPE: usize = 0x12;
    const OFF_RESISTANCES: usize = 0x14;
    const OFF_TRAITS: usize = 0x24;
    const OFF_SUPPORT_TRAIT: usize = 0x28;
    const OFF_SIGNATURE_MOVE: usize = 0x2A;
    const OFF_MOVES: usize = 0x2C;

    pub fn decode(rom: &[u8], offset: usize) -> Result<BaseRecord> {
        let mut stats = [0u16; 6];
        for (i, slot) in stats.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_STATS + i * 2)?;
        }
        let mut resistances = [0u16; 8];
        for (i, slot) in resistances.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_RESISTANCES + i * 2)?;
        }
        let mut traits = [0u8; 4];
        for (i, slot) in traits.iter_mut().enumerate() {
            *slot = read_u8(rom, offset + Self::OFF_TRAITS + i)?;
        }
        let mut moves = [0u16; 4];
        for (i, slot) in moves.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_MOVES + i * 2)?;
        }

        Ok(BaseRecord {
            offset,
            id: read_u16(rom, offset + Self::OFF_ID)?,
            level: read_u8(rom, offset + Self::OFF_LEVEL)?,
            species: read_u8(rom, offset + Self::OFF_SPECIES)?,
            stats,
            aptitude: read_u8(rom, offset + Self::OFF_APTITUDE)?,
            exp_curve: read_u8(rom, offset + Self::OFF_EXP_CURVE)?,
            stat_type: read_u8(rom, offset + Self::OFF_STAT_TYPE)?,
            resistances,
            traits,
            support_trait: read_u8(rom, offset + Self::OFF_SUPPORT_TRAIT)?,
            signature_move: read_u16(rom, offset + Self::OFF_SIGNATURE_MOVE)?,
            moves,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn species_enum(&self) -> Species {
        Species::from_u8(self.species)
    }

    pub fn stat_type_enum(&self) -> StatType {
        StatType::from_u8(self.stat_type)
    }

    /// hp, mp, atk, def, spirit, speed, aptitude — always length 7.
    pub fn base_stats(&self) -> [u16; 7] {
        [
            self.stats[0],
            self.stats[1],
            self.stats[2],
            self.stats[3],
            self.stats[4],
            self.stats[5],
            self.aptitude as u16,
        ]
    }

    /// Bulk stat write. `values` must have length 7; elements equal to
    /// [`KEEP`] leave the corresponding field untouched.
    pub fn set_base_stats(&mut self, rom: &mut [u8], values: &[i32]) -> Result<()> {
        if values.len() != 7 {
            return Err(RandomiserError::Config(format!(
                "base-stat vector must have length 7, got {}",
                values.len()
            )));
        }
        for (i, value) in values[..6].iter().enumerate() {
            if *value == KEEP {
                continue;
            }
            let off = self.offset + Self::OFF_STATS + i * 2;
            write_uint(rom, off, 2, widen(*value, off)?)?;
            self.stats[i] = *value as u16;
        }
        if values[6] != KEEP {
            let off = self.offset + Self::OFF_APTITUDE;
            write_uint(rom, off, 1, widen(values[6], off)?)?;
            self.aptitude = values[6] as u8;
        }
        Ok(())
    }

    /// Bulk resistance write. `values` must have length 8; [`KEEP`] skips.
    pub fn set_resistances(&mut self, rom: &mut [u8], values: &[i32]) -> Result<()> {
        if values.len() != 8 {
            return Err(RandomiserError::Config(format!(
                "resistance vector must have length 8, got {}",
                values.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            if *value == KEEP {
                continue;
            }
            let off = self.offset + Self::OFF_RESISTANCES + i * 2;
            write_uint(rom, off, 2, widen(*value, off)?)?;
            self.resistances[i] = *value as u16;
        }
        Ok(())
    }

    pub fn set_species(&mut self, rom: &mut [u8], species: Species) -> Result<()> {
        self.species = species.as_u8();
        write_uint(rom, self.offset + Self::OFF_SPECIES, 1, self.species as u64)
    }

    pub fn set_stat_type(&mut self, rom: &mut [u8], stat_type: StatType) -> Result<()> {
        self.stat_type = stat_type.as_u8();
        write_uint(rom, self.offset + Self::OFF_STAT_TYPE, 1, self.stat_type as u64)
    }

    pub fn set_traits(&mut self, rom: &mut [u8], traits: [u8; 4]) -> Result<()> {
        for (i, value) in traits.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_TRAITS + i, 1, *value as u64)?;
        }
        self.traits = traits;
        Ok(())
    }

    pub fn set_support_trait(&mut self, rom: &mut [u8], value: u8) -> Result<()> {
        self.support_trait = value;
        write_uint(rom, self.offset + Self::OFF_SUPPORT_TRAIT, 1, value as u64)
    }

    pub fn set_signature_move(&mut self, rom: &mut [u8], value: u16) -> Result<()> {
        self.signature_move = value;
        write_uint(rom, self.offset + Self::OFF_SIGNATURE_MOVE, 2, value as u64)
    }

    pub fn set_moves(&mut self, rom: &mut [u8], moves: [u16; 4]) -> Result<()> {
        for (i, value) in moves.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_MOVES + i * 2, 2, *value as u64)?;
        }
        self.moves = moves;
        Ok(())
    }

    /// Re-encode every field at its original offset.
    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset + Self::OFF_ID, 2, self.id as u64)?;
        write_uint(rom, self.offset + Self::OFF_LEVEL, 1, self.level as u64)?;
        write_uint(rom, self.offset + Self::OFF_SPECIES, 1, self.species as u64)?;
        for (i, v) in self.stats.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_STATS + i * 2, 2, *v as u64)?;
        }
        write_uint(rom, self.offset + Self::OFF_APTITUDE, 1, self.aptitude as u64)?;
        write_uint(rom, self.offset + Self::OFF_EXP_CURVE, 1, self.exp_curve as u64)?;
        write_uint(rom, self.offset + Self::OFF_STAT_TYPE, 1, self.stat_type as u64)?;
        for (i, v) in self.resistances.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_RESISTANCES + i * 2, 2, *v as u64)?;
        }
        for (i, v) in self.traits.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_TRAITS + i, 1, *v as u64)?;
        }
        write_uint(rom, self.offset + Self::OFF_SUPPORT_TRAIT, 1, self.support_trait as u64)?;
        write_uint(rom, self.offset + Self::OFF_SIGNATURE_MOVE, 2, self.signature_move as u64)?;
        for (i, v) in self.moves.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_MOVES + i * 2, 2, *v as u64)?;
        }
        Ok(())
    }
}

/// Per-creature record in the enemy (wild/fixed battle) table. Lives at an
/// unrelated offset from the base record of the same id; trait slots are
/// 16-bit words here rather than bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnemyRecord {
    offset: usize,
    pub id: u16,
    pub level: u8,
    pub species: u8,
    /// hp, mp, atk, def, spirit, speed snapshot.
    pub stats: [u16; 6],
    pub resistances: [u16; 8],
    pub traits: [u16; 4],
    pub signature_move: u16,
    pub moves: [u16; 4],
    /// Per-element experience yields, indexed like resistances.
    pub exp_yields: [u16; 8],
}

impl EnemyRecord {
    pub const STRIDE: usize = 0x44;

    const OFF_ID: usize = 0x00;
    const OFF_LEVEL: usize = 0x02;
    const OFF_SPECIES: usize = 0x03;
    const OFF_STATS: usize = 0x04;
    const OFF_RESISTANCES: usize = 0x10;
    const OFF_TRAITS: usize = 0x20;
    const OFF_SIGNATURE_MOVE: usize = 0x28;
    const OFF_MOVES: usize = 0x2A;
    const OFF_EXP_YIELDS: usize = 0x34;

    pub fn decode(rom: &[u8], offset: usize) -> Result<EnemyRecord> {
        let mut stats = [0u16; 6];
        for (i, slot) in stats.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_STATS + i * 2)?;
        }
        let mut resistances = [0u16; 8];
        for (i, slot) in resistances.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_RESISTANCES + i * 2)?;
        }
        let mut traits = [0u16; 4];
        for (i, slot) in traits.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_TRAITS + i * 2)?;
        }
        let mut moves = [0u16; 4];
        for (i, slot) in moves.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_MOVES + i * 2)?;
        }
        let mut exp_yields = [0u16; 8];
        for (i, slot) in exp_yields.iter_mut().enumerate() {
            *slot = read_u16(rom, offset + Self::OFF_EXP_YIELDS + i * 2)?;
        }

        Ok(EnemyRecord {
            offset,
            id: read_u16(rom, offset + Self::OFF_ID)?,
            level: read_u8(rom, offset + Self::OFF_LEVEL)?,
            species: read_u8(rom, offset + Self::OFF_SPECIES)?,
            stats,
            resistances,
            traits,
            signature_move: read_u16(rom, offset + Self::OFF_SIGNATURE_MOVE)?,
            moves,
            exp_yields,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn hp(&self) -> u16 {
        self.stats[0]
    }

    pub fn set_hp(&mut self, rom: &mut [u8], value: u16) -> Result<()> {
        self.stats[0] = value;
        write_uint(rom, self.offset + Self::OFF_STATS, 2, value as u64)
    }

    pub fn set_level(&mut self, rom: &mut [u8], value: u8) -> Result<()> {
        self.level = value;
        write_uint(rom, self.offset + Self::OFF_LEVEL, 1, value as u64)
    }

    pub fn set_species(&mut self, rom: &mut [u8], species: Species) -> Result<()> {
        self.species = species.as_u8();
        write_uint(rom, self.offset + Self::OFF_SPECIES, 1, self.species as u64)
    }

    pub fn set_resistances(&mut self, rom: &mut [u8], values: &[i32]) -> Result<()> {
        if values.len() != 8 {
            return Err(RandomiserError::Config(format!(
                "resistance vector must have length 8, got {}",
                values.len()
            )));
        }
        for (i, value) in values.iter().enumerate() {
            if *value == KEEP {
                continue;
            }
            let off = self.offset + Self::OFF_RESISTANCES + i * 2;
            write_uint(rom, off, 2, widen(*value, off)?)?;
            self.resistances[i] = *value as u16;
        }
        Ok(())
    }

    /// Trait ids share the base record's byte-sized id space but are stored
    /// as words here.
    pub fn set_traits(&mut self, rom: &mut [u8], traits: [u8; 4]) -> Result<()> {
        for (i, value) in traits.iter().enumerate() {
            let word = *value as u16;
            write_uint(rom, self.offset + Self::OFF_TRAITS + i * 2, 2, word as u64)?;
            self.traits[i] = word;
        }
        Ok(())
    }

    pub fn set_signature_move(&mut self, rom: &mut [u8], value: u16) -> Result<()> {
        self.signature_move = value;
        write_uint(rom, self.offset + Self::OFF_SIGNATURE_MOVE, 2, value as u64)
    }

    pub fn set_moves(&mut self, rom: &mut [u8], moves: [u16; 4]) -> Result<()> {
        for (i, value) in moves.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_MOVES + i * 2, 2, *value as u64)?;
        }
        self.moves = moves;
        Ok(())
    }

    pub fn set_exp_yield(&mut self, rom: &mut [u8], index: usize, value: u16) -> Result<()> {
        self.exp_yields[index] = value;
        write_uint(rom, self.offset + Self::OFF_EXP_YIELDS + index * 2, 2, value as u64)
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset + Self::OFF_ID, 2, self.id as u64)?;
        write_uint(rom, self.offset + Self::OFF_LEVEL, 1, self.level as u64)?;
        write_uint(rom, self.offset + Self::OFF_SPECIES, 1, self.species as u64)?;
        for (i, v) in self.stats.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_STATS + i * 2, 2, *v as u64)?;
        }
        for (i, v) in self.resistances.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_RESISTANCES + i * 2, 2, *v as u64)?;
        }
        for (i, v) in self.traits.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_TRAITS + i * 2, 2, *v as u64)?;
        }
        write_uint(rom, self.offset + Self::OFF_SIGNATURE_MOVE, 2, self.signature_move as u64)?;
        for (i, v) in self.moves.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_MOVES + i * 2, 2, *v as u64)?;
        }
        for (i, v) in self.exp_yields.iter().enumerate() {
            write_uint(rom, self.offset + Self::OFF_EXP_YIELDS + i * 2, 2, *v as u64)?;
        }
        Ok(())
    }
}

/// Mutable view over the base/enemy record pair of one creature. The two
/// live at unrelated offsets; every shared-field write goes through here so
/// they can never drift apart.
pub struct PairMut<'a> {
    pub base: &'a mut BaseRecord,
    pub enemy: Option<&'a mut EnemyRecord>,
}

impl PairMut<'_> {
    pub fn set_species(&mut self, rom: &mut [u8], species: Species) -> Result<()> {
        self.base.set_species(rom, species)?;
        if let Some(enemy) = self.enemy.as_deref_mut() {
            enemy.set_species(rom, species)?;
        }
        Ok(())
    }

    pub fn set_resistances(&mut self, rom: &mut [u8], values: &[i32]) -> Result<()> {
        self.base.set_resistances(rom, values)?;
        if let Some(enemy) = self.enemy.as_deref_mut() {
            enemy.set_resistances(rom, values)?;
        }
        Ok(())
    }

    pub fn set_traits(&mut self, rom: &mut [u8], traits: [u8; 4]) -> Result<()> {
        self.base.set_traits(rom, traits)?;
        if let Some(enemy) = self.enemy.as_deref_mut() {
            enemy.set_traits(rom, traits)?;
        }
        Ok(())
    }

    pub fn set_moves(&mut self, rom: &mut [u8], signature: u16, moves: [u16; 4]) -> Result<()> {
        self.base.set_signature_move(rom, signature)?;
        self.base.set_moves(rom, moves)?;
        if let Some(enemy) = self.enemy.as_deref_mut() {
            enemy.set_signature_move(rom, signature)?;
            enemy.set_moves(rom, moves)?;
        }
        Ok(())
    }
}

/// One entry in the move table. Read-only during randomization: passes
/// select existing moves, never invent new ones. The single exception is
/// the guarantee-basic rewrite, which retunes one fixed move globally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    offset: usize,
    pub element: u8,
    pub mp_cost: u8,
    pub power: u16,
    pub level: u8,
    pub effect: u8,
    pub accuracy: u16,
}

impl MoveRecord {
    pub const STRIDE: usize = 0x10;

    const OFF_ELEMENT: usize = 0x00;
    const OFF_MP_COST: usize = 0x01;
    const OFF_POWER: usize = 0x02;
    const OFF_LEVEL: usize = 0x04;
    const OFF_EFFECT: usize = 0x05;
    const OFF_ACCURACY: usize = 0x06;

    pub fn decode(rom: &[u8], offset: usize) -> Result<MoveRecord> {
        Ok(MoveRecord {
            offset,
            element: read_u8(rom, offset + Self::OFF_ELEMENT)?,
            mp_cost: read_u8(rom, offset + Self::OFF_MP_COST)?,
            power: read_u16(rom, offset + Self::OFF_POWER)?,
            level: read_u8(rom, offset + Self::OFF_LEVEL)?,
            effect: read_u8(rom, offset + Self::OFF_EFFECT)?,
            accuracy: read_u16(rom, offset + Self::OFF_ACCURACY)?,
        })
    }

    pub fn set_power(&mut self, rom: &mut [u8], value: u16) -> Result<()> {
        self.power = value;
        write_uint(rom, self.offset + Self::OFF_POWER, 2, value as u64)
    }

    pub fn set_mp_cost(&mut self, rom: &mut [u8], value: u8) -> Result<()> {
        self.mp_cost = value;
        write_uint(rom, self.offset + Self::OFF_MP_COST, 1, value as u64)
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset + Self::OFF_ELEMENT, 1, self.element as u64)?;
        write_uint(rom, self.offset + Self::OFF_MP_COST, 1, self.mp_cost as u64)?;
        write_uint(rom, self.offset + Self::OFF_POWER, 2, self.power as u64)?;
        write_uint(rom, self.offset + Self::OFF_LEVEL, 1, self.level as u64)?;
        write_uint(rom, self.offset + Self::OFF_EFFECT, 1, self.effect as u64)?;
        write_uint(rom, self.offset + Self::OFF_ACCURACY, 2, self.accuracy as u64)
    }
}

/// A promotion link plus its condition triple.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvoLink {
    pub target: u32,
    pub conditions: [(u32, u32); 3],
}

impl EvoLink {
    pub const NONE: EvoLink = EvoLink {
        target: LINK_NONE,
        conditions: [(0, 0); 3],
    };
}

/// Standard evolution block: one de-evolution link and up to three
/// promotion links with three condition pairs each. Indexed directly by
/// entity id, not block-scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvolutionRecord {
    offset: usize,
    pub id: u16,
    pub de_evolution: u32,
    pub links: [EvoLink; 3],
}

impl EvolutionRecord {
    pub const STRIDE: usize = 0x58;

    const OFF_DE_EVOLUTION: usize = 0x00;
    const OFF_LINKS: usize = 0x04;
    const LINK_SIZE: usize = 0x1C;

    fn link_offset(&self, slot: usize) -> usize {
        self.offset + Self::OFF_LINKS + slot * Self::LINK_SIZE
    }

    fn condition_offset(&self, slot: usize, pair: usize) -> usize {
        self.link_offset(slot) + 4 + pair * 8
    }

    pub fn decode(rom: &[u8], offset: usize, id: u16) -> Result<EvolutionRecord> {
        let mut record = EvolutionRecord {
            offset,
            id,
            de_evolution: read_u32(rom, offset + Self::OFF_DE_EVOLUTION)?,
            links: [EvoLink::NONE; 3],
        };
        for slot in 0..3 {
            let target = read_u32(rom, record.link_offset(slot))?;
            let mut conditions = [(0u32, 0u32); 3];
            for (pair, cond) in conditions.iter_mut().enumerate() {
                let base = record.condition_offset(slot, pair);
                *cond = (read_u32(rom, base)?, read_u32(rom, base + 4)?);
            }
            record.links[slot] = EvoLink { target, conditions };
        }
        Ok(record)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_de_evolution(&mut self, rom: &mut [u8], target: u32) -> Result<()> {
        self.de_evolution = target;
        write_uint(rom, self.offset + Self::OFF_DE_EVOLUTION, 4, target as u64)
    }

    pub fn set_link_target(&mut self, rom: &mut [u8], slot: usize, target: u32) -> Result<()> {
        self.links[slot].target = target;
        write_uint(rom, self.link_offset(slot), 4, target as u64)
    }

    pub fn set_link_conditions(
        &mut self,
        rom: &mut [u8],
        slot: usize,
        conditions: [(u32, u32); 3],
    ) -> Result<()> {
        for (pair, (cond, value)) in conditions.iter().enumerate() {
            let base = self.condition_offset(slot, pair);
            write_uint(rom, base, 4, *cond as u64)?;
            write_uint(rom, base + 4, 4, *value as u64)?;
        }
        self.links[slot].conditions = conditions;
        Ok(())
    }

    pub fn clear_link(&mut self, rom: &mut [u8], slot: usize) -> Result<()> {
        self.set_link_target(rom, slot, LINK_NONE)?;
        self.set_link_conditions(rom, slot, [(0, 0); 3])
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset + Self::OFF_DE_EVOLUTION, 4, self.de_evolution as u64)?;
        for slot in 0..3 {
            write_uint(rom, self.link_offset(slot), 4, self.links[slot].target as u64)?;
            for (pair, (cond, value)) in self.links[slot].conditions.iter().enumerate() {
                let base = self.condition_offset(slot, pair);
                write_uint(rom, base, 4, *cond as u64)?;
                write_uint(rom, base + 4, 4, *value as u64)?;
            }
        }
        Ok(())
    }
}

/// Dual-fusion (DNA) evolution record: two input creatures, one result,
/// three condition pairs. Stored as a flat sentinel-terminated array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusionRecord {
    offset: usize,
    pub input_a: u16,
    pub input_b: u16,
    pub result: u16,
    pub conditions: [(u32, u32); 3],
}

impl FusionRecord {
    pub const STRIDE: usize = 0x20;

    const OFF_INPUT_A: usize = 0x00;
    const OFF_INPUT_B: usize = 0x02;
    const OFF_RESULT: usize = 0x04;
    const OFF_CONDITIONS: usize = 0x08;

    pub fn decode(rom: &[u8], offset: usize) -> Result<FusionRecord> {
        let mut conditions = [(0u32, 0u32); 3];
        for (pair, cond) in conditions.iter_mut().enumerate() {
            let base = offset + Self::OFF_CONDITIONS + pair * 8;
            *cond = (read_u32(rom, base)?, read_u32(rom, base + 4)?);
        }
        Ok(FusionRecord {
            offset,
            input_a: read_u16(rom, offset + Self::OFF_INPUT_A)?,
            input_b: read_u16(rom, offset + Self::OFF_INPUT_B)?,
            result: read_u16(rom, offset + Self::OFF_RESULT)?,
            conditions,
        })
    }

    pub fn set_inputs(&mut self, rom: &mut [u8], a: u16, b: u16) -> Result<()> {
        self.input_a = a;
        self.input_b = b;
        write_uint(rom, self.offset + Self::OFF_INPUT_A, 2, a as u64)?;
        write_uint(rom, self.offset + Self::OFF_INPUT_B, 2, b as u64)
    }

    pub fn set_result(&mut self, rom: &mut [u8], result: u16) -> Result<()> {
        self.result = result;
        write_uint(rom, self.offset + Self::OFF_RESULT, 2, result as u64)
    }

    pub fn set_conditions(&mut self, rom: &mut [u8], conditions: [(u32, u32); 3]) -> Result<()> {
        for (pair, (cond, value)) in conditions.iter().enumerate() {
            let base = self.offset + Self::OFF_CONDITIONS + pair * 8;
            write_uint(rom, base, 4, *cond as u64)?;
            write_uint(rom, base + 4, 4, *value as u64)?;
        }
        self.conditions = conditions;
        Ok(())
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset + Self::OFF_INPUT_A, 2, self.input_a as u64)?;
        write_uint(rom, self.offset + Self::OFF_INPUT_B, 2, self.input_b as u64)?;
        write_uint(rom, self.offset + Self::OFF_RESULT, 2, self.result as u64)?;
        for (pair, (cond, value)) in self.conditions.iter().enumerate() {
            let base = self.offset + Self::OFF_CONDITIONS + pair * 8;
            write_uint(rom, base, 4, *cond as u64)?;
            write_uint(rom, base + 4, 4, *value as u64)?;
        }
        Ok(())
    }
}

/// One farm island plot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FarmTerrainRecord {
    offset: usize,
    pub terrain: u8,
    pub size: u8,
    pub cost: u16,
    pub unlock_flag: u32,
}

impl FarmTerrainRecord {
    pub const STRIDE: usize = 0x08;

    pub fn decode(rom: &[u8], offset: usize) -> Result<FarmTerrainRecord> {
        Ok(FarmTerrainRecord {
            offset,
            terrain: read_u8(rom, offset)?,
            size: read_u8(rom, offset + 1)?,
            cost: read_u16(rom, offset + 2)?,
            unlock_flag: read_u32(rom, offset + 4)?,
        })
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset, 1, self.terrain as u64)?;
        write_uint(rom, self.offset + 1, 1, self.size as u64)?;
        write_uint(rom, self.offset + 2, 2, self.cost as u64)?;
        write_uint(rom, self.offset + 4, 4, self.unlock_flag as u64)
    }
}

/// Entity-id to overworld sprite/palette mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteMapRecord {
    offset: usize,
    pub entity: u16,
    pub sprite: u16,
    pub palette: u16,
}

impl SpriteMapRecord {
    pub const STRIDE: usize = 0x08;

    pub fn decode(rom: &[u8], offset: usize) -> Result<SpriteMapRecord> {
        Ok(SpriteMapRecord {
            offset,
            entity: read_u16(rom, offset)?,
            sprite: read_u16(rom, offset + 2)?,
            palette: read_u16(rom, offset + 4)?,
        })
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        write_uint(rom, self.offset, 2, self.entity as u64)?;
        write_uint(rom, self.offset + 2, 2, self.sprite as u64)?;
        write_uint(rom, self.offset + 4, 2, self.palette as u64)
    }
}

/// Fixed-width NUL-padded display name, indexed by entity id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleStringRecord {
    offset: usize,
    pub bytes: [u8; Self::STRIDE],
}

impl BattleStringRecord {
    pub const STRIDE: usize = 0x20;

    pub fn decode(rom: &[u8], offset: usize) -> Result<BattleStringRecord> {
        if offset + Self::STRIDE > rom.len() {
            return Err(RandomiserError::Decode {
                offset,
                reason: "battle string past end of image".to_string(),
            });
        }
        let mut bytes = [0u8; Self::STRIDE];
        bytes.copy_from_slice(&rom[offset..offset + Self::STRIDE]);
        Ok(BattleStringRecord { offset, bytes })
    }

    pub fn text(&self) -> String {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[..end]).trim_end().to_string()
    }

    pub fn write_all(&self, rom: &mut [u8]) -> Result<()> {
        if self.offset + Self::STRIDE > rom.len() {
            return Err(RandomiserError::Decode {
                offset: self.offset,
                reason: "battle string past end of image".to_string(),
            });
        }
        rom[self.offset..self.offset + Self::STRIDE].copy_from_slice(&self.bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_base_bytes() -> Vec<u8> {
        let mut rom = vec![0u8; BaseRecord::STRIDE];
        rom[0] = 0x23; // id 0x0023
        rom[2] = 7; // level
        rom[3] = 2; // species = Bird
        rom[4] = 0x64; // hp = 100
        rom[0x10] = 30; // aptitude
        rom[0x24] = 5; // trait slot 0
        rom[0x25] = 0xFF;
        rom
    }

    #[test]
    fn decode_reads_expected_fields() {
        let rom = sample_base_bytes();
        let rec = BaseRecord::decode(&rom, 0).unwrap();
        assert_eq!(rec.id, 0x23);
        assert_eq!(rec.level, 7);
        assert_eq!(rec.species_enum(), Species::Bird);
        assert_eq!(rec.stats[0], 100);
        assert_eq!(rec.aptitude, 30);
        assert_eq!(rec.traits, [5, 0xFF, 0, 0]);
    }

    #[test]
    fn unmutated_write_all_is_identity() {
        let rom = sample_base_bytes();
        let rec = BaseRecord::decode(&rom, 0).unwrap();
        let mut out = rom.clone();
        rec.write_all(&mut out).unwrap();
        assert_eq!(out, rom);
    }

    #[test]
    fn bulk_setter_rejects_wrong_length() {
        let mut rom = sample_base_bytes();
        let mut rec = BaseRecord::decode(&rom, 0).unwrap();
        assert!(rec.set_base_stats(&mut rom, &[1, 2, 3]).is_err());
        assert!(rec.set_resistances(&mut rom, &[0; 7]).is_err());
    }

    #[test]
    fn bulk_setter_keep_sentinel_skips_field() {
        let mut rom = sample_base_bytes();
        let mut rec = BaseRecord::decode(&rom, 0).unwrap();
        rec.set_base_stats(&mut rom, &[KEEP, 55, KEEP, KEEP, KEEP, KEEP, KEEP])
            .unwrap();
        assert_eq!(rec.stats[0], 100); // untouched
        assert_eq!(rec.stats[1], 55);
        assert_eq!(rec.aptitude, 30); // untouched
        let reread = BaseRecord::decode(&rom, 0).unwrap();
        assert_eq!(reread, rec);
    }

    #[test]
    fn pair_keeps_enemy_in_sync() {
        let mut rom = vec![0u8; BaseRecord::STRIDE + EnemyRecord::STRIDE];
        let mut base = BaseRecord::decode(&rom, 0).unwrap();
        let mut enemy = EnemyRecord::decode(&rom, BaseRecord::STRIDE).unwrap();
        let mut pair = PairMut {
            base: &mut base,
            enemy: Some(&mut enemy),
        };
        pair.set_species(&mut rom, Species::Aquan).unwrap();
        pair.set_traits(&mut rom, [1, 2, 3, 4]).unwrap();

        let base2 = BaseRecord::decode(&rom, 0).unwrap();
        let enemy2 = EnemyRecord::decode(&rom, BaseRecord::STRIDE).unwrap();
        assert_eq!(base2.species, enemy2.species);
        assert_eq!(base2.traits, [1, 2, 3, 4]);
        assert_eq!(enemy2.traits, [1, 2, 3, 4]);
    }

    #[test]
    fn evolution_link_layout_roundtrips() {
        let mut rom = vec![0u8; EvolutionRecord::STRIDE];
        let mut rec = EvolutionRecord::decode(&rom, 0, 0x11).unwrap();
        rec.set_de_evolution(&mut rom, 0x05).unwrap();
        rec.set_link_target(&mut rom, 1, 0x61).unwrap();
        rec.set_link_conditions(&mut rom, 1, [(1, 20), (9, 40), (0, 0)]).unwrap();

        let reread = EvolutionRecord::decode(&rom, 0, 0x11).unwrap();
        assert_eq!(reread.de_evolution, 0x05);
        assert_eq!(reread.links[1].target, 0x61);
        assert_eq!(reread.links[1].conditions, [(1, 20), (9, 40), (0, 0)]);
        assert_eq!(reread.links[0], EvoLink { target: 0, conditions: [(0, 0); 3] });
    }
}

//! Starter-pack randomization. Runs after the evolution pass: the
//! rookie-line filter walks the freshly randomized pre-evolution links, and
//! the starting level is clamped to the replacement's aptitude.

use rand::rngs::StdRng;
use rand::Rng;

use crate::catalog::{stage_of, Stage, STAGES};
use crate::pools::Pool;
use crate::records::{ID_SENTINEL, LINK_NONE};
use crate::rom::{read_u16, read_u8, write_uint, RomOffsets};
use crate::tables::RomTables;
use crate::{ChangeLog, Result, StarterMode, StarterSettings};

pub const STARTER_PACKS: usize = 4;
pub const STARTERS_PER_PACK: usize = 3;
const STARTER_SLOT_STRIDE: usize = 4;

pub(crate) fn randomize_starters(
    rom: &mut [u8],
    tables: &mut RomTables,
    offsets: &RomOffsets,
    rng: &mut StdRng,
    cfg: &StarterSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == StarterMode::Unchanged {
        return Ok(());
    }
    log.section("starters");

    let mut stage_pools: Vec<Pool> = STAGES
        .iter()
        .map(|stage| Pool::for_stage(*stage, tables.base.keys()))
        .collect();
    let mut global_pool = Pool::new(tables.base.keys().copied().collect());

    for pack in 0..STARTER_PACKS {
        for slot in 0..STARTERS_PER_PACK {
            let slot_offset =
                offsets.starter_table + (pack * STARTERS_PER_PACK + slot) * STARTER_SLOT_STRIDE;
            let original = read_u16(rom, slot_offset)?;
            if original == 0 || original == ID_SENTINEL {
                continue;
            }
            let original_level = read_u8(rom, slot_offset + 2)?;

            let filter = |id: u16| !cfg.require_rookie_line || has_rookie_ancestry(tables, id);
            let replacement = match cfg.mode {
                StarterMode::Unchanged => unreachable!(),
                StarterMode::SameStage => {
                    // Unrecognized originals fall back to a random pick
                    // among the three mainline stages.
                    let stage = stage_of(original).unwrap_or_else(|| {
                        let fallback = [Stage::Rookie, Stage::Champion, Stage::Ultimate];
                        fallback[rng.gen_range(0..fallback.len())]
                    });
                    stage_pools[stage.index()].take_random_where(rng, filter)
                }
                StarterMode::Random => global_pool.take_random_where(rng, filter),
            };
            // Exhausted or fully filtered pool: the pack keeps this slot.
            let Some(replacement) = replacement else {
                log.push(format!("pack {pack} slot {slot}: no candidate, kept"));
                continue;
            };

            write_uint(rom, slot_offset, 2, replacement as u64)?;

            let aptitude = tables
                .base
                .get(&replacement)
                .map(|base| base.aptitude)
                .unwrap_or(u8::MAX);
            let level = original_level.min(aptitude);
            if level != original_level {
                write_uint(rom, slot_offset + 2, 1, level as u64)?;
            }

            log.push(format!(
                "pack {pack} slot {slot}: {} -> {} (lv {level})",
                tables.creature_name(original),
                tables.creature_name(replacement)
            ));
        }
    }
    Ok(())
}

/// Walk pre-evolution links upward; a starter candidate must descend from
/// an In-Training or Rookie creature. The graph is stage-layered, so the
/// walk is bounded.
fn has_rookie_ancestry(tables: &RomTables, mut id: u16) -> bool {
    for _ in 0..STAGES.len() + 1 {
        match stage_of(id) {
            Some(stage) if stage <= Stage::Rookie => return true,
            Some(_) => {}
            None => return false,
        }
        let de_evolution = match tables.evolutions.get(&id) {
            Some(record) => record.de_evolution,
            None => return false,
        };
        if de_evolution == LINK_NONE {
            return false;
        }
        id = de_evolution as u16;
    }
    false
}

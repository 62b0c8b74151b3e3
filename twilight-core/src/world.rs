//! Fixed-offset patches and overworld table passes: the rookie-reset event
//! patch, wild encounter randomization, the boss nerf, item spawn
//! randomization and the flat experience-yield patch.

use rand::rngs::StdRng;
use rand::Rng;

use crate::catalog::{stage_base_exp, stage_of};
use crate::pools::Pool;
use crate::records::ID_SENTINEL;
use crate::rom::{read_u16, read_u8, write_uint, RomOffsets};
use crate::tables::RomTables;
use crate::{ChangeLog, EncounterMode, FlatExpMode, ItemMode, Result, RookieResetMode};

// ARM patches for the rookie-reset event handler. Disabling returns from
// the handler immediately; keeping evolutions NOPs out the de-level call
// two instructions in.
const ARM_BX_LR: u32 = 0xE12F_FF1E;
const ARM_NOP: u32 = 0xE320_F000;
const KEEP_EVOLUTION_PATCH_OFFSET: usize = 0x08;

pub(crate) fn patch_rookie_reset(
    rom: &mut [u8],
    offsets: &RomOffsets,
    mode: RookieResetMode,
    log: &mut ChangeLog,
) -> Result<()> {
    if mode == RookieResetMode::Unchanged {
        return Ok(());
    }
    log.section("rookie reset");

    match mode {
        RookieResetMode::Unchanged => unreachable!(),
        RookieResetMode::KeepEvolution => {
            write_uint(
                rom,
                offsets.rookie_reset_offset + KEEP_EVOLUTION_PATCH_OFFSET,
                4,
                ARM_NOP as u64,
            )?;
            log.push("reset keeps evolution progress".to_string());
        }
        RookieResetMode::Disable => {
            write_uint(rom, offsets.rookie_reset_offset, 4, ARM_BX_LR as u64)?;
            log.push("reset event disabled".to_string());
        }
    }
    Ok(())
}

const ENCOUNTER_AREA_STRIDE: usize = 0x20;
const ENCOUNTER_SLOT_STRIDE: usize = 4;
const ENCOUNTER_SLOTS_PER_AREA: usize = 8;

pub(crate) fn randomize_encounters(
    rom: &mut [u8],
    tables: &mut RomTables,
    offsets: &RomOffsets,
    rng: &mut StdRng,
    mode: EncounterMode,
    log: &mut ChangeLog,
) -> Result<()> {
    if mode == EncounterMode::Unchanged {
        return Ok(());
    }
    log.section("wild encounters");

    // One pool per stage for the whole pass, plus a global pool for the
    // fully-random mode; both are consumed without replacement.
    let mut stage_pools: Vec<Pool> = crate::catalog::STAGES
        .iter()
        .map(|stage| Pool::for_stage(*stage, tables.enemies.keys()))
        .collect();
    let mut global_pool = Pool::new(tables.enemies.keys().copied().collect());

    for area in 0..offsets.encounter_area_count {
        let area_base = offsets.encounter_table + area * ENCOUNTER_AREA_STRIDE;
        for slot in 0..ENCOUNTER_SLOTS_PER_AREA {
            let slot_offset = area_base + slot * ENCOUNTER_SLOT_STRIDE;
            let original = read_u16(rom, slot_offset)?;
            if original == 0 || original == ID_SENTINEL {
                continue;
            }
            let level = read_u8(rom, slot_offset + 2)?;

            let replacement = match mode {
                EncounterMode::Unchanged => unreachable!(),
                EncounterMode::SameStage => match stage_of(original) {
                    Some(stage) => stage_pools[stage.index()].take_random(rng),
                    None => None,
                },
                EncounterMode::Random => global_pool.take_random(rng),
            };
            // Exhausted pool or unstaged original: the slot stays vanilla.
            let Some(replacement) = replacement else {
                continue;
            };

            write_uint(rom, slot_offset, 2, replacement as u64)?;
            // The slot's level follows the encounter, not the creature; the
            // enemy record snapshot must agree before the exp patch runs.
            if let Some(enemy) = tables.enemies.get_mut(&replacement) {
                enemy.set_level(rom, level)?;
            }

            log.push(format!(
                "area {area:02} slot {slot}: {} -> {} (lv {level})",
                tables.creature_name(original),
                tables.creature_name(replacement)
            ));
        }
    }
    Ok(())
}

pub(crate) fn nerf_boss(
    rom: &mut [u8],
    tables: &mut RomTables,
    offsets: &RomOffsets,
    enabled: bool,
    log: &mut ChangeLog,
) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    log.section("boss nerf");

    let name = tables.creature_name(offsets.boss_enemy_id);
    let Some(enemy) = tables.enemies.get_mut(&offsets.boss_enemy_id) else {
        log.push(format!("boss {name} not present, skipped"));
        return Ok(());
    };
    let old = enemy.hp();
    let new = (old / 2).max(1);
    enemy.set_hp(rom, new)?;
    log.push(format!("{name}: hp {old} -> {new}"));
    Ok(())
}

const ITEM_SPAWN_STRIDE: usize = 4;

pub(crate) fn randomize_items(
    rom: &mut [u8],
    offsets: &RomOffsets,
    rng: &mut StdRng,
    mode: ItemMode,
    log: &mut ChangeLog,
) -> Result<()> {
    if mode == ItemMode::Unchanged {
        return Ok(());
    }
    log.section("overworld items");

    // Collect the vanilla spawn ids first, then redraw every spawn from
    // that pool; nothing outside the vanilla item set ever appears.
    let mut pool: Vec<u16> = Vec::new();
    for index in 0..offsets.item_count {
        let offset = offsets.item_table + index * ITEM_SPAWN_STRIDE;
        let item = read_u16(rom, offset)?;
        if item != 0 && item != ID_SENTINEL {
            pool.push(item);
        }
    }
    if pool.is_empty() {
        return Ok(());
    }

    for index in 0..offsets.item_count {
        let offset = offsets.item_table + index * ITEM_SPAWN_STRIDE;
        let original = read_u16(rom, offset)?;
        if original == 0 || original == ID_SENTINEL {
            continue;
        }
        let replacement = pool[rng.gen_range(0..pool.len())];
        write_uint(rom, offset, 2, replacement as u64)?;
        log.push(format!(
            "spawn {index:02}: {original:#06X} -> {replacement:#06X}"
        ));
    }
    Ok(())
}

/// Rewrite every originally non-zero exp-yield category of every enemy to
/// `round(stage_base_exp * level / denominator)`. Which elements "count"
/// for a species is preserved by leaving zero categories alone. Must run
/// last: it reads the final post-randomization enemy levels.
pub(crate) fn patch_flat_exp(
    rom: &mut [u8],
    tables: &mut RomTables,
    mode: FlatExpMode,
    log: &mut ChangeLog,
) -> Result<()> {
    let denominator: u32 = match mode {
        FlatExpMode::Unchanged => return Ok(()),
        FlatExpMode::Moderate => 14,
        FlatExpMode::Aggressive => 7,
    };
    log.section("flat exp");

    let ids: Vec<u16> = tables.enemies.keys().copied().collect();
    for id in ids {
        let Some(stage) = stage_of(id) else {
            continue;
        };
        let name = tables.creature_name(id);
        let Some(enemy) = tables.enemies.get_mut(&id) else {
            continue;
        };

        let base_exp = stage_base_exp(stage);
        let level = enemy.level as u32;
        let value = ((base_exp * level) as f64 / denominator as f64).round() as u32;
        let value = value.min(u16::MAX as u32) as u16;

        let mut touched = false;
        for index in 0..8 {
            if enemy.exp_yields[index] == 0 {
                continue;
            }
            enemy.set_exp_yield(rom, index, value)?;
            touched = true;
        }
        if touched {
            log.push(format!("{name}: exp {value} (lv {})", level));
        }
    }
    Ok(())
}

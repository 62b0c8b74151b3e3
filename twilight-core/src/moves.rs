//! Moveset randomization.
//!
//! Candidates come from the version's regular move-id range (optionally
//! merged with the signature range); per-slot level/power band filters are
//! relative to the move originally in that slot and degrade to no-filter
//! when that move id falls outside the table. Moves matching the creature's
//! affinity element share the configured aggregate probability mass.

use rand::rngs::StdRng;
use rand::Rng;

use crate::catalog::{Element, BASIC_MOVE_ID, BASIC_MOVE_MP_COST, BASIC_MOVE_POWER};
use crate::pools::{aggregate_mass_weights, pick_weighted};
use crate::rom::RomOffsets;
use crate::tables::RomTables;
use crate::{ChangeLog, MovesetMode, MovesetSettings, Result};

pub(crate) fn randomize_movesets(
    rom: &mut [u8],
    tables: &mut RomTables,
    offsets: &RomOffsets,
    rng: &mut StdRng,
    cfg: &MovesetSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == MovesetMode::Unchanged {
        return Ok(());
    }
    log.section("movesets");

    let move_count = tables.moves.len() as u16;
    let clamp_range = |range: (u16, u16)| -> Vec<u16> {
        (range.0..=range.1).filter(|id| *id < move_count).collect()
    };

    let regular_ids = clamp_range(offsets.regular_move_range);
    let signature_ids = clamp_range(offsets.signature_move_range);

    let mut base_pool = regular_ids.clone();
    if cfg.include_signature_moves {
        base_pool.extend_from_slice(&signature_ids);
    }
    if base_pool.is_empty() || signature_ids.is_empty() {
        log.push("move table too small, pass skipped".to_string());
        return Ok(());
    }

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let affinity = tables
            .base
            .get(&id)
            .map(|b| b.species_enum().affinity())
            .unwrap_or(None);
        let (original_moves, original_signature) = match tables.base.get(&id) {
            Some(base) => (base.moves, base.signature_move),
            None => continue,
        };

        let mut pool = base_pool.clone();
        let mut chosen = original_moves;

        for slot in 0..4 {
            match draw_move(
                tables, rng, cfg, &mut pool, original_moves[slot], affinity,
            ) {
                Some(move_id) => chosen[slot] = move_id,
                // Pool exhausted: keep the original move in this slot.
                None => continue,
            }
        }

        // Signature move comes from its dedicated range and must not repeat
        // one of the regular picks.
        let mut sig_pool: Vec<u16> = signature_ids
            .iter()
            .copied()
            .filter(|id| !chosen.contains(id))
            .collect();
        let signature =
            match draw_move(tables, rng, cfg, &mut sig_pool, original_signature, affinity) {
                Some(move_id) => move_id,
                None => original_signature,
            };

        let Some(mut pair) = tables.pair_mut(id) else {
            continue;
        };
        pair.set_moves(rom, signature, chosen)?;
        log.push(format!(
            "{name}: sig {signature:#05X}, moves {:#05X} {:#05X} {:#05X} {:#05X}",
            chosen[0], chosen[1], chosen[2], chosen[3]
        ));
    }

    if cfg.guarantee_basic_move {
        guarantee_basic_move(rom, tables, log)?;
    }
    Ok(())
}

/// Draw one move without replacement, honouring band filters and the
/// affinity bias. `None` means the pool has nothing left to offer.
fn draw_move(
    tables: &RomTables,
    rng: &mut StdRng,
    cfg: &MovesetSettings,
    pool: &mut Vec<u16>,
    original: u16,
    affinity: Option<Element>,
) -> Option<u16> {
    if pool.is_empty() {
        return None;
    }

    // Band filters are anchored on the original move; an out-of-bounds
    // original id degrades both to no-filter.
    let anchor = tables.moves.get(original as usize);
    let mut candidates: Vec<u16> = match anchor {
        Some(anchor) => pool
            .iter()
            .copied()
            .filter(|id| {
                let candidate = &tables.moves[*id as usize];
                let level_ok = match cfg.level_band {
                    Some(band) => candidate.level.abs_diff(anchor.level) <= band,
                    None => true,
                };
                let power_ok = match cfg.power_band {
                    Some(band) => candidate.power.abs_diff(anchor.power) <= band,
                    None => true,
                };
                level_ok && power_ok
            })
            .collect(),
        None => Vec::new(),
    };
    if candidates.is_empty() {
        candidates = pool.clone();
    }

    let weights = aggregate_mass_weights(&candidates, cfg.species_bias, |id| match affinity {
        Some(element) => tables.moves[id as usize].element == element.index() as u8,
        None => false,
    });
    let picked = candidates[pick_weighted(rng, &weights)?];

    let position = pool.iter().position(|id| *id == picked)?;
    pool.swap_remove(position);
    Some(picked)
}

/// Force slot 1 to the baseline move for every creature that lacks it
/// anywhere in its moveset, retuning the move itself once globally.
fn guarantee_basic_move(
    rom: &mut [u8],
    tables: &mut RomTables,
    log: &mut ChangeLog,
) -> Result<()> {
    if let Some(basic) = tables.moves.get_mut(BASIC_MOVE_ID as usize) {
        basic.set_power(rom, BASIC_MOVE_POWER)?;
        basic.set_mp_cost(rom, BASIC_MOVE_MP_COST)?;
    }

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let Some(mut pair) = tables.pair_mut(id) else {
            continue;
        };
        let has_basic = pair.base.signature_move == BASIC_MOVE_ID
            || pair.base.moves.contains(&BASIC_MOVE_ID);
        if has_basic {
            continue;
        }
        let mut moves = pair.base.moves;
        moves[0] = BASIC_MOVE_ID;
        let signature = pair.base.signature_move;
        pair.set_moves(rom, signature, moves)?;
        log.push(format!("{name}: slot 1 forced to basic move"));
    }
    Ok(())
}

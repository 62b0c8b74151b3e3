//! Trait randomization.
//!
//! Regular trait slots draw without replacement from a per-creature copy of
//! the stage pool (or the global pool); a slot that was empty stays empty
//! unless force-four is on. The single support trait draws with replacement
//! since only one exists per creature.

use rand::rngs::StdRng;
use rand::Rng;

use crate::catalog::{
    global_regular_trait_pool, global_support_trait_pool, regular_trait_pool, stage_of,
    support_trait_pool, TRAIT_UNSET,
};
use crate::tables::RomTables;
use crate::{ChangeLog, Result, TraitMode, TraitSettings};

pub(crate) fn randomize_traits(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &TraitSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == TraitMode::Unchanged {
        return Ok(());
    }
    log.section("traits");

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let stage = stage_of(id);
        let (mut regular_pool, support_pool) = match cfg.mode {
            TraitMode::Unchanged => unreachable!(),
            TraitMode::StagePool => {
                // Creatures outside the stage catalog have no stage pool.
                let Some(stage) = stage else { continue };
                (
                    regular_trait_pool(stage, cfg.include_other_bucket),
                    support_trait_pool(stage),
                )
            }
            TraitMode::Global => (
                global_regular_trait_pool(cfg.include_other_bucket),
                global_support_trait_pool(),
            ),
        };

        let name = tables.creature_name(id);
        let Some(mut pair) = tables.pair_mut(id) else {
            continue;
        };

        let mut traits = pair.base.traits;
        for slot in traits.iter_mut() {
            if *slot == TRAIT_UNSET && !cfg.force_four_traits {
                continue;
            }
            if regular_pool.is_empty() {
                // Exhausted: the slot keeps its original value.
                continue;
            }
            let index = rng.gen_range(0..regular_pool.len());
            *slot = regular_pool.swap_remove(index);
        }
        pair.set_traits(rom, traits)?;

        let support = if support_pool.is_empty() {
            pair.base.support_trait
        } else {
            support_pool[rng.gen_range(0..support_pool.len())]
        };
        pair.base.set_support_trait(rom, support)?;

        log.push(format!(
            "{name}: traits {:02X} {:02X} {:02X} {:02X}, support {support:02X}",
            traits[0], traits[1], traits[2], traits[3]
        ));
    }
    Ok(())
}

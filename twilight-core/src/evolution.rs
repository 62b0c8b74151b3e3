//! Standard evolution randomization.
//!
//! Full mode rebuilds the promotion graph stage by stage from the bottom:
//! a shuffled walk order per stage, a promotion count drawn from the
//! stage's distribution, targets taken from the next stage's remove-on-pick
//! pool with similar-species bias, and a reciprocal de-evolution link on
//! every chosen target. Conditions-only mode leaves targets alone and
//! rewrites just the condition pairs, caching them per target so a creature
//! reached through two paths gets one condition set.
//!
//! Both modes finish with the deadlock guard: a true root may not demand a
//! level above its own aptitude on any promotion link.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{
    condition_count_weights, condition_range, exp_condition_species, is_exp_condition,
    promotion_count_weights, stage_ids, stage_of, Species, Stage, COND_LEVEL, COND_NONE,
    CONDITION_IDS,
};
use crate::pools::{pick_discrete, pick_weighted, Pool};
use crate::records::LINK_NONE;
use crate::tables::RomTables;
use crate::{ChangeLog, EvolutionSettings, Result};

pub(crate) fn randomize_evolutions(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &EvolutionSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    log.section("evolutions");

    // Snapshot the original condition triples so links keep their old
    // requirements when conditions are not being rerolled.
    let mut original_conditions: BTreeMap<(u16, usize), [(u32, u32); 3]> = BTreeMap::new();
    let ids: Vec<u16> = tables.evolutions.keys().copied().collect();
    for id in &ids {
        if let Some(record) = tables.evolutions.get(id) {
            for slot in 0..3 {
                original_conditions.insert((*id, slot), record.links[slot].conditions);
            }
        }
    }

    // Start from a clean graph; unpicked creatures end up as roots.
    for id in &ids {
        if let Some(record) = tables.evolutions.get_mut(id) {
            record.set_de_evolution(rom, LINK_NONE)?;
            for slot in 0..3 {
                record.clear_link(rom, slot)?;
            }
        }
    }

    for stage_index in 0..4 {
        let Some(stage) = Stage::from_index(stage_index) else {
            break;
        };
        let Some(next_stage) = stage.next() else {
            break;
        };

        let mut order: Vec<u16> = stage_ids(stage)
            .into_iter()
            .filter(|id| tables.evolutions.contains_key(id))
            .collect();
        order.shuffle(rng);

        let mut pool = Pool::for_stage(next_stage, tables.evolutions.keys());

        for id in order {
            let count = pick_discrete(rng, &promotion_count_weights(stage));
            let species = species_of(tables, id);

            for slot in 0..count.min(3) {
                let target = pool.take_biased(rng, cfg.similar_species_bias, |candidate| {
                    species_of(tables, candidate) == species
                });
                // Pool exhausted: this creature gets fewer links than rolled.
                let Some(target) = target else { break };

                let conditions = if cfg.randomize_conditions {
                    let pair = [species, species_of(tables, target)];
                    generate_conditions(rng, stage, next_stage, &pair, cfg)
                } else {
                    original_conditions
                        .get(&(id, slot))
                        .copied()
                        .unwrap_or([(COND_NONE, 0); 3])
                };

                if let Some(record) = tables.evolutions.get_mut(&id) {
                    record.set_link_target(rom, slot, target as u32)?;
                    record.set_link_conditions(rom, slot, conditions)?;
                }
                if let Some(target_record) = tables.evolutions.get_mut(&target) {
                    target_record.set_de_evolution(rom, id as u32)?;
                }

                log.push(format!(
                    "{} -> {}",
                    tables.creature_name(id),
                    tables.creature_name(target)
                ));
            }
        }
    }

    deadlock_guard(rom, tables, log)
}

pub(crate) fn randomize_conditions_only(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &EvolutionSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    log.section("evolution conditions");

    // One condition set per target id, reused when a second path reaches it.
    let mut cache: BTreeMap<u16, [(u32, u32); 3]> = BTreeMap::new();

    let ids: Vec<u16> = tables.evolutions.keys().copied().collect();
    for id in ids {
        let Some(source_stage) = stage_of(id) else {
            continue;
        };
        let species = species_of(tables, id);

        for slot in 0..3 {
            let target = match tables.evolutions.get(&id) {
                Some(record) => record.links[slot].target,
                None => continue,
            };
            if target == LINK_NONE {
                continue;
            }
            let target_id = target as u16;
            let Some(target_stage) = stage_of(target_id) else {
                continue;
            };

            let conditions = match cache.get(&target_id) {
                Some(conditions) => *conditions,
                None => {
                    let pair = [species, species_of(tables, target_id)];
                    let conditions =
                        generate_conditions(rng, source_stage, target_stage, &pair, cfg);
                    cache.insert(target_id, conditions);
                    conditions
                }
            };

            if let Some(record) = tables.evolutions.get_mut(&id) {
                record.set_link_conditions(rom, slot, conditions)?;
            }
            log.push(format!(
                "{} -> {}: {}",
                tables.creature_name(id),
                tables.creature_name(target_id),
                format_conditions(&conditions)
            ));
        }
    }

    deadlock_guard(rom, tables, log)
}

fn species_of(tables: &RomTables, id: u16) -> Species {
    tables
        .base
        .get(&id)
        .map(|base| base.species_enum())
        .unwrap_or(Species::Unknown)
}

/// Generate 1..=3 condition pairs for a link from `source_stage` to a
/// creature of `target_stage`. The first slot is pinned to a level
/// requirement for In-Training sources; exp conditions whose species
/// matches neither side are down-weighted when avoidance is on.
pub(crate) fn generate_conditions(
    rng: &mut StdRng,
    source_stage: Stage,
    target_stage: Stage,
    species: &[Species],
    cfg: &EvolutionSettings,
) -> [(u32, u32); 3] {
    let count = 1 + pick_discrete(rng, &condition_count_weights(source_stage));

    let mut conditions = [(COND_NONE, 0u32); 3];
    let mut used: Vec<u32> = Vec::new();

    for slot in 0..count.min(3) {
        let candidates: Vec<u32> = CONDITION_IDS
            .iter()
            .copied()
            .filter(|id| !used.contains(id))
            .collect();

        let condition_id = if slot == 0 && source_stage == Stage::InTraining {
            COND_LEVEL
        } else {
            let weights: Vec<f64> = candidates
                .iter()
                .map(|id| {
                    if cfg.avoid_cross_species_exp && is_exp_condition(*id) {
                        match exp_condition_species(*id) {
                            Some(s) if species.contains(&s) => 1.0,
                            _ => cfg.cross_species_exp_bias,
                        }
                    } else {
                        1.0
                    }
                })
                .collect();
            match pick_weighted(rng, &weights) {
                Some(index) => candidates[index],
                None => break,
            }
        };
        used.push(condition_id);

        let (lo, hi) = condition_range(condition_id, target_stage).unwrap_or((1, 1));
        conditions[slot] = (condition_id, rng.gen_range(lo..=hi));
    }

    conditions
}

pub(crate) fn format_conditions(conditions: &[(u32, u32); 3]) -> String {
    let mut parts = Vec::new();
    for (id, value) in conditions {
        if *id == COND_NONE {
            continue;
        }
        parts.push(format!("{} {}", crate::catalog::condition_name(*id), value));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// A creature with no pre-evolution can never satisfy a level requirement
/// above its own aptitude cap; offending values are rewritten down in
/// place and logged.
fn deadlock_guard(rom: &mut [u8], tables: &mut RomTables, log: &mut ChangeLog) -> Result<()> {
    let ids: Vec<u16> = tables.evolutions.keys().copied().collect();
    for id in ids {
        let (is_root, links) = match tables.evolutions.get(&id) {
            Some(record) => (record.de_evolution == LINK_NONE, record.links),
            None => continue,
        };
        if !is_root {
            continue;
        }
        let aptitude = match tables.base.get(&id) {
            Some(base) => base.aptitude as u32,
            None => continue,
        };

        for slot in 0..3 {
            if links[slot].target == LINK_NONE {
                continue;
            }
            let mut conditions = links[slot].conditions;
            let mut lowered = false;
            for (condition_id, value) in conditions.iter_mut() {
                if *condition_id == COND_LEVEL && *value > aptitude {
                    *value = aptitude;
                    lowered = true;
                }
            }
            if lowered {
                if let Some(record) = tables.evolutions.get_mut(&id) {
                    record.set_link_conditions(rom, slot, conditions)?;
                }
                log.push(format!(
                    "{}: level requirement capped at aptitude {}",
                    tables.creature_name(id),
                    aptitude
                ));
            }
        }
    }
    Ok(())
}

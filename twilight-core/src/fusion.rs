//! Dual-fusion (DNA) evolution management.
//!
//! Runs after the standard evolution pass. Mapping builds one id
//! permutation (within each stage, or across all ids) and applies it to
//! both inputs and the result of every fusion record, so no two fusions
//! collapse onto the same creature. Condition handling is independent of
//! the mapping mode.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::catalog::{stage_of, Species, Stage, COND_LEVEL, STAGES};
use crate::evolution::{format_conditions, generate_conditions};
use crate::tables::RomTables;
use crate::{
    ChangeLog, EvolutionSettings, FusionConditionMode, FusionMapMode, FusionSettings, Result,
};

pub(crate) fn manage_fusions(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &FusionSettings,
    evolution_cfg: &EvolutionSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mapping == FusionMapMode::Unchanged && cfg.conditions == FusionConditionMode::Unchanged {
        return Ok(());
    }
    log.section("dual fusions");

    let remap = build_remap(tables, rng, cfg.mapping);
    if !remap.is_empty() {
        for index in 0..tables.fusions.len() {
            let (a, b, result) = {
                let fusion = &tables.fusions[index];
                (fusion.input_a, fusion.input_b, fusion.result)
            };
            let new_a = remap.get(&a).copied().unwrap_or(a);
            let new_b = remap.get(&b).copied().unwrap_or(b);
            let new_result = remap.get(&result).copied().unwrap_or(result);

            let fusion = &mut tables.fusions[index];
            fusion.set_inputs(rom, new_a, new_b)?;
            fusion.set_result(rom, new_result)?;
        }
    }

    match cfg.conditions {
        FusionConditionMode::Unchanged => {
            if cfg.mapping != FusionMapMode::Unchanged {
                // Remapped results keep the conditions their fusion carried
                // before randomization, falling back to fresh ones for
                // results that never had a fusion.
                for index in 0..tables.fusions.len() {
                    let result = tables.fusions[index].result;
                    let conditions = match tables.original_fusion_conditions.get(&result) {
                        Some(original) => *original,
                        None => fresh_conditions(tables, rng, result, evolution_cfg),
                    };
                    tables.fusions[index].set_conditions(rom, conditions)?;
                }
            }
        }
        FusionConditionMode::Random => {
            for index in 0..tables.fusions.len() {
                let result = tables.fusions[index].result;
                let conditions = fresh_conditions(tables, rng, result, evolution_cfg);
                tables.fusions[index].set_conditions(rom, conditions)?;
            }
        }
        FusionConditionMode::Removed => {
            // A fusion without conditions is reachable by simply having
            // both partners in the party.
            for index in 0..tables.fusions.len() {
                tables.fusions[index]
                    .set_conditions(rom, [(COND_LEVEL, 1), (0, 0), (0, 0)])?;
            }
        }
    }

    for fusion in &tables.fusions {
        log.push(format!(
            "{} + {} => {} ({})",
            tables.creature_name(fusion.input_a),
            tables.creature_name(fusion.input_b),
            tables.creature_name(fusion.result),
            format_conditions(&fusion.conditions)
        ));
    }
    Ok(())
}

fn build_remap(
    tables: &RomTables,
    rng: &mut StdRng,
    mode: FusionMapMode,
) -> BTreeMap<u16, u16> {
    let mut remap = BTreeMap::new();
    match mode {
        FusionMapMode::Unchanged => {}
        FusionMapMode::SameStage => {
            for stage in STAGES {
                let ids: Vec<u16> = tables
                    .base
                    .keys()
                    .copied()
                    .filter(|id| stage_of(*id) == Some(stage))
                    .collect();
                let mut shuffled = ids.clone();
                shuffled.shuffle(rng);
                for (from, to) in ids.iter().zip(shuffled.iter()) {
                    remap.insert(*from, *to);
                }
            }
        }
        FusionMapMode::Random => {
            let ids: Vec<u16> = tables.base.keys().copied().collect();
            let mut shuffled = ids.clone();
            shuffled.shuffle(rng);
            for (from, to) in ids.iter().zip(shuffled.iter()) {
                remap.insert(*from, *to);
            }
        }
    }
    remap
}

fn fresh_conditions(
    tables: &RomTables,
    rng: &mut StdRng,
    result: u16,
    evolution_cfg: &EvolutionSettings,
) -> [(u32, u32); 3] {
    let target_stage = stage_of(result).unwrap_or(Stage::Mega);
    let source_stage =
        Stage::from_index(target_stage.index().saturating_sub(1)).unwrap_or(Stage::InTraining);
    let species = tables
        .base
        .get(&result)
        .map(|base| base.species_enum())
        .unwrap_or(Species::Unknown);
    generate_conditions(rng, source_stage, target_stage, &[species], evolution_cfg)
}

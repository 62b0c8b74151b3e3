//! Creature attribute passes: species, elemental resistances, stat type and
//! base stats. Species runs before resistances so coherence swaps see the
//! final species; stat type runs before base stats so shuffle biasing sees
//! the final archetype.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

use crate::catalog::{Species, SPECIES, STAT_TYPES};
use crate::records::KEEP;
use crate::tables::RomTables;
use crate::{
    BaseStatMode, BaseStatSettings, ChangeLog, RandomiserError, ResistanceMode,
    ResistanceSettings, Result, SpeciesMode, SpeciesSettings, StatTypeMode,
};

pub(crate) fn randomize_species(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &SpeciesSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == SpeciesMode::Unchanged {
        return Ok(());
    }
    log.section("species");

    let choices: Vec<Species> = SPECIES
        .iter()
        .copied()
        .filter(|s| cfg.allow_unknown || *s != Species::Unknown)
        .collect();

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let Some(mut pair) = tables.pair_mut(id) else {
            continue;
        };
        let old = pair.base.species_enum();
        let new = choices[rng.gen_range(0..choices.len())];
        pair.set_species(rom, new)?;
        log.push(format!("{name}: {} -> {}", old.name(), new.name()));
    }
    Ok(())
}

pub(crate) fn randomize_resistances(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &ResistanceSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == ResistanceMode::Unchanged {
        return Ok(());
    }
    log.section("resistances");

    let dirichlet = Dirichlet::new_with_size(1.0, 8)
        .map_err(|e| RandomiserError::Config(format!("resistance distribution: {e}")))?;

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let Some(mut pair) = tables.pair_mut(id) else {
            continue;
        };

        let mut values = pair.base.resistances;
        match cfg.mode {
            ResistanceMode::Unchanged => unreachable!(),
            ResistanceMode::Shuffle => {
                values.shuffle(rng);
            }
            ResistanceMode::Random => {
                let total: f64 = values.iter().map(|v| *v as f64).sum();
                let shares = dirichlet.sample(rng);
                for (slot, share) in values.iter_mut().zip(shares.iter()) {
                    *slot = (share * total).round().max(0.0) as u16;
                }
            }
        }

        if cfg.species_coherence {
            let species = pair.base.species_enum();
            if let Some(affinity) = species.affinity() {
                let max_index = max_position(&values);
                values.swap(max_index, affinity.index());
            }
            if let Some(vulnerability) = species.vulnerability() {
                let min_index = min_position(&values);
                values.swap(min_index, vulnerability.index());
            }
        }

        let as_i32: Vec<i32> = values.iter().map(|v| *v as i32).collect();
        pair.set_resistances(rom, &as_i32)?;
        log.push(format!("{name}: {values:?}"));
    }
    Ok(())
}

fn max_position(values: &[u16; 8]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn min_position(values: &[u16; 8]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn randomize_stat_types(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    mode: StatTypeMode,
    log: &mut ChangeLog,
) -> Result<()> {
    if mode == StatTypeMode::Unchanged {
        return Ok(());
    }
    log.section("stat types");

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let Some(base) = tables.base.get_mut(&id) else {
            continue;
        };
        let old = base.stat_type_enum();
        let new = STAT_TYPES[rng.gen_range(0..STAT_TYPES.len())];
        base.set_stat_type(rom, new)?;
        log.push(format!("{name}: {} -> {}", old.name(), new.name()));
    }
    Ok(())
}

pub(crate) fn randomize_base_stats(
    rom: &mut [u8],
    tables: &mut RomTables,
    rng: &mut StdRng,
    cfg: &BaseStatSettings,
    log: &mut ChangeLog,
) -> Result<()> {
    if cfg.mode == BaseStatMode::Unchanged {
        return Ok(());
    }
    log.section("base stats");

    // Redistribution floors each stat at this baseline so nothing rolls to
    // zero hp or zero speed.
    const BASELINE: u32 = 10;

    let dirichlet = Dirichlet::new_with_size(1.0, 6)
        .map_err(|e| RandomiserError::Config(format!("stat distribution: {e}")))?;

    let ids: Vec<u16> = tables.base.keys().copied().collect();
    for id in ids {
        let name = tables.creature_name(id);
        let Some(base) = tables.base.get_mut(&id) else {
            continue;
        };

        let mut stats = base.stats;
        match cfg.mode {
            BaseStatMode::Unchanged => unreachable!(),
            BaseStatMode::Shuffle => {
                // Only atk/def/spirit/speed move; hp and mp stay put.
                let mut four = [stats[2], stats[3], stats[4], stats[5]];
                four.shuffle(rng);
                if cfg.bias_stat_type {
                    if let Some(slot) = base.stat_type_enum().favored_stat_slot() {
                        let max_index = (0..4).max_by_key(|i| four[*i]).unwrap_or(0);
                        four.swap(max_index, slot - 2);
                    }
                }
                stats[2..6].copy_from_slice(&four);
            }
            BaseStatMode::Proportional => {
                let total: f64 = stats.iter().map(|v| *v as f64).sum();
                let scaled: Vec<f64> = stats
                    .iter()
                    .map(|v| *v as f64 * rng.gen_range(0.6..1.4))
                    .collect();
                let scaled_total: f64 = scaled.iter().sum();
                if scaled_total > 0.0 {
                    for (slot, s) in stats.iter_mut().zip(scaled.iter()) {
                        *slot = (s * total / scaled_total).round().max(1.0) as u16;
                    }
                }
            }
            BaseStatMode::Random => {
                let total: u32 = stats.iter().map(|v| *v as u32).sum();
                let spendable = total.saturating_sub(6 * BASELINE);
                let shares = dirichlet.sample(rng);
                for (slot, share) in stats.iter_mut().zip(shares.iter()) {
                    *slot = (BASELINE + (share * spendable as f64).round() as u32) as u16;
                }
            }
        }

        let values = [
            stats[0] as i32,
            stats[1] as i32,
            stats[2] as i32,
            stats[3] as i32,
            stats[4] as i32,
            stats[5] as i32,
            KEEP, // aptitude is never redistributed
        ];
        base.set_base_stats(rom, &values)?;
        log.push(format!(
            "{name}: hp {} mp {} atk {} def {} spi {} spd {}",
            stats[0], stats[1], stats[2], stats[3], stats[4], stats[5]
        ));
    }
    Ok(())
}

use std::fs;
use std::path::PathBuf;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
mod evolution;
mod fusion;
mod moves;
mod pools;
pub mod records;
pub mod report;
pub mod rom;
mod starters;
mod stats;
pub mod tables;
mod traits;
mod world;

use rom::RomOffsets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RookieResetMode {
    Unchanged,
    KeepEvolution,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterMode {
    Unchanged,
    SameStage,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemMode {
    Unchanged,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeciesMode {
    Unchanged,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesSettings {
    pub mode: SpeciesMode,
    /// Allow rolling the Unknown sentinel species.
    pub allow_unknown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResistanceMode {
    Unchanged,
    Shuffle,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceSettings {
    pub mode: ResistanceMode,
    /// Swap the rolled maximum onto the affinity element and the minimum
    /// onto the vulnerability element.
    pub species_coherence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatTypeMode {
    Unchanged,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseStatMode {
    Unchanged,
    Shuffle,
    Proportional,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStatSettings {
    pub mode: BaseStatMode,
    /// In shuffle mode, steer the highest value into the slot matching the
    /// creature's stat-type archetype.
    pub bias_stat_type: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovesetMode {
    Unchanged,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovesetSettings {
    pub mode: MovesetMode,
    /// Fold the signature range into the regular candidate pool.
    pub include_signature_moves: bool,
    /// Candidate learn-level must be within this band of the original
    /// slot's move.
    pub level_band: Option<u8>,
    /// Candidate power must be within this band of the original slot's move.
    pub power_band: Option<u16>,
    /// Aggregate probability mass given to affinity-element moves.
    pub species_bias: f64,
    pub guarantee_basic_move: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraitMode {
    Unchanged,
    StagePool,
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitSettings {
    pub mode: TraitMode,
    /// Fold the unused trait bucket into the Ultimate/Mega pools.
    pub include_other_bucket: bool,
    /// Fill empty slots instead of preserving them.
    pub force_four_traits: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionMode {
    Unchanged,
    /// Rewrite only condition pairs on existing links.
    ConditionsOnly,
    /// Rebuild the promotion graph.
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSettings {
    pub mode: EvolutionMode,
    /// In full mode, also reroll conditions; conditions-only mode always
    /// rerolls regardless.
    pub randomize_conditions: bool,
    /// Aggregate probability mass for same-species promotion targets.
    pub similar_species_bias: f64,
    pub avoid_cross_species_exp: bool,
    /// Relative weight of a mismatched exp condition when avoidance is on.
    pub cross_species_exp_bias: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionMapMode {
    Unchanged,
    SameStage,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionConditionMode {
    Unchanged,
    Random,
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionSettings {
    pub mapping: FusionMapMode,
    pub conditions: FusionConditionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarterMode {
    Unchanged,
    SameStage,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarterSettings {
    pub mode: StarterMode,
    /// Only hand out starters whose pre-evolution chain reaches an
    /// In-Training or Rookie creature.
    pub require_rookie_line: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatExpMode {
    Unchanged,
    /// Denominator 14.
    Moderate,
    /// Denominator 7.
    Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomiserSettings {
    pub seed: u64,
    pub rookie_reset: RookieResetMode,
    pub encounters: EncounterMode,
    pub nerf_first_boss: bool,
    pub items: ItemMode,
    pub species: SpeciesSettings,
    pub resistances: ResistanceSettings,
    pub stat_types: StatTypeMode,
    pub base_stats: BaseStatSettings,
    pub movesets: MovesetSettings,
    pub traits: TraitSettings,
    pub evolutions: EvolutionSettings,
    pub fusions: FusionSettings,
    pub starters: StarterSettings,
    pub flat_exp: FlatExpMode,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl RandomiserSettings {
    /// Every pass off; the pipeline becomes a byte-exact no-op.
    pub fn unchanged(seed: u64) -> RandomiserSettings {
        RandomiserSettings {
            seed,
            rookie_reset: RookieResetMode::Unchanged,
            encounters: EncounterMode::Unchanged,
            nerf_first_boss: false,
            items: ItemMode::Unchanged,
            species: SpeciesSettings {
                mode: SpeciesMode::Unchanged,
                allow_unknown: false,
            },
            resistances: ResistanceSettings {
                mode: ResistanceMode::Unchanged,
                species_coherence: false,
            },
            stat_types: StatTypeMode::Unchanged,
            base_stats: BaseStatSettings {
                mode: BaseStatMode::Unchanged,
                bias_stat_type: false,
            },
            movesets: MovesetSettings {
                mode: MovesetMode::Unchanged,
                include_signature_moves: false,
                level_band: None,
                power_band: None,
                species_bias: 0.9,
                guarantee_basic_move: false,
            },
            traits: TraitSettings {
                mode: TraitMode::Unchanged,
                include_other_bucket: false,
                force_four_traits: false,
            },
            evolutions: EvolutionSettings {
                mode: EvolutionMode::Unchanged,
                randomize_conditions: true,
                similar_species_bias: 0.9,
                avoid_cross_species_exp: false,
                cross_species_exp_bias: 0.2,
            },
            fusions: FusionSettings {
                mapping: FusionMapMode::Unchanged,
                conditions: FusionConditionMode::Unchanged,
            },
            starters: StarterSettings {
                mode: StarterMode::Unchanged,
                require_rookie_line: false,
            },
            flat_exp: FlatExpMode::Unchanged,
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unrecognised ROM image (game code {0:02X?})")]
    UnrecognizedFormat([u8; 4]),
    #[error("decode error at 0x{offset:06X}: {reason}")]
    Decode { offset: usize, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// Ordered, human-readable record of every change, grouped by pass.
#[derive(Debug, Default)]
pub struct ChangeLog {
    sections: Vec<(String, Vec<String>)>,
}

impl ChangeLog {
    pub fn section(&mut self, title: &str) {
        self.sections.push((title.to_string(), Vec::new()));
    }

    pub fn push(&mut self, line: String) {
        if self.sections.is_empty() {
            self.section("general");
        }
        if let Some((_, lines)) = self.sections.last_mut() {
            lines.push(line);
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.sections
            .iter()
            .map(|(title, lines)| (title.as_str(), lines.as_slice()))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (title, lines) in &self.sections {
            out.push_str("== ");
            out.push_str(title);
            out.push('\n');
            for line in lines {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Run every enabled pass over an in-memory image. The pass order is fixed
/// and all passes share one seeded generator, so identical (seed, settings,
/// input) always produce an identical buffer.
pub fn randomize_buffer(rom: &mut [u8], settings: &RandomiserSettings) -> Result<ChangeLog> {
    let version = rom::detect_version(rom)?;
    let offsets = RomOffsets::for_version(version);
    if rom.len() < offsets.required_len() {
        return Err(RandomiserError::Config(format!(
            "image too small for {}: {} < {}",
            version.name(),
            rom.len(),
            offsets.required_len()
        )));
    }

    let mut tables = tables::load_tables(rom, &offsets)?;
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut log = ChangeLog::default();
    log.section("run");
    log.push(format!("variant: {}", version.name()));
    log.push(format!("seed: {}", settings.seed));

    world::patch_rookie_reset(rom, &offsets, settings.rookie_reset, &mut log)?;
    world::randomize_encounters(
        rom,
        &mut tables,
        &offsets,
        &mut rng,
        settings.encounters,
        &mut log,
    )?;
    world::nerf_boss(rom, &mut tables, &offsets, settings.nerf_first_boss, &mut log)?;
    world::randomize_items(rom, &offsets, &mut rng, settings.items, &mut log)?;

    stats::randomize_species(rom, &mut tables, &mut rng, &settings.species, &mut log)?;
    stats::randomize_resistances(rom, &mut tables, &mut rng, &settings.resistances, &mut log)?;
    stats::randomize_stat_types(rom, &mut tables, &mut rng, settings.stat_types, &mut log)?;
    stats::randomize_base_stats(rom, &mut tables, &mut rng, &settings.base_stats, &mut log)?;

    moves::randomize_movesets(
        rom,
        &mut tables,
        &offsets,
        &mut rng,
        &settings.movesets,
        &mut log,
    )?;
    traits::randomize_traits(rom, &mut tables, &mut rng, &settings.traits, &mut log)?;

    match settings.evolutions.mode {
        EvolutionMode::Unchanged => {}
        EvolutionMode::ConditionsOnly => {
            evolution::randomize_conditions_only(
                rom,
                &mut tables,
                &mut rng,
                &settings.evolutions,
                &mut log,
            )?;
        }
        EvolutionMode::Full => {
            evolution::randomize_evolutions(
                rom,
                &mut tables,
                &mut rng,
                &settings.evolutions,
                &mut log,
            )?;
        }
    }

    fusion::manage_fusions(
        rom,
        &mut tables,
        &mut rng,
        &settings.fusions,
        &settings.evolutions,
        &mut log,
    )?;
    starters::randomize_starters(
        rom,
        &mut tables,
        &offsets,
        &mut rng,
        &settings.starters,
        &mut log,
    )?;
    world::patch_flat_exp(rom, &mut tables, settings.flat_exp, &mut log)?;

    if settings.evolutions.mode != EvolutionMode::Unchanged {
        log.section("evolution forest");
        for line in report::format_evolution_forest(&tables).lines() {
            log.push(line.to_string());
        }
    }

    Ok(log)
}

/// Table summary without randomizing anything; the CLI's diagnostic path.
pub fn summarize(rom: &[u8]) -> Result<String> {
    let version = rom::detect_version(rom)?;
    let offsets = RomOffsets::for_version(version);
    let tables = tables::load_tables(rom, &offsets)?;

    let mut out = String::new();
    out.push_str(&format!("variant: {}\n", version.name()));
    out.push_str(&format!("base records: {}\n", tables.base.len()));
    out.push_str(&format!("enemy records: {}\n", tables.enemies.len()));
    out.push_str(&format!("moves: {}\n", tables.moves.len()));
    out.push_str(&format!("evolution blocks: {}\n", tables.evolutions.len()));
    out.push_str(&format!("fusions: {}\n", tables.fusions.len()));
    out.push_str(&format!("sprite mappings: {}\n", tables.sprites.len()));
    out.push_str(&format!("battle strings: {}\n", tables.battle_strings.len()));
    out.push_str(&format!("farm plots: {}\n", tables.farm_plots.len()));
    Ok(out)
}

/// Load the input image, randomize, and write the output image plus the
/// spoiler log and a settings snapshot. Nothing is written unless the full
/// pipeline succeeds; the input file is never touched.
pub fn run(settings: RandomiserSettings) -> Result<()> {
    if !settings.input_path.exists() {
        return Err(RandomiserError::Config(format!(
            "Input path does not exist: {}",
            settings.input_path.display()
        )));
    }

    let mut rom = fs::read(&settings.input_path)?;
    let log = randomize_buffer(&mut rom, &settings)?;

    if let Some(parent) = settings.output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&settings.output_path, &rom)?;

    let log_path = settings.output_path.with_extension("spoiler.txt");
    fs::write(&log_path, log.render())?;

    let settings_path = settings.output_path.with_extension("settings.json");
    let snapshot = serde_json::to_string_pretty(&settings)
        .map_err(|e| RandomiserError::Config(format!("settings snapshot: {e}")))?;
    fs::write(&settings_path, snapshot)?;

    Ok(())
}

use clap::Parser;
use std::path::PathBuf;

use twilight_core::{
    run, BaseStatMode, BaseStatSettings, EncounterMode, EvolutionMode, EvolutionSettings,
    FlatExpMode, FusionConditionMode, FusionMapMode, FusionSettings, ItemMode, MovesetMode,
    MovesetSettings, RandomiserSettings, ResistanceMode, ResistanceSettings, RookieResetMode,
    SpeciesMode, SpeciesSettings, StarterMode, StarterSettings, StatTypeMode, TraitMode,
    TraitSettings,
};

#[derive(Debug, Parser)]
#[command(name = "twilight-randomiser", version, about = "Dawn/Dusk ROM randomiser tool")]
struct Args {
    #[arg(long, required_unless_present = "summary")]
    input: Option<PathBuf>,

    #[arg(long, required_unless_present = "summary")]
    output: Option<PathBuf>,

    #[arg(long, required_unless_present = "summary")]
    seed: Option<u64>,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "keep-evolution", "disable"])]
    rookie_reset: String,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "same-stage", "random"])]
    encounters: String,

    #[arg(long, default_value_t = false)]
    nerf_first_boss: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "random"])]
    items: String,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "random"])]
    species: String,

    #[arg(long, default_value_t = false)]
    allow_unknown_species: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "shuffle", "random"])]
    resistances: String,

    #[arg(long, default_value_t = false)]
    resistance_coherence: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "random"])]
    stat_types: String,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "shuffle", "proportional", "random"])]
    base_stats: String,

    #[arg(long, default_value_t = false)]
    bias_stat_type: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "random"])]
    movesets: String,

    #[arg(long, default_value_t = false)]
    include_signature_moves: bool,

    #[arg(long)]
    level_band: Option<u8>,

    #[arg(long)]
    power_band: Option<u16>,

    #[arg(long, default_value_t = 0.9)]
    species_bias: f64,

    #[arg(long, default_value_t = false)]
    guarantee_basic_move: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "stage", "global"])]
    traits: String,

    #[arg(long, default_value_t = false)]
    include_other_traits: bool,

    #[arg(long, default_value_t = false)]
    force_four_traits: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "conditions", "full"])]
    evolutions: String,

    /// Keep each link's original conditions when rebuilding the graph.
    #[arg(long, default_value_t = false)]
    keep_evolution_conditions: bool,

    #[arg(long, default_value_t = 0.9)]
    similar_species_bias: f64,

    #[arg(long, default_value_t = false)]
    avoid_cross_species_exp: bool,

    #[arg(long, default_value_t = 0.2)]
    cross_species_exp_bias: f64,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "same-stage", "random"])]
    fusion_map: String,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "random", "removed"])]
    fusion_conditions: String,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "same-stage", "random"])]
    starters: String,

    #[arg(long, default_value_t = false)]
    require_rookie_line: bool,

    #[arg(long, default_value = "unchanged", value_parser = ["unchanged", "moderate", "aggressive"])]
    flat_exp: String,

    /// Print table counts for a ROM and exit without randomising.
    #[arg(long, value_name = "ROM")]
    summary: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Diagnostic path: dump table counts and exit.
    if let Some(rom_path) = args.summary.as_ref() {
        match std::fs::read(rom_path) {
            Ok(rom) => match twilight_core::summarize(&rom) {
                Ok(report) => println!("{report}"),
                Err(e) => {
                    eprintln!("Failed to summarise {:?}: {}", rom_path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Failed to read {:?}: {}", rom_path, e);
                std::process::exit(1);
            }
        }
        return;
    }

    let settings = RandomiserSettings {
        // These unwraps are safe here because clap enforces that
        // input/output/seed are present unless --summary was provided, and
        // we have already early-returned in that case.
        seed: args.seed.expect("seed is required unless --summary is used"),
        rookie_reset: match args.rookie_reset.as_str() {
            "keep-evolution" => RookieResetMode::KeepEvolution,
            "disable" => RookieResetMode::Disable,
            _ => RookieResetMode::Unchanged,
        },
        encounters: match args.encounters.as_str() {
            "same-stage" => EncounterMode::SameStage,
            "random" => EncounterMode::Random,
            _ => EncounterMode::Unchanged,
        },
        nerf_first_boss: args.nerf_first_boss,
        items: match args.items.as_str() {
            "random" => ItemMode::Random,
            _ => ItemMode::Unchanged,
        },
        species: SpeciesSettings {
            mode: match args.species.as_str() {
                "random" => SpeciesMode::Random,
                _ => SpeciesMode::Unchanged,
            },
            allow_unknown: args.allow_unknown_species,
        },
        resistances: ResistanceSettings {
            mode: match args.resistances.as_str() {
                "shuffle" => ResistanceMode::Shuffle,
                "random" => ResistanceMode::Random,
                _ => ResistanceMode::Unchanged,
            },
            species_coherence: args.resistance_coherence,
        },
        stat_types: match args.stat_types.as_str() {
            "random" => StatTypeMode::Random,
            _ => StatTypeMode::Unchanged,
        },
        base_stats: BaseStatSettings {
            mode: match args.base_stats.as_str() {
                "shuffle" => BaseStatMode::Shuffle,
                "proportional" => BaseStatMode::Proportional,
                "random" => BaseStatMode::Random,
                _ => BaseStatMode::Unchanged,
            },
            bias_stat_type: args.bias_stat_type,
        },
        movesets: MovesetSettings {
            mode: match args.movesets.as_str() {
                "random" => MovesetMode::Random,
                _ => MovesetMode::Unchanged,
            },
            include_signature_moves: args.include_signature_moves,
            level_band: args.level_band,
            power_band: args.power_band,
            species_bias: args.species_bias,
            guarantee_basic_move: args.guarantee_basic_move,
        },
        traits: TraitSettings {
            mode: match args.traits.as_str() {
                "stage" => TraitMode::StagePool,
                "global" => TraitMode::Global,
                _ => TraitMode::Unchanged,
            },
            include_other_bucket: args.include_other_traits,
            force_four_traits: args.force_four_traits,
        },
        evolutions: EvolutionSettings {
            mode: match args.evolutions.as_str() {
                "conditions" => EvolutionMode::ConditionsOnly,
                "full" => EvolutionMode::Full,
                _ => EvolutionMode::Unchanged,
            },
            randomize_conditions: !args.keep_evolution_conditions,
            similar_species_bias: args.similar_species_bias,
            avoid_cross_species_exp: args.avoid_cross_species_exp,
            cross_species_exp_bias: args.cross_species_exp_bias,
        },
        fusions: FusionSettings {
            mapping: match args.fusion_map.as_str() {
                "same-stage" => FusionMapMode::SameStage,
                "random" => FusionMapMode::Random,
                _ => FusionMapMode::Unchanged,
            },
            conditions: match args.fusion_conditions.as_str() {
                "random" => FusionConditionMode::Random,
                "removed" => FusionConditionMode::Removed,
                _ => FusionConditionMode::Unchanged,
            },
        },
        starters: StarterSettings {
            mode: match args.starters.as_str() {
                "same-stage" => StarterMode::SameStage,
                "random" => StarterMode::Random,
                _ => StarterMode::Unchanged,
            },
            require_rookie_line: args.require_rookie_line,
        },
        flat_exp: match args.flat_exp.as_str() {
            "moderate" => FlatExpMode::Moderate,
            "aggressive" => FlatExpMode::Aggressive,
            _ => FlatExpMode::Unchanged,
        },
        input_path: args
            .input
            .expect("input is required unless --summary is used"),
        output_path: args
            .output
            .expect("output is required unless --summary is used"),
    };

    if let Err(err) = run(settings) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

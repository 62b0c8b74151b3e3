//! Synthetic Dawn image builder shared by the integration tests. Pure
//! formulas, no randomness: two calls always produce identical bytes.
#![allow(dead_code)]

use twilight_core::catalog::{self, Stage, COND_BOND, COND_LEVEL};
use twilight_core::records::{
    BaseRecord, BattleStringRecord, EnemyRecord, EvolutionRecord, FarmTerrainRecord, FusionRecord,
    MoveRecord, SpriteMapRecord, EvoLink, ID_SENTINEL, LINK_NONE,
};
use twilight_core::rom::{write_uint, GameVersion, RomOffsets};
use twilight_core::tables::{self, RomTables};

pub const APTITUDE_BY_STAGE: [u8; 5] = [12, 30, 45, 65, 90];

pub const FUSION_COUNT: usize = 8;
pub const SPRITE_COUNT: usize = 64;

pub fn dawn_offsets() -> RomOffsets {
    RomOffsets::for_version(GameVersion::Dawn)
}

pub fn load(rom: &[u8]) -> RomTables {
    tables::load_tables(rom, &dawn_offsets()).expect("synthetic image loads")
}

fn fill(rom: &mut [u8], start: usize, end: usize, byte: u8) {
    for slot in &mut rom[start..end] {
        *slot = byte;
    }
}

fn base_record(rom: &[u8], offset: usize, id: u16) -> BaseRecord {
    let stage = catalog::stage_of(id).expect("builder only emits catalog ids");
    let mut record = BaseRecord::decode(rom, offset).expect("decode scratch window");
    record.id = id;
    record.level = 3 + (id % 40) as u8;
    record.species = (id % 8) as u8;
    record.stats = [
        60 + id % 25,
        40 + id % 20,
        20 + id % 15,
        18 + id % 12,
        22 + id % 14,
        25 + id % 10,
    ];
    record.aptitude = APTITUDE_BY_STAGE[stage.index()];
    record.exp_curve = (id % 3) as u8;
    record.stat_type = (id % 7) as u8;
    for (i, slot) in record.resistances.iter_mut().enumerate() {
        *slot = 5 + ((id as usize + i * 3) % 16) as u16;
    }
    record.traits = [
        1 + (id % 16) as u8,
        1 + ((id / 3) % 16) as u8,
        0xFF,
        0xFF,
    ];
    record.support_trait = 1 + (id % 8) as u8;
    record.signature_move = 0x160 + id % 0x60;
    for (k, slot) in record.moves.iter_mut().enumerate() {
        *slot = 1 + (id * 4 + k as u16) % 0x15E;
    }
    record
}

fn enemy_record(rom: &[u8], offset: usize, id: u16) -> EnemyRecord {
    let base = base_record(rom, 0, id);
    let mut record = EnemyRecord::decode(rom, offset).expect("decode scratch window");
    record.id = id;
    record.level = 2 + (id % 50) as u8;
    record.species = base.species;
    record.stats = base.stats;
    record.resistances = base.resistances;
    for (i, slot) in record.traits.iter_mut().enumerate() {
        *slot = base.traits[i] as u16;
    }
    record.signature_move = base.signature_move;
    record.moves = base.moves;
    record.exp_yields = [0; 8];
    record.exp_yields[(id % 8) as usize] = 50 + id % 30;
    record
}

fn write_block_table<F>(rom: &mut [u8], start: usize, stride: usize, ids: &[u16], mut write: F)
where
    F: FnMut(&mut [u8], usize, u16),
{
    let mut block = start;
    let mut cursor = block + 4;
    for id in ids {
        if cursor + stride > block + 0x400 {
            block += 0x400;
            cursor = block + 4;
        }
        write(rom, cursor, *id);
        cursor += stride;
    }
}

pub fn build_test_rom() -> Vec<u8> {
    let offsets = dawn_offsets();
    let mut rom = vec![0u8; offsets.required_len()];
    rom[0x0C..0x10].copy_from_slice(b"A6RE");

    let ids = catalog::all_creature_ids();

    // Block-scanned regions read 0xFF as the end-of-block sentinel.
    fill(
        &mut rom,
        offsets.base_table.start,
        offsets.base_table.end + 0x400,
        0xFF,
    );
    fill(
        &mut rom,
        offsets.enemy_table.start,
        offsets.enemy_table.end + 0x400,
        0xFF,
    );

    write_block_table(
        &mut rom,
        offsets.base_table.start,
        BaseRecord::STRIDE,
        &ids,
        |rom, cursor, id| {
            let record = base_record(rom, cursor, id);
            record.write_all(rom).expect("base record fits");
        },
    );
    write_block_table(
        &mut rom,
        offsets.enemy_table.start,
        EnemyRecord::STRIDE,
        &ids,
        |rom, cursor, id| {
            let record = enemy_record(rom, cursor, id);
            record.write_all(rom).expect("enemy record fits");
        },
    );

    for index in 0..offsets.move_count {
        let offset = offsets.move_table + index * MoveRecord::STRIDE;
        let mut record = MoveRecord::decode(&rom, offset).expect("decode scratch window");
        record.element = (index % 8) as u8;
        record.mp_cost = 2 + (index % 10) as u8;
        record.power = 10 + (index % 90) as u16;
        record.level = 1 + (index % 60) as u8;
        record.effect = (index % 4) as u8;
        record.accuracy = 85 + (index % 15) as u16;
        record.write_all(&mut rom).expect("move record fits");
    }

    write_vanilla_evolutions(&mut rom, &offsets);
    write_fusions(&mut rom, &offsets);
    write_starters(&mut rom, &offsets);
    write_encounters(&mut rom, &offsets);
    write_items(&mut rom, &offsets);
    write_sprites(&mut rom, &offsets);
    write_battle_strings(&mut rom, &offsets);
    write_farm_plots(&mut rom, &offsets);

    rom
}

fn write_vanilla_evolutions(rom: &mut [u8], offsets: &RomOffsets) {
    // Chain each creature to the same-index creature of the next stage and
    // record the reciprocal de-evolution link.
    let mut promotion: Vec<(u16, u16)> = Vec::new();
    for stage in [Stage::InTraining, Stage::Rookie, Stage::Champion, Stage::Ultimate] {
        let current = catalog::stage_ids(stage);
        let next = catalog::stage_ids(stage.next().expect("not mega"));
        for (i, id) in current.iter().enumerate() {
            promotion.push((*id, next[i % next.len()]));
        }
    }

    for id in catalog::all_creature_ids() {
        let offset = offsets.evolution_table + id as usize * EvolutionRecord::STRIDE;
        let mut record = EvolutionRecord::decode(rom, offset, id).expect("decode scratch window");
        record.de_evolution = promotion
            .iter()
            .find(|(_, target)| *target == id)
            .map(|(source, _)| *source as u32)
            .unwrap_or(LINK_NONE);
        record.links = [EvoLink::NONE; 3];
        if let Some((_, target)) = promotion.iter().find(|(source, _)| *source == id) {
            let target_stage = catalog::stage_of(*target).expect("catalog id");
            let (lo, _) = catalog::condition_range(COND_LEVEL, target_stage).expect("level range");
            record.links[0] = EvoLink {
                target: *target as u32,
                conditions: [(COND_LEVEL, lo + 2), (0, 0), (0, 0)],
            };
        }
        record.write_all(rom).expect("evolution block fits");
    }
}

fn write_fusions(rom: &mut [u8], offsets: &RomOffsets) {
    let champions = catalog::stage_ids(Stage::Champion);
    let ultimates = catalog::stage_ids(Stage::Ultimate);
    for index in 0..FUSION_COUNT {
        let offset = offsets.fusion_table + index * FusionRecord::STRIDE;
        let mut record = FusionRecord::decode(rom, offset).expect("decode scratch window");
        record.input_a = champions[index * 2];
        record.input_b = champions[index * 2 + 1];
        record.result = ultimates[index];
        record.conditions = [(COND_LEVEL, 30), (COND_BOND, 55), (0, 0)];
        record.write_all(rom).expect("fusion record fits");
    }
    let sentinel = offsets.fusion_table + FUSION_COUNT * FusionRecord::STRIDE;
    write_uint(rom, sentinel, 2, ID_SENTINEL as u64).expect("fusion sentinel fits");
}

pub fn starter_slot_offset(offsets: &RomOffsets, pack: usize, slot: usize) -> usize {
    offsets.starter_table + (pack * 3 + slot) * 4
}

fn write_starters(rom: &mut [u8], offsets: &RomOffsets) {
    let rookies = catalog::stage_ids(Stage::Rookie);
    for pack in 0..4 {
        for slot in 0..3 {
            let offset = starter_slot_offset(offsets, pack, slot);
            let id = rookies[(pack * 3 + slot) % rookies.len()];
            // Pack 0 slot 0 starts above every rookie aptitude to exercise
            // the clamp.
            let level: u8 = if pack == 0 && slot == 0 { 99 } else { 8 + pack as u8 };
            write_uint(rom, offset, 2, id as u64).expect("starter id fits");
            write_uint(rom, offset + 2, 1, level as u64).expect("starter level fits");
        }
    }
}

pub fn encounter_slot_offset(offsets: &RomOffsets, area: usize, slot: usize) -> usize {
    offsets.encounter_table + area * 0x20 + slot * 4
}

fn write_encounters(rom: &mut [u8], offsets: &RomOffsets) {
    let rookies = catalog::stage_ids(Stage::Rookie);
    let champions = catalog::stage_ids(Stage::Champion);
    for area in 0..offsets.encounter_area_count {
        for slot in 0..8 {
            let offset = encounter_slot_offset(offsets, area, slot);
            let id = if slot < 4 {
                rookies[(area * 4 + slot) % rookies.len()]
            } else {
                champions[(area * 4 + slot - 4) % champions.len()]
            };
            write_uint(rom, offset, 2, id as u64).expect("encounter id fits");
            write_uint(rom, offset + 2, 1, 5 + area as u64).expect("encounter level fits");
            write_uint(rom, offset + 3, 1, 20 + slot as u64).expect("encounter rate fits");
        }
    }
}

fn write_items(rom: &mut [u8], offsets: &RomOffsets) {
    for index in 0..offsets.item_count {
        let offset = offsets.item_table + index * 4;
        let item = 0x3000 + (index % 20) as u64;
        write_uint(rom, offset, 2, item).expect("item id fits");
        write_uint(rom, offset + 2, 1, 1).expect("item qty fits");
    }
}

fn write_sprites(rom: &mut [u8], offsets: &RomOffsets) {
    for index in 0..SPRITE_COUNT {
        let offset = offsets.sprite_table + index * SpriteMapRecord::STRIDE;
        let mut record = SpriteMapRecord::decode(rom, offset).expect("decode scratch window");
        record.entity = index as u16 + 1;
        record.sprite = 100 + index as u16;
        record.palette = (index % 16) as u16;
        record.write_all(rom).expect("sprite record fits");
    }
    let sentinel = offsets.sprite_table + SPRITE_COUNT * SpriteMapRecord::STRIDE;
    write_uint(rom, sentinel, 2, ID_SENTINEL as u64).expect("sprite sentinel fits");
}

fn write_battle_strings(rom: &mut [u8], offsets: &RomOffsets) {
    for (id, name) in [(1u16, "Kuramon"), (2, "Koromon"), (3, "Tsunomon")] {
        let offset = offsets.battle_string_table + id as usize * BattleStringRecord::STRIDE;
        let mut record = BattleStringRecord::decode(rom, offset).expect("decode scratch window");
        record.bytes = [0; BattleStringRecord::STRIDE];
        record.bytes[..name.len()].copy_from_slice(name.as_bytes());
        record.write_all(rom).expect("battle string fits");
    }
}

fn write_farm_plots(rom: &mut [u8], offsets: &RomOffsets) {
    for index in 0..offsets.farm_count {
        let offset = offsets.farm_table + index * FarmTerrainRecord::STRIDE;
        let mut record = FarmTerrainRecord::decode(rom, offset).expect("decode scratch window");
        record.terrain = (index % 4) as u8;
        record.size = 1 + (index % 3) as u8;
        record.cost = 100 * index as u16;
        record.unlock_flag = index as u32;
        record.write_all(rom).expect("farm record fits");
    }
}

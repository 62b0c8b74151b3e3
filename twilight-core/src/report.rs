//! Evolution forest formatter for the spoiler log. Reconstruction only:
//! nothing here touches the buffer.

use crate::evolution::format_conditions;
use crate::records::LINK_NONE;
use crate::tables::RomTables;

/// Render the evolution graph as an indented forest. Roots are creatures
/// with no de-evolution link, in id order.
pub fn format_evolution_forest(tables: &RomTables) -> String {
    let mut out = String::new();

    let mut roots: Vec<u16> = tables
        .evolutions
        .iter()
        .filter(|(_, record)| record.de_evolution == LINK_NONE)
        .map(|(id, _)| *id)
        .collect();
    roots.sort_unstable();

    for root in roots {
        format_subtree(tables, root, 0, &mut out);
    }
    out
}

fn format_subtree(tables: &RomTables, id: u16, depth: usize, out: &mut String) {
    // A malformed graph could loop; the stage ladder bounds honest depth.
    if depth > 6 {
        return;
    }

    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&tables.creature_name(id));
    out.push('\n');

    let Some(record) = tables.evolutions.get(&id) else {
        return;
    };
    for link in &record.links {
        if link.target == LINK_NONE {
            continue;
        }
        let target = link.target as u16;
        for _ in 0..depth + 1 {
            out.push_str("  ");
        }
        out.push_str(&format!("[{}]\n", format_conditions(&link.conditions)));
        format_subtree(tables, target, depth + 1, out);
    }
}

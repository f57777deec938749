//! Evolution chain resolution.
//!
//! The chain is a strict tree (one root, no cycles), at most a handful of
//! stages deep, so a plain recursive walk is used throughout.

use crate::pokemon::{display_name, ChainLink, EvolutionDetail, Pokemon};
use serde::Serialize;
use std::collections::HashMap;

/// A renderable stage of an evolution line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub sprite: Option<String>,
    pub types: Vec<String>,
    /// How this stage is reached from its parent; `None` for the root.
    pub method: Option<String>,
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Stage names in depth-first order.
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        for child in &self.evolves_to {
            names.extend(child.names());
        }
        names
    }

    pub fn depth(&self) -> usize {
        1 + self.evolves_to.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

/// Every species name in the chain, depth-first, lowercase, without repeats.
pub fn species_names(chain: &ChainLink) -> Vec<String> {
    fn walk(link: &ChainLink, out: &mut Vec<String>) {
        let name = link.species.name.to_lowercase();
        if !out.contains(&name) {
            out.push(name);
        }
        for child in &link.evolves_to {
            walk(child, out);
        }
    }

    let mut names = Vec::new();
    walk(chain, &mut names);
    names
}

/// Label for the edge into a stage, built from its first condition record.
///
/// Returns `None` when the edge carries no condition record at all (the
/// root), and "Unknown method" when a record is present but none of the
/// recognised fields are set.
pub fn method_label(details: &[EvolutionDetail]) -> Option<String> {
    let detail = details.first()?;
    let mut clauses = Vec::new();

    if let Some(level) = detail.min_level.filter(|l| *l > 0) {
        clauses.push(format!("Level {}", level));
    }
    if let Some(item) = &detail.item {
        clauses.push(format!("Use {}", display_name(&item.name)));
    }
    if let Some(item) = &detail.held_item {
        clauses.push(format!("Hold {}", display_name(&item.name)));
    }
    if let Some(known) = &detail.known_move {
        clauses.push(format!("Know {}", display_name(&known.name)));
    }
    if let Some(happiness) = detail.min_happiness.filter(|h| *h > 0) {
        clauses.push(format!("Happiness {}+", happiness));
    }
    if let Some(beauty) = detail.min_beauty.filter(|b| *b > 0) {
        clauses.push(format!("Beauty {}+", beauty));
    }
    if !detail.time_of_day.is_empty() {
        clauses.push(format!("{} time", detail.time_of_day));
    }
    if let Some(location) = &detail.location {
        clauses.push(format!("At {}", display_name(&location.name)));
    }
    if let Some(species) = &detail.trade_species {
        clauses.push(format!("Trade for {}", species.name));
    }
    if detail.trigger.name == "trade" {
        clauses.push("Trade".to_string());
    }

    if clauses.is_empty() {
        Some("Unknown method".to_string())
    } else {
        Some(clauses.join(", "))
    }
}

/// Builds the display tree for `chain`.
///
/// Stages whose species is missing from `lookup` are dropped together with
/// their descendants. Returns `None` if the root itself is missing.
pub fn resolve_tree(chain: &ChainLink, lookup: &HashMap<String, Pokemon>) -> Option<EvolutionNode> {
    resolve_link(chain, lookup, None)
}

fn resolve_link(
    link: &ChainLink,
    lookup: &HashMap<String, Pokemon>,
    method: Option<String>,
) -> Option<EvolutionNode> {
    let name = link.species.name.to_lowercase();
    let Some(pokemon) = lookup.get(&name) else {
        tracing::debug!("No Pokémon data for evolution stage {}; omitting", name);
        return None;
    };

    let evolves_to = link
        .evolves_to
        .iter()
        .filter_map(|child| resolve_link(child, lookup, method_label(&child.evolution_details)))
        .collect();

    Some(EvolutionNode {
        id: pokemon.id,
        name: pokemon.name.clone(),
        sprite: pokemon.artwork().map(str::to_string),
        types: pokemon.type_names().into_iter().map(str::to_string).collect(),
        method,
        evolves_to,
    })
}

//! Plain-text rendering of an aggregated result, one tab at a time.

use crate::aggregator::AggregatedResult;
use crate::catalog::{sort_cards, CardSort};
use crate::evolution::EvolutionNode;
use crate::moves::MovePage;
use crate::overview;
use crate::pokemon::display_name;
use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Overview,
    Evolution,
    Gallery,
    Moves,
    Matchups,
    Locations,
    Cards,
    All,
}

fn title(name: &str) -> String {
    display_name(name)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a tab writer against a fresh buffer. Writing into a `String` only
/// fails if a `Display` impl does, which yields an empty tab.
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    match write(&mut out) {
        Ok(()) => out,
        Err(e) => {
            tracing::error!("Failed to render tab: {}", e);
            String::new()
        }
    }
}

fn heading(out: &mut String, text: &str) -> fmt::Result {
    writeln!(out, "\n== {} ==", text)
}

pub fn overview(result: &AggregatedResult) -> String {
    render(|out| write_overview(out, result))
}

fn write_overview(out: &mut String, result: &AggregatedResult) -> fmt::Result {
    let pokemon = &result.pokemon;
    let species = &result.species;

    writeln!(out, "{}  #{:04}", title(&pokemon.name), pokemon.id)?;
    if let Some(genus) = overview::genus(species) {
        writeln!(out, "{}", genus)?;
    }
    let types: Vec<&str> = pokemon.type_names();
    writeln!(out, "Types: {}", types.join(" / "))?;
    writeln!(
        out,
        "Height: {:.1} m   Weight: {:.1} kg   Base experience: {}",
        pokemon.height as f64 / 10.0,
        pokemon.weight as f64 / 10.0,
        pokemon
            .base_experience
            .map_or_else(|| "-".to_string(), |xp| xp.to_string())
    )?;
    if let Some(text) = overview::description(species) {
        writeln!(out, "\n{}", text)?;
    }

    heading(out, "Base Stats")?;
    let max = overview::max_stat(pokemon).max(1);
    for stat in &pokemon.stats {
        let bar = "#".repeat((stat.base_stat * 30 / max) as usize);
        writeln!(out, "{:<16} {:>3} {}", display_name(&stat.stat.name), stat.base_stat, bar)?;
    }
    writeln!(out, "{:<16} {:>3}", "total", overview::stat_total(pokemon))?;

    heading(out, "Abilities")?;
    for detail in &result.abilities {
        let hidden = if detail.reference.is_hidden { " (hidden)" } else { "" };
        writeln!(out, "- {}{}", display_name(&detail.reference.ability.name), hidden)?;
        if let Some(effect) = overview::short_effect(&detail.ability) {
            writeln!(out, "    {}", effect)?;
        }
    }

    heading(out, "Breeding")?;
    let groups: Vec<String> = species.egg_groups.iter().map(|g| display_name(&g.name)).collect();
    writeln!(out, "Egg groups: {}", groups.join(", "))?;
    writeln!(out, "Gender: {}", overview::gender_ratio(species))?;
    if let Some(steps) = overview::hatch_steps(species) {
        writeln!(out, "Hatch counter: {} steps", steps)?;
    }
    writeln!(out, "Capture rate: {}", species.capture_rate)?;
    if let Some(happiness) = species.base_happiness {
        writeln!(out, "Base happiness: {}", happiness)?;
    }
    if let Some(growth) = &species.growth_rate {
        writeln!(out, "Growth rate: {}", display_name(&growth.name))?;
    }
    writeln!(
        out,
        "Compatible partners ({}): {}",
        result.breeding_partners.len(),
        result.breeding_partners.join(", ")
    )?;

    heading(out, "Battle Strategy")?;
    writeln!(out, "Role: {:?} attacker", overview::battle_role(pokemon))?;
    let best: Vec<String> = overview::best_stats(pokemon)
        .into_iter()
        .map(|(name, _)| display_name(name))
        .collect();
    writeln!(out, "Best stats: {}", best.join(", "))?;
    writeln!(out, "Type coverage: use {} type moves", types.join(" and "))?;
    if let Some(primary) = pokemon.abilities.first() {
        writeln!(out, "Primary ability: {}", display_name(&primary.ability.name))?;
    }

    let mut flags = Vec::new();
    if species.is_legendary {
        flags.push("legendary");
    }
    if species.is_mythical {
        flags.push("mythical");
    }
    if species.is_baby {
        flags.push("baby");
    }
    if !flags.is_empty() {
        writeln!(out, "\nStatus: {}", flags.join(", "))?;
    }
    Ok(())
}

pub fn evolution(result: &AggregatedResult) -> String {
    render(|out| {
        heading(out, "Evolution Chain")?;
        match result.evolution.as_ref().and_then(|e| e.tree.as_ref()) {
            Some(tree) => write_stage(out, tree, 0),
            None => writeln!(out, "This Pokémon does not evolve."),
        }
    })
}

fn write_stage(out: &mut String, node: &EvolutionNode, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    let types = node.types.join(" / ");
    match &node.method {
        Some(method) => writeln!(out, "{}└─ ({}) {} #{} [{}]", indent, method, title(&node.name), node.id, types)?,
        None => writeln!(out, "{}{} #{} [{}]", indent, title(&node.name), node.id, types)?,
    }
    for child in &node.evolves_to {
        write_stage(out, child, depth + 1)?;
    }
    Ok(())
}

pub fn gallery(result: &AggregatedResult) -> String {
    render(|out| {
        heading(out, "Gallery")?;
        for sprite in overview::gallery(&result.pokemon.sprites) {
            writeln!(out, "[{:?}] {}: {}", sprite.category, sprite.label, sprite.url)?;
        }

        if result.forms.len() > 1 {
            heading(out, "Alternate Forms")?;
            for form in &result.forms {
                write!(out, "- {} (#{}) [{}]", title(&form.name), form.id, form.type_names().join(" / "))?;
                match form.artwork() {
                    Some(url) => writeln!(out, ": {}", url)?,
                    None => writeln!(out)?,
                }
            }
        }
        Ok(())
    })
}

pub fn moves(page: &MovePage<'_>) -> String {
    render(|out| {
        heading(out, "Moves")?;
        if page.total == 0 {
            return writeln!(out, "No moves match.");
        }

        writeln!(
            out,
            "{:<20} {:<10} {:<9} {:>5} {:>5} {:>3}  {}",
            "name", "type", "category", "power", "acc", "pp", "learned"
        )?;
        let dash = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        for entry in &page.moves {
            let learned = entry
                .latest_learn()
                .map(|l| match l.level_learned_at {
                    0 => display_name(&l.move_learn_method.name),
                    level => format!("level {}", level),
                })
                .unwrap_or_default();
            writeln!(
                out,
                "{:<20} {:<10} {:<9} {:>5} {:>5} {:>3}  {}",
                display_name(&entry.name),
                entry.type_name,
                entry.category.map(|c| c.to_string()).unwrap_or_default(),
                dash(entry.power),
                dash(entry.accuracy),
                dash(entry.pp),
                learned
            )?;
        }
        writeln!(out, "Page {} of {} ({} moves)", page.page, page.page_count, page.total)
    })
}

pub fn matchups(result: &AggregatedResult) -> String {
    let m = &result.matchups;
    let list = |entries: Vec<(&str, f32)>| {
        entries
            .into_iter()
            .map(|(name, mult)| format!("{} x{}", name, mult))
            .collect::<Vec<_>>()
            .join(", ")
    };
    render(|out| {
        heading(out, "Type Matchups")?;
        writeln!(out, "Weak to: {}", list(m.weaknesses()))?;
        writeln!(out, "Resists: {}", list(m.resistances()))?;
        writeln!(out, "Immune to: {}", m.immunities().join(", "))?;
        writeln!(out, "Super effective against: {}", list(m.super_effective()))
    })
}

pub fn locations(result: &AggregatedResult) -> String {
    render(|out| {
        heading(out, "Locations")?;
        let summary = overview::encounter_summary(&result.encounters);
        if summary.is_empty() {
            writeln!(out, "Not found in the wild.")?;
        }
        for place in summary {
            writeln!(out, "- {} ({}%): {}", place.location, place.max_chance, place.versions.join(", "))?;
        }
        Ok(())
    })
}

pub fn cards(result: &AggregatedResult, order: CardSort) -> String {
    render(|out| {
        heading(out, &format!("Trading Cards ({})", result.cards.len()))?;
        if result.cards.is_empty() {
            return writeln!(out, "No trading cards found.");
        }

        let mut cards = result.cards.clone();
        sort_cards(&mut cards, order);
        for card in &cards {
            let price = card.price();
            write!(out, "- {} | {}", card.name, card.set.name)?;
            if let Some(date) = &card.set.release_date {
                write!(out, " ({})", date)?;
            }
            if let Some(rarity) = &card.rarity {
                write!(out, " | {}", rarity)?;
            }
            if price > 0.0 {
                write!(out, " | ${:.2}", price)?;
            }
            writeln!(out)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title("mr-mime"), "Mr Mime");
        assert_eq!(title("pikachu"), "Pikachu");
    }

    #[test]
    fn test_stage_tree_indents_children() {
        let leaf = EvolutionNode {
            id: 26,
            name: "raichu".to_string(),
            sprite: None,
            types: vec!["electric".to_string()],
            method: Some("Use thunder stone".to_string()),
            evolves_to: Vec::new(),
        };
        let root = EvolutionNode {
            id: 25,
            name: "pikachu".to_string(),
            sprite: None,
            types: vec!["electric".to_string()],
            method: None,
            evolves_to: vec![leaf],
        };

        let mut out = String::new();
        write_stage(&mut out, &root, 0).unwrap();
        assert_eq!(
            out,
            "Pikachu #25 [electric]\n    └─ (Use thunder stone) Raichu #26 [electric]\n"
        );
    }
}

//! Derived facts shown on the overview and gallery tabs.

use crate::pokemon::{english, display_name, Ability, LocationAreaEncounter, Pokemon, Species, Sprites};
use serde::Serialize;

/// English flavor text with the API's embedded form feeds and line breaks
/// flattened to spaces.
pub fn description(species: &Species) -> Option<String> {
    english(&species.flavor_text_entries, |e| e.language.name.as_str()).map(|entry| {
        entry
            .flavor_text
            .split(['\u{c}', '\n', '\r'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    })
}

pub fn genus(species: &Species) -> Option<&str> {
    english(&species.genera, |g| g.language.name.as_str()).map(|g| g.genus.as_str())
}

pub fn stat_total(pokemon: &Pokemon) -> u32 {
    pokemon.stats.iter().map(|s| s.base_stat).sum()
}

pub fn max_stat(pokemon: &Pokemon) -> u32 {
    pokemon.stats.iter().map(|s| s.base_stat).max().unwrap_or(0)
}

/// "Genderless", or the female / male split from the rate in eighths.
pub fn gender_ratio(species: &Species) -> String {
    if species.is_genderless() {
        return "Genderless".to_string();
    }
    let female = species.gender_rate as f64 / 8.0 * 100.0;
    format!("♀ {}% / ♂ {}%", female, 100.0 - female)
}

pub fn hatch_steps(species: &Species) -> Option<u32> {
    species.hatch_counter.map(|counter| counter * 255)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleRole {
    Physical,
    Special,
}

pub fn battle_role(pokemon: &Pokemon) -> BattleRole {
    let attack = pokemon.base_stat("attack").unwrap_or(0);
    let special = pokemon.base_stat("special-attack").unwrap_or(0);
    if attack > special {
        BattleRole::Physical
    } else {
        BattleRole::Special
    }
}

/// The two highest base stats, highest first; ties keep API order.
pub fn best_stats(pokemon: &Pokemon) -> Vec<(&str, u32)> {
    let mut stats: Vec<(&str, u32)> = pokemon
        .stats
        .iter()
        .map(|s| (s.stat.name.as_str(), s.base_stat))
        .collect();
    stats.sort_by(|a, b| b.1.cmp(&a.1));
    stats.truncate(2);
    stats
}

pub fn short_effect(ability: &Ability) -> Option<&str> {
    english(&ability.effect_entries, |e| e.language.name.as_str()).map(|e| e.short_effect.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteCategory {
    Official,
    Shiny,
    Home,
    Game,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GallerySprite {
    pub url: String,
    pub label: &'static str,
    pub category: SpriteCategory,
}

/// Every available sprite, labelled and grouped for the gallery.
pub fn gallery(sprites: &Sprites) -> Vec<GallerySprite> {
    use SpriteCategory::*;

    let art = &sprites.other.official_artwork;
    let home = &sprites.other.home;
    let showdown = &sprites.other.showdown;
    let candidates: [(&Option<String>, &'static str, SpriteCategory); 21] = [
        (&art.front_default, "Official Artwork", Official),
        (&art.front_shiny, "Official Artwork (Shiny)", Shiny),
        (&home.front_default, "Home (Default)", Home),
        (&home.front_shiny, "Home (Shiny)", Shiny),
        (&home.front_female, "Home (Female)", Home),
        (&home.front_shiny_female, "Home (Shiny Female)", Shiny),
        (&sprites.other.dream_world.front_default, "Dream World", Official),
        (&sprites.front_default, "Front (Default)", Game),
        (&sprites.front_shiny, "Front (Shiny)", Shiny),
        (&sprites.front_female, "Front (Female)", Game),
        (&sprites.front_shiny_female, "Front (Shiny Female)", Shiny),
        (&sprites.back_default, "Back (Default)", Game),
        (&sprites.back_shiny, "Back (Shiny)", Shiny),
        (&sprites.back_female, "Back (Female)", Game),
        (&sprites.back_shiny_female, "Back (Shiny Female)", Shiny),
        (&showdown.front_default, "Showdown (Front)", Game),
        (&showdown.front_shiny, "Showdown (Shiny)", Shiny),
        (&showdown.back_default, "Showdown (Back)", Game),
        (&showdown.back_shiny, "Showdown (Back Shiny)", Shiny),
        (&showdown.front_female, "Showdown (Female)", Game),
        (&showdown.front_shiny_female, "Showdown (Shiny Female)", Shiny),
    ];

    candidates
        .into_iter()
        .filter_map(|(url, label, category)| {
            url.as_ref().map(|url| GallerySprite {
                url: url.clone(),
                label,
                category,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterSummary {
    pub location: String,
    pub versions: Vec<String>,
    pub max_chance: u32,
}

pub fn encounter_summary(encounters: &[LocationAreaEncounter]) -> Vec<EncounterSummary> {
    encounters
        .iter()
        .map(|encounter| EncounterSummary {
            location: display_name(&encounter.location_area.name),
            versions: encounter
                .version_details
                .iter()
                .map(|v| v.version.name.clone())
                .collect(),
            max_chance: encounter
                .version_details
                .iter()
                .map(|v| v.max_chance)
                .max()
                .unwrap_or(0),
        })
        .collect()
}

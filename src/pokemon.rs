// pokemon.rs
// Records returned by the PokeAPI catalog service. Only the fields this crate
// reads are modelled; unknown fields are ignored by serde.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NamedAPIResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct APIResource {
    pub url: String,
}

/// The creature record (`/pokemon/{id or name}`).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub base_experience: Option<u32>,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
    #[serde(default)]
    pub moves: Vec<PokemonMove>,
    pub species: NamedAPIResource,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub cries: Option<Cries>,
}

impl Pokemon {
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.r#type.name.as_str()).collect()
    }

    pub fn base_stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
    }

    /// Official artwork when available, otherwise the default game sprite.
    pub fn artwork(&self) -> Option<&str> {
        self.sprites
            .other
            .official_artwork
            .front_default
            .as_deref()
            .or(self.sprites.front_default.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PokemonAbility {
    #[serde(default)]
    pub is_hidden: bool,
    pub slot: u32,
    pub ability: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PokemonMove {
    pub r#move: NamedAPIResource,
    #[serde(default)]
    pub version_group_details: Vec<MoveLearnDetail>,
}

/// How and when a creature learns a move in one version group.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoveLearnDetail {
    pub level_learned_at: u32,
    pub move_learn_method: NamedAPIResource,
    pub version_group: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PokemonStat {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PokemonType {
    pub slot: u32,
    pub r#type: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Cries {
    pub latest: Option<String>,
    pub legacy: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub front_female: Option<String>,
    pub front_shiny_female: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
    pub back_female: Option<String>,
    pub back_shiny_female: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: SpriteSet,
    #[serde(default)]
    pub home: SpriteSet,
    #[serde(default)]
    pub dream_world: SpriteSet,
    #[serde(default)]
    pub showdown: SpriteSet,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SpriteSet {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub front_female: Option<String>,
    pub front_shiny_female: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
}

/// Species record (`/pokemon-species/{id}`).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Species {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub genera: Vec<Genus>,
    #[serde(default)]
    pub egg_groups: Vec<NamedAPIResource>,
    /// Chance of being female in eighths, or -1 for genderless.
    pub gender_rate: i32,
    pub capture_rate: u32,
    pub base_happiness: Option<u32>,
    pub hatch_counter: Option<u32>,
    pub growth_rate: Option<NamedAPIResource>,
    pub generation: NamedAPIResource,
    pub evolution_chain: Option<APIResource>,
    #[serde(default)]
    pub varieties: Vec<Variety>,
    #[serde(default)]
    pub is_legendary: bool,
    #[serde(default)]
    pub is_mythical: bool,
    #[serde(default)]
    pub is_baby: bool,
    pub habitat: Option<NamedAPIResource>,
    pub color: Option<NamedAPIResource>,
    pub shape: Option<NamedAPIResource>,
}

impl Species {
    pub fn is_genderless(&self) -> bool {
        self.gender_rate < 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedAPIResource,
    pub version: Option<NamedAPIResource>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Genus {
    pub genus: String,
    pub language: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Variety {
    pub is_default: bool,
    pub pokemon: NamedAPIResource,
}

/// Evolution chain (`/evolution-chain/{id}`). The `chain` link is the root.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EvolutionChain {
    pub id: u32,
    pub chain: ChainLink,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainLink {
    #[serde(default)]
    pub is_baby: bool,
    pub species: NamedAPIResource,
    /// Conditions on the edge leading into this link; empty for the root.
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EvolutionDetail {
    pub item: Option<NamedAPIResource>,
    pub trigger: NamedAPIResource,
    pub gender: Option<i32>,
    pub held_item: Option<NamedAPIResource>,
    pub known_move: Option<NamedAPIResource>,
    pub known_move_type: Option<NamedAPIResource>,
    pub location: Option<NamedAPIResource>,
    pub min_level: Option<u32>,
    pub min_happiness: Option<u32>,
    pub min_beauty: Option<u32>,
    pub min_affection: Option<u32>,
    #[serde(default)]
    pub needs_overworld_rain: bool,
    pub party_species: Option<NamedAPIResource>,
    pub party_type: Option<NamedAPIResource>,
    pub relative_physical_stats: Option<i32>,
    #[serde(default)]
    pub time_of_day: String,
    pub trade_species: Option<NamedAPIResource>,
    #[serde(default)]
    pub turn_upside_down: bool,
}

/// Ability record (`/ability/{id}`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ability {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub effect_entries: Vec<VerboseEffect>,
    pub generation: Option<NamedAPIResource>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerboseEffect {
    pub effect: String,
    pub short_effect: String,
    pub language: NamedAPIResource,
}

/// Egg group record (`/egg-group/{id}`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EggGroup {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub pokemon_species: Vec<NamedAPIResource>,
}

/// Type record (`/type/{name}`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TypeRecord {
    pub id: u32,
    pub name: String,
    pub damage_relations: DamageRelations,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DamageRelations {
    #[serde(default)]
    pub no_damage_to: Vec<NamedAPIResource>,
    #[serde(default)]
    pub half_damage_to: Vec<NamedAPIResource>,
    #[serde(default)]
    pub double_damage_to: Vec<NamedAPIResource>,
    #[serde(default)]
    pub no_damage_from: Vec<NamedAPIResource>,
    #[serde(default)]
    pub half_damage_from: Vec<NamedAPIResource>,
    #[serde(default)]
    pub double_damage_from: Vec<NamedAPIResource>,
}

/// Move record (`/move/{id}`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Move {
    pub id: u32,
    pub name: String,
    pub accuracy: Option<u32>,
    pub power: Option<u32>,
    pub pp: Option<u32>,
    #[serde(default)]
    pub priority: i32,
    pub r#type: NamedAPIResource,
    pub damage_class: Option<NamedAPIResource>,
    pub target: Option<NamedAPIResource>,
    pub meta: Option<MoveMeta>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MoveMeta {
    pub ailment: Option<NamedAPIResource>,
    pub category: Option<NamedAPIResource>,
    pub min_hits: Option<u32>,
    pub max_hits: Option<u32>,
    #[serde(default)]
    pub drain: i32,
    #[serde(default)]
    pub healing: i32,
    #[serde(default)]
    pub crit_rate: i32,
    #[serde(default)]
    pub ailment_chance: u32,
    #[serde(default)]
    pub flinch_chance: u32,
    #[serde(default)]
    pub stat_chance: u32,
}

/// One entry of `/pokemon/{id}/encounters`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocationAreaEncounter {
    pub location_area: NamedAPIResource,
    #[serde(default)]
    pub version_details: Vec<VersionEncounterDetail>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VersionEncounterDetail {
    pub max_chance: u32,
    pub version: NamedAPIResource,
}

/// API names use hyphens between words ("thunder-stone").
pub fn display_name(api_name: &str) -> String {
    api_name.replace('-', " ")
}

pub fn english<'a, T>(entries: &'a [T], language: impl Fn(&T) -> &str) -> Option<&'a T> {
    entries.iter().find(|entry| language(entry) == "en")
}

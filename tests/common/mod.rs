//! Test utilities & fixtures.
//! An in-memory [`Transport`] serving canned PokeAPI documents for the
//! Pichu → Pikachu → Raichu line.

#![allow(dead_code)]

pub mod http;

use pokedex_explorer::catalog::{CardCatalog, TradingCard};
use pokedex_explorer::{AppError, Aggregator, PokeApiClient, Result, Transport};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BASE: &str = "https://pokeapi.test/api/v2";

pub fn url(path: &str) -> String {
    format!("{}/{}", BASE, path)
}

#[derive(Default)]
pub struct FakeTransport {
    documents: Mutex<HashMap<String, Value>>,
    assets: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    requests: AtomicUsize,
}

impl FakeTransport {
    pub fn with_document(mut self, url: String, value: Value) -> Self {
        self.documents.get_mut().unwrap().insert(url, value);
        self
    }

    #[allow(dead_code)]
    pub fn with_asset(mut self, url: &str, bytes: &[u8]) -> Self {
        self.assets.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// Requests for `url` fail as if the service were down.
    #[allow(dead_code)]
    pub fn failing(mut self, url: String) -> Self {
        self.failing.insert(url);
        self
    }

    #[allow(dead_code)]
    pub fn without(mut self, url: &str) -> Self {
        self.documents.get_mut().unwrap().remove(url);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(url) {
            return Err(AppError::Unavailable(format!("{} answered with status 503", url)));
        }
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NotFound(url.to_string()))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NotFound(url.to_string()))
    }
}

fn named(name: &str, path: &str) -> Value {
    json!({"name": name, "url": url(path)})
}

fn creature(id: u32, name: &str, types: &[&str], moves: Value) -> Value {
    let types: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"slot": i + 1, "type": named(t, &format!("type/{}", t))}))
        .collect();
    json!({
        "id": id,
        "name": name,
        "base_experience": 112,
        "height": 4,
        "weight": 60,
        "is_default": true,
        "species": named(name, &format!("pokemon-species/{}/", id)),
        "abilities": [
            {"is_hidden": false, "slot": 1, "ability": named("static", "ability/9/")},
            {"is_hidden": true, "slot": 3, "ability": named("lightning-rod", "ability/31/")}
        ],
        "moves": moves,
        "stats": [
            {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": ""}},
            {"base_stat": 55, "effort": 0, "stat": {"name": "attack", "url": ""}},
            {"base_stat": 40, "effort": 0, "stat": {"name": "defense", "url": ""}},
            {"base_stat": 50, "effort": 0, "stat": {"name": "special-attack", "url": ""}},
            {"base_stat": 50, "effort": 0, "stat": {"name": "special-defense", "url": ""}},
            {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": ""}}
        ],
        "types": types,
        "sprites": {
            "front_default": format!("https://sprites.test/{}.png", id),
            "front_shiny": format!("https://sprites.test/shiny/{}.png", id),
            "other": {"official-artwork": {"front_default": format!("https://sprites.test/art/{}.png", id)}}
        },
        "cries": {"latest": format!("https://cries.test/{}.ogg", id), "legacy": null}
    })
}

fn learned(level: u32, method: &str) -> Value {
    json!([{
        "level_learned_at": level,
        "move_learn_method": {"name": method, "url": ""},
        "version_group": {"name": "scarlet-violet", "url": ""}
    }])
}

fn pikachu_moves() -> Value {
    json!([
        {"move": named("thunder-shock", "move/84/"), "version_group_details": learned(1, "level-up")},
        {"move": named("quick-attack", "move/98/"), "version_group_details": learned(1, "level-up")},
        {"move": named("thunderbolt", "move/85/"), "version_group_details": learned(0, "machine")},
        {"move": named("growl", "move/45/"), "version_group_details": learned(1, "level-up")},
        {"move": named("thunder-shock", "move/84/"), "version_group_details": learned(0, "tutor")}
    ])
}

#[allow(clippy::too_many_arguments)]
fn move_doc(
    id: u32,
    name: &str,
    type_name: &str,
    class: &str,
    power: Option<u32>,
    accuracy: Option<u32>,
    pp: u32,
    priority: i32,
) -> Value {
    let ailment = if name.starts_with("thunder") { "paralysis" } else { "none" };
    json!({
        "id": id,
        "name": name,
        "power": power,
        "accuracy": accuracy,
        "pp": pp,
        "priority": priority,
        "type": named(type_name, &format!("type/{}", type_name)),
        "damage_class": {"name": class, "url": ""},
        "target": {"name": "selected-pokemon", "url": ""},
        "meta": {"ailment": {"name": ailment, "url": ""}, "drain": 0, "healing": 0, "crit_rate": 0, "flinch_chance": 0}
    })
}

fn species(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "gender_rate": 4,
        "capture_rate": 190,
        "base_happiness": 50,
        "hatch_counter": 10,
        "is_baby": name == "pichu",
        "growth_rate": {"name": "medium", "url": ""},
        "generation": {"name": "generation-i", "url": ""},
        "evolution_chain": {"url": url("evolution-chain/10/")},
        "egg_groups": [named("ground", "egg-group/5/"), named("fairy", "egg-group/6/")],
        "genera": [
            {"genus": "Souris", "language": {"name": "fr", "url": ""}},
            {"genus": "Mouse Pokémon", "language": {"name": "en", "url": ""}}
        ],
        "flavor_text_entries": [
            {"flavor_text": "When several of\nthese POKéMON gather,\u{c}their electricity could\nbuild and cause lightning storms.", "language": {"name": "en", "url": ""}}
        ],
        "varieties": [
            {"is_default": true, "pokemon": named(name, &format!("pokemon/{}/", id))}
        ]
    })
}

/// Every document needed to aggregate Pikachu.
pub fn pokeapi() -> FakeTransport {
    let pikachu = creature(25, "pikachu", &["electric"], pikachu_moves());
    let mut pikachu_species = species(25, "pikachu");
    pikachu_species["varieties"] = json!([
        {"is_default": true, "pokemon": named("pikachu", "pokemon/25/")},
        {"is_default": false, "pokemon": named("pikachu-rock-star", "pokemon/10080/")}
    ]);

    FakeTransport::default()
        .with_document(url("pokemon/pikachu"), pikachu.clone())
        .with_document(url("pokemon/25"), pikachu.clone())
        .with_document(url("pokemon/25/"), pikachu)
        .with_document(url("pokemon/10080/"), creature(10080, "pikachu-rock-star", &["electric"], json!([])))
        .with_document(url("pokemon/pichu"), creature(172, "pichu", &["electric"], json!([])))
        .with_document(url("pokemon/raichu"), creature(26, "raichu", &["electric"], json!([])))
        .with_document(url("pokemon-species/25/"), pikachu_species)
        .with_document(url("pokemon-species/172/"), species(172, "pichu"))
        .with_document(url("pokemon-species/26/"), species(26, "raichu"))
        .with_document(
            url("evolution-chain/10/"),
            json!({
                "id": 10,
                "chain": {
                    "is_baby": true,
                    "species": named("pichu", "pokemon-species/172/"),
                    "evolution_details": [],
                    "evolves_to": [{
                        "is_baby": false,
                        "species": named("pikachu", "pokemon-species/25/"),
                        "evolution_details": [{
                            "trigger": {"name": "level-up", "url": ""},
                            "min_happiness": 220,
                            "time_of_day": ""
                        }],
                        "evolves_to": [{
                            "is_baby": false,
                            "species": named("raichu", "pokemon-species/26/"),
                            "evolution_details": [{
                                "trigger": {"name": "use-item", "url": ""},
                                "item": {"name": "thunder-stone", "url": ""},
                                "time_of_day": ""
                            }],
                            "evolves_to": []
                        }]
                    }]
                }
            }),
        )
        .with_document(
            url("ability/9/"),
            json!({
                "id": 9,
                "name": "static",
                "effect_entries": [{
                    "effect": "Whenever a move makes contact with this Pokémon, the move's user has a 30% chance of being paralyzed.",
                    "short_effect": "Has a 30% chance of paralyzing attacking Pokémon on contact.",
                    "language": {"name": "en", "url": ""}
                }]
            }),
        )
        .with_document(url("ability/31/"), json!({"id": 31, "name": "lightning-rod", "effect_entries": []}))
        .with_document(
            url("egg-group/5/"),
            json!({"id": 5, "name": "ground", "pokemon_species": [
                {"name": "pikachu"}, {"name": "sandshrew"}, {"name": "raichu"}, {"name": "eevee"}
            ]}),
        )
        .with_document(
            url("egg-group/6/"),
            json!({"id": 6, "name": "fairy", "pokemon_species": [
                {"name": "clefairy"}, {"name": "pikachu"}, {"name": "raichu"}
            ]}),
        )
        .with_document(
            url("type/electric"),
            json!({
                "id": 13,
                "name": "electric",
                "damage_relations": {
                    "double_damage_from": [{"name": "ground"}],
                    "half_damage_from": [{"name": "flying"}, {"name": "steel"}, {"name": "electric"}],
                    "no_damage_from": [],
                    "double_damage_to": [{"name": "water"}, {"name": "flying"}],
                    "half_damage_to": [{"name": "grass"}, {"name": "electric"}, {"name": "dragon"}],
                    "no_damage_to": [{"name": "ground"}]
                }
            }),
        )
        .with_document(url("move/84/"), move_doc(84, "thunder-shock", "electric", "special", Some(40), Some(100), 30, 0))
        .with_document(url("move/98/"), move_doc(98, "quick-attack", "normal", "physical", Some(40), Some(100), 30, 1))
        .with_document(url("move/85/"), move_doc(85, "thunderbolt", "electric", "special", Some(90), Some(100), 15, 0))
        .with_document(url("move/45/"), move_doc(45, "growl", "normal", "status", None, Some(100), 40, 0))
        .with_document(
            url("pokemon/25/encounters"),
            json!([{
                "location_area": {"name": "viridian-forest-area", "url": ""},
                "version_details": [
                    {"max_chance": 5, "version": {"name": "red", "url": ""}},
                    {"max_chance": 10, "version": {"name": "yellow", "url": ""}}
                ]
            }]),
        )
}

pub fn cards() -> Vec<TradingCard> {
    serde_json::from_value(json!([
        {"id": "base1-58", "name": "Pikachu", "set": {"id": "base1", "name": "Base", "releaseDate": "1999/01/09"},
         "tcgplayer": {"prices": {"normal": {"market": 6.12}}}},
        {"id": "swsh4-188", "name": "Pikachu VMAX", "set": {"id": "swsh4", "name": "Vivid Voltage", "releaseDate": "2020/11/13"},
         "tcgplayer": {"prices": {"holofoil": {"market": 312.4}}}},
        {"id": "base1-14", "name": "Raichu", "set": {"id": "base1", "name": "Base", "releaseDate": "1999/01/09"}},
        {"id": "sm115-19", "name": "Dark Pikachu", "set": {"id": "sm115", "name": "Hidden Fates", "releaseDate": "2019/08/23"},
         "cardmarket": {"prices": {"averageSellPrice": 0.0, "avg30": 2.5}}}
    ]))
    .unwrap()
}

pub fn build_aggregator(transport: FakeTransport) -> (Aggregator<FakeTransport>, Arc<FakeTransport>) {
    let transport = Arc::new(transport);
    let client = PokeApiClient::new(Arc::clone(&transport), BASE);
    let catalog = Arc::new(CardCatalog::from_cards(cards()));
    (Aggregator::new(client, catalog, 2), transport)
}

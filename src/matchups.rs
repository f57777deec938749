use crate::pokemon::{NamedAPIResource, TypeRecord};
use serde::Serialize;

pub const TYPE_NAMES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Damage multipliers against every type, in `TYPE_NAMES` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matchups {
    /// Multiplier a move of each attacking type deals to this creature.
    pub defensive: Vec<(String, f32)>,
    /// Multiplier this creature's types deal to each defending type.
    pub offensive: Vec<(String, f32)>,
}

fn factor(target: &str, double: &[NamedAPIResource], half: &[NamedAPIResource], none: &[NamedAPIResource]) -> f32 {
    if none.iter().any(|t| t.name == target) {
        0.0
    } else if double.iter().any(|t| t.name == target) {
        2.0
    } else if half.iter().any(|t| t.name == target) {
        0.5
    } else {
        1.0
    }
}

impl Matchups {
    /// Combines the relation records of a creature's types by multiplying the
    /// per-type factors.
    pub fn from_relations(types: &[TypeRecord]) -> Self {
        let defensive = TYPE_NAMES
            .iter()
            .map(|attacker| {
                let multiplier = types
                    .iter()
                    .map(|t| {
                        let r = &t.damage_relations;
                        factor(attacker, &r.double_damage_from, &r.half_damage_from, &r.no_damage_from)
                    })
                    .product::<f32>();
                (attacker.to_string(), multiplier)
            })
            .collect();

        let offensive = TYPE_NAMES
            .iter()
            .map(|defender| {
                let multiplier = types
                    .iter()
                    .map(|t| {
                        let r = &t.damage_relations;
                        factor(defender, &r.double_damage_to, &r.half_damage_to, &r.no_damage_to)
                    })
                    .product::<f32>();
                (defender.to_string(), multiplier)
            })
            .collect();

        Self { defensive, offensive }
    }

    pub fn weaknesses(&self) -> Vec<(&str, f32)> {
        Self::select(&self.defensive, |m| m > 1.0)
    }

    pub fn resistances(&self) -> Vec<(&str, f32)> {
        Self::select(&self.defensive, |m| m > 0.0 && m < 1.0)
    }

    pub fn immunities(&self) -> Vec<&str> {
        Self::select(&self.defensive, |m| m == 0.0)
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    pub fn super_effective(&self) -> Vec<(&str, f32)> {
        Self::select(&self.offensive, |m| m > 1.0)
    }

    pub fn defensive_against(&self, attacker: &str) -> Option<f32> {
        self.defensive
            .iter()
            .find(|(name, _)| name == attacker)
            .map(|(_, m)| *m)
    }

    fn select(entries: &[(String, f32)], keep: impl Fn(f32) -> bool) -> Vec<(&str, f32)> {
        entries
            .iter()
            .filter(|(_, m)| keep(*m))
            .map(|(name, m)| (name.as_str(), *m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn type_record(value: serde_json::Value) -> TypeRecord {
        serde_json::from_value(value).unwrap()
    }

    fn names(list: &[&str]) -> serde_json::Value {
        json!(list.iter().map(|n| json!({"name": n})).collect::<Vec<_>>())
    }

    fn water() -> TypeRecord {
        type_record(json!({
            "id": 11, "name": "water",
            "damage_relations": {
                "double_damage_from": names(&["electric", "grass"]),
                "half_damage_from": names(&["fire", "water", "ice", "steel"]),
                "no_damage_from": [],
                "double_damage_to": names(&["fire", "ground", "rock"]),
                "half_damage_to": names(&["water", "grass", "dragon"]),
                "no_damage_to": []
            }
        }))
    }

    fn flying() -> TypeRecord {
        type_record(json!({
            "id": 3, "name": "flying",
            "damage_relations": {
                "double_damage_from": names(&["electric", "ice", "rock"]),
                "half_damage_from": names(&["grass", "fighting", "bug"]),
                "no_damage_from": names(&["ground"]),
                "double_damage_to": names(&["grass", "fighting", "bug"]),
                "half_damage_to": names(&["electric", "rock", "steel"]),
                "no_damage_to": []
            }
        }))
    }

    #[test]
    fn test_dual_type_defence_multiplies() {
        // Gyarados: water/flying
        let matchups = Matchups::from_relations(&[water(), flying()]);
        assert_eq!(matchups.defensive.len(), 18);
        assert_eq!(matchups.defensive_against("electric"), Some(4.0));
        assert_eq!(matchups.defensive_against("grass"), Some(1.0));
        assert_eq!(matchups.defensive_against("ground"), Some(0.0));
        assert_eq!(matchups.defensive_against("ice"), Some(1.0));
        assert_eq!(matchups.defensive_against("rock"), Some(2.0));

        assert_eq!(matchups.weaknesses(), vec![("electric", 4.0), ("rock", 2.0)]);
        assert_eq!(matchups.immunities(), vec!["ground"]);
        assert!(matchups.resistances().contains(&("fire", 0.5)));
    }

    #[test]
    fn test_single_type_offence() {
        let matchups = Matchups::from_relations(&[water()]);
        let strong: Vec<&str> = matchups.super_effective().into_iter().map(|(n, _)| n).collect();
        assert_eq!(strong, vec!["fire", "ground", "rock"]);
    }

    #[test]
    fn test_no_types_is_neutral() {
        let matchups = Matchups::from_relations(&[]);
        assert!(matchups.defensive.iter().all(|(_, m)| *m == 1.0));
    }
}

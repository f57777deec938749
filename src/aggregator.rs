//! Builds the complete record for one query.
//!
//! The creature lookup comes first and decides NotFound. Its species follows,
//! then every independent branch (evolution line, abilities, forms, egg
//! groups, type relations, moves, encounters, cards) runs concurrently and is
//! joined; the first failing branch fails the query.

use crate::catalog::{CardCatalog, TradingCard};
use crate::client::{PokeApiClient, QueryKey, Transport};
use crate::error::{AppError, Result};
use crate::evolution::{self, EvolutionNode};
use crate::matchups::Matchups;
use crate::moves::MoveEntry;
use crate::pokemon::{
    Ability, EggGroup, EvolutionChain, LocationAreaEncounter, Move, MoveLearnDetail, Pokemon,
    PokemonAbility, Species, TypeRecord,
};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct AbilityDetail {
    pub reference: PokemonAbility,
    pub ability: Ability,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEvolution {
    pub chain: EvolutionChain,
    /// `None` when even the root stage could not be matched to a Pokémon.
    pub tree: Option<EvolutionNode>,
}

/// Everything known about one queried creature.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedResult {
    pub pokemon: Pokemon,
    pub species: Species,
    pub evolution: Option<ResolvedEvolution>,
    pub abilities: Vec<AbilityDetail>,
    pub forms: Vec<Pokemon>,
    pub breeding_partners: Vec<String>,
    pub type_relations: Vec<TypeRecord>,
    pub matchups: Matchups,
    pub moves: Vec<MoveEntry>,
    pub encounters: Vec<LocationAreaEncounter>,
    pub cards: Vec<TradingCard>,
}

pub struct Aggregator<T> {
    client: PokeApiClient<T>,
    catalog: Arc<CardCatalog>,
    max_concurrent_moves: usize,
}

impl<T> Clone for Aggregator<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            catalog: Arc::clone(&self.catalog),
            max_concurrent_moves: self.max_concurrent_moves,
        }
    }
}

/// After the creature is known, a missing dependent record means the service
/// is inconsistent, not that the user mistyped.
fn dependent(err: AppError) -> AppError {
    match err {
        AppError::NotFound(what) => AppError::Unavailable(format!("missing dependent record {}", what)),
        other => other,
    }
}

impl<T: Transport> Aggregator<T> {
    pub fn new(client: PokeApiClient<T>, catalog: Arc<CardCatalog>, max_concurrent_moves: usize) -> Self {
        Self {
            client,
            catalog,
            max_concurrent_moves: max_concurrent_moves.max(1),
        }
    }

    pub fn client(&self) -> &PokeApiClient<T> {
        &self.client
    }

    pub async fn resolve(&self, input: &str) -> Result<AggregatedResult> {
        let key = QueryKey::parse(input)?;
        tracing::info!("Resolving Pokémon {}", key);

        let pokemon = self.client.pokemon(&key).await.map_err(|e| {
            tracing::warn!("Lookup of {} failed: {}", key, e);
            e
        })?;
        tracing::debug!("Resolved {} to {} (ID: {})", key, pokemon.name, pokemon.id);

        let species = self.client.species(&pokemon).await.map_err(dependent)?;

        let (evolution, abilities, forms, egg_groups, type_relations, moves, encounters, cards) =
            tokio::try_join!(
                self.resolve_evolution(&species),
                self.resolve_abilities(&pokemon),
                self.resolve_forms(&species),
                self.resolve_egg_groups(&species),
                self.resolve_type_relations(&pokemon),
                self.resolve_moves(&pokemon),
                self.resolve_encounters(&pokemon),
                self.catalog.matching(&pokemon.name),
            )
            .map_err(|e| {
                tracing::error!("Aggregation for {} failed: {}", pokemon.name, e);
                dependent(e)
            })?;

        let breeding_partners = breeding_partners(&egg_groups, &species.name);
        let matchups = Matchups::from_relations(&type_relations);

        tracing::info!(
            "Aggregated {}: {} moves, {} forms, {} cards",
            pokemon.name,
            moves.len(),
            forms.len(),
            cards.len()
        );

        Ok(AggregatedResult {
            pokemon,
            species,
            evolution,
            abilities,
            forms,
            breeding_partners,
            type_relations,
            matchups,
            moves,
            encounters,
            cards,
        })
    }

    /// Fetches the chain, then every Pokémon named in it. A stage whose
    /// species has no same-named Pokémon is left out of the tree.
    async fn resolve_evolution(&self, species: &Species) -> Result<Option<ResolvedEvolution>> {
        let Some(reference) = &species.evolution_chain else {
            tracing::debug!("{} has no evolution chain", species.name);
            return Ok(None);
        };
        let chain: EvolutionChain = self.client.resource(&reference.url).await?;

        let names = evolution::species_names(&chain.chain);
        let members = try_join_all(names.into_iter().map(|name| async move {
            match self.client.pokemon(&QueryKey::Name(name.clone())).await {
                Ok(pokemon) => Ok(Some(pokemon)),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Evolution stage {} has no default Pokémon", name);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }))
        .await?;

        let lookup: HashMap<String, Pokemon> = members
            .into_iter()
            .flatten()
            .map(|pokemon| (pokemon.name.to_lowercase(), pokemon))
            .collect();
        let tree = evolution::resolve_tree(&chain.chain, &lookup);
        Ok(Some(ResolvedEvolution { chain, tree }))
    }

    async fn resolve_abilities(&self, pokemon: &Pokemon) -> Result<Vec<AbilityDetail>> {
        try_join_all(pokemon.abilities.iter().cloned().map(|reference| async move {
            let ability: Ability = self.client.resource(&reference.ability.url).await?;
            Ok::<_, AppError>(AbilityDetail { reference, ability })
        }))
        .await
    }

    async fn resolve_forms(&self, species: &Species) -> Result<Vec<Pokemon>> {
        let urls: Vec<String> = species
            .varieties
            .iter()
            .map(|variety| variety.pokemon.url.clone())
            .collect();
        try_join_all(
            urls.into_iter()
                .map(|url| async move { self.client.resource::<Pokemon>(&url).await }),
        )
        .await
    }

    async fn resolve_egg_groups(&self, species: &Species) -> Result<Vec<EggGroup>> {
        let urls: Vec<String> = species.egg_groups.iter().map(|g| g.url.clone()).collect();
        try_join_all(
            urls.into_iter()
                .map(|url| async move { self.client.resource::<EggGroup>(&url).await }),
        )
        .await
    }

    async fn resolve_type_relations(&self, pokemon: &Pokemon) -> Result<Vec<TypeRecord>> {
        let names: Vec<String> = pokemon.type_names().into_iter().map(str::to_string).collect();
        try_join_all(
            names
                .into_iter()
                .map(|name| async move { self.client.type_record(&name).await }),
        )
        .await
    }

    /// One lookup per distinct move, at most `max_concurrent_moves` in
    /// flight, results in the creature's move-list order.
    async fn resolve_moves(&self, pokemon: &Pokemon) -> Result<Vec<MoveEntry>> {
        let mut seen = BTreeSet::new();
        let distinct: Vec<(String, Vec<MoveLearnDetail>)> = pokemon
            .moves
            .iter()
            .filter(|m| seen.insert(m.r#move.name.clone()))
            .map(|m| (m.r#move.url.clone(), m.version_group_details.clone()))
            .collect();
        tracing::debug!("Fetching {} moves for {}", distinct.len(), pokemon.name);

        stream::iter(distinct)
            .map(|(url, learned)| async move {
                let detail: Move = self.client.resource(&url).await?;
                Ok::<_, AppError>(MoveEntry::new(&detail, learned))
            })
            .buffered(self.max_concurrent_moves)
            .try_collect()
            .await
    }

    async fn resolve_encounters(&self, pokemon: &Pokemon) -> Result<Vec<LocationAreaEncounter>> {
        self.client.encounters(pokemon.id).await
    }
}

/// Union of the egg groups' members without `own_species`, sorted, distinct.
pub fn breeding_partners(egg_groups: &[EggGroup], own_species: &str) -> Vec<String> {
    egg_groups
        .iter()
        .flat_map(|group| group.pokemon_species.iter())
        .map(|species| species.name.as_str())
        .filter(|name| *name != own_species)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub mod aggregator;
pub mod assets;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod evolution;
pub mod matchups;
pub mod moves;
pub mod overview;
pub mod pokemon;
pub mod render;
pub mod session;

pub use aggregator::{AggregatedResult, Aggregator};
pub use cache::*;
pub use client::{HttpTransport, PokeApiClient, QueryKey, Transport};
pub use config::*;
pub use error::{AppError, Result};
pub use pokemon::*;

use crate::core::{ConfigError, Result, ServerId};
use crate::identifier::ServerDirectory;
use crate::interrupt::{Interruptor, check_interrupted, interruptible};
use crate::metadata::{ShardConfig, ShardScheme, TableConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Level, event};

/// Shape of a generated table configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfigParams {
    #[serde(default = "default_count")]
    pub num_shards: usize,
    #[serde(default = "default_count")]
    pub num_replicas: usize,
}

fn default_count() -> usize {
    1
}

impl Default for GenerateConfigParams {
    fn default() -> Self {
        Self {
            num_shards: 1,
            num_replicas: 1,
        }
    }
}

impl GenerateConfigParams {
    pub fn new(num_shards: usize, num_replicas: usize) -> Self {
        Self {
            num_shards,
            num_replicas,
        }
    }
}

/// Produces a table configuration from scratch.
#[async_trait]
pub trait ConfigGenerator: Send + Sync {
    /// `server_usage` counts existing replica assignments per server and is
    /// used to spread new replicas over lightly loaded servers.
    async fn generate(
        &self,
        server_usage: &BTreeMap<ServerId, usize>,
        params: &GenerateConfigParams,
        shard_scheme: &ShardScheme,
        interruptor: &Interruptor,
    ) -> Result<TableConfig>;
}

/// Places each shard's replicas on the least used live servers and picks
/// the replica directing the fewest shards as director.
pub struct LoadBalancedConfigGenerator {
    servers: Arc<dyn ServerDirectory>,
}

impl LoadBalancedConfigGenerator {
    pub fn new(servers: Arc<dyn ServerDirectory>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl ConfigGenerator for LoadBalancedConfigGenerator {
    async fn generate(
        &self,
        server_usage: &BTreeMap<ServerId, usize>,
        params: &GenerateConfigParams,
        // Placement does not depend on key ranges.
        _shard_scheme: &ShardScheme,
        interruptor: &Interruptor,
    ) -> Result<TableConfig> {
        check_interrupted(interruptor)?;
        if params.num_shards == 0 {
            return Err(ConfigError::GenerationFailed(
                "Every table must have at least one shard.".to_string(),
            ));
        }
        if params.num_replicas == 0 {
            return Err(ConfigError::GenerationFailed(
                "Every shard must have at least one replica.".to_string(),
            ));
        }

        let live = interruptible(self.servers.live_servers(), interruptor).await?;
        if live.is_empty() {
            return Err(ConfigError::GenerationFailed(
                "There are no servers available to host the table.".to_string(),
            ));
        }
        if live.len() < params.num_replicas {
            return Err(ConfigError::GenerationFailed(format!(
                "Can't put {} replicas on only {} servers.",
                params.num_replicas,
                live.len()
            )));
        }

        let mut usage = live
            .iter()
            .map(|id| (*id, server_usage.get(id).copied().unwrap_or(0)))
            .collect::<BTreeMap<_, _>>();
        let mut directing = BTreeMap::<ServerId, usize>::new();
        let mut shards = Vec::with_capacity(params.num_shards);

        for _ in 0..params.num_shards {
            let mut candidates = usage
                .iter()
                .map(|(id, count)| (*count, *id))
                .collect::<Vec<_>>();
            candidates.sort();
            let chosen = candidates
                .into_iter()
                .take(params.num_replicas)
                .map(|(_, id)| id)
                .collect::<Vec<_>>();

            let director = chosen
                .iter()
                .copied()
                .min_by_key(|id| (directing.get(id).copied().unwrap_or(0), *id));
            if let Some(director) = director {
                *directing.entry(director).or_default() += 1;
            }
            for id in &chosen {
                if let Some(count) = usage.get_mut(id) {
                    *count += 1;
                }
            }
            shards.push(ShardConfig::new(chosen, director));
        }

        event!(
            Level::DEBUG,
            shards = shards.len(),
            replicas = params.num_replicas,
            "generated table configuration"
        );
        Ok(TableConfig { shards })
    }
}

use crate::core::{ConfigError, Result, TableId};
use crate::interrupt::{Interruptor, check_interrupted, interruptible};
use crate::metadata::{ShardScheme, SplitPoint};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Level, event};

/// Upper bound on shards per table unless configured otherwise.
pub const DEFAULT_MAX_SHARDS: usize = 64;

/// Chooses split points for an existing table given a new shard count.
#[async_trait]
pub trait SplitPointCalculator: Send + Sync {
    async fn recompute(
        &self,
        table_id: TableId,
        desired_shards: usize,
        previous: &ShardScheme,
        interruptor: &Interruptor,
    ) -> Result<ShardScheme>;
}

/// New tables always start with one shard covering the whole keyspace.
pub fn scheme_for_new_table(num_shards: usize) -> Result<ShardScheme> {
    if num_shards != 1 {
        return Err(ConfigError::InvalidShardCount(
            "Newly created tables must start with exactly one shard".to_string(),
        ));
    }
    Ok(ShardScheme::one_shard())
}

/// Decides whether a shard-count change needs new split points and, if so,
/// asks the calculator for them.
#[derive(Clone)]
pub struct SplitPointPlanner {
    calculator: Arc<dyn SplitPointCalculator>,
    max_shards: usize,
}

impl SplitPointPlanner {
    pub fn new(calculator: Arc<dyn SplitPointCalculator>, max_shards: usize) -> Self {
        Self {
            calculator,
            max_shards: max_shards.max(1),
        }
    }

    pub fn plan_new_table(&self, num_shards: usize) -> Result<ShardScheme> {
        scheme_for_new_table(num_shards)
    }

    pub async fn plan_existing_table(
        &self,
        table_id: TableId,
        num_shards: usize,
        previous: &ShardScheme,
        interruptor: &Interruptor,
    ) -> Result<ShardScheme> {
        if num_shards == 0 || num_shards > self.max_shards {
            return Err(ConfigError::InvalidShardCount(format!(
                "The number of shards must be between 1 and {}; got {}.",
                self.max_shards, num_shards
            )));
        }
        if num_shards == previous.num_shards() {
            return Ok(previous.clone());
        }

        event!(
            Level::DEBUG,
            table_id = %table_id,
            from = previous.num_shards(),
            to = num_shards,
            "recomputing split points"
        );
        let scheme = interruptible(
            self.calculator
                .recompute(table_id, num_shards, previous, interruptor),
            interruptor,
        )
        .await??;

        if scheme.num_shards() != num_shards || !scheme.is_well_formed() {
            return Err(ConfigError::SplitPointsFailed(format!(
                "Split point calculation for table `{}` returned {} ordered ranges where {} were requested.",
                table_id,
                scheme.num_shards(),
                num_shards
            )));
        }
        Ok(scheme)
    }
}

const KEY_ALPHABET_START: u32 = 0x20;
const KEY_ALPHABET_LEN: usize = 95;
const KEY_SPACE: usize = KEY_ALPHABET_LEN * KEY_ALPHABET_LEN;

/// Divides the printable two-character key prefix space into equally sized
/// ranges. Keeps the previous scheme when the count does not change.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSplitPointCalculator;

impl UniformSplitPointCalculator {
    fn split_point_at(position: usize) -> SplitPoint {
        let high = (position / KEY_ALPHABET_LEN) as u32 + KEY_ALPHABET_START;
        let low = (position % KEY_ALPHABET_LEN) as u32 + KEY_ALPHABET_START;
        let key = [high, low]
            .into_iter()
            .filter_map(char::from_u32)
            .collect::<String>();
        SplitPoint(key)
    }
}

#[async_trait]
impl SplitPointCalculator for UniformSplitPointCalculator {
    async fn recompute(
        &self,
        table_id: TableId,
        desired_shards: usize,
        previous: &ShardScheme,
        interruptor: &Interruptor,
    ) -> Result<ShardScheme> {
        check_interrupted(interruptor)?;
        if desired_shards == previous.num_shards() {
            return Ok(previous.clone());
        }
        if desired_shards == 0 || desired_shards > KEY_SPACE {
            return Err(ConfigError::SplitPointsFailed(format!(
                "Cannot split table `{}` into {} shards.",
                table_id, desired_shards
            )));
        }

        let split_points = (1..desired_shards)
            .map(|idx| Self::split_point_at(idx * KEY_SPACE / desired_shards))
            .collect();
        Ok(ShardScheme { split_points })
    }
}

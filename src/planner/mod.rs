//! Shard planning.
//!
//! - `split_points.rs` - decides when shard boundaries must be recomputed
//! - `generate.rs` - replica placement for tables created without `shards`

mod generate;
mod split_points;

pub use generate::{ConfigGenerator, GenerateConfigParams, LoadBalancedConfigGenerator};
pub use split_points::{
    DEFAULT_MAX_SHARDS, SplitPointCalculator, SplitPointPlanner, UniformSplitPointCalculator,
    scheme_for_new_table,
};

mod common;

use async_trait::async_trait;
use common::Cluster;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tablemeta::metadata::ShardScheme;
use tablemeta::planner::{GenerateConfigParams, SplitPointCalculator};
use tablemeta::{BackendSettings, ConfigError, Interruptor, TableConfigBackend, TableId};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let cluster = Cluster::new().await;
    let (id, row) = cluster.create("users", "test").await;
    let before = cluster.snapshot().await;

    let outcome = assert_ok!(
        cluster
            .backend
            .reconfigure(id, GenerateConfigParams::new(2, 3), true, &Interruptor::new())
            .await
    );
    assert_eq!(outcome.reconfigured, 0);
    assert_eq!(outcome.config_changes.len(), 1);
    assert_eq!(
        outcome.config_changes[0].old_val,
        json!({"shards": row["shards"].clone()})
    );
    let new_shards = outcome.config_changes[0].new_val["shards"].as_array().unwrap();
    assert_eq!(new_shards.len(), 2);
    for shard in new_shards {
        assert_eq!(shard["replicas"].as_array().unwrap().len(), 3);
    }

    assert_eq!(cluster.snapshot().await, before);
    assert_eq!(cluster.store.join_count(), 1);
}

#[tokio::test]
async fn reconfigure_commits_new_placement_and_scheme() {
    let cluster = Cluster::new().await;
    let (id, _) = cluster.create("users", "test").await;

    let outcome = cluster
        .backend
        .reconfigure(id, GenerateConfigParams::new(3, 2), false, &Interruptor::new())
        .await
        .unwrap();
    assert_eq!(outcome.reconfigured, 1);

    let snapshot = cluster.snapshot().await;
    let info = snapshot.live(&id).unwrap().replication_info.get_ref();
    assert_eq!(info.config.shards.len(), 3);
    assert_eq!(info.shard_scheme.num_shards(), 3);
    assert!(info.shard_scheme.is_well_formed());
    for shard in &info.config.shards {
        assert_eq!(shard.replicas.len(), 2);
        assert!(shard.replicas.contains(&shard.director.unwrap()));
    }

    let document = outcome.to_document();
    assert_eq!(document["reconfigured"], 1);
    assert_eq!(
        document["config_changes"][0]["new_val"]["shards"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn shard_count_is_bounded() {
    let cluster = Cluster::with_settings(BackendSettings::new().max_shards(4)).await;
    let (id, _) = cluster.create("users", "test").await;

    for num_shards in [0, 5] {
        let err = assert_err!(
            cluster
                .backend
                .reconfigure(
                    id,
                    GenerateConfigParams::new(num_shards, 1),
                    false,
                    &Interruptor::new()
                )
                .await
        );
        assert!(matches!(err, ConfigError::InvalidShardCount(_)));
    }
    assert_eq!(cluster.store.join_count(), 1);
}

#[tokio::test]
async fn unknown_or_deleted_tables_cannot_be_reconfigured() {
    let cluster = Cluster::new().await;
    let err = assert_err!(
        cluster
            .backend
            .reconfigure(
                TableId::generate(),
                GenerateConfigParams::default(),
                false,
                &Interruptor::new()
            )
            .await
    );
    assert!(matches!(err, ConfigError::UnknownIdentifier(_)));

    let (id, _) = cluster.create("users", "test").await;
    cluster.write(&id, false, None).await.unwrap();
    let err = assert_err!(
        cluster
            .backend
            .reconfigure(id, GenerateConfigParams::default(), false, &Interruptor::new())
            .await
    );
    assert!(matches!(err, ConfigError::UnknownIdentifier(_)));
}

#[tokio::test]
async fn too_many_replicas_fails_generation() {
    let cluster = Cluster::new().await;
    let (id, _) = cluster.create("users", "test").await;
    let err = assert_err!(
        cluster
            .backend
            .reconfigure(id, GenerateConfigParams::new(1, 4), false, &Interruptor::new())
            .await
    );
    assert_eq!(
        err,
        ConfigError::GenerationFailed("Can't put 4 replicas on only 3 servers.".to_string())
    );
}

#[tokio::test]
async fn interrupted_reconfigure_commits_nothing() {
    let cluster = Cluster::new().await;
    let (id, _) = cluster.create("users", "test").await;
    let interruptor = Interruptor::new();
    interruptor.cancel();

    let err = assert_err!(
        cluster
            .backend
            .reconfigure(id, GenerateConfigParams::new(2, 1), false, &interruptor)
            .await
    );
    assert_eq!(err, ConfigError::Interrupted);
    assert_eq!(cluster.store.join_count(), 1);
}

/// Calculator that always returns the wrong number of ranges.
struct BrokenCalculator {
    calls: AtomicUsize,
}

#[async_trait]
impl SplitPointCalculator for BrokenCalculator {
    async fn recompute(
        &self,
        _table_id: TableId,
        _desired_shards: usize,
        _previous: &ShardScheme,
        _interruptor: &Interruptor,
    ) -> tablemeta::Result<ShardScheme> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ShardScheme::one_shard())
    }
}

#[tokio::test]
async fn bad_split_points_are_rejected() {
    let cluster = Cluster::new().await;
    let calculator = Arc::new(BrokenCalculator {
        calls: AtomicUsize::new(0),
    });
    let backend = TableConfigBackend::builder(
        Arc::new(cluster.store.clone()),
        cluster.servers.clone(),
        cluster.databases.clone(),
    )
    .split_point_calculator(calculator.clone())
    .build()
    .unwrap();

    let (id, mut row) = cluster.create("users", "test").await;

    // Unchanged shard count never consults the calculator.
    assert_ok!(
        backend
            .reconfigure(id, GenerateConfigParams::new(1, 2), false, &Interruptor::new())
            .await
    );
    assert_eq!(calculator.calls.load(Ordering::SeqCst), 0);

    let err = assert_err!(
        backend
            .reconfigure(id, GenerateConfigParams::new(2, 1), false, &Interruptor::new())
            .await
    );
    assert!(matches!(err, ConfigError::SplitPointsFailed(_)));
    assert_eq!(calculator.calls.load(Ordering::SeqCst), 1);

    // The same check guards shard changes made through `write_row`.
    row["shards"] = json!([
        {"replicas": ["alpha"], "director": "alpha"},
        {"replicas": ["beta"], "director": "beta"},
    ]);
    let mut new_value = Some(row);
    let err = assert_err!(
        backend
            .write_row(&common::key(&id), false, &mut new_value, &Interruptor::new())
            .await
    );
    assert!(matches!(err, ConfigError::SplitPointsFailed(_)));
    assert_eq!(calculator.calls.load(Ordering::SeqCst), 2);
}

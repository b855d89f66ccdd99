/// One table's configuration before and after a reconfigure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub old_val: Document,
    pub new_val: Document,
}

/// Result of [`TableConfigBackend::reconfigure`]. `reconfigured` is zero for
/// a dry run; the proposed change is reported either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconfigureOutcome {
    pub reconfigured: usize,
    pub config_changes: Vec<ConfigChange>,
}

impl ReconfigureOutcome {
    pub fn to_document(&self) -> Document {
        serde_json::json!({
            "reconfigured": self.reconfigured,
            "config_changes": self
                .config_changes
                .iter()
                .map(|change| serde_json::json!({
                    "old_val": change.old_val,
                    "new_val": change.new_val,
                }))
                .collect::<Vec<_>>(),
        })
    }
}

impl BackendInner {
    async fn reconfigure(
        &self,
        table_id: TableId,
        params: &GenerateConfigParams,
        dry_run: bool,
        interruptor: &Interruptor,
    ) -> Result<ReconfigureOutcome> {
        let mut snapshot = self.fetch_snapshot(interruptor).await?;
        let Some(record) = snapshot.live(&table_id).cloned() else {
            return Err(ConfigError::UnknownIdentifier(format!(
                "There is no table with UUID `{}`.",
                table_id
            )));
        };
        let previous = record.replication_info.get_ref();

        let shard_scheme = self
            .planner
            .plan_existing_table(
                table_id,
                params.num_shards,
                &previous.shard_scheme,
                interruptor,
            )
            .await?;

        // The table's own replicas are about to be replaced, so they do not
        // count against any server.
        let usage = snapshot.server_usage(Some(&table_id));
        let config = interruptible(
            self.generator
                .generate(&usage, params, &shard_scheme, interruptor),
            interruptor,
        )
        .await??;

        let format = self.settings.identifier_format;
        let servers = self.servers.as_ref();
        let old_val = interruptible(
            table_config_to_document(&previous.config, format, servers),
            interruptor,
        )
        .await?;
        let new_val =
            interruptible(table_config_to_document(&config, format, servers), interruptor).await?;

        let reconfigured = if dry_run {
            event!(Level::DEBUG, table_id = %table_id, "reconfigure dry run");
            0
        } else {
            if let Some(entry) = snapshot.get_mut(&table_id).and_then(|entry| entry.get_mutable()) {
                entry.replication_info.set(
                    ReplicationInfo {
                        config,
                        shard_scheme,
                    },
                    self.settings.node_id,
                );
            }
            check_interrupted(interruptor)?;
            self.store.join(snapshot).await;
            event!(Level::DEBUG, table_id = %table_id, "reconfiguration joined");
            1
        };

        Ok(ReconfigureOutcome {
            reconfigured,
            config_changes: vec![ConfigChange { old_val, new_val }],
        })
    }
}

impl TableConfigBackend {
    /// Replaces a live table's replica placement with a freshly generated
    /// one of the requested shape. With `dry_run` nothing is written.
    pub async fn reconfigure(
        &self,
        table_id: TableId,
        params: GenerateConfigParams,
        dry_run: bool,
        interruptor: &Interruptor,
    ) -> Result<ReconfigureOutcome> {
        let span = info_span!(
            "table_config.reconfigure",
            table_id = %table_id,
            num_shards = params.num_shards,
            num_replicas = params.num_replicas,
            dry_run
        );
        let interruptor = interruptor.clone();
        let result = self
            .on_home(move |inner| {
                async move {
                    inner
                        .reconfigure(table_id, &params, dry_run, &interruptor)
                        .await
                }
                .instrument(span)
            })
            .await;
        if let Err(err) = &result {
            warn!(error = %err, "reconfigure rejected");
        }
        result
    }
}

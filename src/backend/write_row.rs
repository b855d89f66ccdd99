impl BackendInner {
    async fn write_row(
        &self,
        primary_key: &Document,
        pkey_was_autogenerated: bool,
        new_value: Option<Document>,
        interruptor: &Interruptor,
    ) -> Result<Option<Document>> {
        let mut snapshot = self.fetch_snapshot(interruptor).await?;

        let table_id = match uuid_from_document(primary_key) {
            Ok(uuid) => TableId::from(uuid),
            Err(_) => {
                // A key that is not a UUID cannot name an existing table.
                guarantee(
                    !pkey_was_autogenerated,
                    "auto-generated primary key should have been a valid UUID string.",
                );
                TableId::nil()
            }
        };
        let existed_before = snapshot.live(&table_id).is_some();

        let new_value = match new_value {
            Some(document) => {
                let row = self
                    .create_or_update(
                        &mut snapshot,
                        table_id,
                        existed_before,
                        pkey_was_autogenerated,
                        &document,
                        interruptor,
                    )
                    .await?;
                Some(row)
            }
            None => {
                self.delete(&mut snapshot, table_id, existed_before, pkey_was_autogenerated);
                None
            }
        };

        check_interrupted(interruptor)?;
        self.store.join(snapshot).await;
        event!(Level::DEBUG, table_id = %table_id, "table config change joined");
        Ok(new_value)
    }

    async fn create_or_update(
        &self,
        snapshot: &mut TablesSnapshot,
        table_id: TableId,
        existed_before: bool,
        pkey_was_autogenerated: bool,
        document: &Document,
        interruptor: &Interruptor,
    ) -> Result<Document> {
        let decoder = TableConfigDecoder {
            format: self.settings.identifier_format,
            servers: self.servers.as_ref(),
            generator: self.generator.as_ref(),
            default_replicas: self.settings.default_replicas,
        };
        let DecodedTableConfig {
            name,
            db,
            id,
            primary_key,
            config,
        } = decoder
            .decode(document, existed_before, snapshot, interruptor)
            .await
            .map_err(|err| {
                err.with_prefix(
                    "The change you're trying to make to `table_config` has the wrong format. ",
                )
            })?;

        guarantee(
            id == table_id,
            "the row's `id` must match the primary key it is written under.",
        );

        if existed_before {
            guarantee(!pkey_was_autogenerated, "UUID collision happened");
        } else {
            if !pkey_was_autogenerated {
                return Err(ConfigError::ExplicitIdNotAllowed);
            }
            // A fresh id must not have been used by a table that was since deleted.
            guarantee(!snapshot.contains(&table_id), "UUID collision happened");
        }

        let existing = snapshot.live(&table_id).cloned();

        // An update compares the `db` document instead of resolving it, so a
        // renamed or deleted database does not block unrelated edits.
        let database = match &existing {
            Some(record) => {
                let current = interruptible(
                    database_id_to_document(
                        *record.database.get_ref(),
                        self.settings.identifier_format,
                        self.databases.as_ref(),
                    ),
                    interruptor,
                )
                .await?;
                if db != current {
                    return Err(ConfigError::ImmutableFieldViolation("database".to_string()));
                }
                *record.database.get_ref()
            }
            None => {
                interruptible(
                    database_id_from_document(
                        &db,
                        self.settings.identifier_format,
                        self.databases.as_ref(),
                    ),
                    interruptor,
                )
                .await??
            }
        };

        if let Some(record) = &existing {
            if &primary_key != record.primary_key.get_ref() {
                return Err(ConfigError::ImmutableFieldViolation("primary_key".to_string()));
            }
        }

        let shard_scheme = match &existing {
            Some(record) => {
                let previous = &record.replication_info.get_ref().shard_scheme;
                self.planner
                    .plan_existing_table(table_id, config.shards.len(), previous, interruptor)
                    .await?
            }
            None => self.planner.plan_new_table(config.shards.len())?,
        };

        let old_name = existing.as_ref().map(|record| record.name.get_ref().clone());
        if old_name.as_ref() != Some(&name) {
            let collision = snapshot
                .find_live_by_name(&database, &name)
                .into_iter()
                .any(|other| other != table_id);
            if collision {
                let db_name = display_reference(&db);
                let message = match &old_name {
                    None => format!("Table `{}.{}` already exists.", db_name, name),
                    Some(old_name) => format!(
                        "Cannot rename table `{db}.{old}` to `{db}.{new}` because table `{db}.{new}` already exists.",
                        db = db_name,
                        old = old_name,
                        new = name
                    ),
                };
                return Err(ConfigError::NameAlreadyExists(message));
            }
        }

        let replication_info = ReplicationInfo {
            config,
            shard_scheme,
        };
        let origin = self.settings.node_id;
        let committed = match snapshot.get_mut(&table_id).and_then(|entry| entry.get_mutable()) {
            Some(record) => {
                event!(Level::DEBUG, table_id = %table_id, "updating table config");
                record.name.set(name.clone(), origin);
                record.replication_info.set(replication_info, origin);
                record.clone()
            }
            None => {
                event!(Level::DEBUG, table_id = %table_id, "creating table");
                let record = TableRecord::new(
                    name.clone(),
                    database,
                    primary_key,
                    replication_info,
                    origin,
                );
                snapshot.insert(table_id, Deletable::Live(record.clone()));
                record
            }
        };

        // Generated `primary_key` and `shards` become visible to the caller.
        self.format_row(table_id, &name, &db, &committed, interruptor)
            .await
    }

    fn delete(
        &self,
        snapshot: &mut TablesSnapshot,
        table_id: TableId,
        existed_before: bool,
        pkey_was_autogenerated: bool,
    ) {
        // Generated keys never name an existing row, so deleting one is a defect
        // whether or not the id happens to be taken.
        guarantee(!pkey_was_autogenerated, "UUID collision happened");
        if existed_before {
            if let Some(entry) = snapshot.get_mut(&table_id) {
                entry.mark_deleted();
            }
            event!(Level::DEBUG, table_id = %table_id, "table tombstoned");
        } else {
            event!(Level::DEBUG, table_id = %table_id, "delete of unknown table is a no-op");
        }
    }
}

impl TableConfigBackend {
    /// Creates, updates or deletes the table named by `primary_key`.
    ///
    /// `new_value` holds the candidate row; `None` deletes. New tables can
    /// only be created under an auto-generated key. On success `new_value`
    /// is replaced by the committed row, including any generated
    /// `primary_key` and `shards`.
    ///
    /// # Panics
    ///
    /// Panics if the row's `id` differs from `primary_key`, or if an
    /// auto-generated key collides with an existing or deleted table, or is
    /// used to delete.
    pub async fn write_row(
        &self,
        primary_key: &Document,
        pkey_was_autogenerated: bool,
        new_value: &mut Option<Document>,
        interruptor: &Interruptor,
    ) -> Result<()> {
        let span = info_span!(
            "table_config.write_row",
            primary_key = %display_reference(primary_key),
            autogenerated = pkey_was_autogenerated,
            delete = new_value.is_none()
        );
        let primary_key = primary_key.clone();
        let candidate = new_value.clone();
        let interruptor = interruptor.clone();
        let result = self
            .on_home(move |inner| {
                async move {
                    inner
                        .write_row(&primary_key, pkey_was_autogenerated, candidate, &interruptor)
                        .await
                }
                .instrument(span)
            })
            .await;

        match result {
            Ok(committed) => {
                *new_value = committed;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "table config change rejected");
                Err(err)
            }
        }
    }
}

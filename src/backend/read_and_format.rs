impl BackendInner {
    /// Full external view of one table: the encoded shards plus `name`,
    /// `db`, `id` and `primary_key`.
    async fn format_row(
        &self,
        table_id: TableId,
        table_name: &NameString,
        db: &Document,
        record: &TableRecord,
        interruptor: &Interruptor,
    ) -> Result<Document> {
        let config = &record.replication_info.get_ref().config;
        let mut row = interruptible(
            table_config_to_document(config, self.settings.identifier_format, self.servers.as_ref()),
            interruptor,
        )
        .await?;

        if let Some(fields) = row.as_object_mut() {
            fields.insert("name".to_string(), name_to_document(table_name));
            fields.insert("db".to_string(), db.clone());
            fields.insert("id".to_string(), uuid_to_document(table_id.as_uuid()));
            fields.insert(
                "primary_key".to_string(),
                Document::String(record.primary_key.get_ref().clone()),
            );
        }
        Ok(row)
    }

    /// Formats a live record looked up in `snapshot`, showing its database
    /// in the configured identifier format.
    async fn format_live_row(
        &self,
        snapshot: &TablesSnapshot,
        table_id: TableId,
        interruptor: &Interruptor,
    ) -> Result<Option<Document>> {
        let Some(record) = snapshot.live(&table_id) else {
            return Ok(None);
        };
        let db = interruptible(
            database_id_to_document(
                *record.database.get_ref(),
                self.settings.identifier_format,
                self.databases.as_ref(),
            ),
            interruptor,
        )
        .await?;
        let row = self
            .format_row(table_id, record.name.get_ref(), &db, record, interruptor)
            .await?;
        Ok(Some(row))
    }

    async fn fetch_snapshot(&self, interruptor: &Interruptor) -> Result<TablesSnapshot> {
        check_interrupted(interruptor)?;
        interruptible(self.store.fetch_snapshot(), interruptor).await
    }
}

impl TableConfigBackend {
    /// Formats `record` as a table row.
    pub async fn format_row(
        &self,
        table_id: TableId,
        table_name: &NameString,
        db: &Document,
        record: &TableRecord,
        interruptor: &Interruptor,
    ) -> Result<Document> {
        let table_name = table_name.clone();
        let db = db.clone();
        let record = record.clone();
        let interruptor = interruptor.clone();
        self.on_home(move |inner| async move {
            inner
                .format_row(table_id, &table_name, &db, &record, &interruptor)
                .await
        })
        .await
    }

    /// Row for `primary_key`, or `None` if it does not name a live table.
    pub async fn read_row(
        &self,
        primary_key: &Document,
        interruptor: &Interruptor,
    ) -> Result<Option<Document>> {
        let Ok(uuid) = uuid_from_document(primary_key) else {
            return Ok(None);
        };
        let table_id = TableId::from(uuid);
        let interruptor = interruptor.clone();
        self.on_home(move |inner| async move {
            let snapshot = inner.fetch_snapshot(&interruptor).await?;
            inner
                .format_live_row(&snapshot, table_id, &interruptor)
                .await
        })
        .await
    }

    /// Every live table, in id order.
    pub async fn read_all_rows(&self, interruptor: &Interruptor) -> Result<Vec<Document>> {
        let interruptor = interruptor.clone();
        self.on_home(move |inner| async move {
            let snapshot = inner.fetch_snapshot(&interruptor).await?;
            let mut rows = Vec::with_capacity(snapshot.len());
            for (table_id, _) in snapshot.iter_live() {
                if let Some(row) = inner
                    .format_live_row(&snapshot, *table_id, &interruptor)
                    .await?
                {
                    rows.push(row);
                }
            }
            Ok(rows)
        })
        .await
    }

    /// Primary keys of every live table.
    pub async fn primary_keys(&self, interruptor: &Interruptor) -> Result<Vec<Document>> {
        let interruptor = interruptor.clone();
        self.on_home(move |inner| async move {
            let snapshot = inner.fetch_snapshot(&interruptor).await?;
            Ok(snapshot
                .iter_live()
                .map(|(table_id, _)| uuid_to_document(table_id.as_uuid()))
                .collect())
        })
        .await
    }
}

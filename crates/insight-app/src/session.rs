//! Session: one store, its query history and an optional SQL assistant

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

use insight_core::{QueryHistory, QueryResult, TableDescriptor};
use insight_data::{CleaningPolicy, ImportPipeline, StoreSettings, TableStore};

use crate::assistant::{AssistantRequest, SqlAssistant};

pub struct Session {
    store: Arc<TableStore>,
    pipeline: ImportPipeline,
    history: QueryHistory,
    settings: StoreSettings,
    assistant: Option<Arc<dyn SqlAssistant>>,
}

impl Session {
    /// Open the store and load the history named by `settings`
    pub fn open(settings: StoreSettings) -> Result<Self> {
        let store = Arc::new(TableStore::from_settings(&settings).context("failed to open table store")?);

        let history = match &settings.history_path {
            Some(path) => QueryHistory::load(path, settings.history_capacity)
                .with_context(|| format!("failed to load history from {}", path.display()))?,
            None => QueryHistory::new(settings.history_capacity),
        };

        info!(
            "Session opened on {} with {} history entries",
            store.location(),
            history.len()
        );
        Ok(Self {
            pipeline: ImportPipeline::new(store.clone()),
            store,
            history,
            settings,
            assistant: None,
        })
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn SqlAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Import a file from disk on the blocking pool.
    ///
    /// Without a table name the next free `table_N` is picked when the
    /// table is committed; without a policy the configured default applies.
    pub async fn import_file(
        &self,
        path: PathBuf,
        table_name: Option<String>,
        policy: Option<CleaningPolicy>,
    ) -> Result<TableDescriptor> {
        let pipeline = self.pipeline.clone();
        let policy = policy.unwrap_or_else(|| self.settings.default_policy.clone());
        let context = format!("import of {} failed", path.display());

        let descriptor = tokio::task::spawn_blocking(move || {
            pipeline.import_path(&path, table_name.as_deref(), &policy)
        })
        .await?
        .context(context)?;

        Ok(descriptor)
    }

    /// Import in-memory file contents on the blocking pool
    pub async fn import_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: String,
        table_name: Option<String>,
        policy: Option<CleaningPolicy>,
    ) -> Result<TableDescriptor> {
        let pipeline = self.pipeline.clone();
        let policy = policy.unwrap_or_else(|| self.settings.default_policy.clone());
        let context = format!("import of {} failed", file_name);

        let descriptor = tokio::task::spawn_blocking(move || match table_name {
            Some(name) => pipeline.import(&bytes, &file_name, &name, &policy),
            None => pipeline.import_as_next(&bytes, &file_name, &policy),
        })
        .await?
        .context(context)?;

        Ok(descriptor)
    }

    /// Execute hand-written SQL and record it in the history
    pub fn run_sql(&mut self, sql: &str) -> Result<QueryResult> {
        if sql.trim().is_empty() {
            bail!("no SQL given");
        }
        let result = self.store.query(sql)?;
        self.record(None, sql)?;
        Ok(result)
    }

    /// Ask the assistant for SQL, run it and annotate the result.
    ///
    /// The assistant sees the schema summary and a few rows of the first
    /// table. Only its `sql` is executed; explanation and insights are
    /// attached to the result untouched.
    pub async fn ask(&mut self, question: &str) -> Result<QueryResult> {
        if question.trim().is_empty() {
            bail!("no question given");
        }
        let assistant = self
            .assistant
            .clone()
            .ok_or_else(|| anyhow!("no SQL assistant configured"))?;

        let schema = self.store.schema_summary()?;
        let sample = match self.store.list()?.first() {
            Some(first) => self.store.sample(&first.name, self.settings.sample_rows)?,
            None => QueryResult::default(),
        };

        let request = AssistantRequest {
            prompt: question.to_string(),
            schema,
            sample,
        };
        let response = assistant
            .generate(&request)
            .await
            .context("assistant request failed")?;
        debug!("Assistant proposed: {}", response.sql);

        let result = self
            .store
            .query(&response.sql)?
            .with_annotations(response.explanation, response.insights);
        self.record(Some(question.to_string()), &response.sql)?;
        Ok(result)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.persist_history()
    }

    fn record(&mut self, natural_language_query: Option<String>, sql: &str) -> Result<()> {
        self.history.record(natural_language_query, sql);
        self.persist_history()
    }

    fn persist_history(&self) -> Result<()> {
        if let Some(path) = &self.settings.history_path {
            self.history
                .save(path)
                .with_context(|| format!("failed to save history to {}", path.display()))?;
        }
        Ok(())
    }
}

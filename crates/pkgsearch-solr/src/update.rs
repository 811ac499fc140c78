//! Update batches: adds, deletes and commits sent in one request.

use pkgsearch_core::document::SearchDocument;
use pkgsearch_core::types::DocumentId;
use serde_json::json;

/// A single update command.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCommand {
    /// Delete every document matching the query.
    DeleteByQuery(String),
    /// Delete one document.
    DeleteById(DocumentId),
    /// Insert or replace a document.
    Add(SearchDocument),
    /// Make everything before this point visible to searches.
    Commit,
}

/// Ordered list of update commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    commands: Vec<UpdateCommand>,
}

impl UpdateBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a delete-by-query.
    pub fn delete_query(&mut self, query: impl Into<String>) {
        self.commands.push(UpdateCommand::DeleteByQuery(query.into()));
    }

    /// Queue a delete-by-id.
    pub fn delete_id(&mut self, id: DocumentId) {
        self.commands.push(UpdateCommand::DeleteById(id));
    }

    /// Queue a document upsert.
    pub fn add(&mut self, document: SearchDocument) {
        self.commands.push(UpdateCommand::Add(document));
    }

    /// Queue a commit.
    pub fn commit(&mut self) {
        self.commands.push(UpdateCommand::Commit);
    }

    /// Commands in the order they were queued.
    #[must_use]
    pub fn commands(&self) -> &[UpdateCommand] {
        &self.commands
    }

    /// Whether nothing has been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Documents queued for upsert.
    pub fn documents(&self) -> impl Iterator<Item = &SearchDocument> {
        self.commands.iter().filter_map(|c| match c {
            UpdateCommand::Add(doc) => Some(doc),
            _ => None,
        })
    }

    /// Render the JSON update body.
    ///
    /// Keys repeat (`add`, `delete`, `commit`) and are applied in order, so
    /// the object is written piecewise rather than through a map.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a document cannot be serialised.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut entries = Vec::with_capacity(self.commands.len());
        for command in &self.commands {
            let entry = match command {
                UpdateCommand::DeleteByQuery(query) => {
                    format!("\"delete\":{}", json!({ "query": query }))
                }
                UpdateCommand::DeleteById(id) => {
                    format!("\"delete\":{}", json!({ "id": id.to_string() }))
                }
                UpdateCommand::Add(doc) => {
                    format!("\"add\":{{\"doc\":{}}}", serde_json::to_string(doc)?)
                }
                UpdateCommand::Commit => "\"commit\":{}".to_owned(),
            };
            entries.push(entry);
        }
        Ok(format!("{{{}}}", entries.join(",")))
    }
}

//! Form state for creating or editing one record.
//!
//! An `Editor` owns the modal's draft, kept apart from the store cache. The
//! cache only changes once the server confirms a submit; cancelling throws
//! the draft away without touching the cache.

use std::sync::Arc;

use tracing::debug;

use crate::error::{NormalizedError, StoreError};
use crate::resource::Resource;
use crate::store::ResourceStore;
use crate::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Closed,
    Creating,
    Editing(EntityId),
}

#[derive(Debug)]
pub struct Editor<R: Resource> {
    mode: EditorMode,
    draft: Option<R::Draft>,
    error: Option<NormalizedError>,
}

impl<R: Resource> Default for Editor<R> {
    fn default() -> Self {
        Self {
            mode: EditorMode::Closed,
            draft: None,
            error: None,
        }
    }
}

impl<R: Resource> Editor<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != EditorMode::Closed
    }

    pub fn draft(&self) -> Option<&R::Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut R::Draft> {
        self.draft.as_mut()
    }

    /// Error from the last failed submit, if the editor is still open.
    pub fn error(&self) -> Option<&NormalizedError> {
        self.error.as_ref()
    }

    pub fn open_create(&mut self, draft: R::Draft) {
        self.mode = EditorMode::Creating;
        self.draft = Some(draft);
        self.error = None;
    }

    pub fn open_edit(&mut self, entity: &R::Entity) {
        self.mode = EditorMode::Editing(R::id(entity));
        self.draft = Some(R::draft_from(entity));
        self.error = None;
    }

    /// Close and discard the draft.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Send the draft through `store`. On success the editor closes; on
    /// failure it stays open with the draft intact and the error recorded.
    pub async fn submit(&mut self, store: &ResourceStore<R>) -> Result<Arc<R::Entity>, StoreError> {
        let draft = match (self.mode, &self.draft) {
            (EditorMode::Closed, _) | (_, None) => return Err(StoreError::NotEditing),
            (_, Some(draft)) => draft.clone(),
        };

        let result = match self.mode {
            EditorMode::Editing(id) => store.update(id, draft).await,
            _ => store.create(draft).await,
        };

        match result {
            Ok(entity) => {
                debug!(resource = R::NAME, id = R::id(&entity), "draft submitted");
                self.cancel();
                Ok(entity)
            }
            Err(err) => {
                self.error = Some(err.normalized());
                Err(err)
            }
        }
    }
}

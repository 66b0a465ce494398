//! Application state and the user actions that drive it.
//!
//! `Remixer` is the single owner of `AppState`. Every action locks the state
//! only between remote calls, so independent actions may interleave: two
//! deletes can be in flight together and whichever refresh lands last decides
//! the displayed list. The saved cache is written only by `refresh`, always
//! as a full replace.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::generator::Generator;
use crate::model::{EditState, SavedItem};
use crate::share;
use crate::store::{SavedItemStore, StoreError};

pub const LOAD_FAILED: &str = "Could not load saved tweets.";
pub const SAVE_FAILED: &str = "Could not save tweet.";
pub const UPDATE_FAILED: &str = "Could not update tweet.";
pub const DELETE_FAILED: &str = "Could not delete tweet.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub input: String,
    pub generated: Vec<String>,
    /// `generated` holds a failure line rather than posts.
    pub generation_failed: bool,
    pub saved: Vec<SavedItem>,
    pub edit: EditState,
    pub is_generating: bool,
    pub is_saving: bool,
    pub is_updating: bool,
    /// Last store failure, shown as a status line.
    pub notice: Option<String>,
}

impl AppState {
    pub fn can_remix(&self) -> bool {
        !self.is_generating && !self.input.trim().is_empty()
    }

    pub fn find_saved(&self, id: i64) -> Option<&SavedItem> {
        self.saved.iter().find(|item| item.id == id)
    }

    /// Replace the cache wholesale; an edit whose item vanished is dropped.
    fn replace_saved(&mut self, items: Vec<SavedItem>) {
        self.saved = items;
        if let Some(id) = self.edit.editing_id() {
            if self.find_saved(id).is_none() {
                debug!(id, "edited item no longer exists; leaving edit mode");
                self.edit = EditState::Viewing;
            }
        }
    }
}

/// Result of a one-shot `edit_saved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    NotFound,
    LoadFailed,
    UpdateFailed,
}

pub struct Remixer {
    state: Mutex<AppState>,
    generator: Generator,
    store: Arc<dyn SavedItemStore>,
}

impl Remixer {
    pub fn new(generator: Generator, store: Arc<dyn SavedItemStore>) -> Self {
        Self {
            state: Mutex::new(AppState::default()),
            generator,
            store,
        }
    }

    /// Copy of the current state for rendering.
    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    /// Initial fetch of the saved list.
    pub async fn load(&self) -> bool {
        self.refresh().await
    }

    pub async fn set_input(&self, text: &str) {
        self.state.lock().await.input = text.to_string();
    }

    /// Generate posts from the current input. Returns whether a request was sent.
    #[instrument(skip_all)]
    pub async fn remix(&self) -> bool {
        let input = {
            let mut st = self.state.lock().await;
            if !st.can_remix() {
                debug!(
                    generating = st.is_generating,
                    "remix ignored: blank input or already generating"
                );
                return false;
            }
            st.is_generating = true;
            st.input.clone()
        };

        let result = self.generator.generate(&input).await;

        let mut st = self.state.lock().await;
        st.is_generating = false;
        match result {
            Ok(posts) => {
                info!(count = posts.len(), "generated posts");
                st.generated = posts;
                st.generation_failed = false;
            }
            Err(err) => {
                error!(?err, "generation failed");
                st.generated = vec![err.user_message().to_string()];
                st.generation_failed = true;
            }
        }
        true
    }

    /// Refetch the saved list and replace the cache. On failure the old cache stays.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> bool {
        match self.store.list_all().await {
            Ok(items) => {
                self.state.lock().await.replace_saved(items);
                true
            }
            Err(err) => {
                self.report(err, LOAD_FAILED, "error fetching saved tweets").await;
                false
            }
        }
    }

    /// Save `content` as a new item, then refresh.
    #[instrument(skip_all)]
    pub async fn save(&self, content: &str) -> bool {
        {
            let mut st = self.state.lock().await;
            if st.is_saving {
                debug!("save ignored: another save is in flight");
                return false;
            }
            st.is_saving = true;
            st.notice = None;
        }

        let result = self.store.create(content).await;
        let ok = match result {
            Ok(()) => self.refresh().await,
            Err(err) => {
                self.report(err, SAVE_FAILED, "error saving tweet").await;
                false
            }
        };
        self.state.lock().await.is_saving = false;
        ok
    }

    /// Save the generated post at `index`. Failure lines cannot be saved.
    pub async fn save_generated(&self, index: usize) -> bool {
        let content = {
            let st = self.state.lock().await;
            if st.generation_failed {
                return false;
            }
            match st.generated.get(index) {
                Some(post) => post.clone(),
                None => return false,
            }
        };
        self.save(&content).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> bool {
        self.state.lock().await.notice = None;
        match self.store.delete(id).await {
            Ok(()) => self.refresh().await,
            Err(err) => {
                self.report(err, DELETE_FAILED, "error deleting tweet").await;
                false
            }
        }
    }

    /// Start editing a saved item. Any other draft is discarded.
    pub async fn start_edit(&self, id: i64) -> bool {
        let mut st = self.state.lock().await;
        let Some(content) = st.find_saved(id).map(|item| item.content.clone()) else {
            return false;
        };
        if let Some(previous) = st.edit.editing_id().filter(|prev| *prev != id) {
            debug!(previous, id, "discarding draft for previous item");
        }
        st.edit = EditState::start(id, &content);
        true
    }

    pub async fn set_draft(&self, text: &str) {
        let mut st = self.state.lock().await;
        st.edit = std::mem::take(&mut st.edit).set_draft(text);
    }

    pub async fn cancel_edit(&self) {
        let mut st = self.state.lock().await;
        st.edit = std::mem::take(&mut st.edit).cancel();
    }

    /// Write the draft to the store, refresh, then leave edit mode.
    /// On failure the draft is kept.
    #[instrument(skip_all)]
    pub async fn commit_edit(&self) -> bool {
        let (id, draft) = {
            let mut st = self.state.lock().await;
            let EditState::Editing { id, draft } = &st.edit else {
                return false;
            };
            let target = (*id, draft.clone());
            if st.is_updating {
                debug!("update ignored: another update is in flight");
                return false;
            }
            st.is_updating = true;
            st.notice = None;
            target
        };

        let ok = match self.store.update(id, &draft).await {
            Ok(()) => {
                self.refresh().await;
                let mut st = self.state.lock().await;
                if st.edit.editing_id() == Some(id) {
                    st.edit = EditState::Viewing;
                }
                true
            }
            Err(err) => {
                self.report(err, UPDATE_FAILED, "error updating tweet").await;
                false
            }
        };
        self.state.lock().await.is_updating = false;
        ok
    }

    /// Refresh, then replace the content of `id` with `text` in one step.
    pub async fn edit_saved(&self, id: i64, text: &str) -> EditOutcome {
        if !self.refresh().await {
            return EditOutcome::LoadFailed;
        }
        if !self.start_edit(id).await {
            return EditOutcome::NotFound;
        }
        self.set_draft(text).await;
        if self.commit_edit().await {
            EditOutcome::Updated
        } else {
            EditOutcome::UpdateFailed
        }
    }

    /// Intent URL for `content`; opening it is left to the caller.
    pub fn share_url(&self, content: &str) -> String {
        share::intent_url(content)
    }

    async fn report(&self, err: StoreError, notice: &str, what: &str) {
        warn!(?err, "{}", what);
        self.state.lock().await.notice = Some(notice.to_string());
    }
}

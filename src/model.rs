use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform limit shown next to every post.
pub const TWEET_MAX_CHARS: i64 = 280;

/// A post the user chose to keep. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedItem {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Characters left before hitting the platform limit; negative when over.
pub fn chars_remaining(content: &str) -> i64 {
    TWEET_MAX_CHARS - content.chars().count() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing {
        id: i64,
        draft: String,
    },
}

impl EditState {
    /// Enter edit mode for `id`. Any draft in progress is dropped.
    pub fn start(id: i64, content: &str) -> Self {
        EditState::Editing {
            id,
            draft: content.to_string(),
        }
    }

    pub fn set_draft(self, text: &str) -> Self {
        match self {
            EditState::Editing { id, .. } => EditState::Editing {
                id,
                draft: text.to_string(),
            },
            EditState::Viewing => EditState::Viewing,
        }
    }

    pub fn cancel(self) -> Self {
        EditState::Viewing
    }

    pub fn editing_id(&self) -> Option<i64> {
        match self {
            EditState::Editing { id, .. } => Some(*id),
            EditState::Viewing => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditState::Editing { draft, .. } => Some(draft.as_str()),
            EditState::Viewing => None,
        }
    }
}

//! Plain-text rendering of `AppState`.
use std::fmt::Write;

use crate::app::AppState;
use crate::model::chars_remaining;

pub const TITLE: &str = "Content Remixer";
pub const SUBTITLE: &str = "Transform your content with AI-powered remixing";
pub const EMPTY_SAVED: &str = "No saved tweets yet";

pub fn remix_label(state: &AppState) -> &'static str {
    if state.is_generating {
        "Remixing..."
    } else {
        "Remix Content"
    }
}

pub fn render_generated(state: &AppState, out: &mut String) {
    if state.generated.is_empty() {
        return;
    }
    let _ = writeln!(out, "Generated Tweets:");
    for (idx, post) in state.generated.iter().enumerate() {
        if state.generation_failed {
            let _ = writeln!(out, "  {post}");
            continue;
        }
        let _ = writeln!(out, "  ({}) {}", idx + 1, post);
        let _ = writeln!(out, "      {} characters remaining", chars_remaining(post));
    }
}

pub fn render_saved(state: &AppState, out: &mut String) {
    let _ = writeln!(out, "Saved Tweets");
    if state.saved.is_empty() {
        let _ = writeln!(out, "  {EMPTY_SAVED}");
        return;
    }
    for item in &state.saved {
        match (state.edit.editing_id(), state.edit.draft()) {
            (Some(id), Some(draft)) if id == item.id => {
                let _ = writeln!(out, "  [{}] (editing) {}", item.id, draft);
                let _ = writeln!(out, "      {} characters remaining", chars_remaining(draft));
            }
            _ => {
                let _ = writeln!(out, "  [{}] {}", item.id, item.content);
            }
        }
    }
}

/// Whole screen: header, remix control, generated posts, saved list, notice.
pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{SUBTITLE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "[{}]", remix_label(state));
    if !state.generated.is_empty() {
        let _ = writeln!(out);
        render_generated(state, &mut out);
    }
    let _ = writeln!(out);
    render_saved(state, &mut out);
    if let Some(notice) = &state.notice {
        let _ = writeln!(out);
        let _ = writeln!(out, "! {notice}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EditState, SavedItem};
    use chrono::Utc;

    fn item(id: i64, content: &str) -> SavedItem {
        SavedItem {
            id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_state() {
        let out = render(&AppState::default());
        assert!(out.contains("[Remix Content]"));
        assert!(out.contains(EMPTY_SAVED));
        assert!(!out.contains("Generated Tweets:"));
    }

    #[test]
    fn generated_posts_show_remaining() {
        let state = AppState {
            generated: vec!["1. First".into(), "2. Second".into()],
            is_generating: true,
            ..Default::default()
        };
        let out = render(&state);
        assert!(out.contains("[Remixing...]"));
        assert!(out.contains("(1) 1. First"));
        assert!(out.contains("272 characters remaining"));
    }

    #[test]
    fn failure_line_has_no_counter() {
        let state = AppState {
            generated: vec!["oops".into()],
            generation_failed: true,
            ..Default::default()
        };
        let out = render(&state);
        assert!(out.contains("  oops"));
        assert!(!out.contains("characters remaining"));
    }

    #[test]
    fn saved_list_with_edit_and_notice() {
        let state = AppState {
            saved: vec![item(2, "two"), item(1, "one")],
            edit: EditState::start(1, "one").set_draft("uno"),
            notice: Some("Could not save tweet.".into()),
            ..Default::default()
        };
        let out = render(&state);
        assert!(out.contains("[2] two"));
        assert!(out.contains("[1] (editing) uno"));
        assert!(out.contains("! Could not save tweet."));
        assert!(out.find("[2]").unwrap() < out.find("[1]").unwrap());
    }
}

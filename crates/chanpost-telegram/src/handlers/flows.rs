//! Flows shared between commands and callback buttons.

use chanpost_core::{
    audit::AuditEvent,
    domain::{ChatId, UserId},
    draft::{DraftState, PostItem},
    errors::Error,
    formatting::escape_html,
    messaging::types::{InlineButton, InlineKeyboard},
    publisher::publish_draft,
};

use crate::router::AppState;

pub const CB_NEW_SINGLE: &str = "new_post:single";
pub const CB_NEW_MULTIPLE: &str = "new_post:multiple";
pub const CB_ADD_LINK: &str = "add_link";
pub const CB_DELETE_LINK: &str = "delete_link";
pub const CB_NAV_PREV: &str = "nav:prev";
pub const CB_NAV_NEXT: &str = "nav:next";
pub const CB_DONE: &str = "done";
pub const CB_CANCEL: &str = "cancel";

struct PreviewSnapshot {
    item: PostItem,
    position: usize,
    total: usize,
    show_prev: bool,
    show_next: bool,
    multiple: bool,
}

fn edit_keyboard(snap: &PreviewSnapshot) -> InlineKeyboard {
    let mut rows: Vec<Vec<InlineButton>> = Vec::new();

    if snap.show_prev || snap.show_next {
        let mut nav = Vec::new();
        if snap.show_prev {
            nav.push(InlineButton::new("⬅️ Previous", CB_NAV_PREV));
        }
        if snap.show_next {
            nav.push(InlineButton::new("Next ➡️", CB_NAV_NEXT));
        }
        rows.push(nav);
    }

    rows.push(vec![InlineButton::new("➕ Add link button", CB_ADD_LINK)]);
    rows.push(vec![InlineButton::new(
        "🗑 Delete link button",
        CB_DELETE_LINK,
    )]);
    rows.push(vec![
        InlineButton::new("✅ Done", CB_DONE),
        InlineButton::new("❌ Cancel", CB_CANCEL),
    ]);

    InlineKeyboard::new(rows)
}

/// Re-sends the item under the cursor as a preview, followed by the edit menu.
pub async fn send_preview(state: &AppState, chat_id: ChatId, owner: UserId, username: &str) {
    let snap = state
        .drafts
        .with(owner, |d| {
            let multiple = d.mode() == chanpost_core::draft::DraftMode::Multiple;
            d.view().map(|v| PreviewSnapshot {
                item: v.item.clone(),
                position: v.position,
                total: v.total,
                show_prev: v.show_prev,
                show_next: v.show_next,
                multiple,
            })
        })
        .await;

    let snap = match snap {
        Ok(Some(s)) => s,
        Ok(None) => return,
        Err(err) => {
            report_error(state, chat_id, owner, username, err).await;
            return;
        }
    };

    let mut caption = snap.item.caption.clone();
    if snap.multiple {
        caption.push_str(&format!("\n\nPreview {}/{}", snap.position + 1, snap.total));
    }

    if let Err(err) = state
        .messenger
        .send_photo(chat_id, &snap.item.media, &caption, &snap.item.buttons)
        .await
    {
        report_error(state, chat_id, owner, username, err).await;
        return;
    }

    let _ = state
        .messenger
        .send_menu(chat_id, "🔧 Edit post:", edit_keyboard(&snap))
        .await;
}

/// `/done` and the ✅ Done button: close link entry if it is open, otherwise publish.
pub async fn run_done(state: &AppState, chat_id: ChatId, owner: UserId, username: &str) {
    let was_entering_links = state
        .drafts
        .with(owner, |d| {
            if d.state() == DraftState::AwaitingLink {
                d.finish_link_entry();
                true
            } else {
                false
            }
        })
        .await;

    match was_entering_links {
        Ok(true) => {
            send_preview(state, chat_id, owner, username).await;
            return;
        }
        Ok(false) => {}
        Err(err) => {
            report_error(state, chat_id, owner, username, err).await;
            return;
        }
    }

    let outcome = publish_draft(
        &state.drafts,
        &state.quota,
        state.broadcaster.as_ref(),
        &state.cfg.channel,
        state.cfg.publish_delay,
        owner,
    )
    .await;

    match outcome {
        Ok(res) => {
            if let Err(e) = state.audit.write(AuditEvent::publish(
                owner.0,
                username,
                res.succeeded,
                res.total,
            )) {
                eprintln!("[AUDIT] Failed to write publish event: {e}");
            }

            if res.is_full_success() {
                let noun = if res.total == 1 { "post" } else { "posts" };
                let _ = state
                    .messenger
                    .send_html(
                        chat_id,
                        &format!("✅ Published {} {noun} to the channel!", res.total),
                    )
                    .await;
            } else if res.succeeded > 0 {
                let failed: Vec<String> = res
                    .per_item_errors
                    .iter()
                    .map(|(idx, _)| (idx + 1).to_string())
                    .collect();
                let first_cause = res
                    .per_item_errors
                    .first()
                    .map(|(_, e)| format!("{e}"))
                    .unwrap_or_default();
                let _ = state
                    .messenger
                    .send_html(
                        chat_id,
                        &format!(
                            "⚠️ Published {}/{} posts. Failed: {} ({})",
                            res.succeeded,
                            res.total,
                            failed.join(", "),
                            escape_html(&first_cause)
                        ),
                    )
                    .await;
            } else {
                let cause = res
                    .per_item_errors
                    .first()
                    .map(|(_, e)| format!("{e}"))
                    .unwrap_or_else(|| "unknown error".to_string());
                let _ = state
                    .messenger
                    .send_html(
                        chat_id,
                        &format!("❌ Publishing failed: {}", escape_html(&cause)),
                    )
                    .await;
            }
        }
        Err(err) => report_error(state, chat_id, owner, username, err).await,
    }
}

pub async fn run_cancel(state: &AppState, chat_id: ChatId, owner: UserId) {
    let text = if state.drafts.discard(owner).await {
        "❌ Post cancelled."
    } else {
        "Nothing to cancel. Use /start to begin a post."
    };
    let _ = state.messenger.send_html(chat_id, text).await;
}

/// Central error renderer. Quota denials keep the draft and are audited separately.
pub async fn report_error(
    state: &AppState,
    chat_id: ChatId,
    owner: UserId,
    username: &str,
    err: Error,
) {
    let text = match &err {
        Error::SessionExpired => "⚠️ No active post. Use /start to begin.".to_string(),
        Error::Validation(v) => format!("⚠️ {v}"),
        Error::QuotaExceeded { limit } => {
            if let Err(e) =
                state
                    .audit
                    .write(AuditEvent::quota_denied(owner.0, username, *limit))
            {
                eprintln!("[AUDIT] Failed to write quota event: {e}");
            }
            format!(
                "⏳ Rate limit reached ({limit} posts per minute). Your post is kept; try /done again shortly."
            )
        }
        other => {
            let msg = format!("{other}");
            let truncated = if msg.len() > 200 {
                format!("{}...", msg.chars().take(200).collect::<String>())
            } else {
                msg
            };
            if let Err(e) = state.audit.write(AuditEvent::error(
                owner.0,
                username,
                &truncated,
                Some("handler"),
            )) {
                eprintln!("[AUDIT] Failed to write error event: {e}");
            }
            format!("❌ Error: {}", escape_html(&truncated))
        }
    };

    let _ = state.messenger.send_html(chat_id, &text).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::support::{self, FakeMessenger};
    use chanpost_core::domain::FileId;
    use chanpost_core::draft::DraftMode;
    use std::sync::Arc;

    async fn seed_single_item(state: &AppState, owner: UserId) {
        state.drafts.start(owner, DraftMode::Single).await;
        state
            .drafts
            .with(owner, |d| {
                d.receive_media(FileId("f".into()), "cap").map(|_| ())
            })
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn preview_sends_photo_then_edit_menu() {
        let messenger = Arc::new(FakeMessenger::default());
        let state = support::test_state(messenger.clone());
        let owner = UserId(1);
        seed_single_item(&state, owner).await;

        send_preview(&state, ChatId(10), owner, "op").await;

        let photos = messenger.photos();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].1, "cap");
        assert_eq!(messenger.menus(), vec!["🔧 Edit post:".to_string()]);
    }

    #[tokio::test]
    async fn preview_failure_audits_the_operator_name() {
        let messenger = Arc::new(FakeMessenger {
            fail_photos: true,
            ..FakeMessenger::default()
        });
        let state = support::test_state(messenger.clone());
        let owner = UserId(1);
        seed_single_item(&state, owner).await;

        send_preview(&state, ChatId(10), owner, "operator_a").await;

        let log = std::fs::read_to_string(&state.cfg.audit_log_path).unwrap();
        assert!(log.contains("operator_a"));
        assert!(!log.contains("unknown"));

        let html = messenger.html();
        assert!(html.last().unwrap().starts_with("❌"));
    }
}

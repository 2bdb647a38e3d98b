use std::sync::Arc;

use teloxide::prelude::*;

use chanpost_core::{
    audit::AuditEvent,
    domain::{ChatId, UserId},
    draft::DraftMode,
    errors::Error,
    formatting::escape_html,
    security::is_authorized,
};

use crate::router::AppState;

use super::flows::{
    self, CB_ADD_LINK, CB_CANCEL, CB_DELETE_LINK, CB_DONE, CB_NAV_NEXT, CB_NAV_PREV,
    CB_NEW_MULTIPLE, CB_NEW_SINGLE,
};

fn new_draft_instructions(mode: DraftMode) -> String {
    let mut text = String::from("📸 Send an image with a caption to start your post.");
    if mode == DraftMode::Multiple {
        text.push_str("\nYou can send several images, each with its own caption.");
    }
    text.push_str("\n\n/cancel - discard the post\n/done - publish when ready");
    text
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let user = q.from.clone();
    let chat = q.message.as_ref().map(|m| m.chat.id);
    let data = q.data.clone().unwrap_or_default();

    // Always answer the callback query so the client stops its spinner.
    if chat.is_none() || data.is_empty() {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    }
    let chat_id = ChatId(chat.map(|c| c.0).unwrap_or_default());

    let owner = UserId(user.id.0 as i64);
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    if !is_authorized(Some(owner), &state.cfg.authorized_users) {
        if let Err(e) = state
            .audit
            .write(AuditEvent::auth(owner.0, &username, false))
        {
            eprintln!("[AUDIT] Failed to write auth event: {e}");
        }
        let _ = state
            .messenger
            .answer_callback(&cb_id, Some("Unauthorized"))
            .await;
        return Ok(());
    }

    let _ = state.messenger.answer_callback(&cb_id, None).await;

    // Button taps for one operator are handled strictly in order,
    // like their messages.
    let _guard = state.user_locks.lock_user(owner.0).await;

    match data.as_str() {
        CB_NEW_SINGLE | CB_NEW_MULTIPLE => {
            let mode = if data == CB_NEW_SINGLE {
                DraftMode::Single
            } else {
                DraftMode::Multiple
            };
            state.drafts.start(owner, mode).await;
            let _ = state
                .messenger
                .send_html(chat_id, &new_draft_instructions(mode))
                .await;
        }

        CB_ADD_LINK => {
            let opened = state.drafts.with(owner, |d| d.begin_link_entry()).await;
            match opened {
                Ok(true) => {
                    let _ = state
                        .messenger
                        .send_html(
                            chat_id,
                            "📝 Send links as: Name - URL\nOne per line. /done when finished.",
                        )
                        .await;
                }
                Ok(false) => {
                    let _ = state
                        .messenger
                        .send_html(chat_id, "⚠️ Send an image first, then add link buttons.")
                        .await;
                }
                Err(err) => flows::report_error(&state, chat_id, owner, &username, err).await,
            }
        }

        CB_DELETE_LINK => {
            let removed = state.drafts.with(owner, |d| d.delete_last_button()).await;
            match removed {
                Ok(Ok(button)) => {
                    let _ = state
                        .messenger
                        .send_html(
                            chat_id,
                            &format!("✅ Removed '{}'", escape_html(button.label())),
                        )
                        .await;
                    flows::send_preview(&state, chat_id, owner, &username).await;
                }
                Ok(Err(err)) | Err(err) => {
                    flows::report_error(&state, chat_id, owner, &username, err).await;
                }
            }
        }

        CB_NAV_PREV | CB_NAV_NEXT => {
            let moved: Result<(), Error> = state
                .drafts
                .with(owner, |d| {
                    if data == CB_NAV_PREV {
                        d.prev();
                    } else {
                        d.next();
                    }
                })
                .await;
            match moved {
                Ok(()) => flows::send_preview(&state, chat_id, owner, &username).await,
                Err(err) => flows::report_error(&state, chat_id, owner, &username, err).await,
            }
        }

        CB_DONE => flows::run_done(&state, chat_id, owner, &username).await,

        CB_CANCEL => flows::run_cancel(&state, chat_id, owner).await,

        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_mode_instructions_mention_several_images() {
        let text = new_draft_instructions(DraftMode::Multiple);
        assert!(text.contains("several images"));
    }

    #[test]
    fn single_mode_instructions_do_not() {
        let text = new_draft_instructions(DraftMode::Single);
        assert!(!text.contains("several images"));
    }
}

//! Telegram update handlers.
//!
//! Each handler validates authorization, routes the event to the draft state
//! machine in `chanpost-core`, and renders the outcome back to the operator.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use chanpost_core::audit::AuditEvent;
use chanpost_core::domain::UserId;
use chanpost_core::security::is_authorized;

use crate::router::AppState;

mod callback;
mod commands;
mod flows;
mod photo;
#[cfg(test)]
mod support;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    if !is_authorized(Some(UserId(user_id)), &state.cfg.authorized_users) {
        if let Err(e) = state
            .audit
            .write(AuditEvent::auth(user_id, &username, false))
        {
            eprintln!("[AUDIT] Failed to write auth event: {e}");
        }
        let _ = bot
            .send_message(msg.chat.id, "⚠️ You are not authorized to use this bot.")
            .await;
        return Ok(());
    }

    // Events for one operator are handled strictly in order.
    let _guard = state.user_locks.lock_user(user_id).await;

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
        return text::handle_text(bot, msg, state).await;
    }

    if msg.photo().is_some() {
        return photo::handle_photo(bot, msg, state).await;
    }

    Ok(())
}

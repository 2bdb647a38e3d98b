use std::sync::Arc;

use teloxide::prelude::*;

use chanpost_core::{
    buttons::ParseReport,
    domain::{ChatId, UserId},
    draft::DraftState,
    formatting::escape_html,
};

use crate::router::AppState;

use super::flows;

fn render_report(report: &ParseReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    for invalid in &report.invalid {
        lines.push(format!(
            "⚠️ {}: {}",
            escape_html(&invalid.line),
            invalid.reason
        ));
    }

    if report.added > 0 {
        let noun = if report.added == 1 { "button" } else { "buttons" };
        lines.push(format!(
            "✅ Added {} {noun}! Send more links or /done to finish.",
            report.added
        ));
    } else if lines.is_empty() {
        lines.push("⚠️ No buttons found. Send links as: Name - URL".to_string());
    }

    lines.join("\n")
}

async fn process_link_text(
    state: &AppState,
    chat_id: ChatId,
    owner: UserId,
    username: &str,
    text: &str,
) {
    let report = state
        .drafts
        .with(owner, |d| {
            if d.state() == DraftState::AwaitingLink {
                Some(d.add_buttons(text))
            } else {
                None
            }
        })
        .await;

    match report {
        // Free text while a draft exists but is not collecting links is
        // ignored, like any other unexpected update.
        Ok(None) => {}
        Ok(Some(report)) => {
            let _ = state
                .messenger
                .send_html(chat_id, &render_report(&report))
                .await;
        }
        // No draft at all: the operator gets start-over guidance instead of
        // silence.
        Err(err) => {
            flows::report_error(state, chat_id, owner, username, err).await;
        }
    }
}

pub async fn handle_text(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let owner = UserId(user.id.0 as i64);
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let chat_id = ChatId(msg.chat.id.0);

    process_link_text(&state, chat_id, owner, &username, text).await;

    Ok(())
}

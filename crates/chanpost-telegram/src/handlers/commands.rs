use std::sync::Arc;

use teloxide::prelude::*;

use chanpost_core::{
    domain::{ChatId, UserId},
    formatting::escape_html,
    messaging::types::{InlineButton, InlineKeyboard},
};

use crate::router::AppState;

use super::flows::{self, CB_NEW_MULTIPLE, CB_NEW_SINGLE};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

async fn send_start_menu(state: &AppState, chat_id: ChatId) {
    let keyboard = InlineKeyboard::one_per_row(vec![
        InlineButton::new("📝 Single Post", CB_NEW_SINGLE),
        InlineButton::new("📚 Multiple Posts", CB_NEW_MULTIPLE),
    ]);
    let _ = state
        .messenger
        .send_menu(
            chat_id,
            "👋 Welcome! What kind of channel post do you want to create?",
            keyboard,
        )
        .await;
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
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

    let (cmd, _arg) = parse_command(text);

    match cmd.as_str() {
        "start" => {
            send_start_menu(&state, chat_id).await;
            Ok(())
        }

        "help" => {
            let body = "📋 Commands:\n\
/start - Choose a post type and begin composing\n\
/done - Finish link entry, or publish the post\n\
/cancel - Discard the current post\n\
/help - Show this message";
            let _ = state.messenger.send_html(chat_id, body).await;
            Ok(())
        }

        "done" => {
            flows::run_done(&state, chat_id, owner, &username).await;
            Ok(())
        }

        "cancel" => {
            flows::run_cancel(&state, chat_id, owner).await;
            Ok(())
        }

        _ => {
            let _ = state
                .messenger
                .send_html(chat_id, &format!("Unknown command: /{}", escape_html(&cmd)))
                .await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix() {
        let (cmd, arg) = parse_command("/done@chanpost_bot now");
        assert_eq!(cmd, "done");
        assert_eq!(arg, "now");
    }

    #[test]
    fn lowercases_command_name() {
        let (cmd, _) = parse_command("/START");
        assert_eq!(cmd, "start");
    }
}

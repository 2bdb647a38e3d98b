use std::sync::Arc;

use teloxide::prelude::*;

use chanpost_core::{
    domain::{ChatId, FileId, UserId},
    draft::DraftMode,
};

use crate::router::AppState;

use super::flows;

pub async fn handle_photo(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(photos) = msg.photo() else {
        return Ok(());
    };
    // Telegram sends every resolution of the image; the last is the largest.
    let Some(best) = photos.last() else {
        return Ok(());
    };

    let owner = UserId(user.id.0 as i64);
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let chat_id = ChatId(msg.chat.id.0);

    let media = FileId(best.file.id.clone());
    let caption = msg.caption().unwrap_or("").to_string();

    let accepted = state
        .drafts
        .with(owner, |d| {
            d.receive_media(media, &caption)
                .map(|count| (count, d.mode()))
        })
        .await;

    match accepted {
        Ok(Ok((count, mode))) => {
            if mode == DraftMode::Multiple {
                let _ = state
                    .messenger
                    .send_html(
                        chat_id,
                        &format!(
                            "✅ Image {count} received! Send another, or press ✅ Done when finished."
                        ),
                    )
                    .await;
            }
            flows::send_preview(&state, chat_id, owner, &username).await;
        }
        Ok(Err(err)) | Err(err) => {
            flows::report_error(&state, chat_id, owner, &username, err).await;
        }
    }

    Ok(())
}

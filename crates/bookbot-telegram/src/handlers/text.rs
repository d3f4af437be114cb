//! Free-text messages. Any non-command text is treated as a search query;
//! the bot replies with the entity picker and keeps the query in the reply
//! chain for the pagination callbacks.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use bookbot_core::{
    analytics::AnalyticsEvent,
    domain::{ChatId, MessageId, UserId},
    search::search_prompt_keyboard,
    strings,
};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let text = msg.text().unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(());
    }

    let chat = ChatId(msg.chat.id.0);
    let user = UserId(from.id.0 as i64);

    state
        .analytics
        .record(AnalyticsEvent::search("new_search_query", user.0, text));

    let sent = state
        .messenger
        .send_html(
            chat,
            strings::SEARCH_PROMPT,
            Some(search_prompt_keyboard()),
            Some(MessageId(msg.id.0)),
        )
        .await;

    if let Err(e) = sent {
        eprintln!("[DISPATCH] search prompt failed: {e}");
    }

    Ok(())
}

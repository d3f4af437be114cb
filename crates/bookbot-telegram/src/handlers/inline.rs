//! Inline mode. The only supported query is `share_{book_id}`, planted by
//! the share button under delivered files; it answers with a single article
//! carrying the book card and a deep link back to the bot.

use std::sync::Arc;

use teloxide::{prelude::*, types::InlineQuery};

use bookbot_core::{analytics::AnalyticsEvent, domain::UserId};

use crate::router::AppState;

pub async fn handle_inline_query(q: InlineQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let user = UserId(q.from.id.0 as i64);

    let Some(book_id) = q
        .query
        .trim()
        .strip_prefix("share_")
        .and_then(|s| s.parse::<u32>().ok())
    else {
        // Anything else clears the result list so the client stops waiting.
        let _ = state.messenger.answer_inline_query(&q.id, Vec::new()).await;
        return Ok(());
    };

    state
        .analytics
        .record(AnalyticsEvent::command("share_book", user.0));

    let results = match state.search.share_article(book_id).await {
        Ok(Some(article)) => vec![article],
        Ok(None) => Vec::new(),
        Err(e) => {
            eprintln!("[DISPATCH] share query for {book_id} failed: {e}");
            Vec::new()
        }
    };

    let _ = state.messenger.answer_inline_query(&q.id, results).await;
    Ok(())
}

//! Telegram update handlers.
//!
//! Each handler parses the raw update, records an analytics event, and calls
//! into the `bookbot-core` services through the messaging port. Failures are
//! logged and answered with a generic notice instead of crashing the
//! dispatcher.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineQuery, Message},
};

use crate::router::AppState;

mod callback;
mod commands;
mod inline;
mod settings;
mod text;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_inline_query(q: InlineQuery, state: Arc<AppState>) -> ResponseResult<()> {
    inline::handle_inline_query(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // The bot only reads text; stickers, photos and the like are ignored.
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return commands::handle_command(msg, state).await;
    }

    text::handle_text(msg, state).await
}

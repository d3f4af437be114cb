//! Settings menus: language filters and the beta-testing opt-in.
//!
//! The menus live in a single message that gets edited as the user walks
//! between them; state changes re-render only the keyboard.

use bookbot_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{InlineButton, InlineKeyboard},
    settings::{UserSettings, KNOWN_LANGS},
    strings, Result,
};

use crate::router::AppState;

fn main_keyboard() -> InlineKeyboard {
    InlineKeyboard::single_row(vec![InlineButton::callback(
        strings::SETTINGS_LANGS,
        "langs_settings",
    )])
    .row(vec![InlineButton::callback(
        strings::SETTINGS_BETA,
        "beta_testing",
    )])
}

/// One row per language. The label shows the current state; the callback
/// carries the explicit opposite, so stale keyboards stay harmless.
fn lang_keyboard(settings: &UserSettings) -> InlineKeyboard {
    let mut keyboard = InlineKeyboard::default();
    for (code, name) in KNOWN_LANGS {
        let button = if settings.allows(code) {
            InlineButton::callback(format!("{name}: ✅ включен!"), format!("{code}_off"))
        } else {
            InlineButton::callback(format!("{name}: 🅾 выключен!"), format!("{code}_on"))
        };
        keyboard = keyboard.row(vec![button]);
    }
    keyboard.row(vec![InlineButton::callback(
        strings::SETTINGS_BACK,
        "settings_main",
    )])
}

fn beta_keyboard(settings: &UserSettings) -> InlineKeyboard {
    let join = if settings.beta_testing {
        InlineButton::callback("✅ Участвовать в бета тесте!", "noop")
    } else {
        InlineButton::callback("Участвовать в бета тесте!", "beta_test_on")
    };
    let leave = if settings.beta_testing {
        InlineButton::callback("Не участвовать в бета тесте!", "beta_test_off")
    } else {
        InlineButton::callback("✅ Не участвовать в бета тесте!", "noop")
    };
    InlineKeyboard::single_row(vec![join])
        .row(vec![leave])
        .row(vec![InlineButton::callback(
            strings::SETTINGS_BACK,
            "settings_main",
        )])
}

pub async fn send_menu(state: &AppState, chat: ChatId, reply_to: Option<MessageId>) -> Result<()> {
    state
        .messenger
        .send_html(chat, strings::SETTINGS_PROMPT, Some(main_keyboard()), reply_to)
        .await?;
    Ok(())
}

pub async fn show_main(state: &AppState, view: MessageRef) -> Result<()> {
    state
        .messenger
        .edit_html(view, strings::SETTINGS_TITLE, Some(main_keyboard()))
        .await
}

pub async fn show_langs(state: &AppState, view: MessageRef, user: UserId) -> Result<()> {
    let settings = state.settings.get(user).await?;
    state
        .messenger
        .edit_html(view, strings::LANGS_TITLE, Some(lang_keyboard(&settings)))
        .await
}

pub async fn show_beta(state: &AppState, view: MessageRef, user: UserId) -> Result<()> {
    let settings = state.settings.get(user).await?;
    state
        .messenger
        .edit_html(view, strings::BETA_TITLE, Some(beta_keyboard(&settings)))
        .await
}

pub async fn set_lang(
    state: &AppState,
    view: MessageRef,
    user: UserId,
    code: &str,
    enabled: bool,
) -> Result<()> {
    let mut settings = state.settings.get(user).await?;
    if settings.set_lang(code, enabled) {
        state.settings.update(&settings).await?;
    }
    state
        .messenger
        .edit_keyboard(view, Some(lang_keyboard(&settings)))
        .await
}

pub async fn set_beta(
    state: &AppState,
    view: MessageRef,
    user: UserId,
    enabled: bool,
) -> Result<()> {
    let mut settings = state.settings.get(user).await?;
    settings.beta_testing = enabled;
    state.settings.update(&settings).await?;
    state
        .messenger
        .edit_keyboard(view, Some(beta_keyboard(&settings)))
        .await
}

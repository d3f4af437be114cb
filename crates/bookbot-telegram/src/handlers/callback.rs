//! Callback-query dispatch.
//!
//! Callback data is a compact grammar. Pagination payloads embed the entity
//! id and page (`ba_37_2`), delivery payloads embed format and id
//! (`seq_dl_epub_51`), and the plain search pages (`b_2`) recover the query
//! text from the reply chain under the prompt message.

use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use regex::Regex;
use teloxide::{prelude::*, types::CallbackQuery};

use bookbot_core::{
    analytics::AnalyticsEvent,
    catalog::types::CONVERTIBLE_FORMATS,
    domain::{ChatId, MessageId, MessageRef, UserId},
    search::SequenceViewMode,
    settings::KNOWN_LANGS,
    strings, Result,
};

use crate::handlers::settings;
use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let user = UserId(q.from.id.0 as i64);

    // Keyboards sent through inline mode have no message to act on; ack and
    // move on.
    let Some(message) = q.message.as_ref() else {
        let _ = state.messenger.answer_callback_query(&q.id, None).await;
        return Ok(());
    };
    if data.is_empty() {
        let _ = state.messenger.answer_callback_query(&q.id, None).await;
        return Ok(());
    }

    let view = MessageRef {
        chat_id: ChatId(message.chat.id.0),
        message_id: MessageId(message.id.0),
    };

    if let Err(e) = dispatch(&state, message, view, user, &data).await {
        eprintln!("[DISPATCH] callback {data} failed: {e}");
        let _ = state
            .messenger
            .send_html(view.chat_id, strings::SOMETHING_WRONG, None, None)
            .await;
    }

    // Always answer, or the client keeps its spinner going.
    let _ = state.messenger.answer_callback_query(&q.id, None).await;
    Ok(())
}

async fn dispatch(
    state: &AppState,
    message: &Message,
    view: MessageRef,
    user: UserId,
    data: &str,
) -> Result<()> {
    let chat = view.chat_id;

    match data {
        "noop" => return Ok(()),
        "settings_main" => {
            state
                .analytics
                .record(AnalyticsEvent::command("settings_main", user.0));
            return settings::show_main(state, view).await;
        }
        "langs_settings" => {
            state
                .analytics
                .record(AnalyticsEvent::command("lang_settings", user.0));
            return settings::show_langs(state, view, user).await;
        }
        "beta_testing" => {
            state
                .analytics
                .record(AnalyticsEvent::command("beta_testing_menu", user.0));
            return settings::show_beta(state, view, user).await;
        }
        "beta_test_on" | "beta_test_off" => {
            state
                .analytics
                .record(AnalyticsEvent::command("beta_testing_choose", user.0));
            return settings::set_beta(state, view, user, data == "beta_test_on").await;
        }
        "remove_cache" => {
            state
                .analytics
                .record(AnalyticsEvent::command("remove_cache", user.0));
            return redeliver_from_reply(state, message, view, user).await;
        }
        _ => {}
    }

    if let Some((code, enabled)) = parse_lang_switch(data) {
        state
            .analytics
            .record(AnalyticsEvent::command("lang_settings_change", user.0));
        return settings::set_lang(state, view, user, code, enabled).await;
    }

    if let Some(id) = data.strip_prefix("book_detail_").and_then(parse_u32) {
        state.analytics.record(AnalyticsEvent::command("book_detail", user.0));
        return state.search.book_detail(chat, Some(view), None, id).await;
    }

    if let Some((id, page)) = data.strip_prefix("b_ann_").and_then(parse_id_page) {
        state
            .analytics
            .record(AnalyticsEvent::command("get_book_annotation", user.0));
        return state.search.book_annotation_page(view, id, page).await;
    }

    if let Some((id, page)) = data.strip_prefix("a_ann_").and_then(parse_id_page) {
        state
            .analytics
            .record(AnalyticsEvent::command("get_author_annotation", user.0));
        return state
            .search
            .author_annotation_page(chat, Some(view), None, id, page)
            .await;
    }

    if let Some(rest) = data.strip_prefix("seq_dl_") {
        // A bare id opens the format menu; `fmt_id` starts the delivery.
        if let Some(id) = parse_u32(rest) {
            state
                .analytics
                .record(AnalyticsEvent::command("download_by_serial_keyboard", user.0));
            return state.search.sequence_format_menu(view, id).await;
        }
        if let Some((fmt, id)) = parse_sequence_download(rest) {
            state
                .analytics
                .record(AnalyticsEvent::command("download_series", user.0));
            return state.delivery.send_sequence(view, user, id, fmt).await;
        }
        return Ok(());
    }

    if let Some(rest) = data.strip_prefix("ul_") {
        if let Some((start, end, page)) = parse_update_log(rest) {
            state
                .analytics
                .record(AnalyticsEvent::command("get_update_log", user.0));
            return state.search.update_log_page(view, user, start, end, page).await;
        }
        return Ok(());
    }

    if let Some((id, page)) = data.strip_prefix("ba_").and_then(parse_id_page) {
        state
            .analytics
            .record(AnalyticsEvent::command("get_books_by_author", user.0));
        return state
            .search
            .author_books_page(chat, Some(view), None, user, id, page)
            .await;
    }

    if let Some((id, page)) = data.strip_prefix("bs_").and_then(parse_id_page) {
        state
            .analytics
            .record(AnalyticsEvent::command("get_books_by_series", user.0));
        return state
            .search
            .sequence_books_page(chat, Some(view), None, user, id, page, SequenceViewMode::Browse)
            .await;
    }

    if let Some(page) = data.strip_prefix("b_").and_then(parse_u32) {
        return search_page(state, message, view, user, page, SearchTarget::Books).await;
    }
    if let Some(page) = data.strip_prefix("a_").and_then(parse_u32) {
        return search_page(state, message, view, user, page, SearchTarget::Authors).await;
    }
    if let Some(page) = data.strip_prefix("s_").and_then(parse_u32) {
        return search_page(state, message, view, user, page, SearchTarget::Sequences).await;
    }

    // Buttons from retired keyboards land here; nothing to do.
    Ok(())
}

#[derive(Clone, Copy, Debug)]
enum SearchTarget {
    Books,
    Authors,
    Sequences,
}

/// Search pagination. The prompt message was sent as a reply to the user's
/// query, so the query text is recovered from the reply chain; without it
/// (the user deleted the message) the bot can only ask to search again.
async fn search_page(
    state: &AppState,
    message: &Message,
    view: MessageRef,
    user: UserId,
    page: u32,
    target: SearchTarget,
) -> Result<()> {
    let chat = view.chat_id;
    let Some(query) = message.reply_to_message().and_then(|m| m.text()) else {
        state
            .messenger
            .send_html(chat, strings::TRY_AGAIN, None, Some(view.message_id))
            .await?;
        return Ok(());
    };

    match target {
        SearchTarget::Books => {
            state
                .analytics
                .record(AnalyticsEvent::search("search_book_by_title", user.0, query));
            state.search.books_page(view, user, query, page).await
        }
        SearchTarget::Authors => {
            state
                .analytics
                .record(AnalyticsEvent::search("search_authors", user.0, query));
            state.search.authors_page(view, user, query, page).await
        }
        SearchTarget::Sequences => {
            state
                .analytics
                .record(AnalyticsEvent::search("search_series", user.0, query));
            state.search.sequences_page(view, user, query, page).await
        }
    }
}

/// The broken-file button hangs under a document that was sent as a reply to
/// the requesting command, so the (book, format) pair is recovered from that
/// command's text.
async fn redeliver_from_reply(
    state: &AppState,
    message: &Message,
    view: MessageRef,
    user: UserId,
) -> Result<()> {
    let chat = view.chat_id;
    let source = message.reply_to_message();
    let Some((book_id, file_type)) = source
        .and_then(|m| m.text())
        .and_then(find_file_request)
    else {
        state
            .messenger
            .send_html(chat, strings::TRY_AGAIN, None, Some(view.message_id))
            .await?;
        return Ok(());
    };

    let reply_to = source.map(|m| MessageId(m.id.0));
    state
        .delivery
        .redeliver(chat, user, reply_to, book_id, &file_type)
        .await
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

/// `{id}_{page}`, both decimal.
fn parse_id_page(rest: &str) -> Option<(u32, u32)> {
    let (id, page) = rest.split_once('_')?;
    Some((id.parse().ok()?, page.parse().ok()?))
}

/// `{fmt}_{id}` from the sequence format menu.
fn parse_sequence_download(rest: &str) -> Option<(&str, u32)> {
    let (fmt, id) = rest.split_once('_')?;
    if !CONVERTIBLE_FORMATS.contains(&fmt) {
        return None;
    }
    Some((fmt, id.parse().ok()?))
}

/// `{start}_{end}_{page}` with ISO dates.
fn parse_update_log(rest: &str) -> Option<(NaiveDate, NaiveDate, u32)> {
    let mut parts = rest.splitn(3, '_');
    let start = parts.next()?.parse().ok()?;
    let end = parts.next()?.parse().ok()?;
    let page = parts.next()?.parse().ok()?;
    Some((start, end, page))
}

/// `{code}_{on|off}` from the language keyboard.
fn parse_lang_switch(data: &str) -> Option<(&str, bool)> {
    let (code, switch) = data.split_once('_')?;
    if !KNOWN_LANGS.iter().any(|(known, _)| *known == code) {
        return None;
    }
    match switch {
        "on" => Some((code, true)),
        "off" => Some((code, false)),
        _ => None,
    }
}

/// Digs a `fb2_42` style file request out of a command message's text.
fn find_file_request(text: &str) -> Option<(u32, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(fb2|epub|mobi|djvu|pdf|doc)_(\d+)").expect("valid regex")
    });
    let caps = re.captures(text)?;
    Some((caps[2].parse().ok()?, caps[1].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_page_pairs_parse() {
        assert_eq!(parse_id_page("37_2"), Some((37, 2)));
        assert_eq!(parse_id_page("37"), None);
        assert_eq!(parse_id_page("37_x"), None);
        assert_eq!(parse_id_page("ann_5_1"), None);
    }

    #[test]
    fn update_log_ranges_parse_iso_dates() {
        let parsed = parse_update_log("2023-01-02_2023-01-08_3");
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 8).unwrap();
        assert_eq!(parsed, Some((start, end, 3)));

        assert_eq!(parse_update_log("2023-01-02_3"), None);
        assert_eq!(parse_update_log("yesterday_today_1"), None);
    }

    #[test]
    fn lang_switches_accept_known_codes_only() {
        assert_eq!(parse_lang_switch("uk_on"), Some(("uk", true)));
        assert_eq!(parse_lang_switch("ru_off"), Some(("ru", false)));
        assert_eq!(parse_lang_switch("fr_on"), None);
        assert_eq!(parse_lang_switch("uk_maybe"), None);
        assert_eq!(parse_lang_switch("beta_test_on"), None);
    }

    #[test]
    fn sequence_downloads_require_a_known_format() {
        assert_eq!(parse_sequence_download("epub_51"), Some(("epub", 51)));
        assert_eq!(parse_sequence_download("pdf_51"), None);
        assert_eq!(parse_sequence_download("epub_x"), None);
    }

    #[test]
    fn file_requests_are_found_inside_command_text() {
        assert_eq!(find_file_request("/fb2_42"), Some((42, "fb2".to_string())));
        assert_eq!(
            find_file_request("Скачать: /epub_123 или /mobi_123"),
            Some((123, "epub".to_string()))
        );
        assert_eq!(find_file_request("нет ссылок"), None);
    }
}

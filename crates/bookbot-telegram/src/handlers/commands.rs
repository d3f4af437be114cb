//! Slash commands, including the per-entity commands search listings embed
//! in their text (/fb2_42, /a_123, /b_info_42 and so on).

use std::sync::{Arc, OnceLock};

use regex::Regex;
use teloxide::prelude::*;

use bookbot_core::{
    analytics::AnalyticsEvent,
    domain::{ChatId, MessageId, UserId},
    search::SequenceViewMode,
    strings, Result,
};

use crate::handlers::settings;
use crate::router::AppState;

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

#[derive(Debug, PartialEq, Eq)]
enum EntityCommand {
    Download { file_type: String, book_id: u32 },
    AuthorBooks(u32),
    SequenceBooks(u32),
    BookDetail(u32),
    AuthorAnnotation(u32),
}

fn parse_entity_command(cmd: &str) -> Option<EntityCommand> {
    static DOWNLOAD: OnceLock<Regex> = OnceLock::new();
    let download = DOWNLOAD.get_or_init(|| {
        Regex::new(r"^(fb2|epub|mobi|djvu|pdf|doc)_(\d+)$").expect("valid regex")
    });
    if let Some(caps) = download.captures(cmd) {
        let book_id = caps[2].parse().ok()?;
        return Some(EntityCommand::Download {
            file_type: caps[1].to_string(),
            book_id,
        });
    }
    if let Some(id) = cmd.strip_prefix("b_info_").and_then(|s| s.parse().ok()) {
        return Some(EntityCommand::BookDetail(id));
    }
    if let Some(id) = cmd.strip_prefix("a_info_").and_then(|s| s.parse().ok()) {
        return Some(EntityCommand::AuthorAnnotation(id));
    }
    if let Some(id) = cmd.strip_prefix("a_").and_then(|s| s.parse().ok()) {
        return Some(EntityCommand::AuthorBooks(id));
    }
    if let Some(id) = cmd.strip_prefix("s_").and_then(|s| s.parse().ok()) {
        return Some(EntityCommand::SequenceBooks(id));
    }
    None
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat = ChatId(msg.chat.id.0);
    let user = UserId(from.id.0 as i64);
    let reply_to = Some(MessageId(msg.id.0));
    let (cmd, rest) = parse_command(text);

    let outcome = dispatch(&state, &from.first_name, chat, user, reply_to, &cmd, &rest).await;
    if let Err(e) = outcome {
        eprintln!("[DISPATCH] command /{cmd} failed: {e}");
        let _ = state
            .messenger
            .send_html(chat, strings::SOMETHING_WRONG, None, reply_to)
            .await;
    }
    Ok(())
}

async fn dispatch(
    state: &AppState,
    first_name: &str,
    chat: ChatId,
    user: UserId,
    reply_to: Option<MessageId>,
    cmd: &str,
    rest: &str,
) -> Result<()> {
    match cmd {
        "start" => {
            // Shared cards deep-link back here as `/start fb2_42`.
            if let Some(EntityCommand::Download { file_type, book_id }) =
                parse_entity_command(rest)
            {
                state
                    .analytics
                    .record(AnalyticsEvent::command("get_shared_book", user.0));
                return state
                    .delivery
                    .send_book(chat, user, reply_to, book_id, &file_type)
                    .await;
            }
            state.analytics.record(AnalyticsEvent::command("start", user.0));
            state
                .messenger
                .send_html(chat, &strings::greeting(first_name), None, reply_to)
                .await?;
            Ok(())
        }

        "help" => {
            state.analytics.record(AnalyticsEvent::command("help", user.0));
            state
                .messenger
                .send_html(chat, strings::HELP, None, reply_to)
                .await?;
            Ok(())
        }

        "settings" => {
            state.analytics.record(AnalyticsEvent::command("settings", user.0));
            settings::send_menu(state, chat, reply_to).await
        }

        "random_book" => {
            state
                .analytics
                .record(AnalyticsEvent::command("get_random_book", user.0));
            state.search.random_book(chat, user, reply_to).await
        }

        "random_author" => {
            state
                .analytics
                .record(AnalyticsEvent::command("get_random_author", user.0));
            state.search.random_author(chat, user, reply_to).await
        }

        "random_series" => {
            state
                .analytics
                .record(AnalyticsEvent::command("get_random_series", user.0));
            state.search.random_sequence(chat, user, reply_to).await
        }

        "update_log" => {
            state
                .analytics
                .record(AnalyticsEvent::command("get_update_log_message", user.0));
            state.search.update_log_menu(chat, reply_to).await
        }

        "beta_functions" => {
            state
                .analytics
                .record(AnalyticsEvent::command("beta_test_functions", user.0));
            state
                .messenger
                .send_html(chat, strings::BETA_FUNCTIONS, None, reply_to)
                .await?;
            Ok(())
        }

        _ => match parse_entity_command(cmd) {
            Some(EntityCommand::Download { file_type, book_id }) => {
                state.analytics.record(AnalyticsEvent::command("download", user.0));
                state
                    .delivery
                    .send_book(chat, user, reply_to, book_id, &file_type)
                    .await
            }
            Some(EntityCommand::AuthorBooks(author_id)) => {
                state
                    .analytics
                    .record(AnalyticsEvent::command("get_books_by_author", user.0));
                state
                    .search
                    .author_books_page(chat, None, reply_to, user, author_id, 1)
                    .await
            }
            Some(EntityCommand::SequenceBooks(sequence_id)) => {
                state
                    .analytics
                    .record(AnalyticsEvent::command("get_book_by_series", user.0));
                state
                    .search
                    .sequence_books_page(
                        chat,
                        None,
                        reply_to,
                        user,
                        sequence_id,
                        1,
                        SequenceViewMode::Browse,
                    )
                    .await
            }
            Some(EntityCommand::BookDetail(book_id)) => {
                state.analytics.record(AnalyticsEvent::command("book_detail", user.0));
                state.search.book_detail(chat, None, reply_to, book_id).await
            }
            Some(EntityCommand::AuthorAnnotation(author_id)) => {
                state
                    .analytics
                    .record(AnalyticsEvent::command("author_annotation", user.0));
                state
                    .search
                    .author_annotation_page(chat, None, reply_to, author_id, 1)
                    .await
            }
            // Group chats carry plenty of commands meant for other bots.
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_mention_and_lowercases() {
        let (cmd, rest) = parse_command("/Start@BookCatalogBot fb2_42");
        assert_eq!(cmd, "start");
        assert_eq!(rest, "fb2_42");

        let (cmd, rest) = parse_command("/update_log");
        assert_eq!(cmd, "update_log");
        assert_eq!(rest, "");
    }

    #[test]
    fn entity_commands_parse_ids() {
        assert_eq!(
            parse_entity_command("fb2_42"),
            Some(EntityCommand::Download {
                file_type: "fb2".to_string(),
                book_id: 42
            })
        );
        assert_eq!(parse_entity_command("a_123"), Some(EntityCommand::AuthorBooks(123)));
        assert_eq!(parse_entity_command("s_7"), Some(EntityCommand::SequenceBooks(7)));
        assert_eq!(parse_entity_command("b_info_42"), Some(EntityCommand::BookDetail(42)));
        assert_eq!(
            parse_entity_command("a_info_9"),
            Some(EntityCommand::AuthorAnnotation(9))
        );
    }

    #[test]
    fn junk_is_not_an_entity_command() {
        assert_eq!(parse_entity_command("zip_42"), None);
        assert_eq!(parse_entity_command("fb2_"), None);
        assert_eq!(parse_entity_command("a_abc"), None);
        assert_eq!(parse_entity_command("random_book"), None);
    }
}

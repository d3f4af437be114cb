//! Telegram adapter (teloxide).
//!
//! This crate implements the `bookbot-core` MessagingPort over the Telegram
//! Bot API and hosts the update handlers that drive the services.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
        InputFile, InputMessageContent, InputMessageContentText, ParseMode,
    },
};
use url::Url;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use bookbot_core::{
    domain::{ChatId, DocumentRef, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{
            ButtonAction, ChatAction, InlineArticle, InlineButton, InlineKeyboard,
            OutgoingDocument,
        },
    },
    Result,
};

fn to_button(button: InlineButton) -> InlineKeyboardButton {
    match button.action {
        ButtonAction::Callback(data) => InlineKeyboardButton::callback(button.label, data),
        ButtonAction::Url(raw) => match Url::parse(&raw) {
            Ok(parsed) => InlineKeyboardButton::url(button.label, parsed),
            // A malformed URL must not take the whole keyboard down.
            Err(_) => InlineKeyboardButton::callback(button.label, "noop"),
        },
        ButtonAction::SwitchInline(query) => {
            InlineKeyboardButton::switch_inline_query(button.label, query)
        }
    }
}

fn to_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        keyboard
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(to_button).collect::<Vec<_>>()),
    )
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Messaging(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let markup = keyboard.map(to_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(true);
                if let Some(reply_to) = reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(reply_to))
                        .allow_sending_without_reply(true);
                }
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        let markup = keyboard.map(to_markup);
        self.with_retry(|| {
            let mut req = self
                .bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    html.to_string(),
                )
                .parse_mode(ParseMode::Html)
                .disable_web_page_preview(true);
            if let Some(markup) = markup.clone() {
                req = req.reply_markup(markup);
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn edit_keyboard(&self, msg: MessageRef, keyboard: Option<InlineKeyboard>) -> Result<()> {
        let markup = keyboard.map(to_markup);
        self.with_retry(|| {
            let mut req = self.bot.edit_message_reply_markup(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
            );
            if let Some(markup) = markup.clone() {
                req = req.reply_markup(markup);
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        document: OutgoingDocument,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<DocumentRef> {
        let markup = keyboard.map(to_markup);
        // InputFile holds the payload behind `Bytes`; cloning it per attempt
        // does not copy the file content.
        let file = InputFile::memory(document.bytes).file_name(document.file_name);
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_document(Self::tg_chat(chat_id), file.clone());
                if let Some(caption) = caption {
                    req = req.caption(caption.to_string());
                }
                if let Some(reply_to) = reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(reply_to))
                        .allow_sending_without_reply(true);
                }
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                req
            })
            .await?;

        let file_id = msg
            .document()
            .map(|d| d.file.id.clone())
            .unwrap_or_default();
        Ok(DocumentRef {
            message: MessageRef {
                chat_id,
                message_id: MessageId(msg.id.0),
            },
            file_id,
        })
    }

    async fn resend_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        let markup = keyboard.map(to_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_document(Self::tg_chat(chat_id), InputFile::file_id(file_id.to_string()));
                if let Some(caption) = caption {
                    req = req.caption(caption.to_string());
                }
                if let Some(reply_to) = reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(reply_to))
                        .allow_sending_without_reply(true);
                }
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn copy_message(
        &self,
        chat_id: ChatId,
        from: MessageRef,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let markup = keyboard.map(to_markup);
        let copied = self
            .with_retry(|| {
                let mut req = self.bot.copy_message(
                    Self::tg_chat(chat_id),
                    Self::tg_chat(from.chat_id),
                    Self::tg_msg_id(from.message_id),
                );
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(copied.0),
        })
    }

    async fn send_photo_url(&self, chat_id: ChatId, url: &str) -> Result<MessageRef> {
        let parsed =
            Url::parse(url).map_err(|e| Error::Messaging(format!("bad photo url {url}: {e}")))?;
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_photo(Self::tg_chat(chat_id), InputFile::url(parsed.clone()))
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
            ChatAction::UploadDocument => teloxide::types::ChatAction::UploadDocument,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: Vec<InlineArticle>,
    ) -> Result<()> {
        let results: Vec<InlineQueryResult> = results
            .into_iter()
            .map(|article| {
                let content = InputMessageContentText::new(article.html)
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(true);
                InlineQueryResult::Article(
                    InlineQueryResultArticle::new(
                        article.id,
                        article.title,
                        InputMessageContent::Text(content),
                    )
                    .description(article.description),
                )
            })
            .collect();

        self.with_retry(|| {
            self.bot
                .answer_inline_query(inline_query_id.to_string(), results.clone())
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_to_their_telegram_kinds() {
        let markup = to_markup(
            InlineKeyboard::single_row(vec![InlineButton::callback("страница", "b_2")]).row(vec![
                InlineButton::switch_inline("Поделиться", "share_7"),
                InlineButton::url("Скачать", "https://books.example.org/book/download/7/fb2"),
            ]),
        );

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "страница");
        assert_eq!(markup.inline_keyboard[1].len(), 2);
    }

    #[test]
    fn bad_urls_degrade_to_inert_buttons() {
        let button = to_button(InlineButton::url("Скачать", "not a url"));
        assert_eq!(button.text, "Скачать");
        assert!(matches!(
            button.kind,
            teloxide::types::InlineKeyboardButtonKind::CallbackData(ref data) if data == "noop"
        ));
    }
}

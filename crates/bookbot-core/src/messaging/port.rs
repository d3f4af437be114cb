use async_trait::async_trait;

use crate::{
    domain::{ChatId, DocumentRef, MessageId, MessageRef},
    messaging::types::{ChatAction, InlineArticle, InlineKeyboard, OutgoingDocument},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is designed so future
/// adapters can fit behind the same interface.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send an HTML-formatted message. `reply_to` requests a reply link to an
    /// earlier message in the same chat (best effort: delivery must not fail
    /// when the referenced message is gone).
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    /// Replace the text (and keyboard) of an already-sent message.
    async fn edit_html(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()>;

    /// Replace only the keyboard of an already-sent message.
    async fn edit_keyboard(&self, msg: MessageRef, keyboard: Option<InlineKeyboard>) -> Result<()>;

    /// Upload a document from memory. The caption is sent as plain text.
    async fn send_document(
        &self,
        chat_id: ChatId,
        document: OutgoingDocument,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<DocumentRef>;

    /// Re-send a previously uploaded document by its platform file id,
    /// without moving the bytes again.
    async fn resend_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    /// Copy a message from another chat (e.g. a broadcast channel) into
    /// `chat_id`, optionally attaching a fresh keyboard.
    async fn copy_message(
        &self,
        chat_id: ChatId,
        from: MessageRef,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    /// Send a photo by URL; the platform fetches the bytes itself.
    async fn send_photo_url(&self, chat_id: ChatId, url: &str) -> Result<MessageRef>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: Vec<InlineArticle>,
    ) -> Result<()>;
}

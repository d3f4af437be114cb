//! Book file delivery.
//!
//! A delivery tries the cheapest source first: copy a relay channel post,
//! then re-send a cached platform file id, and only then fetch the bytes
//! from the catalog and upload them. Successful uploads feed the cache so
//! the next request for the same (book, format) skips the transfer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cache::DeliveryCache,
    catalog::{port::CatalogGateway, types::MULTI_FORMAT},
    config::Config,
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, InlineButton, InlineKeyboard, OutgoingDocument},
    },
    search::{SearchService, SequenceViewMode},
    settings::SettingsStore,
    strings, Result,
};

/// Bot uploads are capped at 50 MB; larger files go out as a direct link.
pub const MAX_UPLOAD_BYTES: usize = 50_000_000;

/// Page size that collects a whole sequence in one catalog call.
const SEQUENCE_FETCH_LIMIT: u32 = 1_000_000;

/// Index of book files already posted to a relay channel. Copying a channel
/// post moves no bytes through the bot at all.
#[async_trait]
pub trait RelayIndex: Send + Sync {
    async fn lookup(&self, book_id: u32, file_type: &str) -> Result<Option<MessageRef>>;
}

/// Per-book download metering.
#[async_trait]
pub trait DownloadCounter: Send + Sync {
    async fn record(&self, book_id: u32, user_id: UserId) -> Result<()>;
}

/// Keyboard under every delivered file: report a broken upload, or share the
/// book through inline mode.
fn share_keyboard(book_id: u32) -> InlineKeyboard {
    InlineKeyboard::single_row(vec![InlineButton::callback(
        strings::BROKEN_FILE,
        "remove_cache",
    )])
    .row(vec![InlineButton::switch_inline(
        strings::SHARE,
        format!("share_{book_id}"),
    )])
}

pub struct DeliveryService {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    gateway: Arc<dyn CatalogGateway>,
    cache: Arc<dyn DeliveryCache>,
    relay: Option<Arc<dyn RelayIndex>>,
    counter: Arc<dyn DownloadCounter>,
    settings: Arc<dyn SettingsStore>,
    search: Arc<SearchService>,
}

impl DeliveryService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        gateway: Arc<dyn CatalogGateway>,
        cache: Arc<dyn DeliveryCache>,
        relay: Option<Arc<dyn RelayIndex>>,
        counter: Arc<dyn DownloadCounter>,
        settings: Arc<dyn SettingsStore>,
        search: Arc<SearchService>,
    ) -> Self {
        Self {
            cfg,
            messenger,
            gateway,
            cache,
            relay,
            counter,
            settings,
            search,
        }
    }

    /// Metering is best effort; a delivery never fails because the counter
    /// endpoint is down.
    async fn meter(&self, book_id: u32, user: UserId) {
        if let Err(e) = self.counter.record(book_id, user).await {
            eprintln!("[DELIVERY] download counter update failed for {book_id}: {e}");
        }
    }

    /// Deliver one book file. Successful paths and failed fetches are
    /// metered; an unknown book is not.
    pub async fn send_book(
        &self,
        chat: ChatId,
        user: UserId,
        reply_to: Option<MessageId>,
        book_id: u32,
        file_type: &str,
    ) -> Result<()> {
        let _ = self
            .messenger
            .send_chat_action(chat, ChatAction::UploadDocument)
            .await;

        let Some(book) = self.gateway.book_by_id(book_id).await? else {
            self.messenger
                .send_html(chat, strings::BOOK_NOT_FOUND, None, reply_to)
                .await?;
            return Ok(());
        };

        if let Some(relay) = &self.relay {
            match relay.lookup(book_id, file_type).await {
                Ok(Some(post)) => {
                    match self
                        .messenger
                        .copy_message(chat, post, Some(share_keyboard(book_id)))
                        .await
                    {
                        Ok(_) => {
                            self.meter(book_id, user).await;
                            return Ok(());
                        }
                        Err(e) => {
                            eprintln!(
                                "[DELIVERY] relay copy failed for {book_id}/{file_type}: {e}"
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    eprintln!("[DELIVERY] relay lookup failed for {book_id}/{file_type}: {e}");
                }
            }
        }

        match self.cache.get(book_id, file_type).await {
            Ok(Some(cached)) => {
                match self
                    .messenger
                    .resend_document(
                        chat,
                        &cached.file_id,
                        Some(&book.caption()),
                        Some(share_keyboard(book_id)),
                        reply_to,
                    )
                    .await
                {
                    Ok(_) => {
                        self.meter(book_id, user).await;
                        return Ok(());
                    }
                    Err(e) => {
                        // The platform expires file ids now and then; drop
                        // the entry and fall through to a fresh fetch.
                        eprintln!(
                            "[DELIVERY] cached re-send failed for {book_id}/{file_type}: {e}"
                        );
                        let _ = self.cache.invalidate(book_id, file_type).await;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("[DELIVERY] cache lookup failed for {book_id}/{file_type}: {e}");
            }
        }

        let payload = match self.gateway.download(book_id, file_type).await {
            Ok(Some(payload)) if !payload.is_empty() => payload,
            Ok(_) => {
                self.messenger
                    .send_html(chat, strings::DOWNLOAD_ERROR, None, reply_to)
                    .await?;
                self.meter(book_id, user).await;
                return Ok(());
            }
            Err(e) => {
                eprintln!("[DELIVERY] download failed for {book_id}/{file_type}: {e}");
                self.messenger
                    .send_html(chat, strings::DOWNLOAD_ERROR, None, reply_to)
                    .await?;
                self.meter(book_id, user).await;
                return Ok(());
            }
        };

        if payload.len() > MAX_UPLOAD_BYTES {
            self.messenger
                .send_html(
                    chat,
                    &book.download_caption(&self.cfg.catalog_public_url, file_type),
                    None,
                    reply_to,
                )
                .await?;
            self.meter(book_id, user).await;
            return Ok(());
        }

        let document = OutgoingDocument {
            file_name: book.filename(file_type),
            bytes: payload,
        };
        let delivered = self
            .messenger
            .send_document(
                chat,
                document,
                Some(&book.caption()),
                Some(share_keyboard(book_id)),
                reply_to,
            )
            .await?;

        if delivered.file_id.is_empty() {
            eprintln!("[DELIVERY] upload for {book_id}/{file_type} returned no file id");
        } else if let Err(e) = self.cache.put(book_id, file_type, &delivered.file_id).await {
            eprintln!("[DELIVERY] cache write failed for {book_id}/{file_type}: {e}");
        }
        self.meter(book_id, user).await;
        Ok(())
    }

    /// "Broken file" flow: tell the user, drop the cached upload and deliver
    /// the book again from a fresh copy.
    pub async fn redeliver(
        &self,
        chat: ChatId,
        user: UserId,
        reply_to: Option<MessageId>,
        book_id: u32,
        file_type: &str,
    ) -> Result<()> {
        self.messenger
            .send_html(chat, strings::CACHE_REMOVED, None, None)
            .await?;
        if let Err(e) = self.cache.invalidate(book_id, file_type).await {
            eprintln!("[DELIVERY] cache invalidate failed for {book_id}/{file_type}: {e}");
        }
        self.send_book(chat, user, reply_to, book_id, file_type).await
    }

    /// Bulk sequence delivery. The listing is re-rendered as an
    /// acknowledgement first, then every book goes out as a reply to it.
    /// Books stored in the convertible format honor the requested one;
    /// everything else ships in its native format.
    pub async fn send_sequence(
        &self,
        view: MessageRef,
        user: UserId,
        sequence_id: u32,
        file_type: &str,
    ) -> Result<()> {
        let chat = view.chat_id;
        let langs = self.settings.get(user).await?.allowed_langs();
        if langs.is_empty() {
            self.messenger
                .send_html(chat, strings::NEED_LANGS, None, None)
                .await?;
            return Ok(());
        }

        self.search
            .sequence_books_page(
                chat,
                Some(view),
                None,
                user,
                sequence_id,
                1,
                SequenceViewMode::Delivering,
            )
            .await?;

        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let Some(sequence) = self
            .gateway
            .sequence_books(sequence_id, &langs, SEQUENCE_FETCH_LIMIT, 1)
            .await?
        else {
            return Ok(());
        };

        for book in &sequence.books {
            let fmt = if book.book.file_type == MULTI_FORMAT {
                file_type
            } else {
                book.book.file_type.as_str()
            };
            // One broken book must not cut the rest of the sequence off.
            if let Err(e) = self
                .send_book(chat, user, Some(view.message_id), book.book.id, fmt)
                .await
            {
                eprintln!(
                    "[DELIVERY] sequence {sequence_id}: book {} failed: {e}",
                    book.book.id
                );
            }
        }
        Ok(())
    }
}

//! Catalog browsing: searches, listings, detail cards, annotations and the
//! update log. Everything here is read-only; file delivery lives in
//! `delivery`.
//!
//! Views triggered by a message are sent as replies; views triggered by a
//! pagination callback edit the message the keyboard hangs off (`view`).

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    catalog::{port::CatalogGateway, types::CONVERTIBLE_FORMATS},
    config::Config,
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, InlineArticle, InlineButton, InlineKeyboard},
    },
    pagination::{page_footer, page_keyboard, ELEMENTS_ON_PAGE},
    settings::SettingsStore,
    strings,
    text::{escape_html, normalize_query, split_text, MAX_CHUNK},
    Result,
};

/// Whether a sequence listing offers the bulk download or acknowledges one
/// already running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceViewMode {
    Browse,
    Delivering,
}

/// Keyboard attached to the search prompt the bot sends back for free-form
/// text: the user picks which entity to search.
pub fn search_prompt_keyboard() -> InlineKeyboard {
    InlineKeyboard::single_row(vec![InlineButton::callback(strings::SEARCH_BY_TITLE, "b_1")])
        .row(vec![
            InlineButton::callback(strings::SEARCH_BY_AUTHOR, "a_1"),
            InlineButton::callback(strings::SEARCH_BY_SEQUENCE, "s_1"),
        ])
}

fn render_listing(entries: Vec<String>, page: u32, total_pages: u32) -> String {
    format!("{}{}", entries.join("\n\n"), page_footer(page, total_pages))
}

pub struct SearchService {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    gateway: Arc<dyn CatalogGateway>,
    settings: Arc<dyn SettingsStore>,
}

impl SearchService {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        gateway: Arc<dyn CatalogGateway>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            cfg,
            messenger,
            gateway,
            settings,
        }
    }

    /// Language filter for catalog queries. `None` means the user disabled
    /// every language and has already been told to fix that.
    async fn allowed_langs_or_prompt(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> Result<Option<Vec<String>>> {
        let langs = self.settings.get(user).await?.allowed_langs();
        if langs.is_empty() {
            self.messenger
                .send_html(chat, strings::NEED_LANGS, None, None)
                .await?;
            return Ok(None);
        }
        Ok(Some(langs))
    }

    async fn reply_or_edit(
        &self,
        chat: ChatId,
        view: Option<MessageRef>,
        reply_to: Option<MessageId>,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<()> {
        match view {
            Some(msg) => self.messenger.edit_html(msg, html, keyboard).await,
            None => self
                .messenger
                .send_html(chat, html, keyboard, reply_to)
                .await
                .map(|_| ()),
        }
    }

    /// Book title search. Always edits the search prompt message.
    pub async fn books_page(
        &self,
        view: MessageRef,
        user: UserId,
        query: &str,
        page: u32,
    ) -> Result<()> {
        let chat = view.chat_id;
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let result = match self
            .gateway
            .search_books(&normalize_query(query), &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("[SEARCH] book search failed: {e}");
                return self.messenger.edit_html(view, strings::SOMETHING_WRONG, None).await;
            }
        };
        if result.is_empty() {
            return self.messenger.edit_html(view, strings::BOOKS_NOT_FOUND, None).await;
        }

        let total_pages = result.total_pages(ELEMENTS_ON_PAGE);
        let entries = result.items().iter().map(|b| b.list_entry()).collect();
        self.messenger
            .edit_html(
                view,
                &render_listing(entries, page, total_pages),
                page_keyboard(page, total_pages, "b", false),
            )
            .await
    }

    /// Author name search. Always edits the search prompt message.
    pub async fn authors_page(
        &self,
        view: MessageRef,
        user: UserId,
        query: &str,
        page: u32,
    ) -> Result<()> {
        let chat = view.chat_id;
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let result = match self
            .gateway
            .search_authors(&normalize_query(query), &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("[SEARCH] author search failed: {e}");
                return self.messenger.edit_html(view, strings::SOMETHING_WRONG, None).await;
            }
        };
        if result.is_empty() {
            return self.messenger.edit_html(view, strings::AUTHOR_NOT_FOUND, None).await;
        }

        let total_pages = result.total_pages(ELEMENTS_ON_PAGE);
        let entries = result.items().iter().map(|a| a.list_entry()).collect();
        self.messenger
            .edit_html(
                view,
                &render_listing(entries, page, total_pages),
                page_keyboard(page, total_pages, "a", false),
            )
            .await
    }

    /// Sequence name search. Always edits the search prompt message.
    pub async fn sequences_page(
        &self,
        view: MessageRef,
        user: UserId,
        query: &str,
        page: u32,
    ) -> Result<()> {
        let chat = view.chat_id;
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let result = match self
            .gateway
            .search_sequences(&normalize_query(query), &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("[SEARCH] sequence search failed: {e}");
                return self.messenger.edit_html(view, strings::SOMETHING_WRONG, None).await;
            }
        };
        if result.is_empty() {
            return self
                .messenger
                .edit_html(view, strings::SEQUENCES_NOT_FOUND, None)
                .await;
        }

        let total_pages = result.total_pages(ELEMENTS_ON_PAGE);
        let entries = result.items().iter().map(|s| s.list_entry()).collect();
        self.messenger
            .edit_html(
                view,
                &render_listing(entries, page, total_pages),
                page_keyboard(page, total_pages, "s", false),
            )
            .await
    }

    /// One page of an author's books, headed by the author card.
    pub async fn author_books_page(
        &self,
        chat: ChatId,
        view: Option<MessageRef>,
        reply_to: Option<MessageId>,
        user: UserId,
        author_id: u32,
        page: u32,
    ) -> Result<()> {
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let found = match self
            .gateway
            .author_books(author_id, &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                eprintln!("[SEARCH] author page failed for {author_id}: {e}");
                return self
                    .reply_or_edit(chat, view, reply_to, strings::SOMETHING_WRONG, None)
                    .await;
            }
        };
        let Some(author_page) = found else {
            return self
                .reply_or_edit(chat, view, reply_to, strings::AUTHOR_NOT_FOUND, None)
                .await;
        };
        if author_page.books.is_empty() {
            return self
                .reply_or_edit(chat, view, reply_to, strings::AUTHOR_BOOKS_NOT_FOUND, None)
                .await;
        }

        let total_pages = author_page.total_pages(ELEMENTS_ON_PAGE);
        let mut html = format!("<b>{}:</b>", escape_html(&author_page.author.normal_name()));
        if author_page.author.annotation_exists {
            html.push_str(&format!("\nОб авторе: /a_info_{}", author_page.author.id));
        }
        html.push_str("\n\n");
        let entries: Vec<String> = author_page.books.iter().map(|b| b.list_entry()).collect();
        html.push_str(&entries.join("\n\n"));
        html.push_str(&page_footer(page, total_pages));

        let keyboard = page_keyboard(page, total_pages, &format!("ba_{author_id}"), false);
        self.reply_or_edit(chat, view, reply_to, &html, keyboard).await
    }

    /// One page of a sequence's books. The extra bottom row either starts the
    /// bulk download or, while one runs, acknowledges it.
    pub async fn sequence_books_page(
        &self,
        chat: ChatId,
        view: Option<MessageRef>,
        reply_to: Option<MessageId>,
        user: UserId,
        sequence_id: u32,
        page: u32,
        mode: SequenceViewMode,
    ) -> Result<()> {
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let found = match self
            .gateway
            .sequence_books(sequence_id, &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                eprintln!("[SEARCH] sequence page failed for {sequence_id}: {e}");
                return self
                    .reply_or_edit(chat, view, reply_to, strings::SOMETHING_WRONG, None)
                    .await;
            }
        };
        let page_data = match found {
            Some(page_data) if !page_data.books.is_empty() => page_data,
            _ => {
                return self
                    .reply_or_edit(
                        chat,
                        view,
                        reply_to,
                        strings::SEQUENCE_BOOKS_NOT_FOUND,
                        None,
                    )
                    .await;
            }
        };

        let total_pages = page_data.total_pages(ELEMENTS_ON_PAGE);
        let mut html = format!("<b>{}:</b>\n\n", escape_html(&page_data.sequence.name));
        let entries: Vec<String> = page_data.books.iter().map(|b| b.list_entry()).collect();
        html.push_str(&entries.join("\n\n"));
        html.push_str(&page_footer(page, total_pages));

        let control = match mode {
            SequenceViewMode::Browse => InlineButton::callback(
                strings::DOWNLOAD_SEQUENCE,
                format!("seq_dl_{sequence_id}"),
            ),
            SequenceViewMode::Delivering => {
                InlineButton::callback(strings::SEQUENCE_SENDING, "noop")
            }
        };
        let keyboard = page_keyboard(page, total_pages, &format!("bs_{sequence_id}"), false)
            .unwrap_or_default()
            .row(vec![control]);

        self.reply_or_edit(chat, view, reply_to, &html, Some(keyboard))
            .await
    }

    /// Replaces a sequence listing with the bulk-download format choice.
    pub async fn sequence_format_menu(&self, view: MessageRef, sequence_id: u32) -> Result<()> {
        let mut keyboard = InlineKeyboard::default();
        for fmt in CONVERTIBLE_FORMATS {
            keyboard = keyboard.row(vec![InlineButton::callback(
                fmt,
                format!("seq_dl_{fmt}_{sequence_id}"),
            )]);
        }
        self.messenger
            .edit_html(view, strings::SEQUENCE_FORMAT_PROMPT, Some(keyboard))
            .await
    }

    /// Full book card with translators and sequences.
    pub async fn book_detail(
        &self,
        chat: ChatId,
        view: Option<MessageRef>,
        reply_to: Option<MessageId>,
        book_id: u32,
    ) -> Result<()> {
        let anchor = view.map(|v| v.message_id).or(reply_to);
        let Some(book) = self.gateway.book_by_id(book_id).await? else {
            self.messenger
                .send_html(chat, strings::BOOK_NOT_FOUND, None, anchor)
                .await?;
            return Ok(());
        };

        let keyboard = book.book.annotation_exists.then(|| {
            InlineKeyboard::single_row(vec![InlineButton::callback(
                strings::VIEW_ANNOTATION,
                format!("b_ann_{book_id}_1"),
            )])
        });
        self.reply_or_edit(chat, view, reply_to, &book.detail_entry(), keyboard)
            .await
    }

    /// One chunk of a book annotation, replacing the book card in place. The
    /// page is clamped into range so stale keyboards cannot ask for a chunk
    /// that does not exist.
    pub async fn book_annotation_page(
        &self,
        view: MessageRef,
        book_id: u32,
        page: u32,
    ) -> Result<()> {
        let chat = view.chat_id;
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let Some(annotation) = self.gateway.book_annotation(book_id).await? else {
            self.messenger
                .send_html(
                    chat,
                    strings::BOOK_ANNOTATION_NOT_FOUND,
                    None,
                    Some(view.message_id),
                )
                .await?;
            return Ok(());
        };

        let parts = split_text(&annotation.body, MAX_CHUNK);
        let total_pages = parts.len() as u32;
        let page = page.clamp(1, total_pages);
        let html = format!(
            "{}{}",
            escape_html(&parts[(page - 1) as usize]),
            page_footer(page, total_pages)
        );

        let keyboard = page_keyboard(page, total_pages, &format!("b_ann_{book_id}"), true)
            .unwrap_or_default()
            .row(vec![InlineButton::callback(
                strings::BACK,
                format!("book_detail_{book_id}"),
            )]);
        self.messenger.edit_html(view, &html, Some(keyboard)).await
    }

    /// One chunk of an author biography. The first (sent) view also delivers
    /// the portrait when the catalog has one.
    pub async fn author_annotation_page(
        &self,
        chat: ChatId,
        view: Option<MessageRef>,
        reply_to: Option<MessageId>,
        author_id: u32,
        page: u32,
    ) -> Result<()> {
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        let anchor = view.map(|v| v.message_id).or(reply_to);
        let Some(annotation) = self.gateway.author_annotation(author_id).await? else {
            self.messenger
                .send_html(chat, strings::AUTHOR_ANNOTATION_NOT_FOUND, None, anchor)
                .await?;
            return Ok(());
        };

        if view.is_none() {
            if let Some(url) = &annotation.photo_url {
                let _ = self.messenger.send_photo_url(chat, url).await;
            }
        }

        let parts = split_text(&annotation.body, MAX_CHUNK);
        let total_pages = parts.len() as u32;
        let page = page.clamp(1, total_pages);
        let html = format!(
            "{}{}",
            escape_html(&parts[(page - 1) as usize]),
            page_footer(page, total_pages)
        );

        let keyboard = page_keyboard(page, total_pages, &format!("a_ann_{author_id}"), true);
        self.reply_or_edit(chat, view, reply_to, &html, keyboard).await
    }

    pub async fn random_book(
        &self,
        chat: ChatId,
        user: UserId,
        reply_to: Option<MessageId>,
    ) -> Result<()> {
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        match self.gateway.random_book(&langs).await? {
            Some(book) => {
                self.messenger
                    .send_html(chat, &book.list_entry(), None, reply_to)
                    .await?;
            }
            None => {
                self.messenger
                    .send_html(chat, strings::RANDOM_UNAVAILABLE, None, None)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn random_author(
        &self,
        chat: ChatId,
        user: UserId,
        reply_to: Option<MessageId>,
    ) -> Result<()> {
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        match self.gateway.random_author(&langs).await? {
            Some(author) => {
                self.messenger
                    .send_html(chat, &author.list_entry(), None, reply_to)
                    .await?;
            }
            None => {
                self.messenger
                    .send_html(chat, strings::RANDOM_UNAVAILABLE, None, None)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn random_sequence(
        &self,
        chat: ChatId,
        user: UserId,
        reply_to: Option<MessageId>,
    ) -> Result<()> {
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };
        let _ = self.messenger.send_chat_action(chat, ChatAction::Typing).await;

        match self.gateway.random_sequence(&langs).await? {
            Some(sequence) => {
                self.messenger
                    .send_html(chat, &sequence.list_entry(), None, reply_to)
                    .await?;
            }
            None => {
                self.messenger
                    .send_html(chat, strings::RANDOM_UNAVAILABLE, None, None)
                    .await?;
            }
        }
        Ok(())
    }

    /// Offer the preset date ranges for the catalog update log. The log runs
    /// a day behind, so every range ends yesterday.
    pub async fn update_log_menu(&self, chat: ChatId, reply_to: Option<MessageId>) -> Result<()> {
        let today = Utc::now().date_naive();
        let end = today - Duration::days(1);

        let mut keyboard = InlineKeyboard::default();
        for (label, days_back) in [
            (strings::UPDATE_LOG_1_DAY, 1),
            (strings::UPDATE_LOG_3_DAYS, 4),
            (strings::UPDATE_LOG_7_DAYS, 8),
            (strings::UPDATE_LOG_30_DAYS, 31),
        ] {
            let start = today - Duration::days(days_back);
            keyboard = keyboard.row(vec![InlineButton::callback(
                label,
                format!("ul_{start}_{end}_1"),
            )]);
        }
        self.messenger
            .send_html(chat, strings::UPDATE_LOG_PROMPT, Some(keyboard), reply_to)
            .await?;
        Ok(())
    }

    /// One page of the catalog update log, editing the range menu in place.
    pub async fn update_log_page(
        &self,
        view: MessageRef,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
        page: u32,
    ) -> Result<()> {
        let chat = view.chat_id;
        let Some(langs) = self.allowed_langs_or_prompt(chat, user).await? else {
            return Ok(());
        };

        let result = match self
            .gateway
            .update_log(start, end, &langs, ELEMENTS_ON_PAGE, page)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("[SEARCH] update log failed for {start}..{end}: {e}");
                return self.messenger.edit_html(view, strings::SOMETHING_WRONG, None).await;
            }
        };
        if result.is_empty() {
            return self
                .messenger
                .edit_html(view, strings::UPDATES_NOT_FOUND, None)
                .await;
        }

        let total_pages = result.total_pages(ELEMENTS_ON_PAGE);
        let mut html = if start == end {
            format!("Обновления за {start}\n\n")
        } else {
            format!("Обновления за {start} - {end}\n\n")
        };
        let entries: Vec<String> = result.items().iter().map(|b| b.list_entry()).collect();
        html.push_str(&entries.join("\n\n"));
        html.push_str(&page_footer(page, total_pages));

        let keyboard = page_keyboard(page, total_pages, &format!("ul_{start}_{end}"), false);
        self.messenger.edit_html(view, &html, keyboard).await
    }

    /// Build the inline-mode share card for a book, or `None` when the book
    /// is gone.
    pub async fn share_article(&self, book_id: u32) -> Result<Option<InlineArticle>> {
        let Some(book) = self.gateway.book_by_id(book_id).await? else {
            return Ok(None);
        };
        Ok(Some(InlineArticle {
            id: format!("share_{book_id}"),
            title: strings::SHARE.to_string(),
            description: book.short_info(),
            html: book.share_text(&self.cfg.bot_name),
        }))
    }
}

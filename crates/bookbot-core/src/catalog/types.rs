use serde::Deserialize;

use crate::{filename::book_filename, pagination::page_count, strings, text::escape_html};

/// Books stored in this format can be converted by the catalog on the fly.
pub const MULTI_FORMAT: &str = "fb2";
/// Formats offered for a `MULTI_FORMAT` book.
pub const CONVERTIBLE_FORMATS: [&str; 3] = ["fb2", "epub", "mobi"];

const MAX_BOOK_AUTHORS: usize = 15;
const MAX_SEQUENCE_AUTHORS: usize = 5;

#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub id: u32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    #[serde(default)]
    pub annotation_exists: bool,
}

impl Author {
    /// "Last First Middle", skipping missing parts.
    pub fn normal_name(&self) -> String {
        let mut out = String::new();
        for part in [&self.last_name, &self.first_name, &self.middle_name] {
            let Some(part) = part.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(part);
        }
        out
    }

    /// "Last F M" with bare initials, used in filenames and compact lists.
    pub fn short_name(&self) -> String {
        let mut out = String::new();
        if let Some(last) = self.last_name.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(last);
        }
        for part in [&self.first_name, &self.middle_name] {
            let Some(initial) = part.as_deref().and_then(|p| p.chars().next()) else {
                continue;
            };
            if !out.is_empty() {
                out.push(' ');
            }
            out.push(initial);
        }
        out
    }

    pub fn list_entry(&self) -> String {
        let mut out = format!(
            "👤 <b>{}</b>\n/a_{}",
            escape_html(&self.normal_name()),
            self.id
        );
        if self.annotation_exists {
            out.push_str(&format!("\nОб авторе: /a_info_{}", self.id));
        }
        out
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Sequence {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub authors: Vec<Author>,
}

impl Sequence {
    pub fn list_entry(&self) -> String {
        let mut lines = vec![format!("📚 <b>{}</b>", escape_html(&self.name))];
        for author in self.authors.iter().take(MAX_SEQUENCE_AUTHORS) {
            lines.push(format!("👤 <b>{}</b>", escape_html(&author.normal_name())));
        }
        if self.authors.len() > MAX_SEQUENCE_AUTHORS {
            lines.push("<b> и другие</b>".to_string());
        }
        lines.push(format!("/s_{}", self.id));
        lines.join("\n")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub lang: String,
    pub file_type: String,
    #[serde(default)]
    pub annotation_exists: bool,
}

impl Book {
    /// The formats a user can actually request for this book.
    pub fn offered_formats(&self) -> Vec<&str> {
        if self.file_type == MULTI_FORMAT {
            CONVERTIBLE_FORMATS.to_vec()
        } else {
            vec![self.file_type.as_str()]
        }
    }

    fn title_line(&self) -> String {
        format!(
            "📖 <b>{}</b> | {}",
            escape_html(&self.title),
            escape_html(&self.lang)
        )
    }

    fn download_lines(&self) -> Vec<String> {
        self.offered_formats()
            .iter()
            .map(|fmt| format!("⬇ {fmt}: /{fmt}_{}", self.id))
            .collect()
    }

    /// Entry used in author pages, where author names would be redundant.
    pub fn list_entry(&self) -> String {
        let mut lines = vec![self.title_line()];
        if self.annotation_exists {
            lines.push(format!("Аннотация: /b_info_{}", self.id));
        }
        lines.extend(self.download_lines());
        lines.join("\n")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BookWithAuthors {
    #[serde(flatten)]
    pub book: Book,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub translators: Vec<Author>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

impl BookWithAuthors {
    fn author_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .authors
            .iter()
            .take(MAX_BOOK_AUTHORS)
            .map(|a| format!("👤 <b>{}</b>", escape_html(&a.normal_name())))
            .collect();
        if self.authors.len() > MAX_BOOK_AUTHORS {
            lines.push("и другие".to_string());
        }
        lines
    }

    pub fn list_entry(&self) -> String {
        let mut lines = vec![self.book.title_line()];
        if self.book.annotation_exists {
            lines.push(format!("Аннотация: /b_info_{}", self.book.id));
        }
        lines.extend(self.author_lines());
        lines.extend(self.book.download_lines());
        lines.join("\n")
    }

    /// Full card with translators and sequences, shown by `/b_info_`.
    pub fn detail_entry(&self) -> String {
        let mut lines = vec![self.book.title_line()];
        if self.book.annotation_exists {
            lines.push(format!("Аннотация: /b_info_{}", self.book.id));
        }
        lines.extend(self.author_lines());
        for translator in &self.translators {
            lines.push(format!(
                "🔄 <b>{}</b>",
                escape_html(&translator.normal_name())
            ));
        }
        for sequence in &self.sequences {
            lines.push(format!(
                "📚 <b>{}</b> /s_{}",
                escape_html(&sequence.name),
                sequence.id
            ));
        }
        lines.extend(self.book.download_lines());
        lines.join("\n")
    }

    /// Plain-text caption attached to delivered files (no parse mode).
    pub fn caption(&self) -> String {
        if self.authors.is_empty() {
            return format!("📖 {}", self.book.title);
        }

        let mut authors_text: Vec<String> = self
            .authors
            .iter()
            .take(MAX_BOOK_AUTHORS)
            .map(|a| format!("👤 {}", a.normal_name()))
            .collect();
        if self.authors.len() > MAX_BOOK_AUTHORS {
            authors_text.push("и т.д.".to_string());
        }
        format!("📖 {}\n\n{}", self.book.title, authors_text.join("\n"))
    }

    /// HTML message used instead of an upload when the file is too large.
    pub fn download_caption(&self, public_url: &str, file_type: &str) -> String {
        format!(
            "{}\n\n⬇ <a href=\"{}/book/download/{}/{}\">{}</a>",
            escape_html(&self.caption()),
            public_url,
            self.book.id,
            file_type,
            strings::DOWNLOAD
        )
    }

    /// HTML body for the inline "share" article: deep links that make the
    /// receiving user's copy of the bot deliver the book.
    pub fn share_text(&self, bot_name: &str) -> String {
        let mut lines = vec![format!(
            "<b>{}</b> | {}",
            escape_html(&self.book.title),
            escape_html(&self.book.lang)
        )];
        for author in &self.authors {
            lines.push(format!("<b>{}</b>", escape_html(&author.normal_name())));
        }
        for fmt in self.book.offered_formats() {
            lines.push(format!(
                "⬇ <a href=\"https://www.t.me/{}?start={}_{}\">{} {}</a>",
                bot_name,
                fmt,
                self.book.id,
                strings::DOWNLOAD,
                fmt
            ));
        }
        lines.join("\n")
    }

    /// Short plain description for the inline article preview.
    pub fn short_info(&self) -> String {
        let authors = self
            .authors
            .iter()
            .map(|a| a.short_name())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}\n{}", self.book.title, authors)
    }

    pub fn filename(&self, file_type: &str) -> String {
        let shorts: Vec<String> = self.authors.iter().map(|a| a.short_name()).collect();
        book_filename(&shorts, &self.book.title, file_type)
    }
}

/// Annotation body with the markup the catalog leaves in, already stripped.
#[derive(Clone, Debug)]
pub struct Annotation {
    pub body: String,
    pub photo_url: Option<String>,
}

/// The catalog serves annotation bodies with leftover library markup; strip
/// the known noise so the text reads cleanly once escaped for display.
pub fn clean_annotation_body(raw: &str) -> String {
    raw.replace("<p class=\"book\">", "")
        .replace("<p class=book>", "")
        .replace("</p>", "")
        .replace("<a>", "")
        .replace("</a>", "")
        .replace("</A>", "")
        .replace("[b]", "")
        .replace("[/b]", "")
}

/// Paged listing with the total match count reported by the catalog.
///
/// The count is authoritative: a zero count means "nothing matched" even if
/// the payload carried stray items.
#[derive(Clone, Debug)]
pub struct SearchResult<T> {
    count: u32,
    items: Vec<T>,
}

impl<T> SearchResult<T> {
    pub fn new(count: u32, items: Vec<T>) -> Self {
        if count == 0 {
            Self {
                count,
                items: Vec::new(),
            }
        } else {
            Self { count, items }
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn total_pages(&self, page_size: u32) -> u32 {
        page_count(self.count, page_size)
    }
}

/// One page of an author's books plus the author header data.
#[derive(Clone, Debug)]
pub struct AuthorBooksPage {
    pub author: Author,
    pub count: u32,
    pub books: Vec<Book>,
}

impl AuthorBooksPage {
    pub fn total_pages(&self, page_size: u32) -> u32 {
        page_count(self.count, page_size)
    }
}

/// One page of a sequence's books plus the sequence header data.
#[derive(Clone, Debug)]
pub struct SequenceBooksPage {
    pub sequence: Sequence,
    pub count: u32,
    pub books: Vec<BookWithAuthors>,
}

impl SequenceBooksPage {
    pub fn total_pages(&self, page_size: u32) -> u32 {
        page_count(self.count, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: u32, last: &str, first: &str, middle: &str) -> Author {
        let opt = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        Author {
            id,
            first_name: opt(first),
            last_name: opt(last),
            middle_name: opt(middle),
            annotation_exists: false,
        }
    }

    fn book(id: u32, title: &str, file_type: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            lang: "ru".to_string(),
            file_type: file_type.to_string(),
            annotation_exists: false,
        }
    }

    #[test]
    fn normal_name_skips_missing_parts() {
        assert_eq!(
            author(1, "Толстой", "Лев", "Николаевич").normal_name(),
            "Толстой Лев Николаевич"
        );
        assert_eq!(author(1, "Толстой", "", "").normal_name(), "Толстой");
        assert_eq!(author(1, "", "Лев", "").normal_name(), "Лев");
        assert_eq!(author(1, "", "", "").normal_name(), "");
    }

    #[test]
    fn short_name_uses_initials() {
        assert_eq!(
            author(1, "Толстой", "Лев", "Николаевич").short_name(),
            "Толстой Л Н"
        );
        assert_eq!(author(1, "Кэрролл", "Льюис", "").short_name(), "Кэрролл Л");
    }

    #[test]
    fn author_entry_links_books_and_annotation() {
        let mut a = author(7, "Чехов", "Антон", "");
        assert_eq!(a.list_entry(), "👤 <b>Чехов Антон</b>\n/a_7");

        a.annotation_exists = true;
        assert_eq!(
            a.list_entry(),
            "👤 <b>Чехов Антон</b>\n/a_7\nОб авторе: /a_info_7"
        );
    }

    #[test]
    fn fb2_books_offer_three_formats() {
        assert_eq!(book(1, "t", "fb2").offered_formats(), vec!["fb2", "epub", "mobi"]);
        assert_eq!(book(1, "t", "pdf").offered_formats(), vec!["pdf"]);
    }

    #[test]
    fn book_entry_lists_download_commands() {
        let entry = book(3, "Каштанка", "fb2").list_entry();
        assert_eq!(
            entry,
            "📖 <b>Каштанка</b> | ru\n⬇ fb2: /fb2_3\n⬇ epub: /epub_3\n⬇ mobi: /mobi_3"
        );

        let entry = book(4, "Скан", "pdf").list_entry();
        assert!(entry.ends_with("⬇ pdf: /pdf_4"));
    }

    #[test]
    fn book_entry_escapes_html_in_titles() {
        let entry = book(5, "Война & мир <1>", "pdf").list_entry();
        assert!(entry.contains("Война &amp; мир &lt;1&gt;"));
        assert!(!entry.contains("<1>"));
    }

    #[test]
    fn book_with_authors_entry_caps_author_list() {
        let authors: Vec<Author> = (0..20)
            .map(|i| author(i, &format!("Автор{i}"), "", ""))
            .collect();
        let b = BookWithAuthors {
            book: book(9, "Сборник", "fb2"),
            authors,
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        let entry = b.list_entry();
        assert!(entry.contains("Автор14"));
        assert!(!entry.contains("Автор15"));
        assert!(entry.contains("и другие"));
    }

    #[test]
    fn sequence_entry_caps_authors_at_five() {
        let authors: Vec<Author> = (0..6).map(|i| author(i, &format!("А{i}"), "", "")).collect();
        let s = Sequence {
            id: 11,
            name: "Цикл".to_string(),
            authors,
        };
        let entry = s.list_entry();
        assert!(entry.contains("А4"));
        assert!(!entry.contains("А5</b>"));
        assert!(entry.contains("<b> и другие</b>"));
        assert!(entry.ends_with("/s_11"));
    }

    #[test]
    fn detail_entry_includes_translators_and_sequences() {
        let b = BookWithAuthors {
            book: book(2, "Алиса в Стране чудес", "fb2"),
            authors: vec![author(1, "Кэрролл", "Льюис", "")],
            translators: vec![author(2, "Демурова", "Нина", "")],
            sequences: vec![Sequence {
                id: 3,
                name: "Алиса".to_string(),
                authors: Vec::new(),
            }],
        };
        let entry = b.detail_entry();
        assert!(entry.contains("🔄 <b>Демурова Нина</b>"));
        assert!(entry.contains("📚 <b>Алиса</b> /s_3"));
    }

    #[test]
    fn caption_is_plain_text() {
        let b = BookWithAuthors {
            book: book(2, "Пьесы & стихи", "fb2"),
            authors: vec![author(1, "Чехов", "Антон", "Павлович")],
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        assert_eq!(b.caption(), "📖 Пьесы & стихи\n\n👤 Чехов Антон Павлович");

        let no_authors = BookWithAuthors {
            book: book(2, "Азбука", "fb2"),
            authors: Vec::new(),
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        assert_eq!(no_authors.caption(), "📖 Азбука");
    }

    #[test]
    fn download_caption_links_public_url() {
        let b = BookWithAuthors {
            book: book(42, "Том & Джерри", "fb2"),
            authors: Vec::new(),
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        let caption = b.download_caption("https://books.example.org", "epub");
        assert!(caption.contains("Том &amp; Джерри"));
        assert!(caption
            .contains("<a href=\"https://books.example.org/book/download/42/epub\">Скачать</a>"));
    }

    #[test]
    fn share_text_has_deep_links_per_format() {
        let b = BookWithAuthors {
            book: book(8, "Каштанка", "fb2"),
            authors: vec![author(1, "Чехов", "Антон", "")],
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        let text = b.share_text("flibusta_bot");
        assert!(text.contains("https://www.t.me/flibusta_bot?start=fb2_8"));
        assert!(text.contains("https://www.t.me/flibusta_bot?start=epub_8"));
        assert!(text.contains("https://www.t.me/flibusta_bot?start=mobi_8"));
    }

    #[test]
    fn search_result_trusts_count_over_items() {
        let result = SearchResult::new(0, vec![1, 2, 3]);
        assert!(result.is_empty());
        assert!(result.items().is_empty());

        let result = SearchResult::new(15, vec![1, 2, 3]);
        assert!(!result.is_empty());
        assert_eq!(result.total_pages(7), 3);
    }

    #[test]
    fn clean_annotation_body_strips_library_markup() {
        let raw = "<p class=\"book\">Текст [b]жирный[/b]</p> <a>ссылка</a>";
        assert_eq!(clean_annotation_body(raw), "Текст жирный ссылка");
    }

    #[test]
    fn filename_uses_short_author_names() {
        let b = BookWithAuthors {
            book: book(2, "Каштанка", "fb2"),
            authors: vec![author(1, "Чехов", "Антон", "Павлович")],
            translators: Vec::new(),
            sequences: Vec::new(),
        };
        assert_eq!(b.filename("epub"), "Chekhov_A_P_-_Kashtanka.epub");
    }
}

//! HTTP adapters for the catalog server: metadata queries, book file
//! downloads, the relay channel index and the download counter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};

use bookbot_core::{
    catalog::{
        port::CatalogGateway,
        types::{
            clean_annotation_body, Annotation, Author, AuthorBooksPage, Book, BookWithAuthors,
            SearchResult, Sequence, SequenceBooksPage,
        },
    },
    config::Config,
    delivery::{DownloadCounter, RelayIndex},
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    Result,
};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Path segment for book cover images on the media host.
const BOOK_PHOTO_PATH: &str = "ib";
/// Path segment for author portraits on the media host.
const AUTHOR_PHOTO_PATH: &str = "ia";

/// The catalog takes the language filter as a JSON array embedded in the
/// request path, so the array itself gets percent-encoded.
fn encode_langs(langs: &[String]) -> String {
    let json = serde_json::to_string(langs).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

fn search_url(
    base: &str,
    entity: &str,
    query: &str,
    langs: &[String],
    limit: u32,
    page: u32,
) -> String {
    format!(
        "{base}/{entity}/search/{}/{limit}/{page}/{}",
        encode_langs(langs),
        urlencoding::encode(query)
    )
}

fn entity_page_url(
    base: &str,
    entity: &str,
    id: u32,
    langs: &[String],
    limit: u32,
    page: u32,
) -> String {
    format!("{base}/{entity}/{id}/{}/{limit}/{page}", encode_langs(langs))
}

fn random_url(base: &str, entity: &str, langs: &[String]) -> String {
    format!("{base}/{entity}/random/{}", encode_langs(langs))
}

fn update_log_url(
    base: &str,
    start: NaiveDate,
    end: NaiveDate,
    langs: &[String],
    limit: u32,
    page: u32,
) -> String {
    format!(
        "{base}/book/update_log_range/{start}/{end}/{}/{limit}/{page}",
        encode_langs(langs)
    )
}

fn download_url(base: &str, book_id: u32, file_type: &str) -> String {
    format!("{base}/book/download/{book_id}/{file_type}")
}

/// Paged catalog response. `result` is absent when nothing matched.
///
/// The explicit bound keeps the derive from also requiring `T: Default`
/// for the defaulted field.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct Listing<T> {
    count: u32,
    #[serde(default)]
    result: Vec<T>,
}

impl<T> From<Listing<T>> for SearchResult<T> {
    fn from(listing: Listing<T>) -> Self {
        SearchResult::new(listing.count, listing.result)
    }
}

#[derive(Debug, Deserialize)]
struct AuthorPageWire {
    count: u32,
    result: AuthorPageBody,
}

#[derive(Debug, Deserialize)]
struct AuthorPageBody {
    #[serde(flatten)]
    author: Author,
    #[serde(default)]
    books: Vec<Book>,
}

impl From<AuthorPageWire> for AuthorBooksPage {
    fn from(wire: AuthorPageWire) -> Self {
        AuthorBooksPage {
            author: wire.result.author,
            count: wire.count,
            books: wire.result.books,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SequencePageWire {
    count: u32,
    result: SequencePageBody,
}

#[derive(Debug, Deserialize)]
struct SequencePageBody {
    #[serde(flatten)]
    sequence: Sequence,
    #[serde(default)]
    books: Vec<BookWithAuthors>,
}

impl From<SequencePageWire> for SequenceBooksPage {
    fn from(wire: SequencePageWire) -> Self {
        SequenceBooksPage {
            sequence: wire.result.sequence,
            count: wire.count,
            books: wire.result.books,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct AnnotationWire {
    #[serde(default)]
    body: String,
    #[serde(default)]
    file: Option<String>,
}

impl AnnotationWire {
    fn into_annotation(self, media_url: &str, photo_path: &str) -> Annotation {
        let photo_url = self
            .file
            .filter(|f| !f.is_empty())
            .map(|f| format!("{media_url}/{photo_path}/{f}"));
        Annotation {
            body: clean_annotation_body(&self.body),
            photo_url,
        }
    }
}

/// A book file already posted to the relay channel. The endpoint answers
/// `null` when no post exists.
#[derive(Debug, Deserialize)]
struct ChannelPostWire {
    channel_id: i64,
    message_id: i32,
}

/// HTTP client for the catalog server, implementing [`CatalogGateway`].
///
/// Metadata requests run on a short deadline; file downloads get their own
/// client because a big book can legitimately stream for minutes.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    base_url: String,
    media_url: String,
    http: reqwest::Client,
    download_http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(cfg: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.metadata_timeout)
            .build()
            .expect("reqwest client build");

        let mut download = reqwest::Client::builder().connect_timeout(DOWNLOAD_CONNECT_TIMEOUT);
        if let Some(timeout) = cfg.download_timeout {
            download = download.timeout(timeout);
        }
        let download_http = download.build().expect("reqwest client build");

        Self {
            base_url: cfg.catalog_url.clone(),
            media_url: cfg.media_url.clone(),
            http,
            download_http,
        }
    }

    /// GET a JSON payload; a 404 becomes `Ok(None)`, anything else
    /// non-success is an error.
    async fn get_json_opt<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("catalog request failed for {url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Catalog(format!(
                "catalog returned {status} for {url}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let value = response
            .json::<T>()
            .await
            .map_err(|e| Error::Catalog(format!("catalog response decode failed for {url}: {e}")))?;
        Ok(Some(value))
    }

    /// GET a JSON payload from an endpoint that always has an answer, so a
    /// 404 is an error too.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_opt(url)
            .await?
            .ok_or_else(|| Error::Catalog(format!("catalog returned 404 Not Found for {url}")))
    }
}

#[async_trait]
impl CatalogGateway for CatalogClient {
    async fn search_books(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<BookWithAuthors>> {
        let url = search_url(&self.base_url, "book", query, langs, limit, page);
        let listing: Listing<BookWithAuthors> = self.get_json(&url).await?;
        Ok(listing.into())
    }

    async fn search_authors(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<Author>> {
        let url = search_url(&self.base_url, "author", query, langs, limit, page);
        let listing: Listing<Author> = self.get_json(&url).await?;
        Ok(listing.into())
    }

    async fn search_sequences(
        &self,
        query: &str,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<Sequence>> {
        let url = search_url(&self.base_url, "sequence", query, langs, limit, page);
        let listing: Listing<Sequence> = self.get_json(&url).await?;
        Ok(listing.into())
    }

    async fn book_by_id(&self, book_id: u32) -> Result<Option<BookWithAuthors>> {
        let url = format!("{}/book/{book_id}", self.base_url);
        self.get_json_opt(&url).await
    }

    async fn author_books(
        &self,
        author_id: u32,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<Option<AuthorBooksPage>> {
        let url = entity_page_url(&self.base_url, "author", author_id, langs, limit, page);
        let wire: Option<AuthorPageWire> = self.get_json_opt(&url).await?;
        Ok(wire.map(Into::into))
    }

    async fn sequence_books(
        &self,
        sequence_id: u32,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<Option<SequenceBooksPage>> {
        let url = entity_page_url(&self.base_url, "sequence", sequence_id, langs, limit, page);
        let wire: Option<SequencePageWire> = self.get_json_opt(&url).await?;
        Ok(wire.map(Into::into))
    }

    async fn random_book(&self, langs: &[String]) -> Result<Option<BookWithAuthors>> {
        let url = random_url(&self.base_url, "book", langs);
        self.get_json_opt(&url).await
    }

    async fn random_author(&self, langs: &[String]) -> Result<Option<Author>> {
        let url = random_url(&self.base_url, "author", langs);
        self.get_json_opt(&url).await
    }

    async fn random_sequence(&self, langs: &[String]) -> Result<Option<Sequence>> {
        let url = random_url(&self.base_url, "sequence", langs);
        self.get_json_opt(&url).await
    }

    async fn book_annotation(&self, book_id: u32) -> Result<Option<Annotation>> {
        let url = format!("{}/annotation/book/{book_id}", self.base_url);
        let wire: Option<AnnotationWire> = self.get_json_opt(&url).await?;
        Ok(wire.map(|w| w.into_annotation(&self.media_url, BOOK_PHOTO_PATH)))
    }

    async fn author_annotation(&self, author_id: u32) -> Result<Option<Annotation>> {
        let url = format!("{}/annotation/author/{author_id}", self.base_url);
        let wire: Option<AnnotationWire> = self.get_json_opt(&url).await?;
        Ok(wire.map(|w| w.into_annotation(&self.media_url, AUTHOR_PHOTO_PATH)))
    }

    async fn update_log(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        langs: &[String],
        limit: u32,
        page: u32,
    ) -> Result<SearchResult<BookWithAuthors>> {
        let url = update_log_url(&self.base_url, start, end, langs, limit, page);
        let listing: Listing<BookWithAuthors> = self.get_json(&url).await?;
        Ok(listing.into())
    }

    async fn download(&self, book_id: u32, file_type: &str) -> Result<Option<Vec<u8>>> {
        let url = download_url(&self.base_url, book_id, file_type);
        let response = self
            .download_http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("catalog download failed for {url}: {e}")))?;

        // Missing books and refused conversions both come back as plain
        // non-success statuses.
        if !response.status().is_success() {
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Catalog(format!("catalog download stream failed for {url}: {e}")))?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Client for the relay channel index, implementing [`RelayIndex`].
#[derive(Clone, Debug)]
pub struct RelayClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}

#[async_trait]
impl RelayIndex for RelayClient {
    async fn lookup(&self, book_id: u32, file_type: &str) -> Result<Option<MessageRef>> {
        let url = format!("{}/get_message_id/{book_id}/{file_type}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("relay request failed for {url}: {e}")))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let post: Option<ChannelPostWire> = response
            .json()
            .await
            .map_err(|e| Error::Catalog(format!("relay response decode failed for {url}: {e}")))?;
        Ok(post.map(|p| MessageRef {
            chat_id: ChatId(p.channel_id),
            message_id: MessageId(p.message_id),
        }))
    }
}

/// Client for the download counter endpoint, implementing [`DownloadCounter`].
#[derive(Clone, Debug)]
pub struct CounterClient {
    base_url: String,
    http: reqwest::Client,
}

impl CounterClient {
    pub fn new(cfg: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.metadata_timeout)
            .build()
            .expect("reqwest client build");
        Self {
            base_url: cfg.catalog_url.clone(),
            http,
        }
    }
}

#[async_trait]
impl DownloadCounter for CounterClient {
    async fn record(&self, book_id: u32, user_id: UserId) -> Result<()> {
        let url = format!(
            "{}/download_counter/update/{book_id}/{}",
            self.base_url, user_id.0
        );
        // Only reachability matters; the response body is ignored.
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Catalog(format!("download counter request failed: {e}")))?;
        Ok(())
    }
}

use crate::config::ClientConfig;
use crate::models::{Book, CatalogError, CreateBookRequest};
use crate::repositories::BookRepository;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

struct SessionToken {
    header: HeaderValue,
}

impl SessionToken {
    fn new(raw: &str) -> anyhow::Result<Self> {
        let mut header =
            HeaderValue::from_str(raw).context("Authorization token is not a valid header value")?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

pub struct CatalogClient<T = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
    token: OnceCell<SessionToken>,
}

impl<T> std::fmt::Debug for CatalogClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url())
            .field("has_token", &self.token.initialized())
            .finish_non_exhaustive()
    }
}

impl CatalogClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            config,
            token: OnceCell::new(),
        }
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn has_token(&self) -> bool {
        self.token.initialized()
    }

    /// Logs in on first use. A failed login leaves the cache empty.
    pub async fn authorized_transport(&self) -> Result<AuthorizedTransport<'_, T>, CatalogError> {
        let token = self.token.get_or_try_init(|| self.fetch_token()).await?;
        Ok(AuthorizedTransport {
            transport: &self.transport,
            authorization: token.header.clone(),
        })
    }

    async fn fetch_token(&self) -> Result<SessionToken, CatalogError> {
        let url = self.config.login_url();
        debug!(%url, "fetching authorization token");

        let response = self
            .transport
            .send(HttpRequest::new(Method::GET, url.as_str()))
            .await
            .map_err(|err| CatalogError::AuthFetch {
                url: url.clone(),
                source: anyhow!(err),
            })?;

        if !response.is_success() {
            return Err(CatalogError::AuthFetch {
                source: anyhow!("Login returned {}", response.status()),
                url,
            });
        }

        let token = serde_json::from_str::<String>(response.body())
            .context("Login response is not a JSON string")
            .and_then(|raw| SessionToken::new(&raw))
            .map_err(|source| CatalogError::AuthFetch { url, source })?;

        info!("fetched authorization token");
        Ok(token)
    }

    pub async fn create(&self, title: &str, author: &str, genre: &str) -> Result<Book, CatalogError> {
        self.post_book(&CreateBookRequest::new(title, author, genre))
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<Book>, CatalogError> {
        let transport = self.authorized_transport().await?;
        let url = self.config.collection_url();

        let response = transport.send(HttpRequest::new(Method::GET, url)).await?;
        ensure_success(&Method::GET, url, &response)?;
        let books: Vec<Book> = decode(url, &response)?;

        debug!(count = books.len(), "listed catalog");
        Ok(books)
    }

    pub async fn update(&self, book: &Book) -> Result<(), CatalogError> {
        let transport = self.authorized_transport().await?;
        let url = self.config.update_url(book.isbn());
        let body = encode(book)?;

        let response = transport
            .send(HttpRequest::new(Method::PUT, url.as_str()).with_json_body(body))
            .await?;
        self.check_unread_response(&Method::PUT, &url, &response)
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), CatalogError> {
        let transport = self.authorized_transport().await?;
        let url = self.config.delete_url(isbn);

        let response = transport
            .send(HttpRequest::new(Method::DELETE, url.as_str()))
            .await?;
        self.check_unread_response(&Method::DELETE, &url, &response)
    }

    async fn post_book(&self, req: &CreateBookRequest) -> Result<Book, CatalogError> {
        let book = req.to_book(Local::now().date_naive());
        let transport = self.authorized_transport().await?;
        let url = self.config.collection_url();
        let body = encode(&book)?;

        let response = transport
            .send(HttpRequest::new(Method::POST, url).with_json_body(body))
            .await?;
        if self.config.strict_status() {
            ensure_success(&Method::POST, url, &response)?;
        }
        decode(url, &response)
    }

    fn check_unread_response(
        &self,
        method: &Method,
        url: &str,
        response: &HttpResponse,
    ) -> Result<(), CatalogError> {
        if self.config.strict_status() {
            return ensure_success(method, url, response);
        }
        if !response.is_success() {
            warn!(%method, %url, status = %response.status(), "catalog rejected request");
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> BookRepository for CatalogClient<T> {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CatalogError> {
        self.post_book(req).await
    }

    async fn find_all_books(&self) -> Result<Vec<Book>, CatalogError> {
        self.list_all().await
    }

    async fn update_book(&self, book: &Book) -> Result<(), CatalogError> {
        self.update(book).await
    }

    async fn delete_book(&self, isbn: &str) -> Result<(), CatalogError> {
        self.delete(isbn).await
    }
}

pub struct AuthorizedTransport<'a, T> {
    transport: &'a T,
    authorization: HeaderValue,
}

impl<T: Transport> AuthorizedTransport<'_, T> {
    pub async fn send(&self, req: HttpRequest) -> Result<HttpResponse, CatalogError> {
        let req = req
            .with_header(AUTHORIZATION, self.authorization.clone())
            .with_header(ACCEPT, HeaderValue::from_static("application/json"));
        let method = req.method().clone();
        let url = req.url().to_string();
        debug!(%method, %url, "sending catalog request");

        self.transport
            .send(req)
            .await
            .map_err(|source| CatalogError::Request {
                method,
                url,
                source,
            })
    }
}

fn ensure_success(method: &Method, url: &str, response: &HttpResponse) -> Result<(), CatalogError> {
    if response.is_success() {
        return Ok(());
    }
    Err(CatalogError::Status {
        method: method.clone(),
        url: url.to_string(),
        status: response.status(),
        body: response.body().to_string(),
    })
}

fn encode(book: &Book) -> Result<String, CatalogError> {
    serde_json::to_string(book).map_err(|source| CatalogError::Encode {
        isbn: book.isbn().to_string(),
        source,
    })
}

fn decode<D: DeserializeOwned>(url: &str, response: &HttpResponse) -> Result<D, CatalogError> {
    serde_json::from_str(response.body()).map_err(|source| CatalogError::Decode {
        url: url.to_string(),
        source,
    })
}

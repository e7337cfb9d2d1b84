use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::TransportError;

/// Written in camelCase; the PascalCase aliases accept records from .NET serializers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "title", alias = "Title")]
    title: String,
    #[serde(rename = "authors", alias = "Authors", default)]
    authors: Vec<String>,
    #[serde(rename = "isbn", alias = "ISBN", alias = "Isbn")]
    isbn: String,
    #[serde(rename = "genre", alias = "Genre")]
    genre: String,
    #[serde(
        rename = "publishDate",
        alias = "PublishDate",
        with = "publish_date"
    )]
    publish_date: NaiveDate,
}

impl Book {
    pub const fn new(
        title: String,
        authors: Vec<String>,
        isbn: String,
        genre: String,
        publish_date: NaiveDate,
    ) -> Self {
        Self {
            title,
            authors,
            isbn,
            genre,
            publish_date,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// Empty until the catalog has assigned one.
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn set_genre(&mut self, genre: String) {
        self.genre = genre;
    }

    pub const fn publish_date(&self) -> NaiveDate {
        self.publish_date
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookRequest {
    title: String,
    author: String,
    genre: String,
}

impl CreateBookRequest {
    pub fn new(title: &str, author: &str, genre: &str) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn to_book(&self, publish_date: NaiveDate) -> Book {
        Book::new(
            self.title().to_string(),
            vec![self.author().to_string()],
            String::new(),
            self.genre().to_string(),
            publish_date,
        )
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch authorization token from {url}")]
    AuthFetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("{method} request to {url} failed")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Response from {url} is not valid catalog JSON")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode book \"{isbn}\"")]
    Encode {
        isbn: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{method} request to {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },
}

mod publish_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de};

    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!(r#"invalid publish date "{raw}""#)))
    }

    // The catalog stores dates in a date-time column, so responses usually carry
    // a midnight time component.
    fn parse(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.date())
            })
    }
}

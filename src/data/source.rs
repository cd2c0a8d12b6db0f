use crate::{
    data::catalog::{parse_catalog, parse_catalog_value, CatalogRecord},
    GuideError, Result,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

/// Shared HTTP client; building it once keeps the connection pool warm
/// between catalog refreshes.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("geoguide/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Anything that can produce the narration catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CatalogRecord>>;
}

/// Fetches one page of the catalog from the REST backend
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    endpoint: String,
    page: u32,
    size: u32,
}

impl HttpCatalogSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page: 1,
            size: 100,
        }
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page.max(1);
        self.size = size.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<CatalogRecord>> {
        log::debug!(
            "fetching catalog page {} (size {}) from {}",
            self.page,
            self.size,
            self.endpoint
        );

        let resp = HTTP_CLIENT
            .get(&self.endpoint)
            .query(&[("page", self.page), ("size", self.size)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GuideError::Catalog(format!(
                "HTTP {} from {}",
                resp.status(),
                self.endpoint
            )));
        }

        let body: serde_json::Value = resp.json().await?;
        let records = parse_catalog_value(body)?;
        log::info!("fetched {} catalog records", records.len());
        Ok(records)
    }
}

/// In-memory catalog, for demos and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    records: Vec<CatalogRecord>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(parse_catalog(json)?))
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.records.clone())
    }
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_returns_records() {
        let source = StaticCatalogSource::from_json(r#"[{ "id": 1 }, { "id": 2 }]"#).unwrap();
        let records = source.fetch().await.unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_http_source_paging() {
        let source = HttpCatalogSource::new("http://localhost/api/audios").with_page(0, 0);
        assert_eq!(source.endpoint(), "http://localhost/api/audios");
        assert_eq!((source.page, source.size), (1, 1));
    }
}

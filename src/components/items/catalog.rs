//! Client du catalogue d'objets échangeables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serenity::async_trait;

/// Objet du catalogue.
///
/// Un objet sans `value` est accepté dans le cache mais refusé à la création
/// d'un ticket.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("requête au catalogue impossible: {0}")]
    Http(#[from] reqwest::Error),
    #[error("réponse du catalogue illisible: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("le catalogue a répondu sans succès")]
    Unsuccessful,
    #[error("le catalogue ne contient aucun objet")]
    Empty,
}

/// Source des objets du cache.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Item>, CatalogError>;
}

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    success: bool,
    body: Option<Vec<Item>>,
}

/// Lit la réponse du catalogue : `{"success": true, "body": [...]}`.
pub fn parse_payload(payload: &str) -> Result<Vec<Item>, CatalogError> {
    let response: CatalogResponse = serde_json::from_str(payload)?;
    match response {
        CatalogResponse { success: true, body: Some(items) } => Ok(items),
        _ => Err(CatalogError::Unsuccessful),
    }
}

/// Catalogue HTTP (`GET <url>`).
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalog {
    pub fn new<S: Into<String>>(url: S, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<Item>, CatalogError> {
        let payload = self.client.get(&self.url)
            .send()
            .await?
            .text()
            .await?;
        parse_payload(&payload)
    }
}

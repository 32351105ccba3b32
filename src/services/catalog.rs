use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogId, CatalogItem, ContentKind},
};

/// Read-only search capability over one domain's catalog service
///
/// One instance exists per domain. Results carry the title, the domain
/// metadata and an artwork reference.
#[async_trait::async_trait]
pub trait CatalogSearch<T: ContentKind>: Send + Sync {
    /// Search for items by free-text query
    async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem<T>>>;

    /// Fetch a single item by its catalog identifier
    async fn details(&self, id: &CatalogId) -> AppResult<CatalogItem<T>>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Query used to reconcile a generated suggestion with the catalog
///
/// Domains whose titles are ambiguous on their own (songs, books) append the
/// secondary field.
pub fn reconciliation_query<T: ContentKind>(title: &str, content: &T) -> String {
    let title = title.trim();
    let secondary = content.secondary().trim();

    if T::SEARCH_WITH_SECONDARY && !secondary.is_empty() {
        format!("{} {}", title, secondary)
    } else {
        title.to_string()
    }
}

/// Validates the query and delegates to the catalog
pub async fn search_titles<T: ContentKind>(
    catalog: Arc<dyn CatalogSearch<T>>,
    query: &str,
) -> AppResult<Vec<CatalogItem<T>>> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let results = catalog.search(query.trim()).await?;
    tracing::info!(
        query = %query,
        results = results.len(),
        catalog = catalog.name(),
        domain = %T::DOMAIN,
        "Catalog search completed"
    );

    Ok(results)
}

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::ApiError;
use crate::models::{Exam, Guide, Item, Scholarship};

/// Where full catalog collections come from.
///
/// `ApiClient` is the production implementation; tests substitute their own.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_exams(&self) -> Result<Vec<Exam>, ApiError>;
    async fn fetch_scholarships(&self) -> Result<Vec<Scholarship>, ApiError>;
    async fn fetch_guides(&self) -> Result<Vec<Guide>, ApiError>;
}

/// Routes a record type to its `CatalogSource` method.
pub trait RemoteCollection: Item {
    fn fetch_from(source: &dyn CatalogSource) -> BoxFuture<'_, Result<Vec<Self>, ApiError>>;
}

impl RemoteCollection for Exam {
    fn fetch_from(source: &dyn CatalogSource) -> BoxFuture<'_, Result<Vec<Self>, ApiError>> {
        source.fetch_exams()
    }
}

impl RemoteCollection for Scholarship {
    fn fetch_from(source: &dyn CatalogSource) -> BoxFuture<'_, Result<Vec<Self>, ApiError>> {
        source.fetch_scholarships()
    }
}

impl RemoteCollection for Guide {
    fn fetch_from(source: &dyn CatalogSource) -> BoxFuture<'_, Result<Vec<Self>, ApiError>> {
        source.fetch_guides()
    }
}

use crate::context::Resource;
use crate::error::RepoError;
use crate::options::Preload;
use crate::types::ModelName;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Field-name to value map used for lookups.
pub type Fields = BTreeMap<String, String>;

/// Storage interface the pipeline loads resources through.
///
/// Errors are propagated to the caller untouched; an absent record is
/// `Ok(None)`, never an error.
#[async_trait]
pub trait Repo<R: Resource>: Send + Sync {
    /// Returns the record of `model` matching every entry in `fields`.
    async fn get_by(
        &self,
        model: &ModelName,
        fields: &Fields,
    ) -> std::result::Result<Option<R>, RepoError>;

    /// Returns every record of `model`.
    async fn get_all(&self, model: &ModelName) -> std::result::Result<Vec<R>, RepoError>;

    /// Loads associations on a single record.
    async fn preload_one(
        &self,
        resource: R,
        _preload: &Preload,
    ) -> std::result::Result<R, RepoError> {
        Ok(resource)
    }

    /// Loads associations on a collection.
    async fn preload_all(
        &self,
        resources: Vec<R>,
        _preload: &Preload,
    ) -> std::result::Result<Vec<R>, RepoError> {
        Ok(resources)
    }
}

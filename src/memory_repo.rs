use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::context::Resource;
use crate::error::RepoError;
use crate::options::Preload;
use crate::repo::{Fields, Repo};
use crate::types::ModelName;

/// Record that exposes its fields by name for [`MemoryRepo`] lookups.
pub trait Record: Resource {
    /// Returns the string form of `field`, if the record has it.
    fn field(&self, name: &str) -> Option<String>;
}

type Preloader<R> = Arc<dyn Fn(R, &Preload) -> R + Send + Sync>;

/// In-memory repo implementation for tests and demos.
#[derive(Clone)]
pub struct MemoryRepo<R> {
    inner: Arc<Inner<R>>,
    preloader: Option<Preloader<R>>,
}

struct Inner<R> {
    records: RwLock<HashMap<ModelName, Vec<R>>>,
    calls: AtomicUsize,
}

impl<R> Default for MemoryRepo<R> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }),
            preloader: None,
        }
    }
}

impl<R> std::fmt::Debug for MemoryRepo<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRepo")
            .field("calls", &self.calls())
            .field("preloader", &self.preloader.is_some())
            .finish()
    }
}

impl<R> MemoryRepo<R> {
    /// Returns how many storage calls (`get_by`/`get_all`) have been served.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::Relaxed)
    }
}

impl<R: Record> MemoryRepo<R> {
    /// Creates an empty repo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a function applied to records when a preload is requested.
    pub fn with_preloader<F>(mut self, preloader: F) -> Self
    where
        F: Fn(R, &Preload) -> R + Send + Sync + 'static,
    {
        self.preloader = Some(Arc::new(preloader));
        self
    }

    /// Inserts a record under its own model name.
    pub fn insert(&self, record: R) {
        let model = ModelName::from_string(record.model_name().to_string());
        let mut guard = self
            .inner
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.entry(model).or_default().push(record);
    }

    fn preload(&self, record: R, preload: &Preload) -> R {
        match &self.preloader {
            Some(preloader) => preloader(record, preload),
            None => record,
        }
    }
}

#[async_trait]
impl<R: Record> Repo<R> for MemoryRepo<R> {
    async fn get_by(
        &self,
        model: &ModelName,
        fields: &Fields,
    ) -> std::result::Result<Option<R>, RepoError> {
        self.inner.calls.fetch_add(1, Ordering::Relaxed);
        let guard = self.inner.records.read().map_err(|_| "poisoned lock")?;
        Ok(guard.get(model).and_then(|records| {
            records
                .iter()
                .find(|record| {
                    fields
                        .iter()
                        .all(|(name, value)| record.field(name).as_deref() == Some(value.as_str()))
                })
                .cloned()
        }))
    }

    async fn get_all(&self, model: &ModelName) -> std::result::Result<Vec<R>, RepoError> {
        self.inner.calls.fetch_add(1, Ordering::Relaxed);
        let guard = self.inner.records.read().map_err(|_| "poisoned lock")?;
        Ok(guard.get(model).cloned().unwrap_or_default())
    }

    async fn preload_one(
        &self,
        resource: R,
        preload: &Preload,
    ) -> std::result::Result<R, RepoError> {
        Ok(self.preload(resource, preload))
    }

    async fn preload_all(
        &self,
        resources: Vec<R>,
        preload: &Preload,
    ) -> std::result::Result<Vec<R>, RepoError> {
        Ok(resources
            .into_iter()
            .map(|record| self.preload(record, preload))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: u32,
        slug: &'static str,
        author_loaded: bool,
    }

    impl Resource for Post {
        fn model_name(&self) -> &str {
            "Post"
        }
    }

    impl Record for Post {
        fn field(&self, name: &str) -> Option<String> {
            match name {
                "id" => Some(self.id.to_string()),
                "slug" => Some(self.slug.to_string()),
                _ => None,
            }
        }
    }

    fn post(id: u32, slug: &'static str) -> Post {
        Post {
            id,
            slug,
            author_loaded: false,
        }
    }

    fn model() -> ModelName {
        ModelName::try_from("Post").unwrap()
    }

    #[test]
    fn memory_repo_should_match_on_any_field() {
        let repo = MemoryRepo::new();
        repo.insert(post(1, "hello"));
        repo.insert(post(2, "world"));

        let by_slug = Fields::from([("slug".to_string(), "world".to_string())]);
        let found = block_on(repo.get_by(&model(), &by_slug)).unwrap();
        assert_eq!(found, Some(post(2, "world")));

        let by_id = Fields::from([("id".to_string(), "9".to_string())]);
        assert_eq!(block_on(repo.get_by(&model(), &by_id)).unwrap(), None);
        assert_eq!(repo.calls(), 2);
    }

    #[test]
    fn memory_repo_debug_reports_call_count() {
        let repo: MemoryRepo<Post> = MemoryRepo::new();
        repo.insert(post(1, "hello"));
        block_on(repo.get_all(&model())).unwrap();

        let debug = format!("{repo:?}");
        assert!(debug.contains("calls: 1"), "{debug}");
        assert!(debug.contains("preloader: false"), "{debug}");
    }

    #[test]
    fn memory_repo_should_apply_preloader() {
        let repo = MemoryRepo::new().with_preloader(|mut post: Post, _preload: &Preload| {
            post.author_loaded = true;
            post
        });
        repo.insert(post(1, "hello"));

        let all = block_on(repo.get_all(&model())).unwrap();
        let loaded = block_on(repo.preload_all(all, &Preload::new(["author"]))).unwrap();
        assert!(loaded.iter().all(|post| post.author_loaded));
    }
}

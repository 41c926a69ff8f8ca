use crate::context::{RequestContext, Resource, Value};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::repo::{Fields, Repo};
use crate::types::AssignKey;

/// Loads the single resource for `options`, keeping a matching resource that
/// is already stored under `key`.
///
/// A stored value of another model, a stored nil, or a missing entry all lead
/// to a fresh fetch by identity. Without an identity parameter nothing is
/// fetched.
pub(crate) async fn load_one<C, Rp>(
    repo: &Rp,
    ctx: &C,
    options: &Options,
    key: &AssignKey,
) -> Result<Option<C::Resource>>
where
    C: RequestContext,
    Rp: Repo<C::Resource> + ?Sized,
{
    if let Some(Value::One(existing)) = ctx.assigns().get(key.as_str())
        && existing.model_name() == options.model.as_str()
    {
        tracing::trace!(key = %key, "keeping assigned resource");
        return Ok(Some(existing.clone()));
    }

    let Some(id) = ctx.param(options.id_param()) else {
        tracing::trace!(param = options.id_param(), "no identity parameter");
        return Ok(None);
    };
    let mut fields = Fields::new();
    fields.insert(options.id_storage_field().to_string(), id.to_string());

    tracing::trace!(model = %options.model, field = options.id_storage_field(), "fetching resource");
    let found = repo
        .get_by(&options.model, &fields)
        .await
        .map_err(Error::from)?;
    match found {
        Some(resource) if !options.preload.is_empty() => Ok(Some(
            repo.preload_one(resource, &options.preload)
                .await
                .map_err(Error::from)?,
        )),
        other => Ok(other),
    }
}

/// Loads every resource of the configured model, keeping a matching
/// collection that is already stored under `key`.
///
/// Only the first element's model is checked. An empty stored collection
/// counts as a mismatch and is fetched again.
pub(crate) async fn load_all<C, Rp>(
    repo: &Rp,
    ctx: &C,
    options: &Options,
    key: &AssignKey,
) -> Result<Vec<C::Resource>>
where
    C: RequestContext,
    Rp: Repo<C::Resource> + ?Sized,
{
    if let Some(Value::Many(existing)) = ctx.assigns().get(key.as_str())
        && existing
            .first()
            .is_some_and(|first| first.model_name() == options.model.as_str())
    {
        tracing::trace!(key = %key, "keeping assigned collection");
        return Ok(existing.clone());
    }

    tracing::trace!(model = %options.model, "fetching collection");
    let all = repo.get_all(&options.model).await.map_err(Error::from)?;
    if options.preload.is_empty() {
        return Ok(all);
    }
    repo.preload_all(all, &options.preload)
        .await
        .map_err(Error::from)
}

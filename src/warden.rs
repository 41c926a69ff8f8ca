use crate::ability::{Ability, decide};
use crate::action::{LoadShape, classify, resolve_action};
use crate::context::{AUTHORIZED_KEY, RequestContext, Value};
use crate::error::Result;
use crate::handler::{HandlerKind, HandlerRef, HandlerRegistry, dispatch};
use crate::loader::{load_all, load_one};
use crate::naming::derive_key;
use crate::options::{Defaults, Options};
use crate::repo::Repo;
use crate::types::{Action, AssignKey};

/// Authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Permission is granted.
    Allow,
    /// Permission is denied.
    Deny,
    /// The action filter disabled the operation; nothing ran.
    Skipped,
}

impl Decision {
    fn from_allowed(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// Resource pipeline with pluggable repo, permission predicate and handlers.
///
/// A warden is immutable once built and can be shared across concurrent
/// requests; all per-request state lives in the context passed to each call.
pub struct Warden<Rp, A, C> {
    repo: Rp,
    ability: A,
    defaults: Defaults,
    handlers: HandlerRegistry<C>,
}

impl<Rp, A, C> std::fmt::Debug for Warden<Rp, A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warden")
            .field("defaults", &self.defaults)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Warden`].
pub struct WardenBuilder<Rp, A, C> {
    repo: Rp,
    ability: A,
    defaults: Defaults,
    handlers: HandlerRegistry<C>,
}

impl<Rp, A, C> WardenBuilder<Rp, A, C> {
    /// Creates a new builder with default configuration.
    pub fn new(repo: Rp, ability: A) -> Self {
        Self {
            repo,
            ability,
            defaults: Defaults::default(),
            handlers: HandlerRegistry::new(),
        }
    }

    /// Replaces the process-wide defaults.
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets the default subject key.
    pub fn current_user(mut self, key: AssignKey) -> Self {
        self.defaults.current_user = key;
        self
    }

    /// Sets the global not-found handler.
    pub fn not_found_handler(mut self, handler: HandlerRef) -> Self {
        self.defaults.not_found_handler = Some(handler);
        self
    }

    /// Sets the global unauthorized handler.
    pub fn unauthorized_handler(mut self, handler: HandlerRef) -> Self {
        self.defaults.unauthorized_handler = Some(handler);
        self
    }

    /// Registers a handler body under `reference`.
    pub fn handler<F>(mut self, reference: HandlerRef, handler: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.handlers.register(reference, handler);
        self
    }

    /// Builds the warden.
    pub fn build(self) -> Warden<Rp, A, C> {
        Warden {
            repo: self.repo,
            ability: self.ability,
            defaults: self.defaults,
            handlers: self.handlers,
        }
    }
}

impl<Rp, A, C> Warden<Rp, A, C>
where
    C: RequestContext,
    Rp: Repo<C::Resource>,
    A: Ability<C::Resource, C::Subject>,
{
    /// Returns the process-wide defaults.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Loads the resource for the current action and stores it on `ctx`.
    ///
    /// `index` loads the whole collection under the pluralized key, `new` and
    /// `create` store nil without touching storage, anything else loads one
    /// instance by identity. A missing required resource fires the not-found
    /// handler.
    pub async fn load(&self, ctx: &mut C, options: &Options) -> Result<()> {
        options.validate()?;
        let action = resolve_action(ctx)?;
        if !options.is_action_enabled(&action) {
            tracing::debug!(action = %action, "load skipped by action filter");
            return Ok(());
        }
        let key = derive_key(options, &action);
        self.load_into(ctx, options, &action, &key).await?;
        self.check_not_found(ctx, options, &action, &key)
    }

    /// Authorizes the subject for the current action.
    ///
    /// The outcome is stored under `authorized` before the unauthorized
    /// handler runs.
    pub async fn authorize(&self, ctx: &mut C, options: &Options) -> Result<Decision> {
        options.validate()?;
        let action = resolve_action(ctx)?;
        if !options.is_action_enabled(&action) {
            tracing::debug!(action = %action, "authorize skipped by action filter");
            return Ok(Decision::Skipped);
        }
        let key = derive_key(options, &action);
        self.authorize_into(ctx, options, &action, &key).await
    }

    /// Loads, then authorizes, in one pass.
    ///
    /// The unauthorized handler runs before the not-found check; when it
    /// halts the context the not-found handler never fires. A denied subject
    /// never sees the loaded resource: the key is reset to nil.
    ///
    /// A stored nil is not kept by the loader, so an absent instance is
    /// fetched once for loading and once more for the permission check.
    pub async fn load_and_authorize(&self, ctx: &mut C, options: &Options) -> Result<Decision> {
        options.validate()?;
        let action = resolve_action(ctx)?;
        if !options.is_action_enabled(&action) {
            tracing::debug!(action = %action, "load_and_authorize skipped by action filter");
            return Ok(Decision::Skipped);
        }
        let key = derive_key(options, &action);

        self.load_into(ctx, options, &action, &key).await?;
        let decision = self.authorize_into(ctx, options, &action, &key).await?;
        if !ctx.is_halted() {
            self.check_not_found(ctx, options, &action, &key)?;
        }
        if decision == Decision::Deny {
            ctx.assigns_mut().insert(key, Value::Nil);
        }
        Ok(decision)
    }

    /// Returns the authorization outcome stored on `ctx`, if any.
    pub fn is_authorized(&self, ctx: &C) -> Option<bool> {
        ctx.assigns().flag(AUTHORIZED_KEY)
    }

    async fn load_into(
        &self,
        ctx: &mut C,
        options: &Options,
        action: &Action,
        key: &AssignKey,
    ) -> Result<()> {
        let loaded = match classify(action, options).load {
            LoadShape::All => Value::Many(load_all(&self.repo, &*ctx, options, key).await?),
            LoadShape::Skip => Value::Nil,
            LoadShape::One => load_one(&self.repo, &*ctx, options, key)
                .await?
                .map_or(Value::Nil, Value::One),
        };
        ctx.assigns_mut().insert(key.clone(), loaded);
        Ok(())
    }

    async fn authorize_into(
        &self,
        ctx: &mut C,
        options: &Options,
        action: &Action,
        key: &AssignKey,
    ) -> Result<Decision> {
        let allowed = decide(
            &self.repo,
            &self.ability,
            &self.defaults,
            &*ctx,
            action,
            options,
            key,
        )
        .await?;
        tracing::debug!(
            action = %action,
            model = %options.model(),
            authorized = allowed,
            "authorization decided"
        );
        ctx.assigns_mut().insert(
            AssignKey::from_string(AUTHORIZED_KEY.to_string()),
            Value::Bool(allowed),
        );
        if !allowed {
            self.dispatch(ctx, HandlerKind::Unauthorized, options)?;
        }
        Ok(Decision::from_allowed(allowed))
    }

    fn check_not_found(
        &self,
        ctx: &mut C,
        options: &Options,
        action: &Action,
        key: &AssignKey,
    ) -> Result<()> {
        if !classify(action, options).required {
            return Ok(());
        }
        let missing = ctx
            .assigns()
            .get(key.as_str())
            .is_none_or(|value| value.is_nil());
        if missing {
            self.dispatch(ctx, HandlerKind::NotFound, options)?;
        }
        Ok(())
    }

    fn dispatch(&self, ctx: &mut C, kind: HandlerKind, options: &Options) -> Result<()> {
        dispatch(&self.handlers, &self.defaults, ctx, kind, options)
    }
}

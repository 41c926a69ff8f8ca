//! Not-found and unauthorized handler resolution.
//!
//! Handlers are registered once under a [`HandlerRef`] and referred to by that
//! reference from [`Options`](crate::Options) and [`Defaults`](crate::Defaults).
//! Resolution order is per-call override, then global default, then the
//! context flavor's built-in fallback.

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::options::{Defaults, Options};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which outcome a handler reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// The resource could not be found.
    NotFound,
    /// The subject is not permitted.
    Unauthorized,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::NotFound => f.write_str("not_found"),
            HandlerKind::Unauthorized => f.write_str("unauthorized"),
        }
    }
}

/// `module::function` pair naming a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String"))]
pub struct HandlerRef {
    module: String,
    function: String,
}

fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.'))
}

impl HandlerRef {
    /// Creates a reference from its two parts.
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Result<Self> {
        let module = module.into();
        let function = function.into();
        if !is_path_segment(&module) || !is_path_segment(&function) || function.contains('.') {
            return Err(Error::MalformedHandler(format!("{module}::{function}")));
        }
        Ok(Self { module, function })
    }

    /// Parses the `module::function` string form.
    pub fn parse(value: &str) -> Result<Self> {
        let (module, function) = value
            .trim()
            .rsplit_once("::")
            .ok_or_else(|| Error::MalformedHandler(value.to_string()))?;
        Self::new(module, function)
    }

    /// Returns the module part.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the function part.
    pub fn function(&self) -> &str {
        &self.function
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.function)
    }
}

impl TryFrom<&str> for HandlerRef {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for HandlerRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

/// Handler body: receives the context and may mutate or halt it.
pub type Handler<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// Registered handlers for one context flavor.
pub struct HandlerRegistry<C> {
    handlers: HashMap<HandlerRef, Handler<C>>,
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for HandlerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl<C> HandlerRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `reference`, replacing any previous one.
    pub fn register<F>(&mut self, reference: HandlerRef, handler: F)
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.handlers.insert(reference, Arc::new(handler));
    }

    /// Returns the handler registered under `reference`.
    pub fn get(&self, reference: &HandlerRef) -> Option<&Handler<C>> {
        self.handlers.get(reference)
    }
}

/// Invokes exactly one handler for `kind` on `ctx`.
pub(crate) fn dispatch<C: RequestContext>(
    registry: &HandlerRegistry<C>,
    defaults: &Defaults,
    ctx: &mut C,
    kind: HandlerKind,
    options: &Options,
) -> Result<()> {
    let reference = options.handler(kind).or_else(|| defaults.handler(kind));
    match reference {
        Some(reference) => {
            let handler = registry
                .get(reference)
                .ok_or_else(|| Error::UnknownHandler(reference.clone()))?;
            tracing::debug!(kind = %kind, handler = %reference, "dispatching handler");
            handler(ctx);
        }
        None => {
            tracing::debug!(kind = %kind, "dispatching default handler");
            match kind {
                HandlerKind::NotFound => ctx.default_not_found(),
                HandlerKind::Unauthorized => ctx.default_unauthorized(),
            }
        }
    }
    Ok(())
}

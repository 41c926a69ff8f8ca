//! Per-call configuration and process-wide defaults.

use crate::error::{Error, Result};
use crate::handler::{HandlerKind, HandlerRef};
use crate::types::{Action, AssignKey, ModelName};

const DEFAULT_ID: &str = "id";
const DEFAULT_CURRENT_USER: &str = "current_user";

/// One or more actions, as accepted by `only`/`except`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "OneOrMany"))]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
    /// Returns whether `action` is a member.
    pub fn contains(&self, action: &Action) -> bool {
        self.0.contains(action)
    }
}

impl From<Action> for ActionSet {
    fn from(action: Action) -> Self {
        Self(vec![action])
    }
}

impl<const N: usize> From<[Action; N]> for ActionSet {
    fn from(actions: [Action; N]) -> Self {
        Self(actions.into())
    }
}

impl From<Vec<Action>> for ActionSet {
    fn from(actions: Vec<Action>) -> Self {
        Self(actions)
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Action),
    Many(Vec<Action>),
}

#[cfg(feature = "serde")]
impl From<OneOrMany> for ActionSet {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(action) => Self(vec![action]),
            OneOrMany::Many(actions) => Self(actions),
        }
    }
}

/// Association names to preload, passed through to the repo untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Preload(Vec<String>);

impl Preload {
    /// Creates a preload spec from association names.
    pub fn new<I, S>(associations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(associations.into_iter().map(Into::into).collect())
    }

    /// Returns whether nothing should be preloaded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the association names.
    pub fn associations(&self) -> &[String] {
        &self.0
    }
}

/// Per-call pipeline configuration.
///
/// ```
/// use rs_warden::{Action, ModelName, Options};
///
/// let options = Options::new(ModelName::try_from("Blog.Post").unwrap())
///     .only([Action::try_from("show").unwrap(), Action::try_from("edit").unwrap()])
///     .id_name("post_id");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Options {
    pub(crate) model: ModelName,
    #[cfg_attr(feature = "serde", serde(default, rename = "as"))]
    pub(crate) as_key: Option<AssignKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) only: Option<ActionSet>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) except: Option<ActionSet>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) preload: Preload,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) id_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) id_field: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) required: Option<bool>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) persisted: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) current_user: Option<AssignKey>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) not_found_handler: Option<HandlerRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) unauthorized_handler: Option<HandlerRef>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) non_id_actions: Vec<Action>,
}

impl Options {
    /// Creates options for `model` with every other setting at its default.
    pub fn new(model: ModelName) -> Self {
        Self {
            model,
            as_key: None,
            only: None,
            except: None,
            preload: Preload::default(),
            id_name: None,
            id_field: None,
            required: None,
            persisted: false,
            current_user: None,
            not_found_handler: None,
            unauthorized_handler: None,
            non_id_actions: Vec::new(),
        }
    }

    /// Stores the resource under `key` instead of the derived name.
    pub fn as_key(mut self, key: AssignKey) -> Self {
        self.as_key = Some(key);
        self
    }

    /// Runs the pipeline only for the given actions.
    pub fn only(mut self, actions: impl Into<ActionSet>) -> Self {
        self.only = Some(actions.into());
        self
    }

    /// Runs the pipeline for every action except the given ones.
    pub fn except(mut self, actions: impl Into<ActionSet>) -> Self {
        self.except = Some(actions.into());
        self
    }

    /// Sets the associations to preload on fetched resources.
    pub fn preload(mut self, preload: Preload) -> Self {
        self.preload = preload;
        self
    }

    /// Sets the request parameter carrying the resource identity.
    pub fn id_name(mut self, name: impl Into<String>) -> Self {
        self.id_name = Some(name.into());
        self
    }

    /// Sets the storage field matched against the identity value.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Sets whether a missing resource triggers the not-found handler.
    ///
    /// Setting this to `true` also pins loading and authorization to a single
    /// instance, regardless of the action.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Deprecated spelling of single-instance mode; see [`Options::required`].
    pub fn persisted(mut self, persisted: bool) -> Self {
        self.persisted = persisted;
        self
    }

    /// Reads the subject from `key` instead of the global default.
    pub fn current_user(mut self, key: AssignKey) -> Self {
        self.current_user = Some(key);
        self
    }

    /// Overrides the not-found handler for this call.
    pub fn not_found_handler(mut self, handler: HandlerRef) -> Self {
        self.not_found_handler = Some(handler);
        self
    }

    /// Overrides the unauthorized handler for this call.
    pub fn unauthorized_handler(mut self, handler: HandlerRef) -> Self {
        self.unauthorized_handler = Some(handler);
        self
    }

    /// Adds actions treated like `index`/`new`/`create` for authorization.
    pub fn non_id_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.non_id_actions.extend(actions);
        self
    }

    /// Returns the configured model.
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    /// Returns the identity parameter name (`id` by default).
    pub fn id_param(&self) -> &str {
        self.id_name.as_deref().unwrap_or(DEFAULT_ID)
    }

    /// Returns the identity storage field (`id` by default).
    pub fn id_storage_field(&self) -> &str {
        self.id_field.as_deref().unwrap_or(DEFAULT_ID)
    }

    pub(crate) fn handler(&self, kind: HandlerKind) -> Option<&HandlerRef> {
        match kind {
            HandlerKind::NotFound => self.not_found_handler.as_ref(),
            HandlerKind::Unauthorized => self.unauthorized_handler.as_ref(),
        }
    }

    /// Checks that the options are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.only.is_some() && self.except.is_some() {
            return Err(Error::ConflictingFilters);
        }
        Ok(())
    }

    /// Returns whether the pipeline runs for `action`.
    ///
    /// Callers must [`validate`](Options::validate) first; with both filters
    /// set, `except` wins here.
    pub fn is_action_enabled(&self, action: &Action) -> bool {
        if let Some(except) = &self.except {
            return !except.contains(action);
        }
        if let Some(only) = &self.only {
            return only.contains(action);
        }
        true
    }
}

/// Process-wide defaults, constructed once at startup.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Defaults {
    /// Attribute key holding the acting subject.
    pub current_user: AssignKey,
    /// Global not-found handler.
    pub not_found_handler: Option<HandlerRef>,
    /// Global unauthorized handler.
    pub unauthorized_handler: Option<HandlerRef>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            current_user: AssignKey::from_string(DEFAULT_CURRENT_USER.to_string()),
            not_found_handler: None,
            unauthorized_handler: None,
        }
    }
}

impl Defaults {
    pub(crate) fn handler(&self, kind: HandlerKind) -> Option<&HandlerRef> {
        match kind {
            HandlerKind::NotFound => self.not_found_handler.as_ref(),
            HandlerKind::Unauthorized => self.unauthorized_handler.as_ref(),
        }
    }
}

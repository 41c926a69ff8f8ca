use crate::context::{ACTION_KEY, Assigns, RequestContext, Resource, Value};
use crate::types::{Action, AssignKey};
use std::collections::HashMap;

/// Lifecycle stage a socket is currently being driven through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Initial mount of the view.
    Mount { live_action: Option<Action> },
    /// Parameter change for the view.
    Params { live_action: Option<Action> },
    /// A named client event.
    Event { name: String },
}

/// Result of running a pipeline on a socket, as consumed by an event loop.
#[derive(Debug)]
pub enum Hook<S> {
    /// Keep processing the event.
    Cont(S),
    /// Stop processing; a terminal action already happened.
    Halt(S),
}

impl<S> Hook<S> {
    /// Returns whether the loop must stop.
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }

    /// Returns the socket regardless of the outcome.
    pub fn into_inner(self) -> S {
        match self {
            Self::Cont(socket) | Self::Halt(socket) => socket,
        }
    }
}

/// UI-event-style request context for a stateful session.
#[derive(Debug, Clone)]
pub struct Socket<R, U> {
    assigns: Assigns<R, U>,
    stage: Stage,
    params: HashMap<String, String>,
    redirect: Option<String>,
    halted: bool,
}

impl<R, U> Socket<R, U> {
    /// Creates a socket in the given stage.
    pub fn new(stage: Stage) -> Self {
        Self {
            assigns: Assigns::new(),
            stage,
            params: HashMap::new(),
            redirect: None,
            halted: false,
        }
    }

    /// Adds a parameter (URL params or event payload).
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Stores an attribute.
    pub fn with_assign(mut self, key: AssignKey, value: Value<R, U>) -> Self {
        self.assigns.insert(key, value);
        self
    }

    /// Moves the socket to another lifecycle stage, keeping its assigns.
    pub fn enter(&mut self, stage: Stage, params: HashMap<String, String>) {
        self.stage = stage;
        self.params = params;
        self.halted = false;
    }

    /// Returns the current stage.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Overrides the action the pipeline resolves for this socket.
    pub fn put_action(&mut self, action: Action) {
        self.assigns.insert(
            AssignKey::from_string(ACTION_KEY.to_string()),
            Value::Text(action.as_str().to_string()),
        );
    }

    /// Navigates to `location`.
    pub fn redirect(&mut self, location: impl Into<String>) {
        self.redirect = Some(location.into());
    }

    /// Returns the redirect location, if one was set.
    pub fn redirect_location(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Converts into the `(halt | cont, socket)` pairing an event loop expects.
    pub fn into_hook(self) -> Hook<Self> {
        if self.halted {
            Hook::Halt(self)
        } else {
            Hook::Cont(self)
        }
    }
}

impl<R, U> RequestContext for Socket<R, U>
where
    R: Resource,
    U: Send + Sync,
{
    type Resource = R;
    type Subject = U;

    fn assigns(&self) -> &Assigns<R, U> {
        &self.assigns
    }

    fn assigns_mut(&mut self) -> &mut Assigns<R, U> {
        &mut self.assigns
    }

    fn framework_action(&self) -> Option<Action> {
        match &self.stage {
            Stage::Mount { live_action } | Stage::Params { live_action } => live_action.clone(),
            Stage::Event { name } => Action::canonical(name),
        }
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn default_not_found(&mut self) {
        self.redirect("/");
        self.halt();
    }

    fn default_unauthorized(&mut self) {
        self.redirect("/");
        self.halt();
    }
}

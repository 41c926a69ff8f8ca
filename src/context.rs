//! Request-context abstraction shared by every pipeline operation.

use crate::types::{Action, AssignKey};
use std::collections::HashMap;

/// Attribute key holding an explicit action override.
pub const ACTION_KEY: &str = "resource_action";

/// Attribute key holding the authorization outcome.
pub const AUTHORIZED_KEY: &str = "authorized";

/// A persisted record of some model.
///
/// The pipeline only ever compares [`Resource::model_name`] against the
/// configured model; everything else about the record is opaque to it.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Returns the type tag of this record.
    fn model_name(&self) -> &str;
}

/// Value stored in a context's attribute store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<R, U> {
    /// Explicitly stored absence.
    Nil,
    /// Boolean flag, such as the authorization outcome.
    Bool(bool),
    /// Free-form text, such as an action override.
    Text(String),
    /// The acting subject.
    Subject(U),
    /// A single loaded resource.
    One(R),
    /// A loaded collection.
    Many(Vec<R>),
}

impl<R, U> Value<R, U> {
    /// Returns whether this is [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

/// Symbolic-key attribute store carried by a request context.
#[derive(Debug, Clone)]
pub struct Assigns<R, U> {
    entries: HashMap<AssignKey, Value<R, U>>,
}

impl<R, U> Default for Assigns<R, U> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<R, U> Assigns<R, U> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value<R, U>> {
        self.entries.get(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: AssignKey, value: Value<R, U>) -> Option<Value<R, U>> {
        self.entries.insert(key, value)
    }

    /// Removes the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value<R, U>> {
        self.entries.remove(key)
    }

    /// Returns whether anything (including nil) is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the single resource stored under `key`, if any.
    pub fn resource(&self, key: &str) -> Option<&R> {
        match self.entries.get(key) {
            Some(Value::One(resource)) => Some(resource),
            _ => None,
        }
    }

    /// Returns the collection stored under `key`, if any.
    pub fn resources(&self, key: &str) -> Option<&[R]> {
        match self.entries.get(key) {
            Some(Value::Many(resources)) => Some(resources),
            _ => None,
        }
    }

    /// Returns the boolean stored under `key`, if any.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(Value::Bool(flag)) => Some(*flag),
            _ => None,
        }
    }
}

/// Capability every request-context flavor provides to the pipeline.
///
/// The HTTP-style [`Conn`](crate::Conn) and the UI-event-style
/// [`Socket`](crate::Socket) both implement it; pipeline operations are generic
/// over this trait instead of branching on the concrete flavor.
pub trait RequestContext: Send {
    /// Record type held by the context.
    type Resource: Resource;
    /// Acting subject type.
    type Subject: Send + Sync;

    /// Returns the attribute store.
    fn assigns(&self) -> &Assigns<Self::Resource, Self::Subject>;

    /// Returns the attribute store for mutation.
    fn assigns_mut(&mut self) -> &mut Assigns<Self::Resource, Self::Subject>;

    /// Returns the action supplied by the framework (route action, view stage, event).
    fn framework_action(&self) -> Option<Action>;

    /// Returns a request parameter.
    fn param(&self, name: &str) -> Option<&str>;

    /// Returns whether a terminal response has been produced.
    fn is_halted(&self) -> bool;

    /// Marks the context as terminally responded.
    fn halt(&mut self);

    /// Returns the explicit action override, if one was assigned.
    fn action_hint(&self) -> Option<Action> {
        match self.assigns().get(ACTION_KEY) {
            Some(Value::Text(name)) => Action::canonical(name),
            _ => None,
        }
    }

    /// Fallback not-found behavior when no handler is configured.
    fn default_not_found(&mut self) {}

    /// Fallback unauthorized behavior when no handler is configured.
    fn default_unauthorized(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Post;

    #[test]
    fn typed_accessors_ignore_other_variants() {
        let mut assigns: Assigns<Post, ()> = Assigns::new();
        let key = AssignKey::try_from("post").unwrap();
        assigns.insert(key.clone(), Value::Bool(true));

        assert!(assigns.resource("post").is_none());
        assert!(assigns.resources("post").is_none());
        assert_eq!(assigns.flag("post"), Some(true));

        assigns.insert(key, Value::One(Post));
        assert_eq!(assigns.resource("post"), Some(&Post));
    }

    #[test]
    fn nil_counts_as_present() {
        let mut assigns: Assigns<Post, ()> = Assigns::new();
        assigns.insert(AssignKey::try_from("post").unwrap(), Value::Nil);

        assert!(assigns.contains_key("post"));
        assert!(assigns.get("post").is_some_and(Value::is_nil));
    }
}

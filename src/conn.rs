use crate::context::{ACTION_KEY, Assigns, RequestContext, Resource, Value};
use crate::types::{Action, AssignKey};
use std::collections::HashMap;

const NOT_FOUND: u16 = 404;
const FORBIDDEN: u16 = 403;

/// HTTP-style request context.
///
/// Carries the route action, request parameters and an attribute store. A
/// conn becomes halted once a handler has produced the response, after which
/// no further pipeline handler runs for it.
#[derive(Debug, Clone)]
pub struct Conn<R, U> {
    assigns: Assigns<R, U>,
    route_action: Option<Action>,
    params: HashMap<String, String>,
    status: Option<u16>,
    redirect: Option<String>,
    halted: bool,
}

impl<R, U> Default for Conn<R, U> {
    fn default() -> Self {
        Self {
            assigns: Assigns::new(),
            route_action: None,
            params: HashMap::new(),
            status: None,
            redirect: None,
            halted: false,
        }
    }
}

impl<R, U> Conn<R, U> {
    /// Creates a conn for the given route action.
    pub fn new(route_action: Action) -> Self {
        Self {
            route_action: Some(route_action),
            ..Self::default()
        }
    }

    /// Adds a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Stores an attribute.
    pub fn with_assign(mut self, key: AssignKey, value: Value<R, U>) -> Self {
        self.assigns.insert(key, value);
        self
    }

    /// Overrides the action the pipeline resolves for this conn.
    pub fn put_action(&mut self, action: Action) {
        self.assigns.insert(
            AssignKey::from_string(ACTION_KEY.to_string()),
            Value::Text(action.as_str().to_string()),
        );
    }

    /// Sets the response status.
    pub fn put_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Returns the response status, if one was set.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Records a redirect to `location`.
    pub fn redirect(&mut self, location: impl Into<String>) {
        self.redirect = Some(location.into());
    }

    /// Returns the redirect location, if one was set.
    pub fn redirect_location(&self) -> Option<&str> {
        self.redirect.as_deref()
    }
}

impl<R, U> RequestContext for Conn<R, U>
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
        self.route_action.clone()
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
        self.put_status(NOT_FOUND);
        self.halt();
    }

    fn default_unauthorized(&mut self) {
        self.put_status(FORBIDDEN);
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Post;

    impl Resource for Post {
        fn model_name(&self) -> &str {
            "Post"
        }
    }

    #[test]
    fn put_action_overrides_route_action() {
        let mut conn: Conn<Post, ()> = Conn::new(Action::try_from("show").unwrap());
        assert_eq!(conn.action_hint(), None);

        conn.put_action(Action::try_from("publish").unwrap());

        assert_eq!(conn.action_hint().unwrap().as_str(), "publish");
        assert_eq!(conn.framework_action().unwrap().as_str(), "show");
    }

    #[test]
    fn default_handlers_halt_with_status() {
        let mut conn: Conn<Post, ()> = Conn::default();
        conn.default_unauthorized();
        assert!(conn.is_halted());
        assert_eq!(conn.status(), Some(403));

        let mut conn: Conn<Post, ()> = Conn::default();
        conn.default_not_found();
        assert_eq!(conn.status(), Some(404));
    }
}

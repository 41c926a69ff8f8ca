//! Action resolution and classification.

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::types::Action;

const NON_ID_ACTIONS: [&str; 3] = ["index", "new", "create"];
const NO_LOAD_ACTIONS: [&str; 2] = ["new", "create"];

/// Resolves the canonical action for a context.
///
/// An explicit override stored on the context wins over the framework action.
pub fn resolve_action<C: RequestContext>(ctx: &C) -> Result<Action> {
    ctx.action_hint()
        .or_else(|| ctx.framework_action())
        .ok_or(Error::MissingAction)
}

/// How the loader treats an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadShape {
    /// Fetch the full collection.
    All,
    /// Nothing exists yet; store nil without touching storage.
    Skip,
    /// Fetch a single instance by identity.
    One,
}

/// What the permission predicate receives as its resource argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    /// The bare model identity.
    Model,
    /// The loaded instance (possibly nil).
    Instance,
}

/// Classification of an action under a set of options.
///
/// `required: true` and the deprecated `persisted` flag both pin the pipeline
/// to a single instance; `non_id_actions` extends the model-level set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Single-instance mode is forced.
    pub pinned: bool,
    /// Action expects no existing instance.
    pub non_id: bool,
    /// Loader behavior.
    pub load: LoadShape,
    /// Permission-predicate argument.
    pub target: TargetShape,
    /// A missing resource fires the not-found handler.
    pub required: bool,
}

/// Classifies `action` under `options`.
pub fn classify(action: &Action, options: &Options) -> Classification {
    let pinned = options.persisted || options.required == Some(true);
    let non_id = NON_ID_ACTIONS.contains(&action.as_str())
        || options.non_id_actions.contains(action);

    let load = if pinned {
        LoadShape::One
    } else if action.is_index() {
        LoadShape::All
    } else if NO_LOAD_ACTIONS.contains(&action.as_str()) {
        LoadShape::Skip
    } else {
        LoadShape::One
    };

    let target = if !pinned && non_id {
        TargetShape::Model
    } else {
        TargetShape::Instance
    };

    Classification {
        pinned,
        non_id,
        load,
        target,
        required: options.required.unwrap_or(!non_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelName;

    fn action(name: &str) -> Action {
        Action::try_from(name).unwrap()
    }

    fn options() -> Options {
        Options::new(ModelName::try_from("Post").unwrap())
    }

    #[test]
    fn default_classification_of_crud_actions() {
        let index = classify(&action("index"), &options());
        assert_eq!(index.load, LoadShape::All);
        assert_eq!(index.target, TargetShape::Model);
        assert!(!index.required);

        let new = classify(&action("new"), &options());
        assert_eq!(new.load, LoadShape::Skip);
        assert_eq!(new.target, TargetShape::Model);

        let show = classify(&action("show"), &options());
        assert_eq!(show.load, LoadShape::One);
        assert_eq!(show.target, TargetShape::Instance);
        assert!(show.required);
    }

    #[test]
    fn persisted_and_required_pin_to_instance() {
        for options in [options().persisted(true), options().required(true)] {
            let class = classify(&action("index"), &options);
            assert!(class.pinned);
            assert_eq!(class.load, LoadShape::One);
            assert_eq!(class.target, TargetShape::Instance);
        }
    }

    #[test]
    fn required_false_only_relaxes_not_found() {
        let class = classify(&action("show"), &options().required(false));
        assert!(!class.pinned);
        assert!(!class.required);
        assert_eq!(class.target, TargetShape::Instance);
    }

    #[test]
    fn extra_non_id_actions_change_target_but_still_load() {
        let options = options().non_id_actions([action("search")]);
        let class = classify(&action("search"), &options);
        assert!(class.non_id);
        assert_eq!(class.target, TargetShape::Model);
        assert_eq!(class.load, LoadShape::One);
        assert!(!class.required);
    }
}

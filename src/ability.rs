use crate::action::{TargetShape, classify};
use crate::context::{RequestContext, Value};
use crate::error::{Error, Result};
use crate::loader::load_one;
use crate::options::{Defaults, Options};
use crate::repo::Repo;
use crate::types::{Action, AssignKey, ModelName};

/// The acting principal as seen by the permission predicate.
#[derive(Debug)]
pub enum Subject<'a, U> {
    /// A known subject.
    Authenticated(&'a U),
    /// The subject key holds nil.
    Anonymous,
}

/// Resource argument handed to the permission predicate.
#[derive(Debug)]
pub enum Target<'a, R> {
    /// Model-level check, for actions without an instance.
    Model(&'a ModelName),
    /// Instance-level check; `None` when nothing was found.
    Instance(Option<&'a R>),
}

/// Permission predicate supplied by the embedding application.
///
/// Implementations must handle both [`Subject`] variants and both [`Target`]
/// variants; the pipeline never interprets the result.
pub trait Ability<R, U>: Send + Sync {
    /// Returns whether `subject` may perform `action` on `target`.
    fn can(&self, subject: Subject<'_, U>, action: &Action, target: Target<'_, R>) -> bool;
}

fn subject_key<'a>(options: &'a Options, defaults: &'a Defaults) -> &'a AssignKey {
    options.current_user.as_ref().unwrap_or(&defaults.current_user)
}

fn resolve_subject<'c, C: RequestContext>(
    ctx: &'c C,
    key: &AssignKey,
) -> Result<Subject<'c, C::Subject>> {
    match ctx.assigns().get(key.as_str()) {
        None => Err(Error::MissingSubject { key: key.clone() }),
        Some(Value::Subject(subject)) => Ok(Subject::Authenticated(subject)),
        Some(Value::Nil) => Ok(Subject::Anonymous),
        Some(_) => Err(Error::InvalidSubject { key: key.clone() }),
    }
}

/// Computes whether the subject on `ctx` may perform `action`.
///
/// A missing subject is a configuration error and is reported before any
/// storage access. Model-level actions pass the bare model; everything else
/// passes the instance stored under `key`, fetching it when needed.
pub(crate) async fn decide<C, Rp, A>(
    repo: &Rp,
    ability: &A,
    defaults: &Defaults,
    ctx: &C,
    action: &Action,
    options: &Options,
    key: &AssignKey,
) -> Result<bool>
where
    C: RequestContext,
    Rp: Repo<C::Resource> + ?Sized,
    A: Ability<C::Resource, C::Subject> + ?Sized,
{
    let subject = resolve_subject(ctx, subject_key(options, defaults))?;

    let allowed = match classify(action, options).target {
        TargetShape::Model => ability.can(subject, action, Target::Model(&options.model)),
        TargetShape::Instance => {
            let loaded = load_one(repo, ctx, options, key).await?;
            ability.can(subject, action, Target::Instance(loaded.as_ref()))
        }
    };
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::Conn;
    use crate::context::Resource;
    use crate::error::RepoError;
    use crate::repo::Fields;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Post {
        id: u32,
    }

    impl Resource for Post {
        fn model_name(&self) -> &str {
            "Post"
        }
    }

    #[derive(Debug, Clone)]
    struct User;

    struct OnePostRepo;

    #[async_trait]
    impl Repo<Post> for OnePostRepo {
        async fn get_by(
            &self,
            _model: &ModelName,
            fields: &Fields,
        ) -> std::result::Result<Option<Post>, RepoError> {
            Ok(fields
                .get("id")
                .and_then(|id| id.parse().ok())
                .map(|id| Post { id }))
        }

        async fn get_all(&self, _model: &ModelName) -> std::result::Result<Vec<Post>, RepoError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Ability<Post, User> for Recorder {
        fn can(&self, subject: Subject<'_, User>, action: &Action, target: Target<'_, Post>) -> bool {
            let who = match subject {
                Subject::Authenticated(_) => "user",
                Subject::Anonymous => "anonymous",
            };
            let what = match target {
                Target::Model(model) => format!("model:{model}"),
                Target::Instance(Some(post)) => format!("post:{}", post.id),
                Target::Instance(None) => "nothing".to_string(),
            };
            self.seen
                .lock()
                .expect("poisoned lock")
                .push(format!("{who} {action} {what}"));
            true
        }
    }

    fn action(name: &str) -> Action {
        Action::try_from(name).unwrap()
    }

    fn options() -> Options {
        Options::new(ModelName::try_from("Post").unwrap())
    }

    fn key(name: &str) -> AssignKey {
        AssignKey::try_from(name).unwrap()
    }

    #[test]
    fn missing_subject_is_an_error() {
        let conn: Conn<Post, User> = Conn::new(action("show"));
        let result = block_on(decide(
            &OnePostRepo,
            &Recorder::default(),
            &Defaults::default(),
            &conn,
            &action("show"),
            &options(),
            &key("post"),
        ));
        assert!(matches!(result, Err(Error::MissingSubject { .. })));
    }

    #[test]
    fn non_subject_value_is_rejected() {
        let conn: Conn<Post, User> =
            Conn::new(action("show")).with_assign(key("current_user"), Value::Bool(true));
        let result = block_on(decide(
            &OnePostRepo,
            &Recorder::default(),
            &Defaults::default(),
            &conn,
            &action("show"),
            &options(),
            &key("post"),
        ));
        assert!(matches!(result, Err(Error::InvalidSubject { .. })));
    }

    #[test]
    fn nil_subject_is_anonymous_and_non_id_passes_model() {
        let recorder = Recorder::default();
        let conn: Conn<Post, User> =
            Conn::new(action("create")).with_assign(key("current_user"), Value::Nil);
        let allowed = block_on(decide(
            &OnePostRepo,
            &recorder,
            &Defaults::default(),
            &conn,
            &action("create"),
            &options(),
            &key("post"),
        ))
        .unwrap();

        assert!(allowed);
        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            ["anonymous create model:Post".to_string()]
        );
    }

    #[test]
    fn per_call_subject_key_overrides_default() {
        let recorder = Recorder::default();
        let conn: Conn<Post, User> = Conn::new(action("show"))
            .with_param("id", "4")
            .with_assign(key("admin"), Value::Subject(User));
        block_on(decide(
            &OnePostRepo,
            &recorder,
            &Defaults::default(),
            &conn,
            &action("show"),
            &options().current_user(key("admin")),
            &key("post"),
        ))
        .unwrap();

        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            ["user show post:4".to_string()]
        );
    }

    #[test]
    fn persisted_index_passes_instance() {
        let recorder = Recorder::default();
        let conn: Conn<Post, User> = Conn::new(action("index"))
            .with_assign(key("current_user"), Value::Subject(User));
        block_on(decide(
            &OnePostRepo,
            &recorder,
            &Defaults::default(),
            &conn,
            &action("index"),
            &options().persisted(true),
            &key("post"),
        ))
        .unwrap();

        assert_eq!(
            recorder.seen.lock().unwrap().as_slice(),
            ["user index nothing".to_string()]
        );
    }
}

//! Resource loading and authorization pipeline for request handlers.
//!
//! Given a request context, this crate works out which resource the request
//! concerns, loads it through a pluggable [`Repo`], asks a pluggable
//! [`Ability`] whether the acting subject may perform the action, and routes
//! "not found" and "unauthorized" outcomes to configurable handlers. Use
//! [`Warden`] to run the pipeline and [`Options`] to configure each call.
//!
//! # Examples
//!
//! Loading and authorizing a post for a `show` request (enable `memory-repo`):
//! ```no_run
//! use rs_warden::{
//!     Ability, Action, AssignKey, Conn, ModelName, Options, Resource, Subject, Target, Value,
//!     WardenBuilder,
//! };
//! # #[cfg(feature = "memory-repo")]
//! # {
//! use rs_warden::{MemoryRepo, Record};
//!
//! #[derive(Debug, Clone)]
//! struct Post { id: u32 }
//!
//! impl Resource for Post {
//!     fn model_name(&self) -> &str { "Post" }
//! }
//!
//! impl Record for Post {
//!     fn field(&self, name: &str) -> Option<String> {
//!         (name == "id").then(|| self.id.to_string())
//!     }
//! }
//!
//! struct Everyone;
//!
//! impl Ability<Post, String> for Everyone {
//!     fn can(&self, _: Subject<'_, String>, _: &Action, _: Target<'_, Post>) -> bool { true }
//! }
//!
//! let repo = MemoryRepo::new();
//! repo.insert(Post { id: 1 });
//! let warden = WardenBuilder::new(repo, Everyone).build();
//!
//! let mut conn = Conn::new(Action::try_from("show").unwrap())
//!     .with_param("id", "1")
//!     .with_assign(AssignKey::try_from("current_user").unwrap(), Value::Subject("ada".to_string()));
//! let options = Options::new(ModelName::try_from("Post").unwrap());
//! let _ = futures::executor::block_on(warden.load_and_authorize(&mut conn, &options));
//! # }
//! ```
#![forbid(unsafe_code)]

mod ability;
mod action;
mod conn;
mod context;
mod error;
mod handler;
mod loader;
mod naming;
mod options;
mod repo;
mod socket;
mod types;
mod warden;
#[cfg(feature = "memory-repo")]
mod memory_repo;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::ability::{Ability, Subject, Target};
pub use crate::action::{Classification, LoadShape, TargetShape, classify, resolve_action};
pub use crate::conn::Conn;
pub use crate::context::{ACTION_KEY, AUTHORIZED_KEY, Assigns, RequestContext, Resource, Value};
pub use crate::error::{Error, RepoError, Result};
pub use crate::handler::{Handler, HandlerKind, HandlerRef, HandlerRegistry};
pub use crate::naming::derive_key;
pub use crate::options::{ActionSet, Defaults, Options, Preload};
pub use crate::repo::{Fields, Repo};
pub use crate::socket::{Hook, Socket, Stage};
pub use crate::types::{Action, AssignKey, ModelName};
pub use crate::warden::{Decision, Warden, WardenBuilder};

#[cfg(feature = "memory-repo")]
pub use crate::memory_repo::{MemoryRepo, Record};

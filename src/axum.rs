//! Axum integration utilities.
//!
//! [`ResourceLayer`] runs one pipeline operation per request on a [`Conn`]
//! that earlier middleware placed in the request extensions. Handlers further
//! down read the loaded resource back with `Extension<Conn<R, U>>`.

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::ability::Ability;
use crate::conn::Conn;
use crate::context::{RequestContext, Resource};
use crate::error::Result;
use crate::options::Options;
use crate::repo::Repo;
use crate::warden::Warden;

use ::axum::body::Body;
use ::axum::http::{Request, StatusCode};
use ::axum::response::{IntoResponse, Response};
use ::http::header::LOCATION;
use ::tower::{Layer, Service};

/// Pipeline operation a [`ResourceLayer`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// [`Warden::load`].
    Load,
    /// [`Warden::authorize`].
    Authorize,
    /// [`Warden::load_and_authorize`].
    LoadAndAuthorize,
}

/// Middleware layer that runs a resource pipeline using [`Warden`].
pub struct ResourceLayer<Rp, A, R, U> {
    warden: Arc<Warden<Rp, A, Conn<R, U>>>,
    options: Arc<Options>,
    operation: Operation,
}

impl<Rp, A, R, U> Clone for ResourceLayer<Rp, A, R, U> {
    fn clone(&self) -> Self {
        Self {
            warden: self.warden.clone(),
            options: self.options.clone(),
            operation: self.operation,
        }
    }
}

impl<Rp, A, R, U> ResourceLayer<Rp, A, R, U> {
    /// Creates a new resource layer.
    pub fn new(
        warden: Arc<Warden<Rp, A, Conn<R, U>>>,
        options: Options,
        operation: Operation,
    ) -> Self {
        Self {
            warden,
            options: Arc::new(options),
            operation,
        }
    }
}

impl<Rp, A, R, U, Inner> Layer<Inner> for ResourceLayer<Rp, A, R, U> {
    type Service = ResourceService<Inner, Rp, A, R, U>;

    fn layer(&self, inner: Inner) -> Self::Service {
        ResourceService {
            inner,
            warden: self.warden.clone(),
            options: self.options.clone(),
            operation: self.operation,
        }
    }
}

/// Middleware service produced by [`ResourceLayer`].
pub struct ResourceService<Inner, Rp, A, R, U> {
    inner: Inner,
    warden: Arc<Warden<Rp, A, Conn<R, U>>>,
    options: Arc<Options>,
    operation: Operation,
}

impl<Inner: Clone, Rp, A, R, U> Clone for ResourceService<Inner, Rp, A, R, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            warden: self.warden.clone(),
            options: self.options.clone(),
            operation: self.operation,
        }
    }
}

async fn run_operation<Rp, A, R, U>(
    warden: &Warden<Rp, A, Conn<R, U>>,
    conn: &mut Conn<R, U>,
    options: &Options,
    operation: Operation,
) -> Result<()>
where
    R: Resource,
    U: Send + Sync,
    Rp: Repo<R>,
    A: Ability<R, U>,
{
    match operation {
        Operation::Load => warden.load(conn, options).await,
        Operation::Authorize => warden.authorize(conn, options).await.map(drop),
        Operation::LoadAndAuthorize => warden.load_and_authorize(conn, options).await.map(drop),
    }
}

fn halted_response<R, U>(conn: &Conn<R, U>) -> Response {
    if let Some(location) = conn.redirect_location() {
        return (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response();
    }
    let status = conn
        .status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::FORBIDDEN);
    status.into_response()
}

impl<Inner, Rp, A, R, U> Service<Request<Body>> for ResourceService<Inner, Rp, A, R, U>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    Rp: Repo<R> + 'static,
    A: Ability<R, U> + 'static,
    R: Resource,
    U: Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let warden = self.warden.clone();
        let options = self.options.clone();
        let operation = self.operation;

        Box::pin(async move {
            let Some(mut conn) = req.extensions_mut().remove::<Conn<R, U>>() else {
                return Ok(
                    (StatusCode::INTERNAL_SERVER_ERROR, "missing request context").into_response(),
                );
            };

            match run_operation(&warden, &mut conn, &options, operation).await {
                Ok(()) if conn.is_halted() => Ok(halted_response(&conn)),
                Ok(()) => {
                    req.extensions_mut().insert(conn);
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                Err(err) => {
                    tracing::error!(error = %err, model = %options.model(), "resource pipeline failed");
                    Ok((StatusCode::INTERNAL_SERVER_ERROR, "resource pipeline error").into_response())
                }
            }
        })
    }
}

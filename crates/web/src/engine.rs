//! The top-level dispatcher.
//!
//! An [`Engine`] is built in two phases. While it is owned mutably, routes, scopes,
//! middleware and the renderer are registered. [`Engine::run`] (or
//! [`Server::builder`](crate::Server::builder)) then moves it behind an `Arc`, after which
//! the routing structures are only ever read, so concurrent requests need no locking.

use crate::body::ResponseBody;
use crate::context::Context;
use crate::error::{RenderError, RouteError, ServerError};
use crate::handler::{Handler, SharedHandler};
use crate::render::{HandlebarsRenderer, Renderer};
use crate::router::Router;
use crate::scope::{Scope, ScopeEntry, method_route};
use crate::server::Server;
use bytes::Bytes;
use http::{Method, Request, Response};
use std::fmt;
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Engine {
    router: Router,
    /// Every scope in creation order; index 0 is the root scope with an empty prefix.
    scopes: Vec<ScopeEntry>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Engine {
    pub fn new() -> Self {
        Self { router: Router::new(), scopes: vec![ScopeEntry::new(String::new())], renderer: None }
    }

    /// The root scope, with an empty prefix.
    pub fn root(&mut self) -> Scope<'_> {
        Scope::new(self, 0)
    }

    /// Creates a scope with `prefix` directly below the root scope.
    pub fn group(&mut self, prefix: &str) -> Scope<'_> {
        let index = self.push_scope(ScopeEntry::new(prefix.to_string()));
        Scope::new(self, index)
    }

    /// Appends a middleware to the root scope; it applies to every request.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.root().use_middleware(middleware);
        self
    }

    pub fn add_route<H: Handler + 'static>(&mut self, method: Method, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        self.router.add_route(method, pattern, handler)?;
        Ok(self)
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);

    /// Serves the files below `root` at `{relative}/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> Result<&mut Self, RouteError> {
        self.root().static_files(relative, root)?;
        Ok(self)
    }

    pub fn set_renderer<R: Renderer + 'static>(&mut self, renderer: R) -> &mut Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Loads Handlebars templates from `dir` and uses them for [`Context::html`].
    pub fn load_templates(&mut self, dir: impl AsRef<Path>, extension: &str) -> Result<&mut Self, RenderError> {
        let renderer = HandlebarsRenderer::from_directory(dir, extension)?;
        Ok(self.set_renderer(renderer))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub(crate) fn scopes(&self) -> &[ScopeEntry] {
        &self.scopes
    }

    pub(crate) fn scope_mut(&mut self, index: usize) -> &mut ScopeEntry {
        &mut self.scopes[index]
    }

    pub(crate) fn push_scope(&mut self, scope: ScopeEntry) -> usize {
        self.scopes.push(scope);
        self.scopes.len() - 1
    }

    /// Middleware of every scope whose prefix matches `path`, in scope creation order.
    fn middlewares_for(&self, path: &str) -> Vec<SharedHandler> {
        self.scopes
            .iter()
            .filter(|scope| scope.applies_to(path))
            .flat_map(|scope| scope.middlewares().iter().cloned())
            .collect()
    }

    /// Handles one request: builds its context, runs the chain and returns what was written.
    pub fn serve(&self, request: Request<Bytes>) -> Response<ResponseBody> {
        let ctx = Context::new(request).with_renderer(self.renderer.clone());
        let middlewares = self.middlewares_for(ctx.path());
        let mut ctx = ctx.with_middlewares(middlewares);

        self.router.handle(&mut ctx);
        ctx.into_response()
    }

    /// Starts accepting connections on `address`. Registration is over once this is called.
    pub async fn run<A: ToSocketAddrs>(self, address: A) -> Result<(), ServerError> {
        Server::builder().engine(self).address(address).build()?.start().await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes = self.scopes.iter().map(ScopeEntry::prefix).collect::<Vec<_>>();
        f.debug_struct("Engine")
            .field("router", &self.router)
            .field("scopes", &prefixes)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

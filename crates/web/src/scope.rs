//! Route groups.
//!
//! A scope is a path prefix plus an ordered list of middleware. Scopes nest: a child's
//! prefix is its parent's prefix followed by its own suffix. All scopes live in one flat
//! list owned by the [`Engine`], in creation order, and that order decides in which
//! order their middleware run.

use crate::engine::Engine;
use crate::error::RouteError;
use crate::handler::{Handler, SharedHandler};
use crate::static_files::StaticFiles;
use http::Method;
use std::path::PathBuf;

pub(crate) struct ScopeEntry {
    prefix: String,
    middlewares: Vec<SharedHandler>,
}

impl ScopeEntry {
    pub(crate) fn new(prefix: String) -> Self {
        Self { prefix, middlewares: Vec::new() }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn middlewares(&self) -> &[SharedHandler] {
        &self.middlewares
    }

    /// Whether this scope's middleware apply to a request for `path`.
    pub(crate) fn applies_to(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// A registration handle on one scope of an [`Engine`].
///
/// ```
/// use shawg::{Context, Engine};
/// use http::StatusCode;
///
/// let mut engine = Engine::new();
/// let mut v1 = engine.group("/v1");
/// v1.get("/ping", |ctx: &mut Context| ctx.string(StatusCode::OK, "pong")).unwrap();
///
/// let mut admin = v1.group("/admin");
/// assert_eq!(admin.prefix(), "/v1/admin");
/// admin.use_middleware(|ctx: &mut Context| ctx.next());
/// ```
#[derive(Debug)]
pub struct Scope<'e> {
    engine: &'e mut Engine,
    index: usize,
}

macro_rules! method_route {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Registers a ", stringify!($upper_case_method), " route.")]
        #[inline]
        pub fn $method<H: Handler + 'static>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
            self.add_route(Method::$upper_case_method, pattern, handler)
        }
    };
}

pub(crate) use method_route;

impl<'e> Scope<'e> {
    pub(crate) fn new(engine: &'e mut Engine, index: usize) -> Self {
        Self { engine, index }
    }

    fn entry(&self) -> &ScopeEntry {
        &self.engine.scopes()[self.index]
    }

    pub fn prefix(&self) -> &str {
        self.entry().prefix()
    }

    /// Creates a nested scope whose prefix is this scope's prefix followed by `suffix`.
    pub fn group(&mut self, suffix: &str) -> Scope<'_> {
        let prefix = format!("{}{}", self.prefix(), suffix);
        let index = self.engine.push_scope(ScopeEntry::new(prefix));
        Scope::new(self.engine, index)
    }

    /// Appends a middleware to this scope. Middleware can't be removed or reordered.
    pub fn use_middleware<H: Handler + 'static>(&mut self, middleware: H) -> &mut Self {
        self.engine.scope_mut(self.index).middlewares.push(SharedHandler::new(middleware));
        self
    }

    /// Registers `handler` for `method` at this scope's prefix followed by `pattern`.
    pub fn add_route<H: Handler + 'static>(&mut self, method: Method, pattern: &str, handler: H) -> Result<&mut Self, RouteError> {
        let full_pattern = format!("{}{}", self.prefix(), pattern);
        self.engine.router_mut().add_route(method, &full_pattern, handler)?;
        Ok(self)
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);

    /// Serves the files below `root` at `{prefix}{relative}/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> Result<&mut Self, RouteError> {
        let pattern = format!("{}/*{}", relative.trim_end_matches('/'), StaticFiles::PARAM);
        self.get(&pattern, StaticFiles::new(root))
    }
}

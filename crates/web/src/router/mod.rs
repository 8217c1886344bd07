//! Method-aware trie router.
//!
//! Every HTTP method that has at least one route owns one trie root. A lookup walks
//! that trie and yields the *pattern* that matched; the handler itself lives in a
//! flat route table keyed by `"{method}-{pattern}"`.

pub mod pattern;

mod node;

use crate::context::Context;
use crate::handler::{Handler, SharedHandler};
use crate::params::PathParams;
use crate::error::RouteError;
use http::{Method, StatusCode};
use node::Node;
use pattern::{Pattern, percent_decode, split_path};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error};

/// Main router structure that handles HTTP request routing
#[derive(Default)]
pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<String, SharedHandler>,
}

/// Result of resolving a request, the matched pattern and its captures
#[derive(Debug, PartialEq, Eq)]
pub struct RouteMatch<'router> {
    pattern: &'router str,
    params: PathParams,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` and `pattern`.
    ///
    /// Registering the same method and pattern again replaces the handler.
    pub fn add_route<H: Handler + 'static>(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.add_shared_route(method, pattern, SharedHandler::new(handler))
    }

    pub(crate) fn add_shared_route(&mut self, method: Method, pattern: &str, handler: SharedHandler) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;

        self.roots.entry(method.clone()).or_insert_with(Node::root).insert(&pattern)?;

        let key = route_key(&method, pattern.as_str());
        debug!(%method, pattern = %pattern, "route registered");
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Matches the raw request `path` against the routes registered for `method`.
    ///
    /// Each segment is percent-decoded after splitting, so an encoded `/` stays inside
    /// its segment. Returns `None` when no route matches.
    pub fn resolve<'router>(&'router self, method: &Method, path: &str) -> Option<RouteMatch<'router>> {
        let root = self.roots.get(method)?;
        let decoded = split_path(path).map(percent_decode).collect::<Vec<_>>();
        let parts = decoded.iter().map(|part| &**part).collect::<Vec<&str>>();
        root.search(&parts).map(|found| RouteMatch { pattern: found.pattern, params: found.captures.into() })
    }

    /// Resolves the request held by `ctx` and runs its chain.
    ///
    /// On a miss the context gets a 404 and no handler runs.
    pub fn handle(&self, ctx: &mut Context) {
        let resolved = self.resolve(ctx.method(), ctx.uri().path()).and_then(|route| {
            let key = route_key(ctx.method(), route.pattern);
            match self.handlers.get(&key) {
                Some(handler) => Some((route.params, handler.clone())),
                None => {
                    error!(%key, "matched pattern has no handler");
                    None
                }
            }
        });

        match resolved {
            Some((params, handler)) => {
                ctx.bind_route(params, handler);
                ctx.next();
            }
            None => {
                let message = format!("404 NOT FOUND:{}\n", ctx.uri());
                ctx.string(StatusCode::NOT_FOUND, message);
            }
        }
    }

    /// All registered routes as `(method, pattern)`, sorted for stable output.
    pub fn routes(&self) -> Vec<(&Method, &str)> {
        let mut routes = self
            .roots
            .iter()
            .flat_map(|(method, root)| root.patterns().into_iter().map(move |pattern| (method, pattern)))
            .collect::<Vec<_>>();
        routes.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()).then(a.1.cmp(b.1)));
        routes
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes()).finish()
    }
}

impl<'router> RouteMatch<'router> {
    /// The canonical pattern of the matched route.
    pub fn pattern(&self) -> &'router str {
        self.pattern
    }

    /// Gets the path parameters from the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

fn route_key(method: &Method, pattern: &str) -> String {
    format!("{method}-{pattern}")
}

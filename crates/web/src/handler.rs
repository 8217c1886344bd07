use crate::context::Context;
use std::fmt;
use std::sync::Arc;

/// A link of the per-request handler chain: middleware or a terminal route handler.
///
/// Handlers run synchronously. A handler passes control onward by calling
/// [`Context::next`]; returning without calling it ends the chain.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    #[inline]
    fn handle(&self, ctx: &mut Context) {
        (self)(ctx);
    }
}

/// Shared handle to a registered handler; cloned into every chain that uses it.
#[derive(Clone)]
pub struct SharedHandler(Arc<dyn Handler>);

impl SharedHandler {
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        Self(Arc::new(handler))
    }

    #[inline]
    pub fn handle(&self, ctx: &mut Context) {
        self.0.handle(ctx);
    }
}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandler").finish_non_exhaustive()
    }
}

/// Pins a closure to the handler signature so its argument type can be inferred.
///
/// ```
/// use shawg::{Engine, handler_fn};
///
/// let mut engine = Engine::new();
/// engine.get("/hello", handler_fn(|ctx| ctx.string(http::StatusCode::OK, "hello"))).unwrap();
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    f
}

#[cfg(test)]
mod test {
    use crate::context::Context;
    use crate::handler::{Handler, handler_fn};

    fn assert_is_handler<T: Handler>(_handler: &T) {
        // no op
    }

    #[test]
    fn assert_fn_is_handler() {
        fn hello(_ctx: &mut Context) {}

        assert_is_handler(&hello);
    }

    #[test]
    fn assert_closure_is_handler() {
        let handler = handler_fn(|ctx| ctx.next());
        assert_is_handler(&handler);
    }
}

//! A minimal HTTP routing engine.
//!
//! Routes are stored in one prefix trie per HTTP method and may contain literal,
//! parameter (`:name`) and catch-all (`*name`) segments. Middleware is attached to
//! scopes (route groups); for every request the middleware of all scopes whose prefix
//! matches the path, followed by the route handler, form a chain that handlers walk
//! explicitly with [`Context::next`].
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use shawg::{Context, Engine, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new();
//!     engine.use_middleware(middleware::logger());
//!     engine.get("/hello/:name", |ctx: &mut Context| {
//!         let message = format!("hello {}\n", ctx.param("name"));
//!         ctx.string(StatusCode::OK, message);
//!     })?;
//!
//!     let mut v1 = engine.group("/v1");
//!     v1.get("/ping", |ctx: &mut Context| ctx.string(StatusCode::OK, "pong"))?;
//!
//!     engine.run("127.0.0.1:9091").await?;
//!     Ok(())
//! }
//! ```

mod body;
mod context;
mod engine;
mod handler;
mod params;
mod scope;
mod server;
mod static_files;

pub mod error;
pub mod middleware;
pub mod render;
pub mod router;

pub use body::ResponseBody;
pub use context::Context;
pub use engine::Engine;
pub use handler::Handler;
pub use handler::SharedHandler;
pub use handler::handler_fn;
pub use params::PathParams;
pub use render::{HandlebarsRenderer, Renderer};
pub use router::Router;
pub use scope::Scope;
pub use server::{DEFAULT_MAX_BODY_SIZE, Server, ServerBuilder};
pub use static_files::StaticFiles;

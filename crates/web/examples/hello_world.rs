//! Serves a single greeting.
//!
//! curl -v http://127.0.0.1:8080/

use http::StatusCode;
use shawg::{Context, Engine};

fn hello_world(ctx: &mut Context) {
    ctx.string(StatusCode::OK, "hello world");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new();
    engine.get("/", hello_world)?;

    engine.run("127.0.0.1:8080").await?;
    Ok(())
}

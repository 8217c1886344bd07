//! Route groups, scoped middleware and the different response writers.
//!
//! curl -v http://127.0.0.1:8080/hello?name=shawg
//! curl -v http://127.0.0.1:8080/v1/users/42
//! curl -v -d "name=hello&zip=world" http://127.0.0.1:8080/v1/users
//! curl -v -H "Authorization: token" http://127.0.0.1:8080/v2/assets/index.html

use http::StatusCode;
use http::header::AUTHORIZATION;
use serde::Serialize;
use shawg::{Context, Engine, middleware};

#[derive(Serialize, Debug)]
struct User {
    id: String,
    name: String,
}

fn hello(ctx: &mut Context) {
    let message = format!("hello {}, you're at {}\n", ctx.query("name"), ctx.path());
    ctx.string(StatusCode::OK, message);
}

fn get_user(ctx: &mut Context) {
    let user = User { id: ctx.param("id").to_string(), name: "anonymous".to_string() };
    ctx.json(StatusCode::OK, &user);
}

fn create_user(ctx: &mut Context) {
    let user = User { id: "0".to_string(), name: ctx.post_form("name") };
    ctx.json(StatusCode::CREATED, &user);
}

fn require_token(ctx: &mut Context) {
    if ctx.headers().contains_key(AUTHORIZATION) {
        ctx.next();
    } else {
        ctx.fail(StatusCode::UNAUTHORIZED, "missing authorization header");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new();
    engine.use_middleware(middleware::logger());
    engine.get("/hello", hello)?;

    {
        let mut v1 = engine.group("/v1");
        v1.get("/users/:id", get_user)?;
        v1.post("/users", create_user)?;
    }

    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(require_token);
        v2.static_files("/assets", "./static")?;
    }

    engine.run("127.0.0.1:8080").await?;
    Ok(())
}

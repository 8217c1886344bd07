//! Per-request execution state.
//!
//! A [`Context`] is created for every inbound request and dropped once the response
//! has been produced. It carries:
//! - the request head and the fully read request body
//! - the path variables captured by the router
//! - the handler chain and the cursor into it
//! - the buffered response, which may be written exactly once

use crate::body::ResponseBody;
use crate::handler::SharedHandler;
use crate::params::PathParams;
use crate::render::Renderer;
use crate::router::pattern::percent_decode;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, warn};

pub struct Context {
    head: Parts,
    /// The percent-decoded request path.
    path: String,
    body: Bytes,
    params: PathParams,

    chain: Vec<SharedHandler>,
    /// Index of the handler currently running; `None` before the chain starts.
    cursor: Option<usize>,

    renderer: Option<Arc<dyn Renderer>>,

    status: StatusCode,
    headers: HeaderMap,
    response_body: Option<Bytes>,
    written: bool,
}

impl Context {
    pub fn new(request: Request<Bytes>) -> Self {
        let (head, body) = request.into_parts();
        let path = percent_decode(head.uri.path()).into_owned();
        Self {
            head,
            path,
            body,
            params: PathParams::empty(),
            chain: Vec::new(),
            cursor: None,
            renderer: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            response_body: None,
            written: false,
        }
    }

    pub(crate) fn with_renderer(mut self, renderer: Option<Arc<dyn Renderer>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub(crate) fn with_middlewares(mut self, middlewares: Vec<SharedHandler>) -> Self {
        self.chain = middlewares;
        self
    }

    /// Completes the chain with the route handler and hands the captures over.
    pub(crate) fn bind_route(&mut self, params: PathParams, handler: SharedHandler) {
        debug_assert!(self.cursor.is_none(), "route bound after the chain started");
        self.params = params;
        self.chain.push(handler);
    }

    /// Moves the cursor to the next handler in the chain and runs it.
    ///
    /// Once the chain is exhausted this is a no-op. Code placed after the call runs
    /// when every later handler has returned.
    pub fn next(&mut self) {
        let index = self.cursor.map_or(0, |cursor| cursor + 1);
        if index > self.chain.len() {
            return;
        }
        self.cursor = Some(index);

        if let Some(handler) = self.chain.get(index).cloned() {
            handler.handle(self);
        }
    }

    /// Stops the chain: later calls to [`Context::next`] do nothing.
    pub fn abort(&mut self) {
        self.cursor = Some(self.chain.len());
    }

    pub fn is_aborted(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor >= self.chain.len())
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// The request path with percent-encoding removed; [`Context::uri`] keeps the raw form.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// The captured path variable `name`, or an empty string when the route has none.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or_default()
    }

    /// The first value of query parameter `name`, or an empty string.
    pub fn query(&self, name: &str) -> String {
        self.head.uri.query().map(|query| form_value(query.as_bytes(), name)).unwrap_or_default()
    }

    /// The first value of `name` in an `application/x-www-form-urlencoded` body, or an empty string.
    pub fn post_form(&self, name: &str) -> String {
        let is_form = self
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str());

        if is_form { form_value(&self.body, name) } else { String::new() }
    }

    /// Sets the response status; ignored once the response is written.
    pub fn status(&mut self, status: StatusCode) {
        if self.guard_written("status") {
            return;
        }
        self.status = status;
    }

    /// Sets a response header; ignored once the response is written.
    pub fn set_header<K, V>(&mut self, name: K, value: V)
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if self.guard_written("header") {
            return;
        }
        let name = <HeaderName as TryFrom<K>>::try_from(name).map_err(Into::into);
        let value = <HeaderValue as TryFrom<V>>::try_from(value).map_err(Into::into);
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) | (_, Err(e)) => warn!(path = %self.path(), cause = %e, "invalid response header ignored"),
        }
    }

    pub fn response_status(&self) -> StatusCode {
        self.status
    }

    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Writes a plain text response.
    pub fn string(&mut self, status: StatusCode, text: impl Display) {
        self.write(status, mime::TEXT_PLAIN_UTF_8.as_ref(), Bytes::from(text.to_string()));
    }

    /// Serializes `value` as a JSON response; a serialization failure becomes a 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(json) => self.write(status, mime::APPLICATION_JSON.as_ref(), Bytes::from(json)),
            Err(e) => {
                error!(path = %self.path(), cause = %e, "serialize json response error");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e);
            }
        }
    }

    /// Writes raw bytes. The content type defaults to `application/octet-stream`
    /// unless a `Content-Type` header was set before.
    pub fn data(&mut self, status: StatusCode, data: impl Into<Bytes>) {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
            .to_string();
        self.write(status, &content_type, data.into());
    }

    /// Renders `template` with the engine's renderer and writes it as HTML.
    pub fn html<T: Serialize + ?Sized>(&mut self, status: StatusCode, template: &str, data: &T) {
        let rendered = match &self.renderer {
            Some(renderer) => serde_json::to_value(data)
                .map_err(Into::into)
                .and_then(|value| renderer.render(template, &value)),
            None => Err(crate::error::RenderError::MissingRenderer),
        };

        match rendered {
            Ok(html) => self.write(status, mime::TEXT_HTML_UTF_8.as_ref(), Bytes::from(html)),
            Err(e) => {
                error!(path = %self.path(), template, cause = %e, "render template error");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e);
            }
        }
    }

    /// Answers with the file at `path`.
    ///
    /// The file is read into memory in one piece, like every other response body; it is
    /// not streamed. A directory is answered with its `index.html`; anything missing is a 404.
    pub fn file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let path = if path.is_dir() { path.join("index.html") } else { path.to_path_buf() };

        match fs::read(&path) {
            Ok(content) => {
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                self.write(StatusCode::OK, mime.as_ref(), Bytes::from(content));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let message = format!("404 NOT FOUND: {}\n", self.path());
                self.string(StatusCode::NOT_FOUND, message);
            }
            Err(e) => {
                error!(file = %path.display(), cause = %e, "read file error");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error\n");
            }
        }
    }

    /// Answers with `{"message": ...}` and stops the rest of the chain.
    pub fn fail(&mut self, status: StatusCode, message: impl Display) {
        self.abort();
        self.json(status, &serde_json::json!({ "message": message.to_string() }));
    }

    fn write(&mut self, status: StatusCode, content_type: &str, body: Bytes) {
        if self.guard_written("body") {
            return;
        }
        self.status = status;
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.response_body = Some(body);
        self.written = true;
    }

    fn guard_written(&self, what: &str) -> bool {
        if self.written {
            warn!(method = %self.method(), path = %self.path(), what, "response already written, ignore");
        }
        self.written
    }

    /// Consumes the context into the response that was written to it.
    pub fn into_response(self) -> Response<ResponseBody> {
        let mut response = Response::new(ResponseBody::from(self.response_body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("path", &self.path())
            .field("params", &self.params)
            .field("chain_len", &self.chain.len())
            .field("cursor", &self.cursor)
            .field("status", &self.status)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

fn form_value(encoded: &[u8], name: &str) -> String {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(encoded)
        .ok()
        .and_then(|pairs| pairs.into_iter().find(|(key, _)| key == name))
        .map(|(_, value)| value)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MockRenderer;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::sync::Mutex;

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap()
    }

    fn context(uri: &str) -> Context {
        Context::new(request(Method::GET, uri))
    }

    async fn body_of(ctx: Context) -> (StatusCode, HeaderMap, String) {
        let response = ctx.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_next_walks_the_chain() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let (t1, t2) = (Arc::clone(&trace), Arc::clone(&trace));

        let mut ctx = context("/").with_middlewares(vec![SharedHandler::new(move |ctx: &mut Context| {
            t1.lock().unwrap().push("before");
            ctx.next();
            t1.lock().unwrap().push("after");
        })]);
        ctx.bind_route(PathParams::empty(), SharedHandler::new(move |_: &mut Context| t2.lock().unwrap().push("handler")));

        ctx.next();
        assert_eq!(*trace.lock().unwrap(), vec!["before", "handler", "after"]);
    }

    #[test]
    fn test_next_without_continuation_halts() {
        let reached = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&reached);

        let mut ctx = context("/").with_middlewares(vec![SharedHandler::new(|ctx: &mut Context| {
            ctx.string(StatusCode::UNAUTHORIZED, "no credential");
        })]);
        ctx.bind_route(PathParams::empty(), SharedHandler::new(move |_: &mut Context| *flag.lock().unwrap() = true));

        ctx.next();
        assert!(!*reached.lock().unwrap());
        assert_eq!(ctx.response_status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_next_on_exhausted_chain_is_noop() {
        let mut ctx = context("/");
        ctx.next();
        ctx.next();
        assert!(ctx.is_aborted());
        assert!(!ctx.is_written());
    }

    #[test]
    fn test_param_defaults_to_empty() {
        let mut ctx = context("/user/42");
        ctx.bind_route(
            PathParams::from(std::collections::HashMap::from([("id".to_string(), "42".to_string())])),
            SharedHandler::new(|_: &mut Context| {}),
        );
        assert_eq!(ctx.param("id"), "42");
        assert_eq!(ctx.param("name"), "");
    }

    #[test]
    fn test_query() {
        let ctx = context("/search?q=rust%20router&page=2&q=ignored");
        assert_eq!(ctx.query("q"), "rust router");
        assert_eq!(ctx.query("page"), "2");
        assert_eq!(ctx.query("missing"), "");
        assert_eq!(context("/search").query("q"), "");
    }

    #[test]
    fn test_post_form() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(Bytes::from_static(b"username=geek&password=1234"))
            .unwrap();
        let ctx = Context::new(request);
        assert_eq!(ctx.post_form("username"), "geek");
        assert_eq!(ctx.post_form("password"), "1234");
        assert_eq!(ctx.post_form("email"), "");
    }

    #[test]
    fn test_post_form_requires_form_content_type() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(b"username=geek"))
            .unwrap();
        assert_eq!(Context::new(request).post_form("username"), "");
    }

    #[tokio::test]
    async fn test_string() {
        let mut ctx = context("/");
        ctx.string(StatusCode::OK, format_args!("hello {}", "shawg"));
        let (status, headers, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(body, "hello shawg");
    }

    #[tokio::test]
    async fn test_second_write_is_ignored() {
        let mut ctx = context("/");
        ctx.string(StatusCode::CREATED, "first");
        ctx.json(StatusCode::OK, &json!({"second": true}));
        ctx.status(StatusCode::BAD_REQUEST);
        ctx.set_header("x-late", "1");

        let (status, headers, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(headers.get("x-late").is_none());
        assert_eq!(body, "first");
    }

    #[tokio::test]
    async fn test_json() {
        let mut ctx = context("/");
        ctx.json(StatusCode::OK, &json!({"name": "shawg"}));
        let (_, headers, body) = body_of(ctx).await;
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(body, r#"{"name":"shawg"}"#);
    }

    #[tokio::test]
    async fn test_data_keeps_custom_content_type() {
        let mut ctx = context("/");
        ctx.set_header(CONTENT_TYPE, "image/png");
        ctx.data(StatusCode::OK, vec![1u8, 2, 3]);
        let (_, headers, _) = body_of(ctx).await;
        assert_eq!(headers[CONTENT_TYPE], "image/png");

        let mut ctx = context("/");
        ctx.data(StatusCode::OK, Bytes::from_static(b"raw"));
        let (_, headers, body) = body_of(ctx).await;
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(body, "raw");
    }

    #[tokio::test]
    async fn test_status_without_body() {
        let mut ctx = context("/");
        ctx.status(StatusCode::NO_CONTENT);
        ctx.set_header("x-trace", "abc");
        let (status, headers, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["x-trace"], "abc");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_fail_aborts_chain() {
        let reached = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&reached);

        let mut ctx = context("/").with_middlewares(vec![SharedHandler::new(|ctx: &mut Context| {
            ctx.fail(StatusCode::FORBIDDEN, "forbidden");
            ctx.next();
        })]);
        ctx.bind_route(PathParams::empty(), SharedHandler::new(move |_: &mut Context| *flag.lock().unwrap() = true));
        ctx.next();

        assert!(!*reached.lock().unwrap());
        let (status, _, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"message":"forbidden"}"#);
    }

    #[tokio::test]
    async fn test_html_with_renderer() {
        let mut renderer = MockRenderer::new();
        renderer
            .expect_render()
            .withf(|template, data| template == "index" && data["title"] == "home")
            .times(1)
            .returning(|_, data| Ok(format!("<title>{}</title>", data["title"].as_str().unwrap_or_default())));

        let mut ctx = context("/").with_renderer(Some(Arc::new(renderer)));
        ctx.html(StatusCode::OK, "index", &json!({"title": "home"}));

        let (status, headers, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body, "<title>home</title>");
    }

    #[tokio::test]
    async fn test_html_without_renderer() {
        let mut ctx = context("/");
        ctx.html(StatusCode::OK, "index", &json!({}));
        let (status, _, _) = body_of(ctx).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>index</p>").unwrap();

        let mut ctx = context("/assets/a.css");
        ctx.file(dir.path().join("a.css"));
        let (status, headers, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/css");
        assert_eq!(body, "body {}");

        let mut ctx = context("/assets/");
        ctx.file(dir.path());
        let (_, headers, body) = body_of(ctx).await;
        assert_eq!(headers[CONTENT_TYPE], "text/html");
        assert_eq!(body, "<p>index</p>");

        let mut ctx = context("/assets/missing.js");
        ctx.file(dir.path().join("missing.js"));
        let (status, _, body) = body_of(ctx).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 NOT FOUND: /assets/missing.js\n");
    }
}

//! Transport adapter: accepts TCP connections and feeds requests into an [`Engine`].
//!
//! Each connection is served by hyper on its own tokio task. For each request the body
//! is read in full, up to the configured maximum, then the engine's handler chain runs
//! synchronously on a blocking thread. A panicking handler only loses its own request,
//! which is answered with a 500.

use crate::body::ResponseBody;
use crate::engine::Engine;
use crate::error::{ServerBuildError, ServerError};
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::error::Error as StdError;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Request bodies larger than this are refused unless configured otherwise.
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug)]
pub struct ServerBuilder {
    engine: Option<Engine>,
    address: Option<io::Result<Vec<SocketAddr>>>,
    max_body_size: usize,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { engine: None, address: None, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// The engine to serve. It can no longer be modified once handed over.
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Largest request body, in bytes, read before a request is answered with 413.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let engine = self.engine.ok_or(ServerBuildError::MissingEngine)?;
        let address = self
            .address
            .ok_or(ServerBuildError::MissingAddress)?
            .map_err(|source| ServerBuildError::InvalidAddress { source })?;
        Ok(Server { engine: Arc::new(engine), address, max_body_size: self.max_body_size })
    }
}

#[derive(Debug)]
pub struct Server {
    engine: Arc<Engine>,
    address: Vec<SocketAddr>,
    max_body_size: usize,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            debug!("global tracing subscriber already set");
        }

        let tcp_listener = TcpListener::bind(self.address.as_slice())
            .await
            .map_err(|source| ServerError::Bind { address: self.address.clone(), source })?;
        info!("start listening at {:?}", self.address);
        for (method, pattern) in self.engine.router().routes() {
            info!(%method, pattern, "route");
        }

        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let engine = Arc::clone(&self.engine);
            let max_body_size = self.max_body_size;

            tokio::spawn(async move {
                let service = service_fn(move |request| dispatch(Arc::clone(&engine), max_body_size, request));
                match http1::Builder::new().serve_connection(TokioIo::new(tcp_stream), service).await {
                    Ok(()) => {
                        debug!(%remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                    }
                }
            });
        }
    }
}

/// Reads the request body, refusing anything over `max_body_size`, and serves the request.
async fn dispatch<B>(engine: Arc<Engine>, max_body_size: usize, request: Request<B>) -> Result<Response<ResponseBody>, BoxError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    if let Some(length) = declared_length(&request)
        && length > max_body_size
    {
        warn!(path = %request.uri().path(), length, max_body_size, "declared request body too large");
        return Ok(payload_too_large());
    }

    let (parts, body) = request.into_parts();
    let body = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(path = %parts.uri.path(), max_body_size, "request body too large");
            return Ok(payload_too_large());
        }
        Err(e) => return Err(e),
    };
    Ok(serve_isolated(engine, Request::from_parts(parts, body)).await)
}

fn declared_length<B>(request: &Request<B>) -> Option<usize> {
    request.headers().get(CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
}

fn payload_too_large() -> Response<ResponseBody> {
    plain_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large\n")
}

fn plain_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from(text));
    *response.status_mut() = status;
    response
}

/// Runs the engine for one request on a blocking thread, turning a panic into a 500.
pub(crate) async fn serve_isolated(engine: Arc<Engine>, request: Request<Bytes>) -> Response<ResponseBody> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::task::spawn_blocking(move || engine.serve(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!(%method, %path, cause = %e, "handler chain failed");
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error\n")
        }
    }
}

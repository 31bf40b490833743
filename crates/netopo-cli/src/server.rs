//! Netopo graph API server.
//!
//! A small HTTP/1 server exposing the graph persistence API:
//!
//! | Method | Path                                  |
//! |--------|---------------------------------------|
//! | POST   | `/api/graphs`                         |
//! | GET    | `/api/graphs?gameType=<mode>`         |
//! | GET    | `/api/graphs/:id`                     |
//! | PUT    | `/api/graphs/:id`                     |
//! | DELETE | `/api/graphs/:id`                     |
//! | PATCH  | `/api/graphs/:id/minimumConsumption`  |
//!
//! Every JSON response uses the `{success, ...}` envelope the editor
//! expects. Requests are independent: each one is a single read-modify-write
//! against the store, and concurrent writers to one graph race with
//! last-write-wins.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use url::form_urlencoded;

use netopo_store::{open_store, GraphService, ServiceError, StoreBackend, StoreConfig};

const GRAPHS_PREFIX: &str = "/api/graphs";
const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

#[derive(Debug, Clone)]
struct ServerConfig {
    listen: SocketAddr,
    store: StoreConfig,
    cors_origin: HeaderValue,
    max_body_bytes: usize,
    ready_file: Option<PathBuf>,
}

struct ServerState {
    config: ServerConfig,
    service: GraphService,
}

pub(crate) fn cmd_serve(args: crate::ServeArgs) -> Result<()> {
    let backend = StoreBackend::parse(&args.store)
        .ok_or_else(|| anyhow!("unknown --store `{}` (expected memory|file)", args.store))?;
    let cors_origin = HeaderValue::from_str(&args.cors_origin)
        .map_err(|e| anyhow!("invalid --cors-origin `{}`: {e}", args.cors_origin))?;

    let config = ServerConfig {
        listen: args.listen,
        store: StoreConfig {
            backend,
            data_dir: args.data_dir.clone(),
        },
        cors_origin,
        max_body_bytes: args.max_body_bytes.max(1),
        ready_file: args.ready_file.clone(),
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move { serve_async(config).await })
}

async fn serve_async(config: ServerConfig) -> Result<()> {
    let store = open_store(&config.store)
        .await
        .with_context(|| format!("serve: failed to open {:?} store", config.store.backend))?;

    let state = Arc::new(ServerState {
        service: GraphService::new(store),
        config: config.clone(),
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", config.listen))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;

    tracing::info!(addr = %bound, store = ?config.store.backend, "listening");
    if let Some(path) = config.ready_file.as_ref() {
        let payload = json!({
            "version": "netopo_server_ready_v1",
            "addr": bound.to_string(),
            "pid": std::process::id(),
        });
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(path, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("serve: failed to write ready file {}", path.display()))?;
    }

    loop {
        let (stream, _peer) = tokio::select! {
            accepted = listener.accept() => accepted.map_err(|e| anyhow!("serve: accept failed: {e}"))?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(error = %e, "connection error");
            }
        });
    }
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Health,
    Graphs,
    Graph(&'a str),
    MinimumConsumption(&'a str),
    Unknown,
}

fn route(path: &str) -> Route<'_> {
    if path == "/healthz" {
        return Route::Health;
    }
    let Some(rest) = path.strip_prefix(GRAPHS_PREFIX) else {
        return Route::Unknown;
    };
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Route::Graphs;
    }
    let Some(rest) = rest.strip_prefix('/') else {
        return Route::Unknown;
    };
    match rest.split_once('/') {
        None => Route::Graph(rest),
        Some((id, "minimumConsumption")) if !id.is_empty() => Route::MinimumConsumption(id),
        Some(_) => Route::Unknown,
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut resp = dispatch(req, &state, &method, &path).await;

    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, state.config.cors_origin.clone());
    if method == Method::OPTIONS {
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    Ok(resp)
}

async fn dispatch(
    req: Request<Incoming>,
    state: &ServerState,
    method: &Method,
    path: &str,
) -> Response<Full<Bytes>> {
    if *method == Method::OPTIONS {
        return empty_response(StatusCode::NO_CONTENT);
    }

    let service = &state.service;
    match (method.clone(), route(path)) {
        (Method::GET, Route::Health) => text_response(StatusCode::OK, "ok\n"),

        (Method::POST, Route::Graphs) => {
            let body = match read_json(req, state.config.max_body_bytes).await {
                Ok(v) => v,
                Err(resp) => return resp,
            };
            match service.create(body).await {
                Ok(graph) => json_response(
                    StatusCode::CREATED,
                    &json!({ "success": true, "data": graph, "message": "Graph created successfully" }),
                ),
                Err(e) => service_error(&e),
            }
        }

        (Method::GET, Route::Graphs) => {
            let params = parse_query_params(req.uri().query());
            match service.list(params.get("gameType").map(String::as_str)).await {
                Ok(graphs) => json_response(
                    StatusCode::OK,
                    &json!({ "success": true, "count": graphs.len(), "data": graphs }),
                ),
                Err(e) => service_error(&e),
            }
        }

        (Method::GET, Route::Graph(id)) => match service.get(id).await {
            Ok(graph) => json_response(StatusCode::OK, &json!({ "success": true, "data": graph })),
            Err(e) => service_error(&e),
        },

        (Method::PUT, Route::Graph(id)) => {
            let body = match read_json(req, state.config.max_body_bytes).await {
                Ok(v) => v,
                Err(resp) => return resp,
            };
            match service.update(id, body).await {
                Ok(graph) => json_response(
                    StatusCode::OK,
                    &json!({ "success": true, "data": graph, "message": "Graph updated successfully" }),
                ),
                Err(e) => service_error(&e),
            }
        }

        (Method::DELETE, Route::Graph(id)) => match service.delete(id).await {
            Ok(()) => json_response(
                StatusCode::OK,
                &json!({ "success": true, "message": "Graph deleted successfully" }),
            ),
            Err(e) => service_error(&e),
        },

        (Method::PATCH, Route::MinimumConsumption(id)) => {
            let body = match read_json(req, state.config.max_body_bytes).await {
                Ok(v) => v,
                Err(resp) => return resp,
            };
            match service.set_minimum_consumption(id, body).await {
                Ok(graph) => json_response(
                    StatusCode::OK,
                    &json!({
                        "success": true,
                        "data": graph,
                        "message": "Minimum consumption updated successfully"
                    }),
                ),
                Err(e) => service_error(&e),
            }
        }

        _ => json_failure(StatusCode::NOT_FOUND, "Route not found"),
    }
}

/// Read and parse a JSON body, enforcing the size limit.
async fn read_json(
    req: Request<Incoming>,
    limit: usize,
) -> Result<serde_json::Value, Response<Full<Bytes>>> {
    let collected = Limited::new(req.into_body(), limit).collect().await;
    let bytes = match collected {
        Ok(c) => c.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            return Err(json_failure(
                StatusCode::PAYLOAD_TOO_LARGE,
                &format!("request body exceeds {limit} bytes"),
            ));
        }
        Err(e) => {
            return Err(json_failure(
                StatusCode::BAD_REQUEST,
                &format!("failed to read request body: {e}"),
            ));
        }
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| json_failure(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {e}")))
}

fn service_error(err: &ServiceError) -> Response<Full<Bytes>> {
    match err {
        ServiceError::Validation(e) => {
            tracing::warn!(error = %e, "rejected graph write");
            json_failure(StatusCode::BAD_REQUEST, &e.to_string())
        }
        ServiceError::NotFound(_) => json_failure(StatusCode::NOT_FOUND, "Graph not found"),
        ServiceError::Storage(e) => {
            tracing::error!(error = %e, "storage failure");
            json_failure(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(q) = query else {
        return out;
    };
    for (k, v) in form_urlencoded::parse(q.as_bytes()) {
        out.insert(k.into_owned(), v.into_owned());
    }
    out
}

// ============================================================================
// Responses
// ============================================================================

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"internal error"))))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value)
        .unwrap_or_else(|_| b"{\"success\":false,\"message\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            Response::new(Full::new(Bytes::from_static(
                b"{\"success\":false,\"message\":\"internal\"}",
            )))
        })
}

fn json_failure(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "success": false, "message": msg }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes() {
        assert_eq!(route("/healthz"), Route::Health);
        assert_eq!(route("/api/graphs"), Route::Graphs);
        assert_eq!(route("/api/graphs/"), Route::Graphs);
        assert_eq!(route("/api/graphs/abc"), Route::Graph("abc"));
        assert_eq!(
            route("/api/graphs/abc/minimumConsumption"),
            Route::MinimumConsumption("abc")
        );
        assert_eq!(route("/api/graphs/abc/other"), Route::Unknown);
        assert_eq!(route("/api/graphsabc"), Route::Unknown);
        assert_eq!(route("/api/other"), Route::Unknown);
    }

    #[test]
    fn query_params_are_decoded() {
        let params = parse_query_params(Some("gameType=Cloud&x=a%20b"));
        assert_eq!(params.get("gameType").map(String::as_str), Some("Cloud"));
        assert_eq!(params.get("x").map(String::as_str), Some("a b"));
        assert!(parse_query_params(None).is_empty());
    }

    #[test]
    fn failure_envelope() {
        let resp = json_failure(StatusCode::NOT_FOUND, "Graph not found");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }
}

//! HTTP reconciliation endpoint.
//!
//! `GET /` and `POST /` accept the OpenRefine parameters `queries`
//! (batch JSON), `query` (single JSON or bare label) and `callback`
//! (JSONP). A request without `queries` or `query` gets the service
//! metadata. Only a malformed payload or callback name is answered with
//! an error status.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use loc_suggest::{MokaHitCache, ReconcileRequest, Reconciler, SuggestClient};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ServerConfig, ServiceConfig};
use crate::error::ServiceError;

/// Content type of JSONP responses.
const JSONP_CONTENT_TYPE: &str = "text/javascript";

/// Longest accepted JSONP callback name.
const MAX_CALLBACK_LEN: usize = 128;

/// Reconciler type served by the endpoint.
pub type SharedReconciler = Arc<Reconciler<SuggestClient>>;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    reconciler: SharedReconciler,
}

/// Request parameters, from the query string or a form body.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
struct ReconcileParams {
    queries: Option<String>,
    query: Option<String>,
    callback: Option<String>,
}

impl ReconcileParams {
    /// Form values win for payloads; the URL wins for `callback`.
    fn merge(form: Self, url: Self) -> Self {
        Self {
            queries: form.queries.or(url.queries),
            query: form.query.or(url.query),
            callback: url.callback.or(form.callback),
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Validate `config` and build the shared reconciler, with the hit cache
/// attached when `[cache] enabled = true`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be built.
pub fn build_reconciler(config: &ServiceConfig) -> crate::error::Result<SharedReconciler> {
    config.validate()?;
    let mut reconciler = Reconciler::from_config(config.reconcile.clone(), config.service.clone())?;
    if config.cache.enabled {
        info!(
            ttl_seconds = config.cache.ttl_seconds,
            max_entries = config.cache.max_entries,
            "suggest2 hit cache enabled"
        );
        reconciler = reconciler.with_cache(Arc::new(MokaHitCache::new(
            config.cache.ttl_seconds,
            config.cache.max_entries,
        )));
    }
    Ok(Arc::new(reconciler))
}

/// Router with the reconciliation and health routes.
pub fn router(reconciler: SharedReconciler) -> Router {
    Router::new()
        .route("/", get(handle_reconcile_get).post(handle_reconcile_post))
        .route("/health", get(handle_health))
        .with_state(AppState { reconciler })
}

async fn bind(config: &ServerConfig) -> crate::error::Result<(TcpListener, SocketAddr)> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| ServiceError::Server(format!("bind to {bind_addr} failed: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServiceError::Server(format!("failed to get local addr: {e}")))?;
    Ok((listener, addr))
}

/// Serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the listener cannot
/// bind, or the server fails.
pub async fn serve(
    config: &ServiceConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::error::Result<()> {
    let reconciler = build_reconciler(config)?;
    let (listener, addr) = bind(&config.server).await?;
    info!("reconciliation service listening on http://{addr}/");

    axum::serve(listener, router(reconciler))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::Server(e.to_string()))
}

// ---------------------------------------------------------------------------
// ReconcileServer
// ---------------------------------------------------------------------------

/// Endpoint running in a background tokio task.
pub struct ReconcileServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ReconcileServer {
    /// Bind to `{config.host}:{config.port}` (port `0` auto-assigns) and
    /// start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(
        reconciler: SharedReconciler,
        config: &ServerConfig,
    ) -> crate::error::Result<Self> {
        let (listener, addr) = bind(config).await?;
        info!("reconciliation service listening on http://{addr}/");

        let app = router(reconciler);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("reconciliation server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for ReconcileServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn handle_reconcile_get(
    State(state): State<AppState>,
    Query(params): Query<ReconcileParams>,
) -> Response {
    respond(&state, params).await
}

async fn handle_reconcile_post(
    State(state): State<AppState>,
    Query(url_params): Query<ReconcileParams>,
    form: Result<Form<ReconcileParams>, FormRejection>,
) -> Response {
    let form_params = match form {
        Ok(Form(params)) => params,
        // A bare POST with no form body is a discovery request.
        Err(FormRejection::InvalidFormContentType(_)) => ReconcileParams::default(),
        Err(rejection) => {
            return render(
                StatusCode::BAD_REQUEST,
                &ErrorBody::new(rejection.body_text()),
                None,
            );
        }
    };
    respond(&state, ReconcileParams::merge(form_params, url_params)).await
}

async fn respond(state: &AppState, params: ReconcileParams) -> Response {
    let callback = params.callback.as_deref();
    if let Some(name) = callback {
        if !is_valid_callback(name) {
            tracing::warn!(callback = name, "rejected JSONP callback name");
            return render(
                StatusCode::BAD_REQUEST,
                &ErrorBody::new("invalid callback name".to_owned()),
                None,
            );
        }
    }

    let request =
        match ReconcileRequest::from_params(params.queries.as_deref(), params.query.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "rejected reconciliation payload");
                return render(StatusCode::BAD_REQUEST, &ErrorBody::new(e.to_string()), callback);
            }
        };

    let response = state.reconciler.reconcile(request).await;
    render(StatusCode::OK, &response, callback)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn new(error: String) -> Self {
        Self { error }
    }
}

/// Whether `name` is a dotted JavaScript identifier path such as
/// `jQuery123_456` or `window.handlers.reconcile`.
fn is_valid_callback(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CALLBACK_LEN {
        return false;
    }
    name.split('.').all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    })
}

/// Serialise `body` as JSON, or as `callback(<json>)` when a callback is given.
fn render<T: Serialize>(status: StatusCode, body: &T, callback: Option<&str>) -> Response {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("response serialization failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "response serialization failed"})),
            )
                .into_response();
        }
    };

    match callback {
        Some(name) => (
            status,
            [(header::CONTENT_TYPE, JSONP_CONTENT_TYPE)],
            format!("{name}({json})"),
        )
            .into_response(),
        None => (status, [(header::CONTENT_TYPE, "application/json")], json).into_response(),
    }
}

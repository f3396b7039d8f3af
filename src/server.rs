// HTTP surface: a single GET / endpoint in front of the trace service

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

use crate::config::{AppConfig, LookupConfig, ServerConfig};
use crate::geocoder::NominatimGeocoder;
use crate::lookup::{build_http_client, LookupError, SeaRouteEstimator};
use crate::parcel::EasyPostTracker;
use crate::registry::GleifRegistry;
use crate::sea_route::{GreatCircleEstimator, SearoutesEstimator};
use crate::trace::{TraceQuery, TraceService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TraceService>,
    // Expose error detail in 500 bodies
    pub debug: bool,
}

pub fn router(service: Arc<TraceService>, debug: bool) -> Router {
    Router::new()
        .route("/", get(trace_handler))
        .with_state(AppState { service, debug })
}

// First occurrence of a repeated parameter wins
fn query_from_pairs(pairs: Vec<(String, String)>) -> TraceQuery {
    let mut query = TraceQuery::default();
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "company" => &mut query.company,
            "origin" => &mut query.origin,
            "destination" => &mut query.destination,
            "tracking" => &mut query.tracking,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    query
}

async fn trace_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let trace_id = format!("trace-{:08x}", rand::random::<u32>());
    let span = info_span!("request", %trace_id);
    respond(state, query_from_pairs(pairs)).instrument(span).await
}

async fn respond(state: AppState, query: TraceQuery) -> Response {
    let started = Instant::now();
    info!(
        company = ?query.company(),
        origin = ?query.origin(),
        destination = ?query.destination(),
        tracking = ?query.tracking(),
        "trace request"
    );

    let result = state.service.trace(&query).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(report) => {
            info!(elapsed_ms, "trace complete");
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(err) => {
            error!(error = %err, elapsed_ms, "trace failed");
            let message = if state.debug {
                err.to_string()
            } else {
                "internal server error".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response()
        }
    }
}

/// Wire the HTTP-backed lookups described by the configuration.
pub fn build_trace_service(config: &AppConfig) -> Result<TraceService, LookupError> {
    let lookups: &LookupConfig = &config.lookups;
    let client = build_http_client(&lookups.http)?;

    let sea_routes: Arc<dyn SeaRouteEstimator> = match &lookups.searoutes_key {
        Some(key) => Arc::new(SearoutesEstimator::new(
            client.clone(),
            lookups.searoutes_base_url.clone(),
            key.clone(),
        )),
        None => Arc::new(GreatCircleEstimator::new(lookups.cruise_speed_knots)),
    };

    let service = TraceService::new(
        Arc::new(GleifRegistry::new(client.clone(), lookups.gleif_base_url.clone())),
        Arc::new(NominatimGeocoder::new(client.clone(), lookups.nominatim_base_url.clone())),
        sea_routes,
        Arc::new(EasyPostTracker::new(
            client,
            lookups.easypost_base_url.clone(),
            lookups.easypost_api_key.clone(),
        )),
    )
    .with_dispatch(config.dispatch);

    Ok(service)
}

pub async fn run(config: &ServerConfig, service: Arc<TraceService>) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        %addr,
        debug = config.debug,
        dispatch = %service.dispatch(),
        sea_routes = service.sea_route_estimator(),
        "trace service listening"
    );

    axum::serve(listener, router(service, config.debug))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("trace service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchMode;
    use axum::body::Body;
    use axum::http::Request;
    use parking_lot::Mutex;
    use std::io;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    // Collects formatted log lines in memory
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_keeps_first_value_and_ignores_unknown_keys() {
        let query = query_from_pairs(pairs(&[
            ("company", "Acme"),
            ("company", "Globex"),
            ("tracking", "EZ1000000001"),
            ("carrier", "USPS"),
        ]));

        assert_eq!(query.company(), Some("Acme"));
        assert_eq!(query.tracking(), Some("EZ1000000001"));
        assert!(query.origin.is_none());
        assert!(query.destination.is_none());
    }

    #[test]
    fn test_build_service_picks_estimator_from_key() {
        let mut config = AppConfig::from_vars(|_| None).unwrap();
        let service = build_trace_service(&config).unwrap();
        assert_eq!(service.sea_route_estimator(), "great_circle");
        assert_eq!(service.dispatch(), DispatchMode::Sequential);

        config.lookups.searoutes_key = Some("sr-key".to_string());
        config.dispatch = DispatchMode::Concurrent;
        let service = build_trace_service(&config).unwrap();
        assert_eq!(service.sea_route_estimator(), "searoutes");
        assert_eq!(service.dispatch(), DispatchMode::Concurrent);
    }

    #[tokio::test]
    async fn test_request_logs_share_one_trace_id() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = AppConfig::from_vars(|_| None).unwrap();
        let app = router(Arc::new(build_trace_service(&config).unwrap()), false);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let lines = logs.lines();
        let trace_id_of = |message: &str| -> String {
            let line = lines
                .iter()
                .find(|line| line.contains(message))
                .unwrap_or_else(|| panic!("no {message:?} line in {lines:?}"));
            let start = line.find("request{trace_id=").expect("request span missing") + 17;
            line[start..].chars().take_while(|c| *c != '}').collect()
        };

        let request_id = trace_id_of("trace request");
        assert!(request_id.starts_with("trace-"), "got {request_id}");
        assert_eq!(request_id, trace_id_of("trace complete"));
    }
}

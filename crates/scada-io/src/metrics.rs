//! Prometheus metrics for the admin client.
//!
//! Backend call outcomes, connectivity, and surface activity.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Backend Calls
// ============================================================================

/// Total requests issued to the backend
pub static REQUESTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "scada_admin_requests_total",
        "Total requests issued to the SCADA backend",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Requests answered with a non-2xx status
pub static HTTP_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "scada_admin_http_errors_total",
        "Backend replies with a non-2xx status",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Requests that never got a response
pub static NETWORK_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "scada_admin_network_errors_total",
        "Backend requests that failed without an HTTP response",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// 2xx replies whose envelope reported `success: false`
pub static APPLICATION_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "scada_admin_application_errors_total",
        "Backend replies reporting success=false",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Round-trip time of backend requests in seconds
pub static REQUEST_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "scada_admin_request_duration_seconds",
            "Round-trip time of backend requests in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .unwrap();
    REGISTRY.register(Box::new(histogram.clone())).unwrap();
    histogram
});

// ============================================================================
// Connectivity and Surfaces
// ============================================================================

/// Backend reachability as last observed (1 = online, 0 = offline)
pub static BACKEND_ONLINE: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        "scada_admin_backend_online",
        "Backend reachability as last observed (1=online, 0=offline)",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Refreshes performed per surface
pub static SURFACE_REFRESHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "scada_admin_surface_refreshes_total",
            "Refreshes performed per surface",
        ),
        &["surface"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Parent tags in the most recently built hierarchy
pub static PARENT_TAGS_LOADED: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        "scada_admin_parent_tags_loaded",
        "Parent tags in the most recently built hierarchy",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let mut buffer = Vec::new();
                    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let mut response = Response::from_data(buffer);
                    if let Ok(header) = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"text/plain; version=0.0.4"[..],
                    ) {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the backend has answered at least once
                    if BACKEND_ONLINE.get() == 1 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = REQUESTS_TOTAL.get();
    let _ = HTTP_ERRORS.get();
    let _ = NETWORK_ERRORS.get();
    let _ = APPLICATION_ERRORS.get();
    let _ = REQUEST_DURATION_SECONDS.get_sample_count();
    let _ = BACKEND_ONLINE.get();
    let _ = SURFACE_REFRESHES.with_label_values(&["dashboard"]).get();
    let _ = PARENT_TAGS_LOADED.get();
}

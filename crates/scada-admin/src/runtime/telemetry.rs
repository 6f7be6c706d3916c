use scada_io::metrics::{init_metrics, serve_metrics};
use std::thread;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: Option<&str>) -> Option<thread::JoinHandle<()>> {
    addr.map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.to_string())
    })
}

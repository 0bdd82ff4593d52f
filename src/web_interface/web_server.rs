use std::net::SocketAddr;
use std::path::PathBuf;

use warp::Filter;

use crate::capture::types::CaptureControl;
use crate::web_interface::routes;

/// Web server exposing the capture control API.
pub struct WebServer {
    control: CaptureControl,
    out_dir: PathBuf,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(control: CaptureControl, out_dir: PathBuf) -> Self {
        Self { control, out_dir }
    }

    /// Start the web server on the given port
    pub async fn start(&self, port: u16) {
        let routes = routes::dashboard_route()
            .or(routes::capture_start_route(self.control.clone()))
            .or(routes::capture_stop_route(self.control.clone()))
            .or(routes::capture_files_route(self.out_dir.clone()));

        // Start server (warp 0.4)
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        warp::serve(routes).run(addr).await;
    }
}

use std::path::PathBuf;

use log::{info, warn};
use warp::{http::Response, http::StatusCode, reply, Filter, Rejection, Reply};

use super::ApiError;
use crate::capture::types::{unique_capture_name, CaptureControl};

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(|| async move {
        let html = r#"<html><head><title>pcapctl</title></head>
                <body><h1>pcapctl is running</h1>
                <p>POST or GET /capture_start, /capture_stop, /capture_files/&lt;name&gt;.</p></body></html>"#;
        Ok::<_, Rejection>(reply::html(html))
    })
}

/// /capture_start (any method)
///
/// Generates the capture filename, hands it to the supervisor and echoes
/// it back as plain text. The echoed name is provisional: the reply does
/// not confirm that the process actually came up.
pub fn capture_start_route(
    control: CaptureControl,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("capture_start")
        .and(warp::path::end())
        .and_then(move || {
            let control = control.clone();
            async move {
                let filename = unique_capture_name();
                match control.start(filename.clone()).await {
                    Ok(()) => {
                        info!("Requested capture start for {}", filename);
                        Ok::<_, Rejection>(
                            reply::with_status(filename, StatusCode::OK).into_response(),
                        )
                    }
                    Err(e) => {
                        warn!("Start request not delivered: {}", e);
                        Ok::<_, Rejection>(
                            reply::with_status(
                                reply::json(&ApiError {
                                    message: "Capture supervisor unavailable".to_string(),
                                }),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                            .into_response(),
                        )
                    }
                }
            }
        })
}

/// /capture_stop (any method)
pub fn capture_stop_route(
    control: CaptureControl,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("capture_stop")
        .and(warp::path::end())
        .and_then(move || {
            let control = control.clone();
            async move {
                match control.stop().await {
                    Ok(()) => {
                        info!("Requested capture stop");
                        Ok::<_, Rejection>(
                            reply::with_status(String::new(), StatusCode::OK).into_response(),
                        )
                    }
                    Err(e) => {
                        warn!("Stop request not delivered: {}", e);
                        Ok::<_, Rejection>(
                            reply::with_status(
                                reply::json(&ApiError {
                                    message: "Capture supervisor unavailable".to_string(),
                                }),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                            .into_response(),
                        )
                    }
                }
            }
        })
}

/// /capture_files/:name (any method)
///
/// Streams the capture file and deletes it afterwards; a capture can be
/// retrieved exactly once.
pub fn capture_files_route(
    out_dir: PathBuf,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("capture_files" / String).and_then(move |name: String| {
        let out_dir = out_dir.clone();
        async move {
            // The filename is a single path component; anything that could
            // escape out_dir is treated as absent.
            if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
                return Ok::<_, Rejection>(not_found("Capture file not found"));
            }

            let path = out_dir.join(&name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        warn!("Failed to remove served capture {}: {}", path.display(), e);
                    } else {
                        info!("Served and removed capture {}", path.display());
                    }
                    match Response::builder()
                        .header("Content-Type", "application/octet-stream")
                        .body(bytes)
                    {
                        Ok(resp) => Ok::<_, Rejection>(resp.into_response()),
                        Err(_) => Ok::<_, Rejection>(
                            reply::with_status(
                                reply::json(&ApiError {
                                    message: "Failed to build response".to_string(),
                                }),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                            .into_response(),
                        ),
                    }
                }
                Err(_) => Ok::<_, Rejection>(not_found("Capture file not found")),
            }
        }
    })
}

fn not_found(message: &str) -> warp::reply::Response {
    reply::with_status(
        reply::json(&ApiError {
            message: message.to_string(),
        }),
        StatusCode::NOT_FOUND,
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn control_pair() -> (CaptureControl, mpsc::Receiver<String>, mpsc::Receiver<()>) {
        let (start_tx, start_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        (CaptureControl::new(start_tx, stop_tx), start_rx, stop_rx)
    }

    #[tokio::test]
    async fn capture_start_echoes_the_generated_filename() {
        let (control, mut start_rx, _stop_rx) = control_pair();
        let route = capture_start_route(control);

        let resp = warp::test::request()
            .path("/capture_start")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let echoed = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(echoed.ends_with(".pcap"));

        let sent = start_rx.recv().await.unwrap();
        assert_eq!(sent, echoed);
    }

    #[tokio::test]
    async fn capture_start_reports_a_dead_supervisor() {
        let (control, start_rx, _stop_rx) = control_pair();
        drop(start_rx);
        let route = capture_start_route(control);

        let resp = warp::test::request()
            .path("/capture_start")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn capture_stop_sends_the_stop_signal() {
        let (control, _start_rx, mut stop_rx) = control_pair();
        let route = capture_stop_route(control);

        let resp = warp::test::request()
            .path("/capture_stop")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        stop_rx.recv().await.unwrap();
    }

    #[tokio::test]
    async fn capture_files_serves_then_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("c.pcap");
        std::fs::write(&file_path, b"pcap bytes").unwrap();

        let route = capture_files_route(dir.path().to_path_buf());
        let resp = warp::test::request()
            .path("/capture_files/c.pcap")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"pcap bytes");
        assert!(!file_path.exists());
    }

    #[tokio::test]
    async fn capture_files_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let route = capture_files_route(dir.path().to_path_buf());

        let resp = warp::test::request()
            .path("/capture_files/nope.pcap")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn capture_files_rejects_path_escapes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.pcap"), b"pcap bytes").unwrap();

        let route = capture_files_route(dir.path().join("sub"));
        let resp = warp::test::request()
            .path("/capture_files/..%2Fc.pcap")
            .reply(&route)
            .await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(dir.path().join("c.pcap").exists());
    }
}

//! Fixtures shared by the integration test binaries

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tempfile::TempDir;
use tokio::net::TcpListener;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Local endpoint that answers every request with a fixed status and body
pub struct TestServer {
    pub addr: SocketAddr,
    pub bodies: Arc<Mutex<Vec<Bytes>>>,
    pub headers: Arc<Mutex<Vec<HeaderMap>>>,
}

impl TestServer {
    pub async fn start(status: StatusCode, delay: Duration) -> Self {
        Self::start_with_archive(status, delay, None).await
    }

    /// Same as `start`, but GET /archive.zip serves `archive`
    pub async fn start_with_archive(
        status: StatusCode,
        delay: Duration,
        archive: Option<Bytes>,
    ) -> Self {
        Self::spawn(
            status,
            delay,
            Bytes::from_static(b"remote read response"),
            archive,
        )
        .await
    }

    /// Answer every request with `status` and `body`
    pub async fn start_with_body(status: StatusCode, body: Bytes) -> Self {
        Self::spawn(status, Duration::ZERO, body, None).await
    }

    async fn spawn(
        status: StatusCode,
        delay: Duration,
        reply: Bytes,
        archive: Option<Bytes>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let headers = Arc::new(Mutex::new(Vec::new()));
        let (seen_bodies, seen_headers) = (Arc::clone(&bodies), Arc::clone(&headers));

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen_bodies = Arc::clone(&seen_bodies);
                let seen_headers = Arc::clone(&seen_headers);
                let archive = archive.clone();
                let reply = reply.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |request: Request<Incoming>| {
                        let seen_bodies = Arc::clone(&seen_bodies);
                        let seen_headers = Arc::clone(&seen_headers);
                        let archive = archive.clone();
                        let reply = reply.clone();
                        async move {
                            if request.uri().path() == "/archive.zip" {
                                let response = match archive {
                                    Some(data) => Response::new(Full::new(data)),
                                    None => Response::builder()
                                        .status(StatusCode::NOT_FOUND)
                                        .body(Full::new(Bytes::new()))
                                        .unwrap(),
                                };
                                return Ok::<_, hyper::Error>(response);
                            }

                            seen_headers.lock().unwrap().push(request.headers().clone());
                            let body = request.into_body().collect().await?.to_bytes();
                            seen_bodies.lock().unwrap().push(body);
                            tokio::time::sleep(delay).await;

                            Ok(Response::builder()
                                .status(status)
                                .body(Full::new(reply))
                                .unwrap())
                        }
                    });

                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            addr,
            bodies,
            headers,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

pub fn record_json(url: &str, body: &[u8]) -> String {
    use base64::Engine;
    let body = base64::engine::general_purpose::STANDARD.encode(body);
    format!(
        r#"{{"request": {{"method": "POST", "url": "{url}", "headers": {{"Content-Type": ["application/x-protobuf"]}}, "body": "{body}"}}, "response": {{"status": 200, "headers": null}}}}"#
    )
}

/// Zip `(name, minute, content)` entries into an archive
pub fn build_archive(entries: &[(String, u8, String)]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, minute, content) in entries {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(
                zip::DateTime::from_date_and_time(2020, 6, 1, 8, *minute, 0).unwrap(),
            );
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    Bytes::from(writer.finish().unwrap().into_inner())
}

pub fn write_archive(dir: &TempDir, name: &str, entries: &[(String, u8, String)]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, build_archive(entries)).unwrap();
    path.to_str().unwrap().to_string()
}

//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed bodies keyed by request path (query string ignored). Unknown
//! paths get a 404. Each route can carry its own status and content type so
//! tests can serve images, HTML error pages and listing JSON side by side.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use image::{ImageFormat, RgbImage};

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }
}

/// Encoded image of the given size, e.g. `encode(1280, 720, ImageFormat::Jpeg)`.
pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160]))
        .write_to(&mut out, format)
        .expect("encode test image");
    out.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Route {
    Route::ok("image/jpeg", encode(width, height, ImageFormat::Jpeg))
}

pub fn png(width: u32, height: u32) -> Route {
    Route::ok("image/png", encode(width, height, ImageFormat::Png))
}

pub fn html_error_page() -> Route {
    Route::ok(
        "text/html",
        b"<!DOCTYPE html><html><body><h1>Image removed</h1></body></html>".to_vec(),
    )
}

/// Starts a server in a background thread. Returns the base URL without a
/// trailing slash (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
pub fn start(routes: HashMap<String, Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target);

    let not_found = Route {
        status: 404,
        content_type: "text/plain",
        body: b"not found".to_vec(),
    };
    let route = routes.get(path).unwrap_or(&not_found);
    let reason = if route.status == 200 { "OK" } else { "Error" };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason,
        route.content_type,
        route.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&route.body);
}

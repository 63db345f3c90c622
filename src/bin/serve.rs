//! Development server for devpane
//!
//! Serves the demo page from `www/` and the wasm-pack output from `pkg/`.
//! Query strings are ignored, so cache-busted reloads (`app.js?c=2`) hit
//! the same file.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Response, Server};

const DEFAULT_PORT: u16 = 8080;
const SITE_ROOT: &str = "www";
const PKG_ROOT: &str = "pkg";

fn main() {
    let port = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = format!("0.0.0.0:{}", port);
    let server = match Server::http(&addr) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("[serve] Failed to start server on {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("┌─────────────────────────────────────┐");
    println!("│  devpane dev server                 │");
    println!("├─────────────────────────────────────┤");
    println!("│  http://localhost:{}              │", port);
    println!("└─────────────────────────────────────┘");

    for request in server.incoming_requests() {
        let response = match resolve(request.url()) {
            Some(path) => serve_file(&path),
            None => not_found(),
        };
        let _ = request.respond(response);
    }
}

/// Map a request URL to a file on disk; `None` for paths escaping the roots
fn resolve(url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let relative = path.trim_start_matches('/');
    let relative = if relative.is_empty() { "index.html" } else { relative };

    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    if relative.starts_with(PKG_ROOT) {
        Some(relative.to_path_buf())
    } else {
        Some(Path::new(SITE_ROOT).join(relative))
    }
}

fn serve_file(path: &Path) -> Response<std::io::Cursor<Vec<u8>>> {
    match fs::read(path) {
        Ok(contents) => {
            let mut response = Response::from_data(contents);
            if let Ok(header) = Header::from_bytes("Content-Type", mime_type(path)) {
                response = response.with_header(header);
            }
            if let Ok(header) = Header::from_bytes("Cache-Control", "no-store") {
                response = response.with_header(header);
            }
            response
        }
        Err(_) => not_found(),
    }
}

fn not_found() -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string("404 Not Found").with_status_code(404);
    match Header::from_bytes("Content-Type", "text/plain") {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript",
        Some("wasm") => "application/wasm",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_roots() {
        assert_eq!(resolve("/"), Some(PathBuf::from("www/index.html")));
        assert_eq!(resolve("/console.css"), Some(PathBuf::from("www/console.css")));
        assert_eq!(resolve("/pkg/devpane.js"), Some(PathBuf::from("pkg/devpane.js")));
    }

    #[test]
    fn test_resolve_drops_query() {
        assert_eq!(resolve("/app.js?c=3"), Some(PathBuf::from("www/app.js")));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        assert_eq!(resolve("/../Cargo.toml"), None);
        assert_eq!(resolve("/pkg/../../etc/passwd"), None);
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.css")), "text/css");
        assert_eq!(mime_type(Path::new("a.wasm")), "application/wasm");
    }
}

//! Minimal HTTP/1.1 server for transfer integration tests.
//!
//! Serves a single static body on any path, with configurable status and an
//! optional missing `Content-Length` (to exercise unknown-total downloads).
//! [`start_lookup_api`] additionally emulates the Bot API file-location
//! lookup: `getFile` paths answer with a fixed JSON envelope, `/file/...`
//! paths stream the body.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct FileServerOptions {
    /// Status code for GET responses.
    pub status: u16,
    /// If false, omit `Content-Length` (body is delimited by close).
    pub send_content_length: bool,
}

impl Default for FileServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            send_content_length: true,
        }
    }
}

/// Starts a server in a background thread serving `body` on every path.
/// Returns the base URL (e.g. `http://127.0.0.1:12345/`). Runs until the
/// process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, FileServerOptions::default())
}

/// Like `start` but with customized response behavior.
pub fn start_with_options(body: Vec<u8>, opts: FileServerOptions) -> String {
    let body = Arc::new(body);
    serve(move |_path, stream| {
        write_response(stream, opts.status, None, &body, opts.send_content_length);
    })
}

/// Starts a server emulating the file-location lookup API: any path
/// containing `getFile` answers `lookup_json`, paths under `/file/` answer
/// `body`, anything else is 404.
pub fn start_lookup_api(lookup_json: String, body: Vec<u8>) -> String {
    let body = Arc::new(body);
    serve(move |path, stream| {
        if path.contains("getFile") {
            write_response(
                stream,
                200,
                Some("application/json"),
                lookup_json.as_bytes(),
                true,
            );
        } else if path.starts_with("/file/") {
            write_response(stream, 200, None, &body, true);
        } else {
            write_response(stream, 404, None, b"not found", true);
        }
    })
}

fn serve<F>(handler: F) -> String
where
    F: Fn(&str, &mut TcpStream) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let handler = Arc::clone(&handler);
            thread::spawn(move || handle(stream, &*handler));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle<F>(mut stream: TcpStream, handler: &F)
where
    F: Fn(&str, &mut TcpStream),
{
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    handler(&path, &mut stream);
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
    send_content_length: bool,
) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let mut head = format!("HTTP/1.1 {} {}\r\nConnection: close\r\n", status, reason);
    if let Some(ct) = content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    if send_content_length {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

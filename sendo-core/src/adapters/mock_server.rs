//! Mock Sendo API server for testing
//!
//! A tiny HTTP/1.1 server on a random local port that answers the handful of
//! routes the gateway tests need, in the same envelope shape as the real API:
//! - POST /auth/login returns `{ data: { accessToken, deviceId } }`
//! - GET /users/me requires the mock bearer token (401 otherwise)
//! - POST /merchant/transfer-funds requires the mock passcode (400 otherwise)
//! - GET /wallet/MAT123 returns a wallet, any other id is a 404
//!
//! Every request is recorded so tests can inspect headers and bodies.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

pub const MOCK_TOKEN: &str = "test-token";
pub const MOCK_PASSCODE: &str = "1234";
pub const MOCK_WALLET: &str = "MAT123";

/// A request as the mock server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

pub struct MockSendoServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockSendoServer {
    /// Start on a random available port
    pub fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let log = requests_clone.clone();
                        thread::spawn(move || handle_connection(stream, &log));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockSendoServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn handle_connection(mut stream: TcpStream, log: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_nonblocking(false);

    let Some(request) = read_request(&stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"message":"Invalid request"}"#);
        return;
    };
    if let Ok(mut log) = log.lock() {
        log.push(request.clone());
    }

    let authorized = request.header("authorization").as_deref()
        == Some(format!("Bearer {}", MOCK_TOKEN).as_str());

    let (status, text, body) = match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/auth/login") => (
            200,
            "OK",
            json!({
                "status": 200,
                "message": "Login successful",
                "data": { "accessToken": MOCK_TOKEN, "deviceId": "device-1" }
            }),
        ),
        (_, _) if !authorized => (
            401,
            "Unauthorized",
            json!({ "statusCode": 401, "message": "Unauthorized" }),
        ),
        ("GET", "/api/users/me") => (
            200,
            "OK",
            json!({
                "status": 200,
                "message": "ok",
                "data": {
                    "id": 7,
                    "firstname": "Awa",
                    "lastname": "Ndiaye",
                    "email": "awa@example.com",
                    "roles": [{ "id": 3, "name": "MERCHANT" }],
                    "merchant": { "id": 42, "typeAccount": "AGENT", "userId": 7 }
                }
            }),
        ),
        ("POST", "/api/merchant/transfer-funds") => {
            if request.header("x-passcode").as_deref() == Some(MOCK_PASSCODE) {
                (
                    201,
                    "Created",
                    json!({
                        "status": 201,
                        "message": "Transfer done",
                        "data": {
                            "transactionId": "TX-MOCK-1",
                            "amount": 1500,
                            "currency": "XAF",
                            "createdAt": "2025-03-01T10:00:00Z"
                        }
                    }),
                )
            } else {
                (
                    400,
                    "Bad Request",
                    json!({ "statusCode": 400, "message": "Invalid passcode" }),
                )
            }
        }
        ("GET", path) if path == format!("/api/wallet/{}", MOCK_WALLET) => (
            200,
            "OK",
            json!({
                "status": 200,
                "message": "ok",
                "data": {
                    "id": 9,
                    "balance": 1000,
                    "currency": "XAF",
                    "matricule": MOCK_WALLET,
                    "user": { "id": 12, "firstname": "Jean", "lastname": "Mbarga", "email": "jean@example.com" }
                }
            }),
        ),
        _ => (
            404,
            "Not Found",
            json!({ "statusCode": 404, "message": "Not found" }),
        ),
    };

    send_response(&mut stream, status, text, &body.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

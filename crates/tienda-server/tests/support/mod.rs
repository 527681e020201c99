#![allow(dead_code)]

use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;
use tienda_model::{Address, Email, NewUser, PersonName};
use tienda_server::{build_router, hash_password, AppState, ServerConfig};
use tienda_store::{Store, StoreConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const TEST_SECRET: &[u8] = b"integration-test-signing-secret";
pub const TEST_ITERATIONS: u32 = 1_000;
pub const TEST_MAX_BODY_BYTES: usize = 4 * 1024;

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Store,
    _dir: TempDir,
}

pub async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(StoreConfig {
        path: dir.path().join("tienda.sqlite"),
        ..StoreConfig::default()
    })
    .expect("open store");
    let cfg = ServerConfig {
        jwt_secret: TEST_SECRET.to_vec(),
        password_hash_iterations: TEST_ITERATIONS,
        max_body_bytes: TEST_MAX_BODY_BYTES,
        token_ttl: Duration::from_secs(600),
        ..ServerConfig::default()
    };
    cfg.validate().expect("test config");
    let app = build_router(AppState::new(store.clone(), cfg));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    TestServer {
        addr,
        store,
        _dir: dir,
    }
}

#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("response body is not json ({e}): {}", self.body))
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }
}

pub async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<(&str, &str)>,
) -> Reply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    match body {
        Some((content_type, payload)) => {
            req.push_str(&format!(
                "Content-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{payload}",
                payload.len()
            ));
        }
        None => req.push_str("Content-Length: 0\r\n\r\n"),
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Reply {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

fn auth_header(token: Option<&str>) -> Option<String> {
    token.map(|t| format!("Bearer {t}"))
}

pub async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> Reply {
    let auth = auth_header(token);
    let headers: Vec<(&str, &str)> = auth.iter().map(|a| ("Authorization", a.as_str())).collect();
    send(addr, "GET", path, &headers, None).await
}

pub async fn delete(addr: SocketAddr, path: &str, token: Option<&str>) -> Reply {
    let auth = auth_header(token);
    let headers: Vec<(&str, &str)> = auth.iter().map(|a| ("Authorization", a.as_str())).collect();
    send(addr, "DELETE", path, &headers, None).await
}

pub async fn with_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Reply {
    let auth = auth_header(token);
    let headers: Vec<(&str, &str)> = auth.iter().map(|a| ("Authorization", a.as_str())).collect();
    let payload = body.to_string();
    send(
        addr,
        method,
        path,
        &headers,
        Some(("application/json", &payload)),
    )
    .await
}

pub async fn login(addr: SocketAddr, email: &str, password: &str) -> Reply {
    let form = format!(
        "username={}&password={}",
        email.replace('@', "%40"),
        password
    );
    send(
        addr,
        "POST",
        "/api/login",
        &[],
        Some(("application/x-www-form-urlencoded", &form)),
    )
    .await
}

/// Registers a shopper through the API and returns a bearer token.
pub async fn shopper_token(addr: SocketAddr, email: &str) -> String {
    let reply = with_json(
        addr,
        "POST",
        "/api/register",
        None,
        &serde_json::json!({
            "full_name": "Ana Perez",
            "email": email,
            "password": "secreto1"
        }),
    )
    .await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    token_from(login(addr, email, "secreto1").await)
}

/// Seeds an administrator directly in the store and logs in.
pub async fn admin_token(server: &TestServer) -> String {
    let store = server.store.clone();
    tokio::task::spawn_blocking(move || {
        store.ensure_admin(&NewUser {
            full_name: PersonName::parse("Root Admin").expect("name"),
            email: Email::parse("admin@tienda.mx").expect("email"),
            password_hash: hash_password("admin-pass", TEST_ITERATIONS),
            address: Address::default(),
        })
    })
    .await
    .expect("join")
    .expect("ensure admin");
    token_from(login(server.addr, "admin@tienda.mx", "admin-pass").await)
}

pub fn token_from(reply: Reply) -> String {
    assert_eq!(reply.status, 200, "{}", reply.body);
    reply.json()["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

pub async fn create_product(
    addr: SocketAddr,
    admin: &str,
    name: &str,
    price: f64,
    stock: i64,
) -> i64 {
    let reply = with_json(
        addr,
        "POST",
        "/api/admin/products",
        Some(admin),
        &serde_json::json!({"name": name, "price": price, "stock": stock, "size": "M"}),
    )
    .await;
    assert_eq!(reply.status, 201, "{}", reply.body);
    reply.json()["id"].as_i64().expect("product id")
}

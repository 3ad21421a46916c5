use std::io::Write;
use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_std::net::{TcpListener, TcpStream};
use async_std::prelude::*;
use async_std::task;
use tinyroute::{HttpMethod, HttpRequest, ResponseSink, RouteTable, Server, ServerConfig};

const BAD_REQUEST: &[u8] =
    b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const NOT_FOUND: &[u8] =
    b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

fn reply(out: &mut ResponseSink, body: &str) -> std::io::Result<()> {
    write!(
        out,
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

async fn start(server: Server) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    task::spawn(async move { server.serve(listener).await });
    addr
}

fn server_with(pool_size: usize) -> Server {
    let config = ServerConfig {
        pool_size,
        ..ServerConfig::default()
    };
    Server::new(config, Arc::new(RouteTable::new()))
}

/// Sends `raw`, half-closes, and collects everything the server writes back.
async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

#[async_std::test]
async fn get_runs_registered_handler_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let server = server_with(4);
    server.add_handler(
        HttpMethod::Get,
        "/hello",
        move |req: HttpRequest, out: &mut ResponseSink| {
            counter.fetch_add(1, Ordering::SeqCst);
            reply(out, &format!("{} {}", req.method(), req.path()))
        },
    );
    let addr = start(server).await;

    let response = send(addr, b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nGET /hello");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[async_std::test]
async fn post_body_is_exactly_content_length() {
    let server = server_with(4);
    server.add_handler(
        HttpMethod::Post,
        "/echo",
        |req: HttpRequest, out: &mut ResponseSink| reply(out, req.body()),
    );
    let addr = start(server).await;

    let response = send(
        addr,
        b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello trailing",
    )
    .await;
    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");

    let response = send(addr, b"POST /echo HTTP/1.1\r\nHost: a\r\n\r\nhello").await;
    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
}

#[async_std::test]
async fn headers_reach_handler_in_order() {
    let server = server_with(2);
    server.add_handler(
        HttpMethod::Get,
        "/headers",
        |req: HttpRequest, out: &mut ResponseSink| reply(out, &req.headers().join("|")),
    );
    let addr = start(server).await;

    let response = send(addr, b"GET /headers HTTP/1.0\r\nA: 1\r\nB: 2\r\nA: 3\r\n\r\n").await;
    assert!(response.ends_with(b"A: 1|B: 2|A: 3"));
}

#[async_std::test]
async fn malformed_requests_get_bad_request() {
    let server = server_with(4);
    server.add_handler(
        HttpMethod::Get,
        "/",
        |_req: HttpRequest, out: &mut ResponseSink| reply(out, "root"),
    );
    let addr = start(server).await;

    let cases: [&[u8]; 6] = [
        b"PUT / HTTP/1.1\r\nHost: a\r\n\r\n",
        b"DELETE / HTTP/1.1\r\n\r\n",
        b"GET index.html HTTP/1.1\r\n\r\n",
        b"GET / HTTP/1.1 extra\r\n\r\n",
        b"GET / HTTP/1.1",
        b"GET / HTTP/1.1\r\nHost: a\r\n",
    ];

    for raw in cases {
        assert_eq!(send(addr, raw).await, BAD_REQUEST, "request {raw:?}");
    }
}

#[async_std::test]
async fn header_block_filling_budget_gets_bad_request() {
    let addr = start(server_with(1)).await;

    let mut raw = String::from("GET / HTTP/1.1\r\nX-Pad: ");
    raw.push_str(&"a".repeat(4096 - raw.len()));
    assert_eq!(raw.len(), 4096);
    assert_eq!(send(addr, raw.as_bytes()).await, BAD_REQUEST);
}

#[async_std::test]
async fn method_and_path_misses_look_the_same() {
    let server = server_with(4);
    server.add_handler(
        HttpMethod::Get,
        "/known",
        |_req: HttpRequest, out: &mut ResponseSink| reply(out, "known"),
    );
    let addr = start(server).await;

    let path_miss = send(addr, b"GET /unknown HTTP/1.1\r\n\r\n").await;
    let method_miss = send(addr, b"POST /known HTTP/1.1\r\nContent-Length: 0\r\n\r\n").await;

    assert_eq!(path_miss, NOT_FOUND);
    assert_eq!(method_miss, NOT_FOUND);
}

#[async_std::test]
async fn second_registration_wins() {
    let server = server_with(2);
    server.add_handler(
        HttpMethod::Get,
        "/",
        |_req: HttpRequest, out: &mut ResponseSink| reply(out, "first"),
    );
    server.add_handler(
        HttpMethod::Get,
        "/",
        |_req: HttpRequest, out: &mut ResponseSink| reply(out, "second"),
    );
    let addr = start(server).await;

    let response = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert!(response.ends_with(b"second"));
}

#[async_std::test]
async fn failing_handler_only_drops_its_connection() {
    let server = server_with(2);
    server.add_handler(
        HttpMethod::Get,
        "/fail",
        |_req: HttpRequest, out: &mut ResponseSink| -> std::io::Result<()> {
            out.write_all(b"HTTP/1.1 200 OK\r\n")?;
            Err(std::io::Error::other("handler gave up"))
        },
    );
    server.add_handler(
        HttpMethod::Get,
        "/ok",
        |_req: HttpRequest, out: &mut ResponseSink| reply(out, "ok"),
    );
    let addr = start(server).await;

    assert!(send(addr, b"GET /fail HTTP/1.1\r\n\r\n").await.is_empty());
    assert!(send(addr, b"GET /ok HTTP/1.1\r\n\r\n").await.ends_with(b"ok"));
}

#[async_std::test]
async fn serves_more_clients_than_workers() {
    let server = server_with(4);
    server.add_handler(
        HttpMethod::Get,
        "/n",
        |req: HttpRequest, out: &mut ResponseSink| reply(out, req.header("X-N").unwrap_or("")),
    );
    let addr = start(server).await;

    let clients: Vec<_> = (0..50)
        .map(|n| {
            task::spawn(async move {
                let raw = format!("GET /n HTTP/1.1\r\nX-N: {n}\r\n\r\n");
                let response = send(addr, raw.as_bytes()).await;
                (n, response)
            })
        })
        .collect();

    for client in clients {
        let (n, response) = client.await;
        assert!(response.ends_with(n.to_string().as_bytes()), "client {n}");
    }
}

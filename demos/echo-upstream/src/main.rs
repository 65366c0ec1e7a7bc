//! A minimal HTTP upstream for driving the gateway through its proxying
//! and policy paths in integration tests and manual exercise.
//!
//! Most paths respond `200 ok`. `/title` returns an HTML page with a
//! `<title>` tag. `/bad-gateway` returns 502, to exercise the gateway's
//! remap to 404.

use clap::Parser;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "echo-upstream", about = "Minimal HTTP upstream for gateway testing")]
struct Cli {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.addr))
}

async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    eprintln!("[echo-upstream] listening on http://{addr}");

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::task::spawn(async move {
            let conn = http1::Builder::new()
                .keep_alive(true)
                .serve_connection(io, service_fn(handle));

            if let Err(e) = conn.await {
                eprintln!("[echo-upstream] conn error: {e}");
            }
        });
    }
}

async fn handle(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match req.uri().path() {
        "/title" => Response::builder()
            .status(200)
            .header("content-type", "text/html")
            .body(Full::new(Bytes::from_static(
                b"<html><head><title>Upstream Page</title></head><body></body></html>",
            )))
            .unwrap(),
        "/bad-gateway" => Response::builder()
            .status(502)
            .body(Full::new(Bytes::from_static(b"bad gateway")))
            .unwrap(),
        _ => Response::builder()
            .status(200)
            .header("content-type", "text/plain")
            .body(Full::new(Bytes::from_static(b"ok")))
            .unwrap(),
    };
    Ok(response)
}

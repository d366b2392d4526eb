use std::env;

use anyhow::{Context, Result, bail};
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, header};

use storefront_gateway::catalog;
use storefront_gateway::endpoint::InboundRequest;
use storefront_gateway::{Adapter, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <METHOD> <PATH> [--token TOKEN] [--body JSON]",
            args[0]
        );
        eprintln!("  METHOD: GET, POST, PUT, PATCH, DELETE");
        eprintln!("  PATH: storefront path, e.g. /api/products/featured?limit=6");
        eprintln!("  BACKEND_URL must point at the backend (e.g. http://localhost:4000)");
        std::process::exit(1);
    }

    let method: Method = args[1]
        .to_uppercase()
        .parse()
        .with_context(|| format!("Unknown method: {}", args[1]))?;

    let (path, query) = match args[2].split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (args[2].clone(), None),
    };

    let mut token = None;
    let mut body = None;
    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--token" => token = rest.next().cloned(),
            "--body" => body = rest.next().cloned(),
            other => bail!("Unknown argument: {}", other),
        }
    }

    let Some((endpoint, path_params)) = catalog::resolve(&method, &path) else {
        bail!("No endpoint serves {} {}", method, path);
    };

    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).context("Malformed token")?,
        );
    }
    if body.is_some() {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    let config = GatewayConfig::from_env();
    let adapter = Adapter::from_config(&config)?;

    eprintln!("{} {} -> {}", method, path, endpoint.name);
    let reply = adapter
        .handle(
            &endpoint,
            InboundRequest {
                path_params,
                query,
                headers,
                body: body.map(Bytes::from).unwrap_or_default(),
            },
        )
        .await;

    println!("Status: {}", reply.status);
    println!("{}", serde_json::to_string_pretty(&reply.body)?);

    if !reply.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

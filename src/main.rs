use clap::Parser;
use json_route::{auth::RequireHeader, Request, Response, Server, StatusCode};
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Demo server with a greeting route and an about page.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// IP address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind.
    #[arg(long, default_value_t = 65432)]
    port: u16,

    /// Serve without requiring an `Authorization` header.
    #[arg(long)]
    open: bool,

    /// Log filter, overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

fn handle_root(request: &Request) -> Response {
    let mut content = Map::new();
    content.insert("message".into(), json!("Hello, world!"));
    content.insert("body".into(), Value::String(request.body().to_owned()));

    Response::new(StatusCode::OK, content)
}

fn handle_about(_: &Request) -> Response {
    let mut content = Map::new();
    content.insert("message".into(), json!("This is the about page"));

    Response::new(StatusCode::OK, content)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "json_route=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let builder = Server::builder()
        .host(args.host)
        .port(args.port)
        .route("GET", "/", handle_root)
        .route("GET", "/about", handle_about);

    let builder = match args.open {
        true => builder,
        false => builder.auth_handler(RequireHeader::new("Authorization")),
    };

    builder.build().launch().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

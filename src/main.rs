use crate::{
    common::{constants::PROHIBITED_NAMESPACES_ENV, error::Error},
    config::DeployConfig,
    rest::service,
};
use actix_web::{middleware, web, HttpServer};
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Shell command execution module.
pub(crate) mod command;
/// Constants and error module.
pub(crate) mod common;
/// Service configuration module.
pub(crate) mod config;
/// Deploy request orchestration module.
pub(crate) mod deploy;
/// Helm command builder module.
pub(crate) mod helm;
/// REST service module.
pub(crate) mod rest;
/// Temporary resource staging module.
pub(crate) mod stage;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// TCP address where the deploy endpoint listens.
    #[clap(long, short, default_value = "0.0.0.0:8080")]
    listen_endpoint: SocketAddr,

    /// Namespaces that deploy requests may never target, appended to the
    /// built-in `kube-system`.
    #[clap(long, env = PROHIBITED_NAMESPACES_ENV, value_delimiter = ',')]
    prohibited_namespaces: Vec<String>,

    /// Echo the composed commands back instead of executing them.
    #[clap(long)]
    dry_run: bool,
}

impl Cli {
    fn args() -> Self {
        Cli::parse()
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let args = Cli::args();
    let config = web::Data::new(DeployConfig::new(
        args.prohibited_namespaces.as_slice(),
        args.dry_run,
    ));

    let app = move || {
        actix_web::App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .service(service::apply_release)
    };

    HttpServer::new(app)
        .bind(args.listen_endpoint)
        .expect("Unable to bind address")
        .run()
        .await
        .expect("Unable to run the server");
    Ok(())
}

/// Initialize logging components -- tracing.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

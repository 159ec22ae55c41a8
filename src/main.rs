//! Endpoint routing host.
//!
//! Loads endpoints declared in a TOML file, publishes them through the routing
//! composite and keeps them current while the file changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   routing.toml ──▶ config::load_config ──▶ build_endpoints ──▶ DynamicEndpointDataSource("config")
//!        │                                                              │
//!        └── ConfigWatcher (--watch) ── reload ── replace() ────────────┤
//!                                                                       ▼
//!                          feature modules ──add_source──▶  CompositeEndpointDataSource
//!                                                                       │
//!                                                                       ▼
//!                                                     EndpointView (matcher side)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use endpoint_routing::config::{build_endpoints, load_config, ConfigWatcher, HandlerMap, RoutingConfig};
use endpoint_routing::endpoint::{
    Endpoint, EndpointNameMetadata, HttpMethodMetadata, RouteConstraintsMetadata, RoutePatternMetadata,
};
use endpoint_routing::observability::{logging::init_logging, metrics::init_metrics};
use endpoint_routing::{add_routing, DynamicEndpointDataSource};

#[derive(Parser)]
#[command(name = "endpoint-routing")]
#[command(about = "Publishes configured endpoints through the routing composite", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload endpoints when the configuration file changes.
    #[arg(short, long)]
    watch: bool,

    /// Print the endpoint table as JSON and exit.
    #[arg(long)]
    dump: bool,
}

#[derive(Serialize)]
struct EndpointSummary {
    name: String,
    pattern: Option<String>,
    methods: Vec<String>,
    constraints: Vec<ConstraintSummary>,
}

#[derive(Serialize)]
struct ConstraintSummary {
    parameter: String,
    constraint: String,
}

fn summarize(endpoint: &Endpoint) -> EndpointSummary {
    let metadata = endpoint.metadata();
    EndpointSummary {
        name: metadata
            .get::<EndpointNameMetadata>()
            .map(|n| n.0.clone())
            .unwrap_or_else(|| endpoint.display_name().to_string()),
        pattern: metadata.get::<RoutePatternMetadata>().map(|p| p.0.clone()),
        methods: metadata
            .get::<HttpMethodMetadata>()
            .map(|m| m.methods().to_vec())
            .unwrap_or_default(),
        constraints: metadata
            .get::<RouteConstraintsMetadata>()
            .map(|c| {
                c.constraints
                    .iter()
                    .map(|(parameter, constraint)| ConstraintSummary {
                        parameter: parameter.clone(),
                        constraint: format!("{constraint:?}"),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let handlers = Arc::new(HandlerMap::with_builtins());
    let services = add_routing(|_| {});
    let resolver = services.constraint_resolver().clone();

    let config = match &cli.config {
        Some(path) => load_config(path, &resolver, &handlers)?,
        None => RoutingConfig::default(),
    };

    init_logging(&config.logging)?;
    tracing::info!("endpoint-routing v{} starting", env!("CARGO_PKG_VERSION"));

    if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.address.parse()?;
        init_metrics(addr)?;
    }

    let config_source = Arc::new(DynamicEndpointDataSource::with_endpoints(
        "config",
        build_endpoints(&config.endpoints, &handlers, &resolver)?,
    ));
    services.endpoint_data_source().add_source(config_source.clone());

    let view = services.endpoint_view();
    let (endpoints, mut token) = view.current_with_token()?;

    if cli.dump {
        let table: Vec<EndpointSummary> = endpoints.iter().map(|e| summarize(e)).collect();
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    tracing::info!(
        endpoints = endpoints.len(),
        data_sources = services.endpoint_data_source().len(),
        "Endpoint table ready"
    );

    tokio::spawn({
        let view = view.clone();
        async move {
            loop {
                token.changed().await;
                match view.current_with_token() {
                    Ok((snapshot, next)) => {
                        tracing::info!(endpoints = snapshot.len(), "Endpoint table changed");
                        token = next;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read endpoint table");
                        token = view.change_token();
                    }
                }
            }
        }
    });

    // Dropping the watcher stops notifications, so it lives until shutdown.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path, resolver.clone(), handlers.clone());
            let watcher = watcher.run()?;
            let (resolver, handlers, config_source) = (resolver.clone(), handlers.clone(), config_source.clone());
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    match build_endpoints(&new_config.endpoints, &handlers, &resolver) {
                        Ok(endpoints) => config_source.replace(endpoints),
                        Err(e) => tracing::error!(error = %e, "Rejected reloaded endpoints"),
                    }
                }
            });
            Some(watcher)
        }
        (None, true) => {
            tracing::warn!("--watch has no effect without --config");
            None
        }
        _ => None,
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

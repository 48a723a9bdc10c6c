//! devil-router binary
//!
//! Serves the HTTP API by default; the other subcommands operate on the
//! configured credential store directly.

use clap::Parser;
use devil_router::{
    cli::{Cli, Command, CredentialsCommand, generate_config_template},
    config::Config,
    credentials::{UpsertOutcome, open_vault},
    handlers::{self, AppState},
    router::{CategoryClassifier, RoutingTable},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { output }) => write_template(output),
        Some(Command::Classify { message }) => classify(&cli.config, &message),
        Some(Command::Credentials(args)) => credentials(&cli.config, args.action).await,
        Some(Command::Serve) | None => serve(&cli.config).await,
    }
}

fn write_template(output: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(&path, template)?;
            eprintln!("Configuration template written to {}", path);
        }
        None => print!("{}", template),
    }
    Ok(())
}

fn classify(config_path: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    let classifier = CategoryClassifier::new(Arc::new(RoutingTable::from_config(&config.routing)?));
    let classification = classifier.classify(message);
    println!(
        "{} ({}, credential {})",
        classification.category(),
        classification.basis,
        classification.rule.credential()
    );
    Ok(())
}

async fn credentials(
    config_path: &str,
    action: CredentialsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);
    let vault = open_vault(&config.credentials).await?;

    match action {
        CredentialsCommand::List => {
            for summary in vault.summaries().await? {
                println!(
                    "{}\t{}\tupdated {}",
                    summary.name, summary.model_id, summary.updated_at
                );
            }
        }
        CredentialsCommand::Set {
            name,
            model,
            secret,
        } => {
            let created_by = std::env::var("USER").unwrap_or_else(|_| "cli".to_string());
            match vault.save(&name, &secret, &model, &created_by).await? {
                UpsertOutcome::Created => println!("Created {}", name.trim()),
                UpsertOutcome::Updated => println!("Updated {}", name.trim()),
            }
        }
        CredentialsCommand::Delete { name } => {
            if vault.delete(&name).await? {
                println!("Deleted {}", name);
            } else {
                return Err(format!("credential '{}' not found", name).into());
            }
        }
    }
    Ok(())
}

async fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Config::from_file(config_path)?);
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        config = %config_path,
        host = %config.server.host,
        port = config.server.port,
        categories = config.routing.categories.len(),
        "Starting devil-router"
    );

    let vault = open_vault(&config.credentials).await?;
    let health = vault.verify().await;
    tracing::info!(
        healthy = health.healthy,
        credentials = health.key_count,
        "Credential store ready"
    );

    let state = AppState::new(config.clone(), vault)?;
    if state.admin_token().is_none() {
        tracing::warn!(
            token_env = %config.admin.token_env,
            "No admin token configured; /admin routes are disabled"
        );
    }
    let app = handlers::app(state);

    let ip = config.server.host.parse::<std::net::IpAddr>().map_err(|e| {
        format!("Invalid server.host '{}': {}", config.server.host, e)
    })?;
    let addr = SocketAddr::from((ip, config.server.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

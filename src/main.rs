use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plant_access::client::PortalClient;
use plant_access::config::{self, Config};
use plant_access::dashboard::{code, DashboardController, MountOutcome};
use plant_access::models::entry::{ApprovalStatus, Entry, EntryKind};
use plant_access::session::{AuthSessionManager, FileSessionStore};
use plant_access::vault::{CredentialResolver, Operation};
use plant_access::{api, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Workflows) => {
            print_workflows(&cfg);
            Ok(())
        }
        Some(cli::Commands::Login { user, password }) => handle_login(&cfg, &user, &password).await,
        Some(cli::Commands::Whoami) => handle_whoami(&cfg),
        Some(cli::Commands::Logout) => {
            session_manager(&cfg)?.logout();
            println!("Logged out.");
            Ok(())
        }
        Some(cli::Commands::Entries { solicitud, kind }) => {
            handle_entries(&cfg, &solicitud, kind).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "plant-access"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "plant_access=debug,tower_http=debug".into()),
        ))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with(telemetry_layer)
        .init();
    Ok(())
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let configured = cfg.workflows.configured();
    if configured.len() < Operation::ALL.len() {
        tracing::warn!(
            "{} of {} workflow operations configured; the rest answer 500",
            configured.len(),
            Operation::ALL.len()
        );
    }

    let state = Arc::new(AppState::new(cfg).context("failed to build application state")?);
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("plant access portal listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutdown signal received");
}

fn print_workflows(cfg: &Config) {
    let configured = cfg.workflows.configured();
    println!("{:<22} {:<12} HOST", "OPERATION", "STATUS");
    for op in Operation::ALL {
        match cfg.workflows.resolve(op) {
            Ok(cred) => println!("{:<22} {:<12} {}", op.name(), "configured", cred.display_host()),
            Err(_) => println!("{:<22} {:<12} set {} and {}", op.name(), "missing", op.url_var(), op.token_var()),
        }
    }
    println!("\n{}/{} configured", configured.len(), Operation::ALL.len());
}

fn session_manager(cfg: &Config) -> anyhow::Result<AuthSessionManager<FileSessionStore, PortalClient>> {
    let store = FileSessionStore::new(cfg.session_file.clone());
    let client = PortalClient::new(cfg.portal_url.clone())?;
    Ok(AuthSessionManager::new(store, client))
}

async fn handle_login(cfg: &Config, user: &str, password: &str) -> anyhow::Result<()> {
    let manager = session_manager(cfg)?;
    let result = manager.login(user, password).await;
    if !result.success {
        anyhow::bail!(result.message.unwrap_or_default());
    }
    match manager.user() {
        Some(profile) => println!("Logged in as {} ({})", profile.name, profile.role),
        None => println!("Logged in."),
    }
    println!("Session saved to {}", manager.store().path().display());
    Ok(())
}

fn handle_whoami(cfg: &Config) -> anyhow::Result<()> {
    let manager = session_manager(cfg)?;
    match manager.user() {
        Some(profile) => {
            println!("ID:    {}", profile.id);
            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);
            println!("Role:  {}", profile.role);
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

async fn handle_entries(cfg: &Config, solicitud: &str, kind: EntryKind) -> anyhow::Result<()> {
    let client = PortalClient::new(cfg.portal_url.clone())?;

    let path = code::enter_code(&client, solicitud)
        .await
        .map_err(anyhow::Error::msg)?;
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();

    let mut dashboard = DashboardController::new(client);
    if let MountOutcome::Redirect(to) = dashboard.mount(query).await {
        anyhow::bail!("no request code resolved (would redirect to {})", to);
    }
    if kind != dashboard.kind() {
        dashboard.set_kind(kind).await;
    }
    if let Some(err) = dashboard.error() {
        anyhow::bail!(err.to_string());
    }

    let entries = dashboard.visible_entries();
    if let Some(msg) = dashboard.empty_message() {
        println!("{}", msg);
        return Ok(());
    }

    match kind {
        EntryKind::Person => println!("{:<38} {:<32} {:<14} {:<10}", "ID", "NAME", "DOCUMENT", "STATUS"),
        EntryKind::Vehicle => println!("{:<38} {:<10} {:<24} {:<10}", "ID", "PLATE", "VEHICLE", "STATUS"),
    }
    for entry in entries {
        match entry {
            Entry::Person(p) => println!(
                "{:<38} {:<32} {:<14} {:<10}",
                p.id,
                p.full_name(),
                p.document_number,
                status_label(p.status)
            ),
            Entry::Vehicle(v) => println!(
                "{:<38} {:<10} {:<24} {:<10}",
                v.id,
                v.plate,
                format!("{} {}", v.brand, v.model),
                status_label(v.status)
            ),
        }
    }
    Ok(())
}

fn status_label(status: ApprovalStatus) -> &'static str {
    match status {
        ApprovalStatus::Approved => "approved",
        ApprovalStatus::Pending => "pending",
    }
}

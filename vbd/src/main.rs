mod app;
mod cli;
mod error;
mod refresh;

use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vbea::{local_wallet, Tab, VbeaConfig};

use crate::app::AppContext;
use crate::error::{AppError, Result};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv(); // load .env if present

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let config = VbeaConfig::default();
    let ctx = match AppContext::init(&config, cli.store) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Dashboard(args) => run_dashboard(ctx, args, cancel).await,
        Command::SignIn => run_sign_in(ctx).await,
        Command::SignOut => run_sign_out(ctx).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run_dashboard(
    mut ctx: AppContext,
    args: cli::DashboardArgs,
    cancel: CancellationToken,
) -> Result<()> {
    // Resume the persisted session and wallet binding if possible.
    if let Ok(key) = std::env::var("PRIVATE_KEY") {
        let (address, _sign) = local_wallet(&key)?;
        let status = ctx.wallet.connect(&address).await;
        info!(%address, ?status, "wallet connected");
        ctx.session.ensure_bound_account(Some(&address));
    }
    if ctx.session.check_session().await {
        info!("session resumed");
    }

    let start_tab = args.tab.as_deref().and_then(|s| match s.parse::<Tab>() {
        Ok(tab) => Some(tab),
        Err(e) => {
            warn!("{e}, using the persisted tab");
            None
        }
    });
    let events = refresh::spawn_stdin_events(cancel.clone());
    refresh::run(
        &mut ctx,
        start_tab,
        args.page,
        Default::default(),
        events,
        cancel,
    )
    .await;

    ctx.teardown();
    Ok(())
}

async fn run_sign_in(mut ctx: AppContext) -> Result<()> {
    let key = std::env::var("PRIVATE_KEY").map_err(|_| AppError::MissingPrivateKey)?;
    let (address, sign) = local_wallet(&key)?;

    let status = ctx.wallet.connect(&address).await;
    info!(%address, ?status, "wallet connected");

    ctx.session.sign_in(&address, &sign).await?;
    ctx.teardown();
    Ok(())
}

async fn run_sign_out(mut ctx: AppContext) -> Result<()> {
    if !ctx.session.is_signed_in() {
        warn!("no local session to sign out");
    }
    ctx.session.sign_out().await;
    ctx.teardown();
    Ok(())
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}

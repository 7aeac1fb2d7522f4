mod screen;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use cryptodevs_core::{Alert, AlertKind, AlertLog, AlertSink, DappConfig, logging};
use cryptodevs_dapp::{
    ActionOutcome, MintPage, PageSettings, PreferredWallet, SystemClock, WalletModal,
};

use screen::Command;

const FILE_PREFIX: &str = "cryptodevs.log";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = DappConfig::load().context("Failed to load config")?;
    let _log_guard = logging::init_file_logging(&DappConfig::logs_dir()?, &config.log_level, FILE_PREFIX)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Crypto Devs mint page starting");

    let settings = PageSettings::from_config(&config)?;
    let alerts = Arc::new(AlertLog::new());
    let modal = WalletModal::new(
        config.wallets.clone(),
        PreferredWallet::new(config.preferred_wallet.clone()),
    );
    let page = MintPage::new(settings, Arc::new(modal), alerts.clone(), Arc::new(SystemClock));

    // Connect on load, the way the page does when a wallet is already
    // authorized. A failure leaves the connect button on screen.
    if let Err(e) = page.connect_wallet().await {
        warn!(error = %e, "initial wallet connection failed");
    }
    screen::draw(&page, &alerts);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
    let mut changes = page.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                alerts.mark_all_read();
                match Command::parse(&line) {
                    Command::Press => {
                        let (page, alerts, done) = (page.clone(), alerts.clone(), done_tx.clone());
                        tokio::spawn(async move {
                            if let Some(outcome) = page.press().await {
                                report(&outcome, alerts.as_ref());
                            }
                            let _ = done.send(());
                        });
                    }
                    Command::Refresh => page.refresh().await,
                    Command::Disconnect => page.disconnect(),
                    Command::Quit => break,
                    Command::Unknown => {}
                }
                screen::draw(&page, &alerts);
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                screen::draw(&page, &alerts);
            }
            Some(()) = done_rx.recv() => screen::draw(&page, &alerts),
        }
    }

    page.end();
    info!("Crypto Devs mint page closed");
    Ok(())
}

/// Surface failures the dispatcher only logged.
fn report(outcome: &ActionOutcome, alerts: &dyn AlertSink) {
    match outcome {
        ActionOutcome::Failed { intent, reason } => {
            alerts.alert(Alert::new(
                AlertKind::Error,
                format!("Could not {}: {reason}", intent.label()),
            ));
        }
        ActionOutcome::Busy => {
            alerts.alert(Alert::new(AlertKind::Info, "A transaction is already in flight"));
        }
        ActionOutcome::Confirmed { .. } => {}
    }
}

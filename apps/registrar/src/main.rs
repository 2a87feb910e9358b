mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    orchestrator::IntentOutcome, view::RegistrationPreview, ConfiguredWallet,
    GatewayVoterContract, IpfsHttpStore, Notification, RegistrationIntent,
    RegistrationOrchestrator, SubmitOutcome, UploadOutcome, VoterContract, WalletSession,
};
use shared::domain::ImageFile;
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, validate_settings, Settings, DEFAULT_CONFIG_PATH};
use crate::render::TerminalNavigator;

#[derive(Parser, Debug)]
#[command(about = "Register voters through an IPFS node and a voter contract gateway")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a profile image and authorize a voter on chain.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List voters known to the contract.
    Voters {
        #[arg(long)]
        json: bool,
    },
    /// Show the navigation menu for the configured account.
    Nav,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    validate_settings(&settings)?;
    info!(
        ipfs_api_url = %settings.ipfs_api_url,
        contract_gateway_url = %settings.contract_gateway_url,
        "registrar starting"
    );

    let wallet = Arc::new(ConfiguredWallet::new(settings.organizer_account.clone()));
    if let Err(err) = wallet.connect().await {
        warn!(%err, "continuing without a connected organizer wallet");
    }

    match args.command {
        Command::Register {
            name,
            address,
            position,
            image,
            json,
        } => {
            let form = RegisterInput {
                name,
                address,
                position,
                image,
            };
            register(&settings, wallet, form, json).await
        }
        Command::Voters { json } => list_voters(&settings, wallet, json).await,
        Command::Nav => {
            let account = wallet.current_account().await.map(|a| a.to_string());
            render::print_nav(account.as_deref());
            Ok(())
        }
    }
}

struct RegisterInput {
    name: String,
    address: String,
    position: String,
    image: PathBuf,
}

async fn register(
    settings: &Settings,
    wallet: Arc<ConfiguredWallet>,
    input: RegisterInput,
    json: bool,
) -> Result<()> {
    let navigator = Arc::new(TerminalNavigator::default());
    let orchestrator = RegistrationOrchestrator::new(
        Arc::new(IpfsHttpStore::new(
            settings.ipfs_api_url.clone(),
            settings.ipfs_gateway_url.clone(),
        )),
        Arc::new(GatewayVoterContract::new(
            settings.contract_gateway_url.clone(),
            wallet,
        )),
        navigator.clone(),
    );
    let renderer = spawn_renderer(orchestrator.notifications().subscribe(), json);

    if let IntentOutcome::VotersRefreshed(count) =
        orchestrator.dispatch(RegistrationIntent::RefreshVoters).await
    {
        if !json && count > 0 {
            println!("Existing voters:");
            render::print_candidates(&orchestrator.snapshot().await.voters);
        }
    }

    for intent in [
        RegistrationIntent::EditName(input.name),
        RegistrationIntent::EditWalletAddress(input.address),
        RegistrationIntent::EditPosition(input.position),
    ] {
        orchestrator.dispatch(intent).await;
    }

    let image = read_image(&input.image).await?;
    if let IntentOutcome::Upload(UploadOutcome::Ready(uri)) = orchestrator
        .dispatch(RegistrationIntent::DropFile(image))
        .await
    {
        if !json {
            let preview = RegistrationPreview::new(&orchestrator.snapshot().await.form, &uri);
            println!(
                "Preview: {} | {} | {} | {}",
                preview.name, preview.address, preview.position, preview.image
            );
        }
    }

    let outcome = orchestrator.submit().await;
    drop(orchestrator);
    if let Err(err) = renderer.await {
        warn!(%err, "notification renderer stopped unexpectedly");
    }

    match outcome {
        SubmitOutcome::Registered(receipt) => {
            if json {
                println!("{}", serde_json::to_string(&receipt)?);
            } else {
                println!("Transaction: {}", receipt.transaction_hash);
            }
            info!(route = ?navigator.current(), "registration complete");
            Ok(())
        }
        SubmitOutcome::Rejected(err) => bail!("registration rejected: {err}"),
        SubmitOutcome::Failed(err) => bail!("registration failed: {err}"),
        SubmitOutcome::Ignored => bail!("a registration attempt is already running"),
    }
}

async fn list_voters(
    settings: &Settings,
    wallet: Arc<ConfiguredWallet>,
    json: bool,
) -> Result<()> {
    let contract = GatewayVoterContract::new(settings.contract_gateway_url.clone(), wallet);
    let voters = contract.voters().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&voters)?);
    } else {
        render::print_voters(&voters);
    }
    Ok(())
}

async fn read_image(path: &std::path::Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("image path {} has no file name", path.display()))?;
    Ok(ImageFile::new(file_name, None, bytes))
}

/// Prints notifications until the bridge is dropped.
fn spawn_renderer(
    rx: tokio::sync::broadcast::Receiver<Notification>,
    json: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = BroadcastStream::new(rx);
        while let Some(item) = stream.next().await {
            match item {
                Ok(notification) if json => match serde_json::to_string(&notification) {
                    Ok(line) => eprintln!("{line}"),
                    Err(err) => warn!(%err, "failed to encode notification"),
                },
                Ok(notification) => eprintln!("{}", render::notification_line(&notification)),
                Err(err) => warn!(%err, "notification renderer lagged"),
            }
        }
    })
}

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use cpayment::{
    client::{
        view::{card_actions, render_board, render_card, render_detail},
        ApiClient, CardAction, Poller, StatusFilter,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Operator dashboard for Cpayment payment requests")]
struct Cli {
    /// Base URL of the Cpayment API
    #[arg(long, env = "CPAYMENT_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the payment board on screen, refreshing on an interval
    Watch {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
        /// Seconds between refreshes
        #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 30)]
        interval: u64,
    },
    /// Print the payment board once
    List {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
    },
    /// Show every field of one payment request
    Show { id: String },
    /// Approve a pending payment request
    Approve { id: String },
    /// Reject a pending payment request
    Reject { id: String },
    /// Print aggregate statistics
    Stats,
    /// Print the published UPI id and QR code
    Settings,
    /// Update the UPI id and/or upload a new QR code image
    SetSettings {
        #[arg(long)]
        upi_id: Option<String>,
        #[arg(long)]
        qr_code: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.url);

    match cli.command {
        Command::Watch { filter, interval } => watch(client, filter, interval).await?,
        Command::List { filter } => {
            let (payments, stats) =
                futures::try_join!(client.list_payments(), client.statistics())?;
            print!("{}", render_board(&payments, &stats, filter));
        }
        Command::Show { id } => {
            let payment = client.get_payment(&id).await?;
            print!("{}", render_detail(&payment, |p| client.asset_url(p)));
        }
        Command::Approve { id } => decide(&client, &id, CardAction::Approve).await?,
        Command::Reject { id } => decide(&client, &id, CardAction::Reject).await?,
        Command::Stats => {
            let stats = client.statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Settings => {
            let settings = client.settings().await?;
            println!("UPI ID:  {}", display_or_unset(&settings.upi_id));
            if settings.qr_code.is_empty() {
                println!("QR code: (not set)");
            } else {
                println!("QR code: {}", client.asset_url(&settings.qr_code));
            }
        }
        Command::SetSettings { upi_id, qr_code } => {
            if upi_id.is_none() && qr_code.is_none() {
                bail!("Nothing to save: pass --upi-id and/or --qr-code");
            }
            let settings = client
                .save_settings(upi_id.as_deref(), qr_code.as_deref())
                .await?;
            println!("[OK] Settings saved successfully!");
            println!("UPI ID:  {}", display_or_unset(&settings.upi_id));
            println!("QR code: {}", display_or_unset(&settings.qr_code));
        }
    }

    Ok(())
}

async fn watch(client: ApiClient, filter: StatusFilter, interval: u64) -> Result<()> {
    if interval == 0 {
        bail!("Refresh interval must be at least one second");
    }

    let client = Arc::new(client);
    println!("Watching {} (refresh every {}s, ctrl+c to quit)", client.base_url(), interval);

    let poller = Poller::spawn(Duration::from_secs(interval), move || {
        let client = client.clone();
        async move {
            match futures::try_join!(client.list_payments(), client.statistics()) {
                Ok((payments, stats)) => {
                    // Clear the screen before redrawing the board.
                    print!("\x1B[2J\x1B[H{}", render_board(&payments, &stats, filter));
                }
                Err(e) => tracing::error!("Error fetching data: {:#}", e),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    poller.stop().await;
    Ok(())
}

async fn decide(client: &ApiClient, id: &str, action: CardAction) -> Result<()> {
    let payment = client.get_payment(id).await?;
    let Some(status) = action.target_status() else {
        bail!("{:?} does not change status", action);
    };

    if !card_actions(&payment).contains(&action) {
        bail!(
            "Payment {} is already {}; only pending payments can be approved or rejected",
            payment.short_id(),
            payment.status
        );
    }

    let updated = client.update_status(id, status).await?;
    print!("{}", render_card(&updated));
    Ok(())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

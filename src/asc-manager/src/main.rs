//! ASC Manager — campaign lifecycle CLI.
//!
//! Drives a campaign handler against demo-seeded in-memory collaborators.
//! Useful for exercising the lifecycle end-to-end without a live ad account.

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use asc_ads_client::{AdsApi, InMemoryAdsApi};
use asc_campaigns::{CampaignHandler, CampaignProps, CampaignStore, InMemoryCampaignStore};
use asc_core::config::AscConfig;
use asc_core::types::CampaignKind;

#[derive(Parser, Debug)]
#[command(name = "asc-manager")]
#[command(about = "Ad campaign lifecycle manager (demo mode)")]
#[command(version)]
struct Cli {
    /// Campaign type to operate on
    #[arg(long, value_enum, default_value_t = KindArg::NewBuyers)]
    campaign_type: KindArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    NewBuyers,
    Retargeting,
}

impl From<KindArg> for CampaignKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::NewBuyers => CampaignKind::NewBuyers,
            KindArg::Retargeting => CampaignKind::Retargeting,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show running state, budget, message, and targeting
    Status,
    /// Create the campaign entity tree
    Create {
        /// Daily budget in major currency units
        #[arg(long)]
        daily_budget: Option<f64>,
        /// Ad message
        #[arg(long)]
        message: Option<String>,
        /// Targeted countries (prospecting)
        #[arg(long)]
        country: Vec<String>,
        /// Visit-recency window in days (retargeting)
        #[arg(long)]
        visit_period: Option<u32>,
        /// Activate immediately
        #[arg(long, default_value_t = false)]
        activate: bool,
    },
    /// Apply changes to the existing campaign
    Update {
        /// Daily budget in major currency units
        #[arg(long)]
        daily_budget: Option<f64>,
        /// Ad message
        #[arg(long)]
        message: Option<String>,
        /// Targeted countries (prospecting)
        #[arg(long)]
        country: Vec<String>,
        /// Visit-recency window in days (retargeting)
        #[arg(long)]
        visit_period: Option<u32>,
    },
    /// Pause delivery
    Pause,
    /// Resume delivery
    Resume,
    /// Show campaign insights
    Insights,
    /// Render an ad preview for the given message
    Preview {
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "DESKTOP_FEED_STANDARD")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asc_manager=info,asc_campaigns=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AscConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AscConfig::default()
    });
    if config.ad_account_id.is_empty() {
        config = demo_config(config);
    }

    let api = Arc::new(InMemoryAdsApi::new(&config.access_token));
    api.seed_demo(&config);
    let store = Arc::new(InMemoryCampaignStore::new());

    let kind: CampaignKind = cli.campaign_type.into();
    info!(kind = %kind, account = %config.ad_account_id, "ASC manager starting");

    let handler = CampaignHandler::new(
        kind,
        Arc::clone(&api) as Arc<dyn AdsApi>,
        store as Arc<dyn CampaignStore>,
        &config,
    )?;

    match cli.command {
        Command::Status => print_status(&handler)?,
        Command::Create {
            daily_budget,
            message,
            country,
            visit_period,
            activate,
        } => {
            let props = CampaignProps {
                status: Some(activate),
                daily_budget,
                ad_message: message,
                country: if country.is_empty() { None } else { Some(country) },
                visit_period_days: visit_period,
            };
            handler.create_campaign(&props)?;
            println!("Campaign created.");
            print_status(&handler)?;
        }
        Command::Update {
            daily_budget,
            message,
            country,
            visit_period,
        } => {
            let props = CampaignProps {
                status: None,
                daily_budget,
                ad_message: message,
                country: if country.is_empty() { None } else { Some(country) },
                visit_period_days: visit_period,
            };
            handler.update_campaign(&props)?;
            println!("Campaign updated.");
            print_status(&handler)?;
        }
        Command::Pause => {
            handler.set_ad_status(false)?;
            println!("Delivery paused.");
        }
        Command::Resume => {
            handler.set_ad_status(true)?;
            println!("Delivery resumed.");
        }
        Command::Insights => match handler.insights() {
            Some(insights) => println!("{}", serde_json::to_string_pretty(&insights)?),
            None => println!("No insights available; the campaign is not running."),
        },
        Command::Preview { message, format } => {
            let preview = handler.generate_ad_preview(&message, &format)?;
            println!("{}", preview.body);
        }
    }

    Ok(())
}

fn print_status(handler: &CampaignHandler) -> anyhow::Result<()> {
    println!("kind:           {}", handler.kind());
    println!("running:        {}", handler.is_running()?);
    println!("ad live:        {}", handler.get_ad_status()?);
    println!(
        "daily budget:   {:.2} {}",
        handler.get_ad_daily_budget()?,
        handler.get_currency()
    );
    println!("minimum budget: {:.2}", handler.get_allowed_min_daily_budget());
    println!("message:        {}", handler.get_ad_message()?);
    match handler.kind() {
        CampaignKind::NewBuyers => {
            println!("countries:      {}", handler.get_ad_targeted_countries()?.join(", "));
        }
        CampaignKind::Retargeting => {
            println!("visit period:   {} days", handler.get_visit_period_days()?);
        }
    }
    Ok(())
}

fn demo_config(base: AscConfig) -> AscConfig {
    AscConfig {
        ad_account_id: "act_demo".to_string(),
        page_id: "page_demo".to_string(),
        pixel_id: "pix_demo".to_string(),
        catalog_id: "cat_demo".to_string(),
        access_token: "demo-token".to_string(),
        ..base
    }
}

//! Pulse CLI - terminal front end for the scent lab.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (blank email falls back to the demo address)
//! pulse sign-in -e julian@example.com -r user
//!
//! # Run a biometric scan and synthesize a scent DNA
//! pulse scan
//!
//! # Simulate a refused camera, then retry
//! pulse scan --deny --retry
//!
//! # Identify a bottle photo and add it to this run's wardrobe
//! pulse identify bottle.jpg --add
//!
//! # Blend catalog entries (the wardrobe is not kept between runs)
//! pulse blend ysl-libre mugler-alien
//!
//! # Withdraw sensor consent; scans are refused until it is granted again
//! pulse consent --withdraw
//!
//! # Admin directory
//! pulse sign-in -r admin
//! pulse users luxe --archetype "Obsidian Nomad"
//! ```
//!
//! # Commands
//!
//! - `sign-in`, `sign-out`, `status` - Session management
//! - `navigate` - Check page access for the current role
//! - `consent` - Grant or withdraw sensor consent
//! - `scan` - Biometric profiling scan
//! - `catalog` - Search the fragrance catalog
//! - `identify` - Bottle recognition
//! - `blend` - Layering recommendation
//! - `users` - Admin user directory

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pulse_core::Role;
use pulse_lab::LabConfig;
use pulse_lab::directory::ArchetypeFilter;
use pulse_lab::navigation::Page;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(author, version, about = "Pulse biometric scent lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a fabricated identity
    SignIn {
        /// Email address (blank uses the demo address)
        #[arg(short, long, default_value = "")]
        email: String,

        /// Role (`user` or `admin`)
        #[arg(short, long, default_value = "user")]
        role: Role,
    },
    /// Clear the stored session
    SignOut,
    /// Show the stored session
    Status,
    /// Open a page if the current role allows it
    Navigate {
        /// Page identifier, e.g. `scanner` or `admin-dashboard`
        page: Page,
    },
    /// Grant sensor consent, or withdraw it with `--withdraw`
    Consent {
        #[arg(long)]
        withdraw: bool,
    },
    /// Run a biometric profiling scan
    Scan {
        /// Refuse camera permission on the first attempt
        #[arg(long)]
        deny: bool,

        /// Fail the first attempt with a device error
        #[arg(long, conflicts_with = "deny")]
        fail: Option<String>,

        /// Retry once after a failed acquisition
        #[arg(long)]
        retry: bool,
    },
    /// Search the fragrance catalog
    Catalog {
        /// Name, brand or id fragment
        #[arg(default_value = "")]
        query: String,
    },
    /// Identify a fragrance from a bottle photo
    Identify {
        /// Image file
        path: PathBuf,

        /// Add the identified fragrance to this run's wardrobe
        #[arg(long)]
        add: bool,
    },
    /// Recommend a layering blend for catalog entries
    Blend {
        /// Catalog ids to place in the wardrobe
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Search the admin user directory
    Users {
        /// Name, email or id fragment
        #[arg(default_value = "")]
        query: String,

        /// Archetype name or `All`
        #[arg(short, long, default_value = "All")]
        archetype: ArchetypeFilter,

        /// Toggle suspension for these user ids
        #[arg(long)]
        suspend: Vec<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &LabConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match LabConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pulse_lab=info,pulse_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &LabConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = commands::open_lab(config);

    match cli.command {
        Commands::SignIn { email, role } => commands::session::sign_in(&mut lab, &email, role)?,
        Commands::SignOut => commands::session::sign_out(&mut lab)?,
        Commands::Status => commands::session::status(&lab),
        Commands::Navigate { page } => commands::session::navigate(&mut lab, page)?,
        Commands::Consent { withdraw } => commands::session::consent(&mut lab, !withdraw)?,
        Commands::Scan { deny, fail, retry } => {
            commands::lab::scan(&mut lab, config, deny, fail, retry).await?;
        }
        Commands::Catalog { query } => commands::lab::catalog(&lab, &query),
        Commands::Identify { path, add } => {
            commands::lab::identify(&mut lab, config, &path, add).await?;
        }
        Commands::Blend { ids } => commands::lab::blend(&mut lab, &ids)?,
        Commands::Users {
            query,
            archetype,
            suspend,
        } => commands::admin::users(&mut lab, &query, archetype, &suspend)?,
    }
    Ok(())
}

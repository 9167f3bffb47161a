use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use spinwheel_common::Error;
use spinwheel_common::models::reward::RewardDistribution;
use spinwheel_common::traits::repository_traits::{
    RedemptionRepository, RedemptionStore, TokenRepository,
};
use spinwheel_core::Database;
use spinwheel_core::repositories::postgres::{
    PostgresRedemptionRepository, PostgresRedemptionStore, PostgresTokenRepository,
};
use spinwheel_core::repositories::sqlite::{
    self, SqliteRedemptionRepository, SqliteRedemptionStore, SqliteTokenRepository,
};
use spinwheel_core::services::{IdentityService, RedemptionService, RewardSelector, TokenService};

#[derive(Parser, Debug)]
#[command(name = "spinwheel")]
#[command(author, version, about = "Spinwheel - one-time promotional spin redemption service")]
struct Args {
    /// Database URL. `postgres://` (or `postgresql://`) selects the Postgres
    /// backend; anything else is treated as SQLite. Falls back to the
    /// DATABASE_URL environment variable, then to a local SQLite file.
    #[arg(long)]
    database_url: Option<String>,

    /// Path to a JSON reward distribution ({"tiers":[{"amount":1,"weight":25},...]}).
    /// Defaults to the built-in wheel when omitted.
    #[arg(long)]
    rewards: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a new order token (4-20 chars; letters, digits, dash, underscore).
    CreateToken { code: String },

    /// Read-only check whether a token can still be redeemed.
    ValidateToken { code: String },

    /// Redeem a token for the requesting identity and print the reward.
    Redeem {
        code: String,
        #[arg(long, default_value = "cli-session")]
        session: String,
        #[arg(long, default_value = "127.0.0.1")]
        remote_addr: String,
        #[arg(long, default_value = "spinwheel-cli")]
        client_signature: String,
    },

    /// Attach a payout reference to the identity's most recent redemption.
    AttachPayout {
        reference: String,
        #[arg(long, default_value = "cli-session")]
        session: String,
        #[arg(long, default_value = "127.0.0.1")]
        remote_addr: String,
        #[arg(long, default_value = "spinwheel-cli")]
        client_signature: String,
    },

    /// Show the identity's most recent redemption, if any.
    Status {
        #[arg(long, default_value = "cli-session")]
        session: String,
        #[arg(long, default_value = "127.0.0.1")]
        remote_addr: String,
        #[arg(long, default_value = "spinwheel-cli")]
        client_signature: String,
    },

    /// Aggregate counters over tokens and the redemption ledger.
    Stats,

    /// Destructive reset of both tables. Requires --yes.
    ClearAll {
        #[arg(long)]
        yes: bool,
    },
}

fn load_distribution(path: Option<&Path>) -> anyhow::Result<RewardDistribution> {
    match path {
        Some(p) => {
            let raw = fs::read_to_string(p)?;
            let dist: RewardDistribution = serde_json::from_str(&raw)?;
            Ok(dist)
        }
        None => Ok(RewardDistribution::default()),
    }
}

type Backend = (
    Arc<dyn TokenRepository>,
    Arc<dyn RedemptionRepository>,
    Arc<dyn RedemptionStore>,
);

/// Pick the storage backend from the URL scheme, run migrations, and hand
/// back the repository trio.
async fn build_backend(database_url: &str) -> Result<Backend, Error> {
    if database_url.starts_with("postgres") {
        let db = Database::new(database_url).await?;
        db.migrate().await?;
        let pool = db.pool().clone();
        Ok((
            Arc::new(PostgresTokenRepository::new(pool.clone())),
            Arc::new(PostgresRedemptionRepository::new(pool.clone())),
            Arc::new(PostgresRedemptionStore::new(pool)),
        ))
    } else {
        let pool = sqlite::connect(database_url).await?;
        sqlite::run_migrations(&pool).await?;
        info!("Connected to SQLite");
        Ok((
            Arc::new(SqliteTokenRepository::new(pool.clone())),
            Arc::new(SqliteRedemptionRepository::new(pool.clone())),
            Arc::new(SqliteRedemptionStore::new(pool)),
        ))
    }
}

/// Domain failures print their user-facing message and set a nonzero exit
/// code; infrastructure failures bubble up through anyhow.
fn fail(err: Error) -> anyhow::Result<()> {
    match err {
        Error::InvalidInput(_)
        | Error::InvalidToken
        | Error::AlreadyUsed
        | Error::TokenExists
        | Error::NoRedemptionFound
        | Error::AlreadyAttached => {
            println!("{err}");
            std::process::exit(1);
        }
        other => Err(other.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let database_url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://spinwheel.db".to_string());

    let distribution = load_distribution(args.rewards.as_deref())?;
    let (tokens, ledger, store) = build_backend(&database_url).await?;

    let selector = Arc::new(RewardSelector::new(distribution)?);
    let identities = IdentityService::new();
    let redemption = RedemptionService::new(tokens.clone(), ledger.clone(), store, selector);
    let token_service = TokenService::new(tokens, ledger);

    match args.command {
        Command::CreateToken { code } => match token_service.create_token(&code).await {
            Ok(token) => println!("Issued order token {}", token.token_id),
            Err(e) => return fail(e),
        },

        Command::ValidateToken { code } => {
            let validation = redemption.validate_token(&code).await?;
            if validation.valid {
                println!("Valid order token");
            } else {
                println!("{}", validation.reason.unwrap_or_else(|| "Invalid".to_string()));
                std::process::exit(1);
            }
        }

        Command::Redeem { code, session, remote_addr, client_signature } => {
            let identity = identities.resolve(&session, &remote_addr, &client_signature);
            match redemption.redeem(identity, &code, Some(&remote_addr)).await {
                Ok(record) => println!("You won {}!", record.reward_amount),
                Err(e) => return fail(e),
            }
        }

        Command::AttachPayout { reference, session, remote_addr, client_signature } => {
            let identity = identities.resolve(&session, &remote_addr, &client_signature);
            match redemption.attach_payout(identity, &reference).await {
                Ok(()) => println!("Payout reference saved. Payment will be processed manually."),
                Err(e) => return fail(e),
            }
        }

        Command::Status { session, remote_addr, client_signature } => {
            let identity = identities.resolve(&session, &remote_addr, &client_signature);
            match redemption.latest_redemption(identity).await? {
                Some(r) => {
                    println!("Last redemption: {} at {}", r.reward_amount, r.redeemed_at);
                    if let Some(token_id) = &r.token_id {
                        println!("Order token: {token_id}");
                    }
                    match &r.payout_reference {
                        Some(p) if !p.is_empty() => println!("Payout reference: {p}"),
                        _ => println!("No payout reference submitted yet"),
                    }
                }
                None => println!("No redemption on record for this identity"),
            }
        }

        Command::Stats => {
            let t = token_service.token_stats().await?;
            let r = token_service.redemption_stats().await?;
            println!("Tokens:      issued {} / used {} / available {}", t.issued, t.used, t.available);
            println!("Redemptions: {} total, {} identities, {} paid out in total, {} payout refs",
                r.total_redemptions, r.distinct_identities, r.total_reward_amount, r.payout_attached);
            for s in token_service.identity_summaries(10).await? {
                println!(
                    "  {}  spins={} total={} last={}",
                    s.identity, s.redemption_count, s.total_reward_amount, s.last_redeemed_at
                );
            }
        }

        Command::ClearAll { yes } => {
            if !yes {
                println!("Refusing to clear without --yes");
                std::process::exit(1);
            }
            token_service.clear_all().await?;
            println!("All data cleared");
        }
    }

    Ok(())
}

use std::env;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use tracing_subscriber::EnvFilter;

use dashboard::{
    activities::gallery::GALLERIES,
    config::AppConfig,
    reconcile::{reconcile_uploads, ReconcileOptions, DEFAULT_UPLOAD_GRACE_MINUTES},
    state::AppState,
};

const USAGE: &str = "Usage: maintenance reconcile-uploads [--dry-run] [--grace-minutes N]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("reconcile-uploads") => {
            let options = parse_reconcile_args(args)?;
            reconcile_all(options).await?;
        }
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_reconcile_args(mut args: impl Iterator<Item = String>) -> Result<ReconcileOptions> {
    let mut dry_run = false;
    let mut grace_minutes = DEFAULT_UPLOAD_GRACE_MINUTES;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--grace-minutes" => {
                let value = args.next().context("--grace-minutes needs a value")?;
                grace_minutes = value
                    .parse()
                    .with_context(|| format!("invalid --grace-minutes value {value}"))?;
                if grace_minutes < 0 {
                    bail!("--grace-minutes must not be negative");
                }
            }
            other => bail!("unknown option {other}\n{USAGE}"),
        }
    }
    Ok(ReconcileOptions::with_grace(
        dry_run,
        Duration::minutes(grace_minutes),
    ))
}

async fn reconcile_all(options: ReconcileOptions) -> Result<()> {
    let config = AppConfig::from_env()?;
    let service_token = config
        .supabase_service_role_key
        .clone()
        .context("SUPABASE_SERVICE_ROLE_KEY must be set to reconcile uploads")?;
    tracing::info!(
        component = "maintenance",
        supabase_url = %config.supabase_url,
        aws_endpoint_url = %config.aws_endpoint_url,
        dry_run = options.dry_run,
        cutoff = %options.cutoff,
        "loaded dashboard configuration"
    );

    let state = AppState::connect(config).await?;
    let backend = &state.backend;

    for kind in GALLERIES {
        let report = reconcile_uploads(
            backend.tables.as_ref(),
            backend.storage.as_ref(),
            &service_token,
            kind,
            options,
        )
        .await
        .with_context(|| format!("failed to reconcile bucket {}", kind.bucket))?;

        println!(
            "{}: scanned {}, recent {}, orphaned {}, deleted {}, failed {}",
            report.bucket,
            report.scanned,
            report.recent,
            report.orphaned.len(),
            report.deleted,
            report.failed
        );
        for key in &report.orphaned {
            println!("  {key}");
        }
    }

    Ok(())
}

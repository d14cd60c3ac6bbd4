use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use vaaradhi::cache::GalleryCache;
use vaaradhi::config;
use vaaradhi::credentials::{ComposeError, Composer, CredentialSubject, DocumentKind, OutputFormat};
use vaaradhi::fetch::HttpFetcher;
use vaaradhi::output;

fn version_string() -> &'static str {
    let on_tag = env!("VAARADHI_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("VAARADHI_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vaaradhi")]
#[command(about = "Album-synced gallery and credential composer")]
#[command(long_about = "\
Album-synced gallery and credential composer

The gallery mirrors a shared photo album: the album page is fetched, photo
URLs are extracted, and the result is cached for a TTL. If a refresh fails,
the last good snapshot keeps being served.

Credentials (ID cards, donation and patronage certificates) are rendered
from fixed layouts. A subject photo that cannot be fetched is replaced by a
placeholder; the document is still produced.

Document kinds: id-card, donation-certificate, patron-certificate

Logs go to stderr (RUST_LOG, default 'info'); results go to stdout.

Run 'vaaradhi gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sync the gallery from the album and list its images
    Gallery {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render a credential document
    Compose {
        /// Document kind: id-card, donation-certificate, patron-certificate
        #[arg(long)]
        kind: String,
        /// Name printed on the document
        #[arg(long)]
        name: String,
        /// Card or certificate number
        #[arg(long)]
        id: String,
        /// Subject photo URL
        #[arg(long)]
        photo_url: Option<String>,
        /// Role line on ID cards (default VOLUNTEER)
        #[arg(long)]
        role: Option<String>,
        /// Issue date, YYYY-MM-DD (default today)
        #[arg(long, value_parser = parse_issue_date)]
        issued_at: Option<DateTime<Utc>>,
        /// Output format: png or svg
        #[arg(long, default_value = "png")]
        format: OutputFormat,
        /// Output file, or a directory to write the suggested file name into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Validate the config file without doing anything else
    CheckConfig,
}

fn parse_issue_date(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date {s:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Gallery { json } => {
            let app_config = config::load_config(&cli.config)?;
            let fetcher = HttpFetcher::new(&app_config.http)?;
            let cache = GalleryCache::from_config(fetcher, &app_config.gallery);
            let lookup = cache.lookup().await.inspect_err(|e| {
                error!(error = %e, "gallery sync failed");
            })?;
            if json {
                println!("{}", output::format_gallery_json(lookup.snapshot.images())?);
            } else {
                output::print_gallery(&lookup);
            }
        }
        Command::Compose {
            kind,
            name,
            id,
            photo_url,
            role,
            issued_at,
            format,
            out,
        } => {
            let kind: DocumentKind = kind.parse().map_err(ComposeError::from)?;
            let app_config = config::load_config(&cli.config)?;
            let fetcher = HttpFetcher::new(&app_config.http)?;
            let composer = Composer::from_config(fetcher, &app_config.credentials);

            let mut subject =
                CredentialSubject::new(kind, name, id, issued_at.unwrap_or_else(Utc::now));
            if let Some(url) = photo_url {
                subject = subject.with_photo_url(url);
            }
            if let Some(role) = role {
                subject = subject.with_role(role);
            }

            let document = composer.compose_as(&subject, format).await?;
            let path = if out.is_dir() {
                out.join(&document.file_name)
            } else {
                out
            };
            std::fs::write(&path, &document.bytes)?;
            info!(path = %path.display(), "document written");
            output::print_document(kind, &document, &path);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig => {
            let app_config = config::load_config(&cli.config)?;
            output::print_config_summary(&app_config, &cli.config);
        }
    }

    Ok(())
}

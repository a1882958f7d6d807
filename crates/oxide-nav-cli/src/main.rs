//! oxide-nav CLI
//!
//! Command-line tool for inspecting route tables and simulating navigations.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_nav::history::{MemoryHistory, RouterHistory};
use oxide_nav::{LoggingGuard, RouteLocation, RouteRecordRaw, Router, RouterMatcher, RouterOptions};

/// Inspect route tables and simulate navigations.
#[derive(Parser)]
#[command(name = "oxide-nav")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route table: a JSON array of route records.
    #[arg(short, long, env = "OXIDE_NAV_ROUTES", default_value = "routes.json")]
    routes: PathBuf,

    /// Base prepended to rendered hrefs.
    #[arg(short, long, default_value = "")]
    base: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled route table in match order.
    Routes,

    /// Resolve targets and print the resulting routes as JSON.
    Resolve {
        /// Location strings to resolve.
        targets: Vec<String>,

        /// Resolve a named route instead.
        #[arg(short, long)]
        name: Option<String>,

        /// Param for the named route (key=value, repeatable).
        #[arg(short, long, value_parser = parse_pair)]
        param: Vec<(String, String)>,

        /// Query entry for the named route (key=value, repeatable).
        #[arg(short, long, value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Hash for the named route, including `#`.
        #[arg(long)]
        hash: Option<String>,
    },

    /// Push each location in turn over an in-memory history.
    ///
    /// The keywords `back` and `forward` move through history instead.
    Simulate {
        /// Locations or `back`/`forward`.
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn named_target(
    name: &str,
    params: &[(String, String)],
    query: &[(String, String)],
    hash: Option<&str>,
) -> RouteLocation {
    let mut location = RouteLocation::named(name);
    for (key, value) in params {
        location = location.param(key.as_str(), value);
    }
    for (key, value) in query {
        location = location.query(key.as_str(), value.as_str());
    }
    if let Some(hash) = hash {
        location = location.hash(hash);
    }
    location
}

fn load_routes(path: &Path) -> anyhow::Result<Vec<RouteRecordRaw>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading route table {}", path.display()))?;
    let routes = RouteRecordRaw::from_json(&json)?;
    debug!(path = %path.display(), count = routes.len(), "loaded route table");
    Ok(routes)
}

fn build_router(routes: Vec<RouteRecordRaw>, history: Rc<MemoryHistory>) -> anyhow::Result<Router> {
    Ok(Router::new(RouterOptions::new(history).routes(routes))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let routes = load_routes(&cli.routes)?;

    match cli.command {
        Commands::Routes => {
            let matcher = RouterMatcher::new(&routes)?;
            if matcher.routes().is_empty() {
                info!("The route table is empty.");
                return Ok(());
            }

            println!("\n{:<30} {:<20} PATTERN", "PATH", "NAME");
            println!("{:-<80}", "");
            for record in matcher.routes() {
                let name = record.name.as_ref().map(ToString::to_string).unwrap_or_default();
                println!("{:<30} {:<20} {}", record.path, name, record.pattern.as_regex());
            }
            println!();
        }

        Commands::Resolve {
            targets,
            name,
            param,
            query,
            hash,
        } => {
            if targets.is_empty() && name.is_none() {
                anyhow::bail!("nothing to resolve: pass a location or --name");
            }

            let router = build_router(routes, Rc::new(MemoryHistory::with_base(cli.base)))?;
            let mut resolved = Vec::new();
            for target in targets {
                let href = router.href(&target)?;
                resolved.push(serde_json::json!({ "href": href, "route": router.resolve(&target)? }));
            }
            if let Some(name) = name {
                let target = named_target(&name, &param, &query, hash.as_deref());
                let href = router.href(target.clone())?;
                resolved.push(serde_json::json!({ "href": href, "route": router.resolve(target)? }));
            }

            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }

        Commands::Simulate { steps } => {
            let history = Rc::new(MemoryHistory::with_base(cli.base));
            let router = build_router(routes, Rc::clone(&history))?;
            router.add_guard(LoggingGuard);

            println!("\n{:>4}  {:<40} {:<20} PREVIOUS", "STEP", "LOCATION", "NAME");
            println!("{:-<80}", "");
            for (index, step) in steps.iter().enumerate() {
                match step.as_str() {
                    "back" => router.back(),
                    "forward" => router.forward(),
                    location => {
                        if let Err(error) = router.push(location).await {
                            warn!(location, %error, "navigation failed");
                        }
                    }
                }

                let current = router.current();
                let name = current.name.as_ref().map(ToString::to_string).unwrap_or_default();
                println!(
                    "{:>4}  {:<40} {:<20} {}",
                    index + 1,
                    history.create_href(&current.full_path),
                    name,
                    current.previous_full_path.as_deref().unwrap_or("-")
                );
            }
            println!();
        }
    }

    Ok(())
}

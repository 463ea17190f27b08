mod app;
mod catalog;
mod config;
mod event;
mod logging;
mod query;
mod route;
#[cfg(test)]
mod test_support;
mod ui;

use clap::Parser;
use color_eyre::Result;
use route::Route;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(about = "A terminal browser for a music album catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./maestro.yaml or $XDG_CONFIG_HOME/maestro/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog API root, overriding api.base_url
  #[arg(short, long)]
  api_url: Option<String>,

  /// Page to open: "/" or "/albums/<id>"
  #[arg(short, long, default_value = "/")]
  route: Route,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override the API root if specified on command line
  if let Some(api_url) = args.api_url {
    config.api.base_url = api_url;
    config.validate()?;
  }

  // Initialize and run the app
  let mut app = app::App::new(&config, args.route)?;
  let result = app.run().await;
  if let Err(e) = &result {
    tracing::error!(error = %e, "exited with error");
  }
  result
}

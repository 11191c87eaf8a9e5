use buildly::api::types::{
  Board, Budget, Bug, Comment, CoreUser, Feature, Issue, Organization, Product, Punchlist, Release,
  Status, TaskCategory,
};
use buildly::api::{
  MutationClient, MutationOptions, ProductMachine, ProductState, QueryClient, Resource,
};
use buildly::cache::QueryCache;
use buildly::config::{Config, ServiceTable};
use buildly::event::{AlertKind, AlertSink, Event, EventHandler, LogSink, Navigator};
use buildly::gateway::{Gateway, ReqwestTransport, StaticToken};
use buildly::session::Session;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "buildly")]
#[command(about = "Command-line client for the Buildly product and release services")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/buildly/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Organization to work in
  #[arg(short, long)]
  organization: Option<String>,

  /// Only log alerts instead of printing them
  #[arg(short, long)]
  quiet: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the organization's products and show which one is active
  Products,
  /// Print a resource list as JSON
  List {
    resource: ResourceKind,
    /// Parent identifier (product or organization uuid)
    #[arg(short, long)]
    parent: Option<String>,
    /// Extra query filter, as key=value
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
  },
  /// Create workflow statuses for a product
  AddStatuses {
    #[arg(short, long)]
    product: String,
    #[arg(required = true)]
    names: Vec<String>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
  Organizations,
  Users,
  Products,
  Releases,
  Features,
  Issues,
  Statuses,
  Comments,
  Budgets,
  TaskCategories,
  Boards,
  Punchlists,
  Bugs,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let (events_tx, mut events) = EventHandler::channel();
  let (alerts, navigator): (Arc<dyn AlertSink>, Arc<dyn Navigator>) = if args.quiet {
    (Arc::new(LogSink), Arc::new(LogSink))
  } else {
    (Arc::new(events_tx.clone()), Arc::new(events_tx))
  };

  let gateway = Gateway::new(
    ServiceTable::from_config(&config.services)?,
    Arc::new(ReqwestTransport::new()?),
    Arc::new(StaticToken(Config::get_access_token()?)),
  );
  let session = Arc::new(Session::start(
    gateway,
    QueryCache::new(chrono::Duration::seconds(config.cache.stale_seconds)),
    alerts,
    navigator,
    config.active_product.clone(),
  ));

  let organization = args.organization.or(config.organization_uuid);
  let result = run(args.command, session.clone(), organization.as_deref()).await;

  for event in events.drain() {
    match event {
      Event::Alert(alert) => match alert.kind {
        AlertKind::Success => eprintln!("✓ {}", alert.message),
        AlertKind::Error => eprintln!("✗ {}", alert.message),
      },
      Event::Navigate(route) => eprintln!("→ {}", route),
    }
  }
  session.end();

  result
}

async fn run(command: Command, session: Arc<Session>, organization: Option<&str>) -> Result<()> {
  match command {
    Command::Products => {
      let mut machine = ProductMachine::new(session);
      match machine.load(organization).await {
        ProductState::ProductsLoaded { products, selected } => {
          let selected = selected.as_ref().and_then(|p| p.product_uuid.as_deref());
          for product in products {
            let uuid = product.product_uuid.as_deref().unwrap_or("-");
            let marker = if Some(uuid) == selected { "*" } else { " " };
            println!("{} {}  {}", marker, uuid, product.name);
          }
          Ok(())
        }
        ProductState::ProductsLoadingFailed { error } => {
          Err(eyre!("Failed to load products: {}", error))
        }
        ProductState::ProductsLoading => Err(eyre!("Product list never loaded")),
      }
    }
    Command::List {
      resource,
      parent,
      filters,
    } => {
      let queries = QueryClient::new(session);
      let parent = parent.as_deref().or(organization);
      let filters: Vec<(&str, &str)> = filters
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

      match resource {
        ResourceKind::Organizations => print_list::<Organization>(&queries, parent, &filters).await,
        ResourceKind::Users => print_list::<CoreUser>(&queries, parent, &filters).await,
        ResourceKind::Products => print_list::<Product>(&queries, parent, &filters).await,
        ResourceKind::Releases => print_list::<Release>(&queries, parent, &filters).await,
        ResourceKind::Features => print_list::<Feature>(&queries, parent, &filters).await,
        ResourceKind::Issues => print_list::<Issue>(&queries, parent, &filters).await,
        ResourceKind::Statuses => print_list::<Status>(&queries, parent, &filters).await,
        ResourceKind::Comments => print_list::<Comment>(&queries, parent, &filters).await,
        ResourceKind::Budgets => print_list::<Budget>(&queries, parent, &filters).await,
        ResourceKind::TaskCategories => {
          print_list::<TaskCategory>(&queries, parent, &filters).await
        }
        ResourceKind::Boards => print_list::<Board>(&queries, parent, &filters).await,
        ResourceKind::Punchlists => print_list::<Punchlist>(&queries, parent, &filters).await,
        ResourceKind::Bugs => print_list::<Bug>(&queries, parent, &filters).await,
      }
    }
    Command::AddStatuses { product, names } => {
      let statuses: Vec<Status> = names
        .into_iter()
        .enumerate()
        .map(|(rank, name)| Status {
          name,
          product_uuid: Some(product.clone()),
          rank: Some(rank as i64),
          ..Status::default()
        })
        .collect();

      let created = MutationClient::new(session)
        .create_statuses(&statuses, MutationOptions::default())
        .await?;
      println!("{}", serde_json::to_string_pretty(&created)?);
      Ok(())
    }
  }
}

async fn print_list<R: Resource>(
  queries: &QueryClient,
  parent: Option<&str>,
  filters: &[(&str, &str)],
) -> Result<()> {
  let items: Vec<R> = queries.list(parent, filters).await;
  println!("{}", serde_json::to_string_pretty(&items)?);
  Ok(())
}

/// Log to a file in the data directory so stdout stays clean for output.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("buildly");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "buildly.log"));
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("buildly=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

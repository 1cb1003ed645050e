//! Resolve command - select operators for a cluster state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use olm_resolver::catalog::{CatalogConfig, RegistryConfig, SourceRegistry};
use olm_resolver::{Entry, Error, OperatorSet, ResolverConfig, SatResolver};
use tokio_util::sync::CancellationToken;

use crate::state::{parse_source_arg, ClusterState};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// State file listing installed operators and subscriptions
    #[arg(long)]
    pub state: PathBuf,

    /// Catalog document on disk, as NAME/NAMESPACE=PATH
    #[arg(long = "catalog", value_name = "SOURCE=PATH")]
    pub catalogs: Vec<String>,

    /// Catalog served over HTTP, as NAME/NAMESPACE=URL
    #[arg(long = "remote", value_name = "SOURCE=URL")]
    pub remotes: Vec<String>,

    /// Namespaces to resolve for
    #[arg(short = 'n', long = "namespace", default_value = "operators")]
    pub namespaces: Vec<String>,

    /// Resolver configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Namespace whose catalogs are visible from every namespace
    #[arg(long)]
    pub global_namespace: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ResolveArgs, cancel: CancellationToken) -> Result<i32> {
    let state = ClusterState::load(&args.state)?;
    let config = load_config(args.config.as_deref())?;
    let registry = build_registry(&args)?;

    if registry.is_empty() {
        eprintln!("{} No catalog sources given, use --catalog or --remote",
            style("Warning:").yellow().bold()
        );
    }

    let resolver = SatResolver::new(Arc::new(registry), config);
    let installed = state.installed_set();

    let selected = match resolver
        .solve_operators(&args.namespaces, &installed, &state.subscriptions, &cancel)
        .await
    {
        Ok(selected) => selected,
        Err(Error::Unsatisfiable(problem)) => {
            eprintln!("{} Unable to resolve subscriptions", style("Error:").red().bold());
            eprintln!("  {}", problem);
            return Ok(1);
        }
        Err(Error::Cancelled) => {
            eprintln!("{} Resolution cancelled", style("Error:").red().bold());
            return Ok(1);
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return Ok(1);
        }
    };

    if args.json {
        let entries: Vec<&Entry> = selected.entries().map(|e| e.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_selection(&selected, &installed);
    }

    Ok(0)
}

fn load_config(path: Option<&std::path::Path>) -> Result<ResolverConfig> {
    let Some(path) = path else {
        return Ok(ResolverConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn build_registry(args: &ResolveArgs) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::new(RegistryConfig {
        global_namespace: args.global_namespace.clone(),
    });

    let local = args.catalogs.iter().map(|arg| (arg, false));
    let remote = args.remotes.iter().map(|arg| (arg, true));

    for (arg, is_remote) in local.chain(remote) {
        let (key, location) = parse_source_arg(arg)?;
        let catalog = if is_remote {
            CatalogConfig::Remote { url: location }
        } else {
            CatalogConfig::Local { path: PathBuf::from(location) }
        };
        let client = catalog
            .build()
            .with_context(|| format!("Failed to open catalog source {}", key))?;
        registry.register(key, client);
    }

    Ok(registry)
}

fn print_selection(selected: &OperatorSet, installed: &OperatorSet) {
    if selected.is_empty() {
        println!("{}", style("Nothing to install").dim());
        return;
    }

    for entry in selected.entries() {
        let status = if installed.contains(&entry.name) {
            style("keep").dim()
        } else {
            style("install").green()
        };
        let version = entry
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let source = entry
            .source_info
            .as_ref()
            .map(|info| info.to_string())
            .unwrap_or_default();

        println!("  {:<8} {} {} {}",
            status,
            style(&entry.name).bold(),
            style(version).yellow(),
            style(source).dim()
        );
    }
}

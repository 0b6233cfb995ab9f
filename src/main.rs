use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use catalog_tree::api::{build_http_client, CategoryClient};
use catalog_tree::app::{App, AppEvent, CategorySource};
use catalog_tree::config::Config;
use catalog_tree::tree::{
    build_tree, render_outline, selection_states, toggle_selection, Category, CategoryId,
    CategoryIndex, ExpansionState,
};
use catalog_tree::ui;

/// Default config path (~/.config/catalog-tree/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("catalog-tree")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "catalog-tree",
    about = "Browse and bulk-edit a shop's category tree in the terminal"
)]
struct Args {
    /// Config file (default: ~/.config/catalog-tree/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load categories from a JSON file instead of the API
    #[arg(long, value_name = "PATH", conflicts_with = "api_url")]
    file: Option<PathBuf>,

    /// Catalogue API base URL (overrides api_base_url from the config)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Print the visible rows as text and exit
    #[arg(long, conflicts_with = "json")]
    print: bool,

    /// Print the category forest as JSON and exit
    #[arg(long)]
    json: bool,

    /// Start with every category expanded
    #[arg(long)]
    expand_all: bool,

    /// Select a category (and its subtree) at startup; repeatable
    #[arg(long = "select", value_name = "ID")]
    select: Vec<CategoryId>,
}

fn build_source(args: &Args, config: &Config) -> Result<CategorySource> {
    if let Some(path) = &args.file {
        return Ok(CategorySource::File(path.clone()));
    }

    let base_url = args
        .api_url
        .as_deref()
        .or(config.api_base_url.as_deref())
        .context("No category source: pass --file or --api-url, or set api_base_url in the config")?;
    let http = build_http_client().context("Failed to build HTTP client")?;
    let client = CategoryClient::new(http, base_url, config.api_token())
        .context("Invalid catalogue API settings")?;
    Ok(CategorySource::Api(Arc::new(client)))
}

/// Apply each `--select` id through the cascading toggle. Unknown ids are
/// skipped with a warning.
fn seed_selection(categories: &[Category], ids: &[CategoryId]) -> Result<HashSet<CategoryId>> {
    let index = CategoryIndex::new(categories);
    let mut selected = HashSet::new();
    for id in ids {
        if !index.contains(id) {
            tracing::warn!(id = %id, "Ignoring unknown --select id");
            eprintln!("Warning: no category with id '{}'", id);
            continue;
        }
        selected = toggle_selection(categories, id, &selected)
            .with_context(|| format!("Failed to select '{}'", id))?;
    }
    Ok(selected)
}

/// Non-interactive output for `--print` and `--json`. Expand-all honours
/// the same depth limit as the tree-table.
fn format_tree(
    categories: &[Category],
    expand_all: bool,
    max_depth: usize,
    selected: &HashSet<CategoryId>,
    as_json: bool,
) -> Result<String> {
    let mut expansion = ExpansionState::new();
    if expand_all {
        expansion.expand_all_within_depth(categories, max_depth);
    }
    let forest = build_tree(categories, expansion.as_set()).context("Failed to build tree")?;

    if as_json {
        let mut json = serde_json::to_string_pretty(&forest).context("Failed to serialize tree")?;
        json.push('\n');
        Ok(json)
    } else {
        let states = selection_states(categories, selected).context("Failed to compute selection")?;
        Ok(render_outline(&forest, &states))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --print/--json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::debug!(?config, "Configuration loaded");

    let source = build_source(&args, &config)?;
    tracing::info!(source = %source.describe(), "Loading categories");
    let categories = source.fetch().await?;
    let selected = seed_selection(&categories, &args.select)?;

    if args.print || args.json {
        let output = format_tree(
            &categories,
            args.expand_all || config.expand_all_on_load,
            config.max_depth.max(1),
            &selected,
            args.json,
        )?;
        print!("{}", output);
        return Ok(());
    }

    let mut config = config;
    config.expand_all_on_load |= args.expand_all;

    let mut app = App::new(source, &config);
    app.selected = selected;
    let count = categories.len();
    app.set_categories(categories);
    if app.status_message.is_none() {
        match &app.tree_error {
            Some(e) => app.set_status(format!("Loaded {} categories ({})", count, e)),
            None => app.set_status(format!("Loaded {} categories", count)),
        }
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    ui::run(&mut app, event_tx, event_rx).await?;

    Ok(())
}

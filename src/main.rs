use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pokedex_explorer::assets::AssetCache;
use pokedex_explorer::catalog::{self, CardCatalog, CardSort};
use pokedex_explorer::moves::{DamageCategory, MoveFilter, MoveListState, SortKey};
use pokedex_explorer::render::{self, Tab};
use pokedex_explorer::session::{QueryTicket, Session};
use pokedex_explorer::{
    AggregatedResult, Aggregator, AppError, CacheTrait, Config, HttpTransport, PokeApiClient,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "pokedex",
    version,
    about = "Look up a Pokémon with its evolutions, moves, matchups and trading cards"
)]
struct Cli {
    /// Path to a TOML configuration file (defaults to the bundled one)
    #[arg(long, env = "POKEDEX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (repeat for more verbose output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a Pokémon by name or national dex number
    Show {
        query: String,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show a random Pokémon
    Random {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Interactive lookup session on stdin
    Browse,

    /// Download the trading-card catalog from the TCG API
    SyncCards {
        /// Output file (defaults to catalog.path from the configuration)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Tab to print
    #[arg(long, value_enum, default_value_t = Tab::Overview)]
    tab: Tab,

    /// Print the whole aggregated record as JSON instead
    #[arg(long)]
    json: bool,

    /// Only moves of this type (repeatable)
    #[arg(long = "type")]
    types: Vec<String>,

    /// Only moves of this damage category (repeatable)
    #[arg(long = "category", value_enum)]
    categories: Vec<DamageCategory>,

    /// Only moves whose name contains this text
    #[arg(long, default_value = "")]
    search: String,

    #[arg(long, value_enum, default_value_t = SortKey::Name)]
    sort: SortKey,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, value_enum, default_value_t = CardSort::PriceHigh)]
    card_sort: CardSort,

    /// Save the Pokémon's cry to this file
    #[arg(long)]
    cry: Option<PathBuf>,
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{}={level},pokedex_explorer={level}", env!("CARGO_CRATE_NAME")).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

struct App {
    config: Config,
    aggregator: Arc<Aggregator<HttpTransport>>,
    assets: AssetCache<HttpTransport>,
}

impl App {
    fn new(config: Config) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.pokemon, &config.cache)?);
        let client = PokeApiClient::new(Arc::clone(&transport), &config.pokemon.api_url);
        let catalog = Arc::new(CardCatalog::new(&config.catalog.path));
        let aggregator = Arc::new(Aggregator::new(client, catalog, config.moves.max_concurrent));

        Ok(Self {
            assets: AssetCache::new(transport),
            aggregator,
            config,
        })
    }

    fn response_cache(&self) -> Option<&Arc<dyn CacheTrait<serde_json::Value>>> {
        self.aggregator.client().transport().cache()
    }

    fn log_cache_stats(&self) {
        if let Some(cache) = self.response_cache() {
            let stats = cache.stats();
            tracing::debug!(
                "Response cache: {} entries, {} hits, {} misses, {} evictions ({:.0}% hit rate)",
                cache.size(),
                stats.hits,
                stats.misses,
                stats.evictions,
                stats.hit_rate() * 100.0
            );
        }
    }

    fn random_query(&self) -> String {
        rand::random_range(1..=self.config.random.max_id).to_string()
    }

    async fn show(&self, query: &str, view: &ViewArgs) -> anyhow::Result<()> {
        let result = self
            .aggregator
            .resolve(query)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        self.log_cache_stats();

        if let Some(path) = &view.cry {
            self.save_cry(&result, path).await?;
        }

        if view.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        let mut moves = MoveListState::new(self.config.moves.page_size);
        moves.set_filter(MoveFilter {
            types: view.types.iter().map(|t| t.to_lowercase()).collect(),
            categories: view.categories.iter().copied().collect(),
            search: view.search.clone(),
            sort: view.sort,
        });
        moves.set_page(view.page);
        print!("{}", render_tab(&result, view.tab, &mut moves, view.card_sort));
        Ok(())
    }

    async fn save_cry(&self, result: &AggregatedResult, path: &Path) -> anyhow::Result<()> {
        let Some(url) = result.pokemon.cries.as_ref().and_then(|c| c.latest.clone()) else {
            tracing::warn!("{} has no recorded cry", result.pokemon.name);
            return Ok(());
        };
        let bytes = self.assets.get(&url).await.context("failed to download cry")?;
        tokio::fs::write(path, bytes.as_slice())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Saved cry of {} to {}", result.pokemon.name, path.display());
        Ok(())
    }
}

fn render_tab(result: &AggregatedResult, tab: Tab, moves: &mut MoveListState, cards: CardSort) -> String {
    match tab {
        Tab::Overview => render::overview(result),
        Tab::Evolution => render::evolution(result),
        Tab::Gallery => render::gallery(result),
        Tab::Moves => render::moves(&moves.view(&result.moves)),
        Tab::Matchups => render::matchups(result),
        Tab::Locations => render::locations(result),
        Tab::Cards => render::cards(result, cards),
        Tab::All => [
            render::overview(result),
            render::evolution(result),
            render::matchups(result),
            render::moves(&moves.view(&result.moves)),
            render::locations(result),
            render::gallery(result),
            render::cards(result, cards),
        ]
        .concat(),
    }
}

enum BrowseCommand {
    Query(String),
    Random,
    Tab(Tab),
    Type(String),
    Category(DamageCategory),
    Search(String),
    Sort(SortKey),
    Page(usize),
    Cards(CardSort),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

fn parse_browse_command(line: &str) -> Option<BrowseCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Some(BrowseCommand::Query(line.to_string()));
    };

    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    let arg = arg.trim();
    let command = match name {
        "q" | "quit" => BrowseCommand::Quit,
        "help" => BrowseCommand::Help,
        "random" => BrowseCommand::Random,
        "clear" => BrowseCommand::Clear,
        "tab" => Tab::from_str(arg, true)
            .map(BrowseCommand::Tab)
            .unwrap_or_else(|_| BrowseCommand::Invalid(format!("unknown tab '{}'", arg))),
        "type" if !arg.is_empty() => BrowseCommand::Type(arg.to_string()),
        "category" => DamageCategory::from_str(arg, true)
            .map(BrowseCommand::Category)
            .unwrap_or_else(|_| BrowseCommand::Invalid(format!("unknown category '{}'", arg))),
        "search" => BrowseCommand::Search(arg.to_string()),
        "sort" => SortKey::from_str(arg, true)
            .map(BrowseCommand::Sort)
            .unwrap_or_else(|_| BrowseCommand::Invalid(format!("unknown sort key '{}'", arg))),
        "page" => arg
            .parse()
            .map(BrowseCommand::Page)
            .unwrap_or_else(|_| BrowseCommand::Invalid(format!("not a page number: '{}'", arg))),
        "cards" => CardSort::from_str(arg, true)
            .map(BrowseCommand::Cards)
            .unwrap_or_else(|_| BrowseCommand::Invalid(format!("unknown card order '{}'", arg))),
        other => BrowseCommand::Invalid(format!("unknown command ':{}'", other)),
    };
    Some(command)
}

const BROWSE_HELP: &str = "\
Type a Pokémon name or number to look it up.
  :tab <overview|evolution|gallery|moves|matchups|locations|cards|all>
  :type <name>        toggle a move type filter
  :category <physical|special|status>
  :search <text>      filter moves by name
  :sort <name|power|accuracy|pp|type>
  :page <n>           move list page
  :cards <price-high|price-low|date-new|date-old>
  :clear              drop move filters
  :random             look up a random Pokémon
  :quit";

type Outcome = (QueryTicket, String, Result<AggregatedResult, AppError>);

async fn browse(app: App) -> anyhow::Result<()> {
    let mut session = Session::new(app.config.moves.page_size);
    let mut tab = Tab::Overview;
    let mut card_sort = CardSort::PriceHigh;
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", BROWSE_HELP);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_browse_command(&line) else { continue };

                let query = match command {
                    BrowseCommand::Quit => break,
                    BrowseCommand::Help => {
                        println!("{}", BROWSE_HELP);
                        continue;
                    }
                    BrowseCommand::Invalid(msg) => {
                        println!("{}", msg);
                        continue;
                    }
                    BrowseCommand::Query(query) => Some(query),
                    BrowseCommand::Random => Some(app.random_query()),
                    BrowseCommand::Tab(next) => {
                        tab = next;
                        None
                    }
                    BrowseCommand::Cards(order) => {
                        card_sort = order;
                        tab = Tab::Cards;
                        None
                    }
                    other => {
                        let moves = session.moves_mut();
                        match other {
                            BrowseCommand::Type(name) => moves.toggle_type(&name),
                            BrowseCommand::Category(category) => moves.toggle_category(category),
                            BrowseCommand::Search(text) => moves.set_search(&text),
                            BrowseCommand::Sort(key) => moves.set_sort(key),
                            BrowseCommand::Page(page) => moves.set_page(page),
                            BrowseCommand::Clear => moves.clear_filters(),
                            _ => {}
                        }
                        tab = Tab::Moves;
                        None
                    }
                };

                match query {
                    Some(query) => {
                        if let Some(cache) = app.response_cache() {
                            cache.cleanup_expired();
                        }
                        let ticket = session.begin_query();
                        let aggregator = Arc::clone(&app.aggregator);
                        let tx = tx.clone();
                        println!("Searching for {}...", query.trim());
                        tokio::spawn(async move {
                            let outcome = aggregator.resolve(&query).await;
                            let _ = tx.send((ticket, query, outcome));
                        });
                    }
                    None => print_current(&mut session, tab, card_sort),
                }
            }
            Some((ticket, query, outcome)) = rx.recv() => {
                app.log_cache_stats();
                match outcome {
                    Ok(result) => {
                        if session.complete(ticket, result) {
                            print_current(&mut session, tab, card_sort);
                        }
                    }
                    Err(e) if session.is_current(ticket) => println!("{}", e.user_message()),
                    Err(e) => tracing::debug!("Ignoring failure of superseded query {}: {}", query, e),
                }
            }
        }
    }
    Ok(())
}

fn print_current(session: &mut Session, tab: Tab, card_sort: CardSort) {
    match session.current_mut() {
        Some((result, moves)) => print!("{}", render_tab(result, tab, moves, card_sort)),
        None => println!("Nothing to show yet; look up a Pokémon first."),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Commands::SyncCards { output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.catalog.path));
            catalog::sync_catalog(&config.tcg, &output)
                .await
                .map(|count| println!("Saved {} cards to {}", count, output.display()))
                .context("card catalog sync failed")
        }
        command => match App::new(config) {
            Ok(app) => match command {
                Commands::Show { query, view } => app.show(&query, &view).await,
                Commands::Random { view } => {
                    let query = app.random_query();
                    app.show(&query, &view).await
                }
                _ => browse(app).await,
            },
            Err(e) => Err(e),
        },
    };

    if let Err(e) = outcome {
        tracing::error!("{:#}", e);
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

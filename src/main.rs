mod aggregate;
mod config;
mod filter;
mod format;
mod index;
mod router;
mod search;

pub const USER_AGENT: &str = concat!("xivsearch/", env!("CARGO_PKG_VERSION"));

use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use aggregate::ResultAggregator;
use aggregate::extracts::ExtractStore;
use aggregate::lore::XivapiLoreClient;
use config::Config;
use filter::Filter;
use index::{JsonIndexEngine, LanguageIndexRegistry};
use router::{QueryRouter, RemoteSearchClient};
use search::{ContentType, Language, SearchRequest, SearchService, Sort, SortOrder};

#[derive(Parser)]
#[command(name = "xivsearch", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search one content type, every content type (`any`), or lore
    Search {
        /// Free-text query
        query: String,
        /// Content type, e.g. item, recipe, action, npc, any, lore
        #[arg(short = 't', long = "type", default_value = "item")]
        content_type: ContentType,
        /// Filter: `name=value`, `name|=a;b`, `name=min..max`, or `name!!`
        #[arg(short, long = "filter")]
        filters: Vec<Filter>,
        /// Field to sort by; the engine's default order applies when unset
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,
        /// Search language; unsupported codes fall back to English
        #[arg(short, long, env = "XIVSEARCH_LANG", default_value = "en")]
        lang: String,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build every index of a language and report how long it took
    Ingest {
        #[arg(short, long, env = "XIVSEARCH_LANG", default_value = "en")]
        lang: String,
    },
    /// Show index readiness for every language
    Status {
        #[arg(short, long, env = "XIVSEARCH_LANG", default_value = "en")]
        lang: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("xivsearch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let extracts = ExtractStore::default();
    let extracts_loading = extracts.spawn_load(config.extracts_path());

    let http = config.http_client()?;
    let lore = match &config.lore_api_url {
        Some(url) => XivapiLoreClient::with_base_url(http.clone(), url.as_str()),
        None => XivapiLoreClient::for_region(http.clone(), config.region),
    };
    let aggregator = ResultAggregator::new(lore, config.region, extracts)
        .with_reference_paths(config.npcs_path(), config.instances_path());
    let registry = LanguageIndexRegistry::new(|language| {
        JsonIndexEngine::new(config.data_dir.join(language.code()))
            .with_max_results(config.max_results)
    });
    let service = SearchService::new(
        QueryRouter::new(config.context, config.use_local_api),
        registry,
        aggregator,
        RemoteSearchClient::new(
            http,
            config.dev_api_url.as_str(),
            config.prod_api_url.as_str(),
        ),
    );

    match cli.command {
        Command::Search {
            query,
            content_type,
            filters,
            sort,
            order,
            lang,
            json,
        } => {
            if !service.language_ready(Language::from_code_or_default(&lang)) {
                info!(%lang, "search index not built yet, ingesting");
            }
            service.set_search_language(&lang).await?;
            let sort = Sort { field: sort, order };
            let request = SearchRequest::new(query, content_type, service.search_language())
                .with_filters(filters)
                .with_sort(sort);

            // One-shot runs wait for the snapshot so item rows carry sources.
            if let Err(e) = extracts_loading.await {
                warn!(error = %e, "extracts loader task failed");
            }

            let rows = service.search(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", format::format_rows(&rows));
            }
        }
        Command::Ingest { lang } => {
            let language = Language::from_code_or_default(&lang);
            let started = Instant::now();
            service.ingest(language).await?;
            println!(
                "{language}: {} indexes ready in {}ms",
                ContentType::SEARCHABLE.len(),
                started.elapsed().as_millis()
            );
        }
        Command::Status { lang } => {
            let current = Language::from_code_or_default(&lang);
            let statuses: Vec<_> = Language::ALL
                .into_iter()
                .map(|language| format::LanguageStatus {
                    language,
                    ready: service.language_ready(language),
                    ingesting: service.is_ingesting(language),
                })
                .collect();
            print!("{}", format::format_status(&statuses, current));
        }
    }

    info!("done");
    Ok(())
}

//! Spelunker CLI - query a gazetteer backend from the command line
//!
//! Every subcommand runs one query against the backend named by
//! `--spelunker-uri` and prints the result as JSON.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ConcordanceCommand, DescendantsCommand, ListCommand, NamedListCommand, RecentCommand,
    RecordCommand, RecordFormat, SearchCommand,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "SPELUNKER_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "SPELUNKER_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    /// Backend to query, e.g. sql://sqlite?dsn=gazetteer.db
    #[arg(long, default_value = "null://", env = "SPELUNKER_URI", global = true)]
    spelunker_uri: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored record for an id
    Record(RecordCommand),
    /// Print the standard places result for an id
    Spr(RecordCommand),
    /// Print the complete GeoJSON feature for an id
    Feature(RecordCommand),
    /// List the descendants of a record
    Descendants(DescendantsCommand),
    /// Count the descendants of a record
    CountDescendants(RecordCommand),
    /// Full-text search
    Search(SearchCommand),
    /// List records modified recently
    Recent(RecentCommand),
    /// Count records per placetype
    Placetypes,
    /// List records with a placetype
    Placetype(NamedListCommand),
    /// Count records per alternate placetype
    AltPlacetypes,
    /// List records with an alternate placetype
    AltPlacetype(NamedListCommand),
    /// Count records per concordance namespace
    Concordances,
    /// List records with a concordance
    Concordance(ConcordanceCommand),
    /// Count records per tag
    Tags,
    /// List records with a tag
    Tag(NamedListCommand),
    /// List records located at 0,0
    NullIsland(ListCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.clone();

    // RUST_LOG, when set, takes full control of the filter
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "spelunker_cli={level},\
             spelunker={level},\
             spelunker_query={level},\
             spelunker_query_sql={level},\
             spelunker_query_opensearch={level},\
             sqlx=warn,\
             reqwest=warn,\
             hyper=warn",
            level = log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {}", e))?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("Opening {}", cli.spelunker_uri);
    let spelunker = spelunker::open(&cli.spelunker_uri).await?;

    match cli.command {
        Commands::Record(cmd) => cmd.execute(&spelunker, RecordFormat::Record).await,
        Commands::Spr(cmd) => cmd.execute(&spelunker, RecordFormat::Spr).await,
        Commands::Feature(cmd) => cmd.execute(&spelunker, RecordFormat::Feature).await,
        Commands::CountDescendants(cmd) => cmd.execute(&spelunker, RecordFormat::Count).await,
        Commands::Descendants(cmd) => cmd.execute(&spelunker).await,
        Commands::Search(cmd) => cmd.execute(&spelunker).await,
        Commands::Recent(cmd) => cmd.execute(&spelunker).await,
        Commands::Placetypes => commands::placetypes(&spelunker).await,
        Commands::Placetype(cmd) => cmd.placetype(&spelunker).await,
        Commands::AltPlacetypes => commands::alternate_placetypes(&spelunker).await,
        Commands::AltPlacetype(cmd) => cmd.alternate_placetype(&spelunker).await,
        Commands::Concordances => commands::concordances(&spelunker).await,
        Commands::Concordance(cmd) => cmd.execute(&spelunker).await,
        Commands::Tags => commands::tags(&spelunker).await,
        Commands::Tag(cmd) => cmd.tag(&spelunker).await,
        Commands::NullIsland(cmd) => cmd.null_island(&spelunker).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_listing_flags() {
        let cli = Cli::try_parse_from([
            "spelunker",
            "--spelunker-uri",
            "null://",
            "descendants",
            "85633793",
            "--placetype",
            "locality",
            "--isdeprecated",
            "-1",
            "--facet",
            "country",
        ])
        .unwrap();

        assert_eq!(cli.spelunker_uri, "null://");

        let Commands::Descendants(cmd) = cli.command else {
            panic!("expected descendants");
        };

        assert_eq!(cmd.id, 85633793);
        assert_eq!(cmd.list.placetype, vec!["locality".to_string()]);
        assert_eq!(cmd.list.isdeprecated.as_deref(), Some("-1"));
        assert_eq!(cmd.list.facet, vec!["country".to_string()]);
    }

    #[test]
    fn test_cursor_conflicts_with_page() {
        let result = Cli::try_parse_from([
            "spelunker",
            "null-island",
            "--page",
            "2",
            "--cursor",
            "from-20",
        ]);

        assert!(result.is_err());
    }
}

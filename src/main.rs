use clap::Parser;
use filmdex::cli::{Cli, Commands};
use filmdex::query::SearchForm;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Index { corpus, index }) => filmdex::commands::index(corpus, index),
        Some(Commands::Search {
            query,
            starring,
            director,
            language,
            location,
            time,
            categories,
            country,
            min_runtime,
            max_runtime,
            page,
            index,
        }) => {
            let form = SearchForm {
                text: query,
                starring,
                director,
                language,
                location,
                time,
                categories,
                country,
                min_runtime,
                max_runtime,
                page,
            };
            filmdex::commands::search(&form, index)
        }
        Some(Commands::Get { id, index }) => filmdex::commands::get(&id, index),
        None => {
            Cli::parse_from(["filmdex", "--help"]);
            Ok(())
        }
    }
}

use std::path::PathBuf;

use clap::Parser;
use quarry_core::{Config, RepoSession};

/// Ask a question about a GitHub repository.
///
/// Fetches the repository contents, builds an in-memory embedding index,
/// and answers the question with a chat completion grounded in the most
/// relevant chunks.
#[derive(Parser, Debug)]
#[command(
    name = "quarry",
    version,
    about = "Retrieval-augmented question answering for GitHub repositories"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "quarry.toml")]
    config: PathBuf,

    /// Print the retrieved chunks after the answer
    #[arg(long)]
    sources: bool,

    /// Repository URL, e.g. https://github.com/owner/repo
    repo_url: String,

    /// Question to answer from the repository contents
    question: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    let mut session = RepoSession::new(&config);
    tracing::info!(repo = %cli.repo_url, "loading repository");
    session.load_repository(&cli.repo_url).await?;

    let result = session.ask_question(&cli.question).await?;
    println!("{}", result.answer);

    if cli.sources {
        for (i, source) in result.sources.iter().enumerate() {
            println!("\n--- source {} ---\n{source}", i + 1);
        }
    }

    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so the answer on stdout stays pipeable.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

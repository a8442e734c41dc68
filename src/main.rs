use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use arxivtidy::run::{process_feeds, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "arxivtidy",
    about = "Deduplicate and tidy a collection of arXiv RSS feeds",
    version
)]
struct Args {
    /// Output directory for the cleaned feeds (one <subject>.xml each)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: PathBuf,

    /// Feed endpoint; the subject code is appended as a path segment
    #[arg(
        long,
        value_name = "URL",
        default_value = "http://export.arxiv.org/rss"
    )]
    base_url: String,

    /// Rewrite surviving articles with direct PDF links, [subject]
    /// title prefixes, and abstract-page links
    #[arg(long)]
    pdf_links: bool,

    /// arXiv subject codes to fetch, in priority order (e.g. cs.CV cs.CL)
    #[arg(value_name = "SUBJECT", required = true)]
    subjects: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // The reduction report is the program's output, so default to info
    // when RUST_LOG is unset.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    std::fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            args.output.display()
        )
    })?;

    let opts = RunOptions {
        base_url: args.base_url,
        output_dir: args.output,
        subjects: args.subjects,
        pdf_links: args.pdf_links,
    };

    process_feeds(&opts).await?;
    Ok(())
}

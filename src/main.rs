use clap::{Parser, Subcommand};
use flatfile::{Lookup, Site, config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatfile")]
#[command(about = "Inspect and query a flat-file content tree")]
#[command(long_about = "\
Inspect and query a flat-file content tree

The content directory is the database. Directories become pages, text files
hold their fields, everything else is attached to the page as a file.

Content structure:

  content/
  ├── site.txt                     # Site-wide fields
  ├── 1-home/                      # Page (numbered = visible)
  │   └── home.txt                 # Content file; its name is the template
  ├── 2-blog/
  │   ├── blog.txt
  │   └── 1-first-post/
  │       ├── article.txt          # Title: Hello\\n----\\nText: ...
  │       ├── photo.jpg            # File
  │       ├── photo.txt            # Meta sidecar for photo.jpg
  │       └── photo.thumb.jpg      # Thumbnail for photo.jpg
  └── error/                       # No number = invisible
      └── error.txt

Run 'flatfile gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    content: PathBuf,

    /// Config file (defaults apply when it doesn't exist)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the page tree
    Tree,
    /// Show one page with its fields and files
    Show {
        /// Page uri, e.g. blog/first-post
        uri: String,
        /// Print the page as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Full-text search across all pages
    Search {
        query: String,
    },
    /// Validate the content directory and templates
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Tree => {
            let site = Site::open(&cli.content, &cli.config)?;
            output::print_tree(&site)?;
        }
        Command::Show { uri, json } => {
            let site = Site::open(&cli.content, &cli.config)?;
            match site.find(&uri) {
                Lookup::Found(page) if json => println!("{}", page.to_json()?),
                Lookup::Found(page) => output::print_page(&page)?,
                Lookup::NotFound => return Err(format!("no page at '{uri}'").into()),
                Lookup::IoError(reason) => return Err(reason.into()),
            }
        }
        Command::Search { query } => {
            let site = Site::open(&cli.content, &cli.config)?;
            let results = site.search(&query)?;
            output::print_search(&query, &results);
        }
        Command::Check => {
            println!("==> Checking {}", cli.content.display());
            let site = Site::open(&cli.content, &cli.config)?;
            output::print_tree(&site)?;
            let problems = output::format_check(&site)?;
            if problems.is_empty() {
                println!("==> Content is valid");
            } else {
                for problem in &problems {
                    println!("    {}", problem);
                }
                return Err(format!("{} problems found", problems.len()).into());
            }
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "flatfile=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

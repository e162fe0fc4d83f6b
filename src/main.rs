use agetech_kb::config::{find_config_file, load_config, Config, CONFIG_FILE_NAME};
use agetech_kb::models::{PaperStore, ResearcherProfile};
use agetech_kb::pipeline::{
    coauthor_graph, read_profiles, top_authors, Pipeline, RunOptions, DEFAULT_DEPTH,
    DEFAULT_MAX_NODES,
};
use agetech_kb::sources::OrcidSource;
use agetech_kb::ui::{self, Spinner, Status};
use agetech_kb::utils::{SnapshotCache, StageOptions, PAPERS_CACHE};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// AgeTech KB - Build a researcher knowledge base from OpenAlex, ORCID and ROR
#[derive(Parser, Debug)]
#[command(name = "agetech-kb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build a researcher knowledge base for technology and aging research", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and write authors.json / papers.json
    Run {
        /// Rebuild every stage, ignoring all caches
        #[arg(long)]
        from_scratch: bool,

        /// Refetch papers from OpenAlex
        #[arg(long)]
        from_scratch_papers: bool,

        /// Re-aggregate authors from the paper store
        #[arg(long)]
        from_scratch_authors: bool,

        /// Resolve affiliations again for every selected author
        #[arg(long)]
        from_scratch_affiliations: bool,

        /// Request summaries again for every selected author
        #[arg(long)]
        from_scratch_summaries: bool,

        /// Do not persist new affiliations or summaries
        #[arg(long)]
        no_update_cache: bool,

        /// Skip the AI summary stage
        #[arg(long)]
        skip_summaries: bool,

        /// Number of top authors to enrich
        #[arg(long)]
        top: Option<usize>,
    },

    /// Build or load the paper store and report its size
    Papers {
        /// Refetch papers from OpenAlex
        #[arg(long)]
        from_scratch: bool,
    },

    /// List the top authors by publication count
    Authors {
        /// Re-aggregate authors from the paper store
        #[arg(long)]
        from_scratch: bool,

        /// Number of authors to list
        #[arg(long)]
        top: Option<usize>,
    },

    /// Show one researcher from authors.json
    Show {
        /// OpenAlex author id (full URL or short `A...` form)
        author_id: String,
    },

    /// Show the co-author network around one researcher
    Network {
        /// OpenAlex author id (full URL or short `A...` form)
        author_id: String,

        /// Maximum expansion depth
        #[arg(long, default_value_t = DEFAULT_DEPTH)]
        depth: usize,

        /// Maximum number of co-authors beyond the root
        #[arg(long, default_value_t = DEFAULT_MAX_NODES)]
        max_nodes: usize,
    },

    /// Fetch a researcher's ORCID biography
    Biography {
        /// ORCID identifier (bare or URL form)
        orcid: String,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Destination path
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("AgeTech KB - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  OPENAI_API_KEY              API key for AI summaries (summaries are skipped without it)");
    println!("  OPENALEX_EMAIL              Email for OpenAlex 'polite pool' access");
    println!();
    println!("Configuration Overrides (nested keys use '__'):");
    println!("  AGETECH_KB_KEYWORDS__TECH           Comma-separated technology keywords");
    println!("  AGETECH_KB_KEYWORDS__HEALTH         Comma-separated health keywords");
    println!("  AGETECH_KB_OPENALEX__MAX_PAGES      Page ceiling per keyword pair (default: 10)");
    println!("  AGETECH_KB_OPENALEX__PAGE_DELAY_MS  Pause after every page in ms (default: 100)");
    println!("  AGETECH_KB_LLM__MODEL               Chat model for summaries (default: gpt-4.1-mini)");
    println!("  AGETECH_KB_RANKING__TOP_AUTHORS     Number of authors to enrich (default: 100)");
    println!("  AGETECH_KB_RANKING__COAUTHOR_THRESHOLD  Team size that stops co-author counting (default: 10)");
    println!("  AGETECH_KB_CACHE__DIRECTORY         Snapshot cache directory (default: ./cache)");
    println!("  AGETECH_KB_CACHE__ROR_TABLE         ROR data dump CSV (default: ./cache/ror.csv)");
    println!("  AGETECH_KB_OUTPUT__DIRECTORY        Output directory (default: .)");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export OPENAI_API_KEY=\"your-key-here\"");
    println!("  export AGETECH_KB_RANKING__TOP_AUTHORS=\"50\"");
    std::process::exit(0);
}

/// Find a researcher by full id or by the short `A...` suffix
fn find_profile<'a>(
    profiles: &'a IndexMap<String, ResearcherProfile>,
    author_id: &str,
) -> Option<&'a ResearcherProfile> {
    profiles.get(author_id).or_else(|| {
        profiles
            .values()
            .find(|p| p.author.short_id() == author_id)
    })
}

fn load_profiles(config: &Config) -> Result<IndexMap<String, ResearcherProfile>> {
    read_profiles(&config.output.directory)
        .context("Failed to read researcher output")?
        .with_context(|| {
            format!(
                "No authors.json in {}; run `agetech-kb run` first",
                config.output.directory.display()
            )
        })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("agetech_kb={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    let format = cli.output.resolve();
    let show_progress = !cli.quiet && std::io::stderr().is_terminal();

    match cli.command {
        Some(Commands::Run {
            from_scratch,
            from_scratch_papers,
            from_scratch_authors,
            from_scratch_affiliations,
            from_scratch_summaries,
            no_update_cache,
            skip_summaries,
            top,
        }) => {
            if let Some(top) = top {
                config.ranking.top_authors = top;
            }

            let mut options = RunOptions {
                skip_summaries,
                show_progress,
                ..Default::default()
            }
            .update_cache(!no_update_cache);
            if from_scratch {
                options = options.from_scratch();
            }
            options.papers.from_scratch |= from_scratch_papers;
            options.authors.from_scratch |= from_scratch_authors || from_scratch_papers;
            options.affiliations.from_scratch |= from_scratch_affiliations;
            options.summaries.from_scratch |= from_scratch_summaries;

            let pipeline = Pipeline::from_config(config)?;
            let report = pipeline.run(&options).await?;

            match format {
                OutputFormat::Json => print_json(&report)?,
                _ => ui::print_report(&report),
            }
        }

        Some(Commands::Papers { from_scratch }) => {
            let pipeline = Pipeline::from_config(config)?;
            let spinner = Spinner::new("Building paper store", show_progress);
            let options = if from_scratch {
                StageOptions::from_scratch()
            } else {
                StageOptions::default()
            };

            match pipeline.papers(options).await {
                Ok(store) => {
                    spinner.finish_with_success(&format!(
                        "{} papers in store",
                        ui::format_number(store.len() as u64)
                    ));
                    if format == OutputFormat::Json {
                        print_json(&serde_json::json!({ "papers": store.len() }))?;
                    }
                }
                Err(e) => {
                    spinner.finish_with_error("Failed to build paper store");
                    return Err(e.into());
                }
            }
        }

        Some(Commands::Authors { from_scratch, top }) => {
            let pipeline = Pipeline::from_config(config)?;
            let options = if from_scratch {
                StageOptions::from_scratch()
            } else {
                StageOptions::default()
            };

            let store = pipeline.papers(StageOptions::default()).await?;
            let index = pipeline.authors(&store, options)?;
            let n = top.unwrap_or(pipeline.config().ranking.top_authors);
            let authors = top_authors(&index, n);

            match format {
                OutputFormat::Json => print_json(&authors)?,
                OutputFormat::Plain => {
                    for author in &authors {
                        println!(
                            "{}\t{}\t{}\t{}",
                            author.id,
                            author.name(),
                            author.publication_count.total,
                            author.citation_count.total
                        );
                    }
                }
                _ => {
                    use comfy_table::{Attribute, Cell, Table};
                    let mut table = Table::new();
                    table.load_preset(comfy_table::presets::UTF8_FULL);
                    table.set_header(vec!["Name", "Papers", "Citations", "First", "Last", "ID"]);

                    for author in &authors {
                        table.add_row(vec![
                            Cell::new(ui::truncate_with_ellipsis(author.name(), 40))
                                .add_attribute(Attribute::Bold),
                            Cell::new(author.publication_count.total),
                            Cell::new(ui::format_number(author.citation_count.total)),
                            Cell::new(author.publication_count.first),
                            Cell::new(author.publication_count.last),
                            Cell::new(author.short_id()),
                        ]);
                    }
                    println!("{table}");
                    ui::print_status(
                        Status::Info,
                        &format!("{} of {} authors", authors.len(), index.len()),
                    );
                }
            }
        }

        Some(Commands::Show { author_id }) => {
            let profiles = load_profiles(&config)?;
            let Some(profile) = find_profile(&profiles, &author_id) else {
                bail!("No researcher {} in authors.json", author_id);
            };

            match format {
                OutputFormat::Json => print_json(profile)?,
                _ => {
                    let store: Option<PaperStore> =
                        SnapshotCache::new(&config.cache.directory, PAPERS_CACHE)
                            .load()
                            .context("Failed to read paper cache")?;
                    ui::print_researcher(profile, &profiles, store.as_ref());
                }
            }
        }

        Some(Commands::Network {
            author_id,
            depth,
            max_nodes,
        }) => {
            let profiles = load_profiles(&config)?;
            let Some(profile) = find_profile(&profiles, &author_id) else {
                bail!("No researcher {} in authors.json", author_id);
            };

            let graph = coauthor_graph(&profiles, profile.id(), depth, max_nodes);
            match format {
                OutputFormat::Json => print_json(&graph)?,
                _ => ui::print_graph(&graph, &profiles),
            }
        }

        Some(Commands::Biography { orcid }) => {
            let source = OrcidSource::new(&config.orcid)?;
            let bare = orcid.trim_end_matches('/').rsplit('/').next().unwrap_or(&orcid);
            let biography = source
                .biography(bare)
                .await
                .with_context(|| format!("Failed to fetch ORCID record {}", bare))?;

            match (format, biography) {
                (OutputFormat::Json, biography) => print_json(&serde_json::json!({
                    "orcid": bare,
                    "biography": biography,
                }))?,
                (_, Some(text)) => println!("{}", text),
                (_, None) => ui::print_status(Status::Warning, "No biography on record"),
            }
        }

        Some(Commands::InitConfig { path, force }) => {
            let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ui::print_status(
                Status::Success,
                &format!("Wrote default configuration to {}", path.display()),
            );
        }

        None => {
            ui::print_status(
                Status::Info,
                "No command given. Try `agetech-kb run` or `agetech-kb --help`.",
            );
            ui::print_divider();
            println!("Cache directory:  {}", config.cache.directory.display());
            println!("Output directory: {}", config.output.directory.display());
            println!(
                "Keyword pairs:    {} x {}",
                config.keywords.tech.len(),
                config.keywords.health.len()
            );
        }
    }

    Ok(())
}

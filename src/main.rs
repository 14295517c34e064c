use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use themescope::config::Config;
use themescope::output::{insights, terminal};
use themescope::pipeline::thematic;
use themescope::records::table;
use themescope::themes::assign::ThemeAssigner;

/// themescope: thematic analysis for mobile-banking app reviews.
///
/// Extracts TF-IDF keywords from each review, tags reviews with themes from
/// a keyword dictionary, and summarizes the results per bank.
#[derive(Parser)]
#[command(name = "themescope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract keywords and assign themes to every review
    Run {
        /// Sentiment-enriched review table (CSV)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Where to write the theme-enriched table (CSV)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keywords kept per review (default: 3)
        #[arg(long)]
        top_n: Option<usize>,

        /// TF-IDF vocabulary cap (default: 1000)
        #[arg(long)]
        max_features: Option<usize>,
    },

    /// Build the per-bank insights report from the enriched table
    Report {
        /// Theme-enriched review table (CSV)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Where to write the JSON report
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load the enriched table into the SQLite database
    #[cfg(feature = "sqlite")]
    Load {
        /// Theme-enriched review table (CSV)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Show the active theme dictionary
    Themes,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("themescope=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            top_n,
            max_features,
        } => {
            let mut config = Config::load()?;
            if let Some(input) = input {
                config.input_path = input;
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            if let Some(n) = top_n {
                config.top_n_keywords = n;
            }
            if let Some(k) = max_features {
                config.max_features = k;
            }
            config.require_input()?;
            config.require_extractor()?;

            // Resolve every resource up front so a bad dictionary or lemma
            // file fails before any work is done.
            let dictionary = config.theme_dictionary()?;
            let assigner = ThemeAssigner::new(&dictionary)?;
            let normalizer = config.normalizer(&dictionary)?;
            let extractor = config.extractor();

            info!(
                input = %config.input_path.display(),
                themes = dictionary.len(),
                top_n = extractor.top_n_keywords,
                max_features = extractor.max_features,
                "Starting thematic analysis"
            );

            let summary = thematic::run(
                &config.input_path,
                &config.output_path,
                &normalizer,
                &extractor,
                &assigner,
            )?;

            terminal::display_run_summary(&summary);
            println!(
                "\nEnriched table written to {}",
                config.output_path.display().to_string().bold()
            );
            println!(
                "{}",
                "Next: run `themescope report` for per-bank insights.".dimmed()
            );
        }

        Commands::Report { input, output } => {
            let mut config = Config::load()?;
            if let Some(input) = input {
                config.output_path = input;
            }
            if let Some(output) = output {
                config.report_path = output;
            }
            config.require_enriched()?;

            let records = table::read_enriched(&config.output_path)?;
            let report = insights::build_report(&records);

            terminal::display_report(&report);
            insights::save_report(&report, &config.report_path)?;
            println!(
                "Insights saved to {}",
                config.report_path.display().to_string().bold()
            );
        }

        #[cfg(feature = "sqlite")]
        Commands::Load { input } => {
            use themescope::db;

            let mut config = Config::load()?;
            if let Some(input) = input {
                config.output_path = input;
            }
            config.require_enriched()?;

            let records = table::read_enriched(&config.output_path)?;

            let mut conn = db::initialize(&config.db_path)?;
            let loaded = db::queries::replace_reviews(&mut conn, &records)?;
            db::queries::set_state(&conn, "last_load_at", &chrono::Utc::now().to_rfc3339())?;
            db::queries::set_state(
                &conn,
                "last_load_source",
                &config.output_path.display().to_string(),
            )?;

            let stored = db::queries::review_count(&conn)?;
            let tables = db::schema::table_count(&conn)?;
            info!(loaded, stored, "Loaded reviews into database");

            println!("Database: {} ({tables} tables)", config.db_path);
            println!("Reviews stored: {}", stored.to_string().bold());

            let themes = db::queries::theme_counts(&conn)?;
            if !themes.is_empty() {
                println!("\n  {}", "Reviews per theme".bold());
                for (label, count) in themes {
                    println!("    {:<32} {:>6}", label, count);
                }
            }
        }

        Commands::Themes => {
            let config = Config::load()?;
            let dictionary = config.theme_dictionary()?;
            terminal::display_dictionary(&dictionary);

            match &config.themes_path {
                Some(path) => println!("{}", format!("Loaded from {}", path.display()).dimmed()),
                None => println!(
                    "{}",
                    "Built-in banking themes. Set THEMESCOPE_THEMES to use your own.".dimmed()
                ),
            }
        }
    }

    Ok(())
}

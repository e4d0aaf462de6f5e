use article_images::config::{self, Config, Credentials};
use article_images::imaging::RustBackend;
use article_images::ladder::LADDER;
use article_images::output;
use article_images::pipeline::{self, PipelineSettings};
use article_images::supabase::SupabaseClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "article-images")]
#[command(about = "Publish freshly generated article images as cropped WebP variants")]
#[command(long_about = "\
Publish freshly generated article images as cropped WebP variants

Every image in the images directory is matched to the article whose
image_standard column holds its filename. Matched images are cropped and
resized into the variant ladder, uploaded to Supabase Storage, written
back to the article's image columns, and the article is published. The
raw file and temporary variants are removed afterwards.

Unmatched images are left in place for a later run.

Credentials come from the environment (a .env file is loaded first):
  SUPABASE_URL           https://<project>.supabase.co
  SUPABASE_SERVICE_KEY   service role key

Log verbosity follows RUST_LOG (default: info).

Run 'article-images gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (optional; stock defaults when absent)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Override the images directory from the config
    #[arg(long, global = true)]
    images_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every pending image: generate, upload, update, publish, clean
    Run,
    /// List pending images and their matching articles without changing anything
    Check,
    /// Print the variant ladder and its column mapping
    Ladder,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;
            let settings = PipelineSettings::from_config(&config);
            let batch = pipeline::run_batch(&RustBackend::new(), &client, &client, &settings)?;
            output::print_batch_output(&batch);
        }
        Command::Check => {
            let config = load_config(&cli)?;
            let client = connect(&config)?;
            let settings = PipelineSettings::from_config(&config);
            let entries = pipeline::check_batch(&client, &settings)?;
            output::print_check_output(&entries);
        }
        Command::Ladder => {
            output::print_ladder(&LADDER);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, config::ConfigError> {
    let mut config = config::load_config(&cli.config)?;
    if let Some(dir) = &cli.images_dir {
        config.images_dir = dir.clone();
    }
    Ok(config)
}

fn connect(config: &Config) -> Result<SupabaseClient, Box<dyn std::error::Error>> {
    let credentials = Credentials::from_env()?;
    let client = SupabaseClient::new(
        &credentials.url,
        &credentials.service_key,
        config.records.clone(),
        config.http.timeout(),
    )?;
    Ok(client)
}

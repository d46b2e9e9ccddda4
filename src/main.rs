use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use helmetscan::config::AppConfig;
use helmetscan::core::db::CredentialDb;
use helmetscan::detection::{DetectionPipeline, ReplayEngine};
use helmetscan::shell::{
    Accounts, Analyzer, MSG_LOGGED_IN, MSG_SIGNED_UP, MSG_USERNAME_TAKEN, MSG_WRONG_CREDENTIALS,
    Session,
};

#[derive(Parser)]
#[command(name = "helmetscan")]
#[command(about = "Detect helmets in images for registered users")]
struct Cli {
    /// Path to a TOML config file (overrides HELMETSCAN_CONFIG)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new user
    Signup { username: String, password: String },

    /// Check a username and password
    Login { username: String, password: String },

    /// Log in and run helmet detection on an image
    Detect {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Where to save the annotated image
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let cfg = match &args.config {
        Some(path) => AppConfig::load_from(Some(path.as_path()))?,
        None => AppConfig::load()?,
    };
    let accounts = Accounts::new(CredentialDb::open(&cfg.db_path).await?);
    let mut session = Session::new();

    match args.command {
        Command::Signup { username, password } => {
            if accounts.signup(&mut session, &username, &password).await? {
                println!("{}", MSG_SIGNED_UP);
            } else {
                println!("{}", MSG_USERNAME_TAKEN);
                std::process::exit(1);
            }
        }
        Command::Login { username, password } => {
            if accounts.login(&mut session, &username, &password).await? {
                println!("{}", MSG_LOGGED_IN);
            } else {
                println!("{}", MSG_WRONG_CREDENTIALS);
                std::process::exit(1);
            }
        }
        Command::Detect {
            username,
            password,
            image_path,
            out,
        } => {
            if !accounts.login(&mut session, &username, &password).await? {
                println!("{}", MSG_WRONG_CREDENTIALS);
                std::process::exit(1);
            }

            let engine = ReplayEngine::load(&cfg.detection.weights)?;
            let pipeline = DetectionPipeline::new(
                Arc::new(engine),
                cfg.detection.confidence_threshold,
                cfg.detection.class_labels.clone(),
            );
            let analyzer = Analyzer::new(pipeline);

            let filename = image_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = std::fs::read(&image_path)?;

            match analyzer.analyze_upload(&session, &filename, &bytes).await {
                Ok(result) => {
                    println!("\n=== Helmet Detection Results ===");
                    println!("Total detections: {}", result.detections.len());
                    for label in &result.detections {
                        println!("  {}", label);
                    }
                    if let Some(out) = out {
                        result
                            .annotated_image
                            .save(&out)
                            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
                        println!("Annotated image saved to {:?}", out);
                    }
                }
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

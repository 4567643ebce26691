mod pipeline;

use std::path::PathBuf;

use adreel_media::TrimConfig;
use adreel_resolver::RankingStrategy;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pipeline::{RunOptions, ScriptSource};

#[derive(Parser, Debug)]
#[command(name = "adreel")]
#[command(about = "Turn a campaign idea into an ad script with matched stock clips", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate (or load) a script and resolve a clip for every scene
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Campaign idea to write the script from
    #[arg(short, long, conflicts_with = "script", required_unless_present = "script")]
    idea: Option<String>,

    /// Existing script JSON file, skips script generation
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Result JSON path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ranking strategy: model or embedding
    #[arg(long, env = "RESOLVER_RANKING")]
    ranking: Option<RankingStrategy>,

    /// Download and trim the matched clips
    #[arg(long)]
    trim: bool,

    /// Download cache for source clips
    #[arg(long, env = "TRIM_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Directory for trimmed clips
    #[arg(long, env = "TRIM_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

impl GenerateArgs {
    fn into_options(self) -> RunOptions {
        let source = match (self.idea, self.script) {
            (_, Some(path)) => ScriptSource::File(path),
            (Some(idea), None) => ScriptSource::Idea(idea),
            (None, None) => ScriptSource::Idea(String::new()),
        };

        let trim = self.trim.then(|| {
            let mut config = TrimConfig::from_env();
            if let Some(dir) = self.work_dir {
                config.work_dir = dir;
            }
            if let Some(dir) = self.output_dir {
                config.output_dir = dir;
            }
            config
        });

        RunOptions {
            source,
            ranking: self.ranking,
            trim,
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adreel=info,warn"));

    // Logs go to stderr so JSON results on stdout stay clean
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    match cli.command {
        Command::Generate(args) => {
            let output_path = args.output.clone();
            let output = match pipeline::run(args.into_options(), cancel_rx).await {
                Ok(output) => output,
                Err(e) => {
                    error!("Pipeline failed: {:#}", e);
                    std::process::exit(1);
                }
            };
            pipeline::write_output(&output, output_path.as_deref()).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("adreel").chain(args.iter().copied()))
    }

    #[test]
    fn test_idea_or_script_is_required() {
        assert!(parse(&["generate"]).is_err());
        assert!(parse(&["generate", "--idea", "x", "--script", "s.json"]).is_err());
    }

    #[test]
    fn test_script_file_source() {
        let Command::Generate(args) = parse(&["generate", "--script", "s.json", "--ranking", "embedding"])
            .unwrap()
            .command;
        let options = args.into_options();

        assert_eq!(options.source, ScriptSource::File(PathBuf::from("s.json")));
        assert_eq!(options.ranking, Some(RankingStrategy::Embedding));
        assert!(options.trim.is_none());
    }

    #[test]
    fn test_trim_dirs_override_config() {
        let Command::Generate(args) = parse(&[
            "generate",
            "--idea",
            "summer sale",
            "--trim",
            "--work-dir",
            "/tmp/cache",
            "--output-dir",
            "/tmp/clips",
        ])
        .unwrap()
        .command;
        let options = args.into_options();

        assert_eq!(options.source, ScriptSource::Idea("summer sale".into()));
        let trim = options.trim.unwrap();
        assert_eq!(trim.work_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(trim.output_dir, PathBuf::from("/tmp/clips"));
    }
}

mod output;

use anyhow::Context;
use clap::Parser;
use output::{print_json, print_warnings, ConsoleSink};
use std::path::PathBuf;
use svcpatch_core::{
    paths,
    run::{preflight, run_all},
    runner::SystemRunner,
    settings::Settings,
};

#[derive(Parser)]
#[command(
    name = "svcpatch",
    about = "Enable metrics on the Artifactory and Mattermost containers and reload them",
    version
)]
struct Cli {
    /// Settings file overriding paths, container names and commands
    #[arg(long, env = "SVCPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Print the run summary as JSON (status lines go to stderr)
    #[arg(long, short = 'j')]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("❌ error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let home = paths::home_dir()?;
    let settings = settings.resolve(&home);

    let warnings = settings.validate();
    print_warnings(&warnings);
    if Settings::has_errors(&warnings) {
        anyhow::bail!("invalid settings; fix the errors above");
    }
    preflight(&settings)?;

    let sink = ConsoleSink::new(cli.json);
    sink.line("🔧 Starting Additional Services Patcher...");

    let summary = run_all(&settings, &SystemRunner, &sink)?;
    tracing::debug!(?summary, "run complete");

    if cli.json {
        print_json(&summary)?;
    } else {
        sink.line("\n✨ All patches applied successfully.");
    }
    Ok(())
}

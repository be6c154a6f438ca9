use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use hpi_update::config::{DependencyPolicy, ResolverConfig};
use hpi_update::logging::{self, LogFile};
use hpi_update::resolve::update::update_plugins_file;
use hpi_update::version::registries::UpdateCenter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nGit Commit Hash: ",
    env!("HPI_UPDATE_GIT_HASH"),
    "\nBuild Time: ",
    env!("HPI_UPDATE_BUILD_TIME"),
);

#[derive(Parser)]
#[command(name = "hpi-update")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Resolve the newest Jenkins plugin versions compatible with a Jenkins release")]
struct Cli {
    /// Target Jenkins version
    #[arg(long)]
    jenkins: Option<String>,

    /// Declared plugin list
    #[arg(long, default_value = "jenkins_plugins_test.yml")]
    src: PathBuf,

    /// Where to write the updated plugin list
    #[arg(long, default_value = "jenkins_plugins_latest.yml")]
    dest: PathBuf,

    /// Plugins resolved at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// What to do when a dependency cannot be installed
    #[arg(long, value_enum)]
    dependency_policy: Option<DependencyPolicy>,

    /// Java version to check Minimum-Java-Version against
    #[arg(long)]
    java: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write JSON logs, to the data directory when no path is given
    #[arg(long, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,
}

impl Cli {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::load(path)?,
            None => ResolverConfig::default(),
        };

        if let Some(jenkins) = &self.jenkins {
            config.jenkins_version = jenkins.clone();
        }
        if let Some(java) = &self.java {
            config.java_version = Some(java.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(policy) = self.dependency_policy {
            config.dependency_policy = policy;
        }
        Ok(config.validate()?)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolver_config()?;
    let source = Arc::new(UpdateCenter::from_config(&config.update_center)?);

    let lines = update_plugins_file(source, &config, &cli.src, &cli.dest).await?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match logging::init(&LogFile::from_flag(cli.log_file.clone())) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    ExitCode::from(exit_status(result))
}

/// Process exit status for `result`, logging a fatal error
fn exit_status(result: anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            1
        }
    }
}

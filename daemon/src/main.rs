//! callverify daemon: entry point for running the operator console.

use anyhow::Context;
use callverify_console::app::load_directory;
use callverify_console::{Console, ConsoleConfig, DirectoryKind, ShutdownController};
use callverify_utils::{init_tracing, mask_secret, LogFormat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "callverify-daemon", about = "Operator-assisted caller verification console")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CALLVERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP console binds to.
    #[arg(long, env = "CALLVERIFY_BIND_ADDRESS")]
    bind_address: Option<String>,

    #[arg(long, env = "CALLVERIFY_PORT")]
    port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CALLVERIFY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CALLVERIFY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Delay before the caller view reads "completed", in milliseconds.
    #[arg(long, env = "CALLVERIFY_COMPLETION_DELAY_MS")]
    completion_delay_ms: Option<u64>,

    /// Duo Auth API base URL.
    #[arg(long, env = "DUO_API_URL")]
    duo_api_url: Option<String>,

    /// Duo integration key.
    #[arg(long, env = "DUO_IKEY", hide_env_values = true)]
    duo_ikey: Option<String>,

    /// Duo secret key.
    #[arg(long, env = "DUO_SKEY", hide_env_values = true)]
    duo_skey: Option<String>,

    /// Identity directory endpoint; switches the directory to HTTP.
    #[arg(long, env = "CALLVERIFY_DIRECTORY_URL")]
    directory_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Serve the operator console until SIGINT/SIGTERM.
    Serve,
    /// Load the identity directory once and print it.
    Identities,
    /// Print the effective configuration (credentials masked).
    Config,
}

impl Cli {
    /// Layer flags and env vars over `base`.
    fn apply(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(addr) = &self.bind_address {
            config.bind_address = addr.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(delay) = self.completion_delay_ms {
            config.completion_delay_ms = delay;
        }
        if let Some(url) = &self.duo_api_url {
            config.duo.api_url = url.clone();
        }
        if let Some(ikey) = &self.duo_ikey {
            config.duo.integration_key = ikey.clone();
        }
        if let Some(skey) = &self.duo_skey {
            config.duo.secret_key = skey.clone();
        }
        if let Some(url) = &self.directory_url {
            config.directory.kind = DirectoryKind::Http;
            config.directory.url = Some(url.clone());
        }
        config
    }

    fn load_config(&self) -> anyhow::Result<ConsoleConfig> {
        let base = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                ConsoleConfig::from_toml_file(&path)
                    .with_context(|| format!("failed to load config file {path}"))?
            }
            None => ConsoleConfig::default(),
        };
        Ok(self.apply(base))
    }
}

fn log_effective_config(config: &ConsoleConfig) {
    tracing::info!(
        bind = %format!("{}:{}", config.bind_address, config.port),
        completion_delay_ms = config.completion_delay_ms,
        "console configuration"
    );
    let api_url = if config.duo.api_url.is_empty() {
        "Not Set"
    } else {
        config.duo.api_url.as_str()
    };
    tracing::info!(
        api_url,
        integration_key = %mask_secret(&config.duo.integration_key),
        secret_key = %mask_secret(&config.duo.secret_key),
        "Duo configuration"
    );
    tracing::info!(kind = ?config.directory.kind, "identity directory");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.log_level, config.log_format);

    match cli.command {
        Command::Serve => {
            log_effective_config(&config);
            let addr = config.socket_addr()?;
            let console = Console::from_config(&config).await?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            let shutdown = ShutdownController::new();
            let mut server = tokio::spawn(console.serve(listener, shutdown.signalled()));
            tokio::select! {
                reason = shutdown.wait_for_signal() => {
                    tracing::info!(%reason, "shutdown signal received");
                    server.await.context("console task panicked")??;
                }
                result = &mut server => {
                    result.context("console task panicked")??;
                }
            }
            tracing::info!("callverify daemon exited cleanly");
        }
        Command::Identities => {
            let directory = load_directory(&config.directory).await?;
            if let Some(reason) = directory.load_error() {
                anyhow::bail!("identity directory unavailable: {reason}");
            }
            for option in directory.options() {
                println!("{}\t{}\t{}", option.handle, option.label, option.contact_status.as_str());
            }
        }
        Command::Config => {
            config.validate()?;
            print!("{}", config.to_masked_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "callverify-daemon",
            "--port",
            "9001",
            "--log-format",
            "json",
            "--duo-api-url",
            "https://api-abc.duosecurity.com",
            "--directory-url",
            "http://directory.internal",
            "serve",
        ]);
        let config = cli.apply(ConsoleConfig::default());
        assert_eq!(config.port, 9001);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.duo.api_url, "https://api-abc.duosecurity.com");
        assert_eq!(config.directory.kind, DirectoryKind::Http);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(cli.command, Command::Serve);
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let cli = Cli::parse_from(["callverify-daemon", "config"]);
        let base = ConsoleConfig::from_toml_str("port = 8123\n[duo]\nsecret_key = \"s3cr3t-value\"")
            .unwrap();
        let config = cli.apply(base.clone());
        assert_eq!(config.port, 8123);
        assert_eq!(config.duo.secret_key, base.duo.secret_key);
    }
}

//! Triton CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use triton_api::{ArtifactCache, TritonApi};
use triton_cli::cli::{Cli, Commands};
use triton_cli::commands::{
    ChangefeedCommand, ImageCommand, InstanceCommand, LookupCommand, LookupKind, RbacCommand,
    VolumeCommand, VpcCommand,
};
use triton_cli::output::OutputFormat;
use triton_cli::{CliError, load_key, resolve_profile};
use triton_cloudapi::{ClientConfig, CloudApi, config_dir};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("triton: error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// 3 for missing resources, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_dir = config_dir().context("locating configuration directory")?;
    let profile = resolve_profile(&cli.profile, &config_dir, |name| std::env::var(name).ok())?;
    debug!(profile = ?profile.name, url = %profile.url, account = %profile.account, "profile resolved");
    let key = load_key(&profile).await?;
    let cloudapi = CloudApi::new(&profile, &ClientConfig::for_cli(), key).map_err(CliError::from)?;
    let api = TritonApi::new(cloudapi).with_cache(ArtifactCache::for_profile(&config_dir, &profile));

    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Instance { command } => {
            let cmd = InstanceCommand::new(&api);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Image { command } => {
            let cmd = ImageCommand::new(&api);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Package { command } => {
            let cmd = LookupCommand::new(&api, LookupKind::Package);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Network { command } => {
            let cmd = LookupCommand::new(&api, LookupKind::Network);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Fwrule { command } => {
            let cmd = LookupCommand::new(&api, LookupKind::FirewallRule);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Key { command } => {
            let cmd = LookupCommand::new(&api, LookupKind::Key);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Vpc { command } => {
            let cmd = VpcCommand::new(&api);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Volume { command } => {
            let cmd = VolumeCommand::new(&api);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Account => {
            let cmd = RbacCommand::new(&api);
            cmd.account(&mut stdout, &format).await?;
        }
        Commands::Rbac { command } => {
            let cmd = RbacCommand::new(&api);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Changefeed(args) => {
            let cmd = ChangefeedCommand::new(&api);
            cmd.execute(&mut stdout, &format, args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use triton_api::Error as ApiError;

    #[test]
    fn exit_code_follows_cli_error() {
        let not_found = anyhow::Error::from(CliError::from(ApiError::not_found("gone")));
        assert_eq!(exit_code(&not_found), 3);
        let usage = anyhow::Error::from(CliError::from(ApiError::usage("bad")));
        assert_eq!(exit_code(&usage), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn exit_code_survives_context() {
        let err = anyhow::Error::from(CliError::from(ApiError::not_found("gone")))
            .context("resolving instance");
        assert_eq!(exit_code(&err), 3);
    }
}

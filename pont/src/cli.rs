//! # CLI
//!
//! This module defines the command-line interface of `pont` using `clap`.
//!
//! Flags override the values of the optional TOML configuration file, which in turn
//! override the built-in defaults.
use clap::Parser;
use pont_core::{ConfigError, ProxyConfig};
use std::{net::SocketAddr, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pont", version, about = "gRPC-Web to gRPC bridge for browser clients")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to accept gRPC-Web requests on (e.g. 127.0.0.1:3000)
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// The upstream gRPC server URL (e.g. http://localhost:4001)
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Fully qualified name of the proxied service (e.g. habits.HabitService)
    #[arg(long, value_parser = parse_service)]
    pub service: Option<String>,
}

impl Cli {
    /// Resolves the effective configuration: defaults, then the config file, then flags.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProxyConfig::load(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.url = upstream;
        }
        if let Some(service) = self.service {
            config.service = service;
        }

        Ok(config)
    }
}

fn parse_service(value: &str) -> Result<String, String> {
    let value = value.trim().trim_matches('/');

    if value.is_empty() || value.contains('/') {
        return Err(format!(
            "Invalid service name: '{value}'. Expected 'package.Service'"
        ));
    }

    Ok(value.to_string())
}

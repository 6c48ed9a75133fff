//! # CLI
//!
//! This module defines the command-line interface of `mongo-grpc-proxy` using `clap`.
//!
//! It parses the connection string and resolves it, together with the remaining flags, into a
//! [`ProxyConfig`] the rest of the binary can use without further validation.
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mongo-grpc-proxy",
    version,
    about = "Expose a MongoDB collection over gRPC",
    after_help = "Connection string reference: https://docs.mongodb.com/manual/reference/connection-string/"
)]
pub struct Cli {
    /// MongoDB connection string naming the database (e.g. mongodb://localhost/test)
    #[arg(value_parser = parse_mongodb_uri)]
    pub uri: MongoUri,

    /// MongoDB collection to read/write from
    #[arg(short, long)]
    pub collection: String,

    /// gRPC port, 0 picks a free one
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disables colored output
    #[arg(long)]
    pub no_color: bool,
}

/// A connection string that passed validation, with its database extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoUri {
    pub uri: String,
    pub database: String,
}

/// Everything needed to start the proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub addr: SocketAddr,
}

impl Cli {
    pub fn config(&self) -> ProxyConfig {
        ProxyConfig {
            uri: self.uri.uri.clone(),
            database: self.uri.database.clone(),
            collection: self.collection.clone(),
            addr: SocketAddr::new(self.host, self.port),
        }
    }

    /// Log level selected by the `-v` flags.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }
}

fn parse_mongodb_uri(value: &str) -> Result<MongoUri, String> {
    let (scheme, rest) = value
        .split_once("://")
        .ok_or_else(|| format!("Invalid connection string '{value}'"))?;

    if scheme != "mongodb" {
        return Err(format!("Expected 'mongodb:' uri protocol. Got '{scheme}:'"));
    }

    let path = rest
        .split_once('/')
        .map(|(_, path)| path)
        .unwrap_or_default();
    let database = path.split('?').next().unwrap_or_default();

    if database.is_empty() {
        return Err("Missing mongodb uri pathname".to_string());
    }

    if database.contains('/') {
        return Err("Invalid mongodb uri pathname. Cannot contain '/'".to_string());
    }

    Ok(MongoUri {
        uri: value.to_string(),
        database: database.to_string(),
    })
}

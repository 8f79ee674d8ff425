//! Command line interface built on clap.
//!
//! Each subcommand loads a stored process, applies one lifecycle operation
//! and saves it again, optionally mirroring the change to webhooks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::process::{EntityId, ResultValue};

/// Track the lifecycle of long-running batch processes.
#[derive(Debug, Parser)]
#[command(name = "process-tracker", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the config file (defaults to ./process-tracker.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Company (tenant) id; overrides the config file.
    #[arg(long, global = true)]
    pub company: Option<i64>,

    /// Send webhook notifications to the configured endpoints.
    #[arg(long, global = true, default_value_t = false)]
    pub notify: bool,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates a scheduled process and prints its id.
    Create {
        /// Owner plugin id; overrides the config file.
        #[arg(long)]
        plugin: Option<i64>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Starts a process with an optional expected unit count.
    Init {
        id: String,
        #[arg(long)]
        count: Option<u64>,
    },

    /// Records handled units.
    Handle {
        id: String,
        #[arg(long, default_value_t = 1)]
        count: u64,
    },

    /// Records skipped units.
    Skip {
        id: String,
        #[arg(long, default_value_t = 1)]
        count: u64,
    },

    /// Records a failed unit.
    Error {
        id: String,
        #[arg(long)]
        message: String,
        /// Entity the error refers to; `true`/`false` and integers keep
        /// their type.
        #[arg(long, value_parser = parse_entity_id)]
        entity: Option<EntityId>,
    },

    /// Stops a process abnormally; unaccounted units count as failed.
    Terminate {
        id: String,
        #[arg(long)]
        message: String,
        #[arg(long, value_parser = parse_entity_id)]
        entity: Option<EntityId>,
    },

    /// Stops a process normally; unaccounted units count as skipped.
    Finish {
        id: String,
        /// `true`/`false`, an integer, or any other text.
        #[arg(value_parser = parse_result_value)]
        value: ResultValue,
    },

    /// Changes the lifecycle state (e.g. `post_processing`).
    State { id: String, state: String },

    /// Replaces the description; allowed even after finish.
    Describe { id: String, description: String },

    /// Prints the process snapshot as JSON.
    Show { id: String },
}

/// Reads a finish value: booleans and integers keep their type, anything
/// else is a string.
pub fn parse_result_value(raw: &str) -> Result<ResultValue, String> {
    Ok(match raw {
        "true" => ResultValue::Bool(true),
        "false" => ResultValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(ResultValue::Int)
            .unwrap_or_else(|_| ResultValue::String(raw.to_string())),
    })
}

pub fn parse_entity_id(raw: &str) -> Result<EntityId, String> {
    Ok(match parse_result_value(raw)? {
        ResultValue::Bool(b) => EntityId::Bool(b),
        ResultValue::Int(i) => EntityId::Int(i),
        ResultValue::String(s) => EntityId::String(s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_init_subcommand() {
        let cli = Cli::parse_from(["process-tracker", "init", "p-1", "--count", "100"]);
        match cli.command {
            Command::Init { id, count } => {
                assert_eq!(id, "p-1");
                assert_eq!(count, Some(100));
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_handle_defaults_to_one() {
        let cli = Cli::parse_from(["process-tracker", "handle", "p-1"]);
        assert!(matches!(cli.command, Command::Handle { count: 1, .. }));
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "process-tracker",
            "--company",
            "5",
            "--notify",
            "--verbose",
            "show",
            "p-1",
        ]);
        assert!(cli.verbose);
        assert!(cli.notify);
        assert_eq!(cli.company, Some(5));
    }

    #[test]
    fn cli_parses_finish_value() {
        let cli = Cli::parse_from(["process-tracker", "finish", "p-1", "42"]);
        match cli.command {
            Command::Finish { value, .. } => assert_eq!(value, ResultValue::Int(42)),
            _ => panic!("expected Finish command"),
        }
    }

    #[test]
    fn result_value_parsing() {
        assert_eq!(parse_result_value("true"), Ok(ResultValue::Bool(true)));
        assert_eq!(parse_result_value("false"), Ok(ResultValue::Bool(false)));
        assert_eq!(parse_result_value("-7"), Ok(ResultValue::Int(-7)));
        assert_eq!(
            parse_result_value("https://files/x.csv"),
            Ok(ResultValue::String("https://files/x.csv".into()))
        );
    }

    #[test]
    fn cli_keeps_entity_id_types() {
        let cli = Cli::parse_from([
            "process-tracker",
            "error",
            "p-1",
            "--message",
            "bad row",
            "--entity",
            "42",
        ]);
        match cli.command {
            Command::Error { entity, .. } => assert_eq!(entity, Some(EntityId::Int(42))),
            _ => panic!("expected Error command"),
        }
        assert_eq!(parse_entity_id("false"), Ok(EntityId::Bool(false)));
        assert_eq!(parse_entity_id("sku-1"), Ok(EntityId::String("sku-1".into())));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}

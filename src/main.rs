#![deny(rust_2018_idioms)]

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod macros;

mod config;
mod db;
mod domain;
mod error;
mod export;
mod feedback;
mod github;
mod ingest;
mod recommend;
mod scoring;
mod triage;

use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::RecResult;

#[derive(Debug, Parser)]
#[command(name = "recbot", about = "reviewer recommendations for a single repository")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "recbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch pull requests, changed files, and reviews into the database.
    Fetch,
    /// Print (and optionally post) reviewer suggestions for a pull request.
    Recommend {
        /// Pull request number.
        pr: i32,
        /// Post the suggestions as a comment on the pull request.
        #[arg(long)]
        post: bool,
        /// Override the configured number of candidates.
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Adjust a reviewer's favorite-reviewer points.
    Feedback {
        /// Reviewer login.
        reviewer: String,
        /// Points to add (may be negative).
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },
    /// Apply the triage label to open pull requests that have no labels.
    Label,
    /// Dump all tables to CSV files.
    Export {
        /// Output directory, created if missing.
        #[arg(long, default_value = "export")]
        out: PathBuf,
    },
    /// Delete all rows from all tables.
    Reset,
}

fn main() {
    use std::io::Write;

    // init environment variables, CLI, and logging
    dotenv::dotenv().ok();

    env_logger::Builder::new()
        .format(|buf, rec| {
            writeln!(
                buf,
                "[{} {}:{} {}] {}",
                rec.level(),
                rec.module_path().unwrap_or("<unnamed>"),
                rec.line().unwrap_or(0),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                rec.args()
            )
        })
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    debug!("Logging initialized.");

    let cli = Cli::parse();

    if let Err(why) = run(&cli) {
        error!("{:?}", why);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> RecResult<()> {
    let cfg = Config::load(&cli.config)?;

    match &cli.command {
        Command::Fetch => ingest::run(&cfg),
        Command::Recommend { pr, post, top_n } => recommend::run(&cfg, *pr, *top_n, *post),
        Command::Feedback { reviewer, delta } => feedback::run(&cfg, reviewer, *delta),
        Command::Label => triage::run(&cfg),
        Command::Export { out } => export::run(&cfg, out),
        Command::Reset => db::reset(&cfg),
    }
}

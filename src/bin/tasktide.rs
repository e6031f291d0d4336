use anyhow::Result;
use clap::Parser;
use tasktide::cli::{Cli, run};

fn main() -> Result<()> {
    run(Cli::parse())
}

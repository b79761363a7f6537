//! CLI entry-point for inspecting partial date resolution.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::calendar::dates;

/// Args for the `resolve` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Raw registry dates, e.g. `2026`, `2026 Q3`, `Mar 2027`.
    #[arg(required = true)]
    pub values: Vec<String>,
}

pub fn run(args: Args) -> Result<()> {
    for value in &args.values {
        match dates::resolve(Some(value.as_str())) {
            Some(date) => println!("{value}\t{date}"),
            None => println!("{value}\tnone"),
        }
    }
    Ok(())
}

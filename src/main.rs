//! CLI entry point for the photomosaic builder

use clap::Parser;
use photomosaic::io::cli::{Cli, MosaicCommand, init_logging};

fn main() -> photomosaic::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    MosaicCommand::new(cli).run().map(|_| ())
}

use clap::Parser;
use miette::Result;
use rcdgen::cli::{Cli, Commands};
use rcdgen::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new().with_verbose(cli.verbose);

    match cli.command {
        Commands::Build(args) => rcdgen::cli::build::run(args, &printer)?,
        Commands::Validate(args) => rcdgen::cli::validate::run(args, &printer)?,
        Commands::Inspect(args) => rcdgen::cli::inspect::run(args, &printer)?,
        Commands::Completions(args) => rcdgen::cli::completions::run(args)?,
    }

    Ok(())
}

// ABOUTME: Main entry point for the fastslides program.
// ABOUTME: Provides CLI interface over the library: serve, open, validate, state.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local agent hook HTTP server (foreground)
    Serve,

    /// Open a project and print its detail as JSON
    Open(PathArgs),

    /// Validate a project folder and print the report as JSON
    Validate(PathArgs),

    /// Print the resolved application state as JSON
    State,
}

#[derive(Args)]
struct PathArgs {
    /// Path to the project folder
    path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Serve) => fastslides::hook::serve(),
        Some(Commands::Open(args)) => fastslides::project::open_project(&args.path)
            .and_then(|detail| {
                println!("{}", serde_json::to_string_pretty(&detail)?);
                Ok(())
            }),
        Some(Commands::Validate(args)) => fastslides::project::validate_project(&args.path)
            .and_then(|report| {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }),
        Some(Commands::State) => fastslides::project::build_state().and_then(|state| {
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

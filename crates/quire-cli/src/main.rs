//! Quire CLI - Literate notebooks, run top to bottom.

mod colors;
mod executor;
mod import;
mod output;
mod render;
mod run;
mod sync;
mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Run and publish literate percent-format notebooks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Loop iterations allowed per cell
    #[arg(long, global = true, default_value_t = 1_000_000)]
    max_loop_iterations: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a notebook and print its outputs
    Run {
        /// Path to the notebook (.py file)
        notebook: String,

        /// Print outputs as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a notebook and render it as Markdown
    Render {
        /// Path to the notebook (.py file)
        notebook: String,

        /// Output path (default: notebook path with .md extension)
        #[arg(short, long)]
        output: Option<String>,

        /// Figure directory, relative to the output file (default: <name>_files)
        #[arg(long, conflicts_with = "embed_figures")]
        figures: Option<String>,

        /// Embed figures as data URIs instead of writing files
        #[arg(long)]
        embed_figures: bool,
    },

    /// Sync a notebook to .ipynb format
    Sync {
        /// Path to the notebook (.py file)
        notebook: String,

        /// Run the notebook and include its outputs
        #[arg(short, long)]
        execute: bool,

        /// Watch for changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Convert a .ipynb notebook to percent format
    Import {
        /// Path to the Jupyter notebook
        ipynb: String,

        /// Output path (default: .py next to the input)
        #[arg(short, long)]
        output: Option<String>,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format quire-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<quire_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let config = quire_core::ScriptConfig {
        max_loop_iterations: cli.max_loop_iterations,
        ..quire_core::ScriptConfig::default()
    };

    match cli.command {
        Commands::Run { notebook, json } => {
            run::execute(&notebook, config, json).map_err(format_error)?;
        }

        Commands::Render {
            notebook,
            output,
            figures,
            embed_figures,
        } => {
            let options = render::RenderOptions {
                output,
                figures,
                embed_figures,
            };
            render::execute(&notebook, config, &options).map_err(format_error)?;
        }

        Commands::Sync {
            notebook,
            execute,
            watch,
        } => {
            sync::execute(&notebook, config, execute, watch).map_err(format_error)?;
        }

        Commands::Import {
            ipynb,
            output,
            force,
        } => {
            import::execute(&ipynb, output.as_deref(), force).map_err(format_error)?;
        }
    }

    Ok(())
}

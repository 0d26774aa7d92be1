mod libretranslate;
mod sanitize;
mod translate;
mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::sanitize::run_sanitize_command;
use crate::translate::{
    ServiceKind, TranslateOptions, run_languages_command, run_translate_command,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log debug details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate values/*.xml resource files into other locales.
    Translate {
        /// Source resource files (e.g. res/values/strings.xml)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Configuration file (default: ./resxlate.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source locale code
        #[arg(short, long)]
        source: Option<String>,

        /// Target locale codes, comma separated
        #[arg(short, long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Translation service endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Pause after each service request, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Output directory template; {locale} is replaced by each target
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Unit names never sent to the service, comma separated
        #[arg(long, value_delimiter = ',')]
        skip_names: Vec<String>,

        /// Input file names to leave out, comma separated
        #[arg(long, value_delimiter = ',')]
        skip_files: Vec<String>,

        /// Also write an untranslated copy for this locale
        #[arg(long)]
        write_base: Option<String>,

        /// Keep non-localizable resources (colors, dimens, ...) in the output
        #[arg(long)]
        all_resources: bool,

        /// Translation service to use (default: identity for dry runs)
        #[arg(long, value_enum)]
        service: Option<ServiceKind>,

        /// Query the service's language list before translating
        #[arg(long)]
        check_endpoint: bool,

        /// Write the run report as JSON to this path
        #[arg(long)]
        report_json: Option<PathBuf>,

        /// Exit with an error when any unit or file failed
        #[arg(long)]
        strict: bool,

        /// Translate and report without writing any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Repair invalid backslash escapes in resource files, in place.
    Sanitize {
        /// Resource files to repair
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only report; fail when a file needs fixing
        #[arg(long)]
        check: bool,
    },

    /// Check that the translation service is up and list its languages.
    Languages {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "resxlate=debug" } else { "resxlate=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.commands {
        Commands::Translate {
            inputs,
            config,
            source,
            targets,
            endpoint,
            delay_ms,
            out_dir,
            skip_names,
            skip_files,
            write_base,
            all_resources,
            service,
            check_endpoint,
            report_json,
            strict,
            dry_run,
        } => run_translate_command(TranslateOptions {
            inputs,
            config,
            source,
            targets,
            endpoint,
            delay_ms,
            out_dir,
            skip_names,
            skip_files,
            write_base,
            all_resources,
            service,
            check_endpoint,
            report_json,
            strict,
            dry_run,
        }),
        Commands::Sanitize { files, check } => run_sanitize_command(files, check),
        Commands::Languages { config, endpoint } => run_languages_command(config, endpoint),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

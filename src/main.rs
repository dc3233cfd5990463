use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compose_agentsmd::commands::{self, App, InitOptions, OutputMode};
use compose_agentsmd::ruleset::{self, DEFAULT_OUTPUT};
use compose_agentsmd::source::SystemGit;

#[derive(Parser)]
#[command(name = "compose-agentsmd", version)]
#[command(about = "Compose AGENTS.md from modular rule fragments")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// Project root containing agent-ruleset.json (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Path to the ruleset file (overrides --root lookup)
    #[arg(long, global = true)]
    ruleset: Option<PathBuf>,

    /// Re-fetch the remote rules source instead of using the cache
    #[arg(long, global = true)]
    refresh: bool,

    /// Delete every cached rules checkout before running
    #[arg(long, global = true)]
    clear_cache: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show what would be written without touching any file
    #[arg(long, global = true)]
    dry_run: bool,

    /// List every rule source and enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter agent-ruleset.json
    Init {
        /// Rules source: github:owner/repo@ref or a local path
        #[arg(long, default_value = commands::DEFAULT_SOURCE)]
        source: String,

        /// Domains to include, comma-separated
        #[arg(long, value_delimiter = ',')]
        domains: Vec<String>,

        /// Extra local rule files, comma-separated
        #[arg(long, value_delimiter = ',')]
        extra: Vec<String>,

        /// Output file
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: String,

        /// Exclude rules/global
        #[arg(long)]
        no_global: bool,

        /// Do not write a CLAUDE.md companion
        #[arg(long)]
        no_claude: bool,

        /// Overwrite an existing ruleset
        #[arg(long)]
        force: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Prepare a writable copy of the rules source
    EditRules,
    /// Publish edited rules and recompose
    ApplyRules {
        /// Commit message for the rules repository
        #[arg(short, long, default_value = "Update agent rules")]
        message: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Initialize tracing on stderr so stdout stays clean for `--json`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "compose_agentsmd=debug"
    } else {
        "compose_agentsmd=warn"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Ask a yes/no question on the terminal. Non-interactive input answers no.
fn confirm(prompt: &str) -> bool {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return false;
    }
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `--clear-cache` implies `--refresh`; a dry run never refreshes.
fn refresh_requested(args: &GlobalArgs) -> bool {
    (args.refresh || args.clear_cache) && !args.dry_run
}

fn run(cli: Cli, app: &App) -> anyhow::Result<()> {
    let args = cli.global;
    let mode = OutputMode {
        quiet: args.quiet,
        json: args.json,
        verbose: args.verbose,
    };

    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let ruleset_path = ruleset::find(&root, args.ruleset.as_deref());

    if args.clear_cache && !args.dry_run {
        app.cache()?.clear()?;
    }
    let refresh = refresh_requested(&args);

    match cli.command {
        Some(Commands::Init {
            source,
            domains,
            extra,
            output,
            no_global,
            no_claude,
            force,
            yes,
        }) => {
            let opts = InitOptions {
                source,
                global: !no_global,
                domains,
                extra,
                output,
                claude: !no_claude,
                force,
                yes,
                dry_run: args.dry_run,
            };
            let report = commands::init(app, &ruleset_path, &opts, &mut confirm)?;
            mode.print(&report, || commands::format_init(&report));
        }
        Some(Commands::EditRules) => {
            let ruleset = app.load_ruleset(&ruleset_path)?;
            let report = commands::edit_rules(app, &ruleset, args.dry_run)?;
            mode.print(&report, || commands::format_edit(&report));
        }
        Some(Commands::ApplyRules { message, yes }) => {
            let ruleset = app.load_ruleset(&ruleset_path)?;
            let report = commands::apply_rules(
                app,
                &ruleset,
                &message,
                yes,
                args.dry_run,
                &mut confirm,
            )?;
            mode.print(&report, || commands::format_apply(&report, mode.verbose));
        }
        None => {
            let ruleset = app.load_ruleset(&ruleset_path)?;
            let report = app.compose(&ruleset, refresh, args.dry_run)?;
            mode.print(&report, || commands::format_compose(&report, mode.verbose));
        }
    }

    Ok(())
}

/// What `main` prints on stderr when a run fails.
fn failure_message(err: &anyhow::Error) -> String {
    format!("error: {:#}\n{}", err, Cli::command().render_usage())
}

fn exit_status(result: &anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = App::new(Box::new(SystemGit)).and_then(|app| run(cli, &app));
    if let Err(e) = &result {
        eprintln!("{}", failure_message(e));
    }
    ExitCode::from(exit_status(&result))
}

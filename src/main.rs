//! covrecon CLI binary entry point.
//! Delegates to library modules for reconciliation and prints results.

use clap::Parser;
use covrecon::cli::{Cli, Commands};
use covrecon::config::{self, Overrides};
use covrecon::rules::{candidate_keys, RuleProfile};
use covrecon::service::SnapshotService;
use covrecon::tree::DiskTree;
use covrecon::{output, reconcile, utils};
use tracing::debug;

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), msg);
    std::process::exit(2);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Explain {
            domain,
            checker,
            subcategory,
            language,
            output,
        } => {
            let keys = candidate_keys(&domain, &checker, &subcategory, &language);
            output::print_explain(&keys, output.as_deref().unwrap_or("human"));
        }
        Commands::Reconcile {
            repo_root,
            stream,
            project,
            source_dirs,
            strip_prefix,
            path_style,
            snapshot,
            profile,
            output,
            force,
            check,
        } => {
            let eff = config::resolve_effective(&Overrides {
                repo_root,
                enabled: if force { Some(true) } else { None },
                stream,
                project,
                source_dirs,
                strip_prefix,
                path_style,
                snapshot,
                profile,
                output,
            });
            if !eff.config_found {
                eprintln!(
                    "{} No covrecon.toml found; using defaults.",
                    utils::note_prefix()
                );
            }

            let registry = match RuleProfile::load(&eff.profile) {
                Ok(p) => p,
                Err(e) => fail(e),
            };
            let service = match SnapshotService::load(eff.connection.clone(), &eff.snapshot) {
                Ok(s) => s,
                Err(e) => fail(e),
            };
            let working_dir = std::env::current_dir().unwrap_or_else(|_| eff.repo_root.clone());
            let scan_root = working_dir.join(&eff.repo_root);
            let tree = DiskTree::scan(&scan_root, &eff.index_dirs);
            debug!(files = tree.len(), rules = registry.len(), "collaborators ready");

            let settings = eff.pass_settings(&working_dir);
            let report = match reconcile::run_pass(&service, &tree, &registry, &settings) {
                Ok(r) => r,
                Err(e) => fail(e),
            };
            output::print_report(&report, &eff.output, &eff.repo_root);
            if check && !report.issues.is_empty() {
                std::process::exit(1);
            }
        }
    }
}

//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "covrecon",
    version,
    about = "Reconcile remote static-analysis defects with a local source tree",
    long_about = "covrecon maps defects reported by a remote static-analysis service onto local files and active quality rules.\n\nConfiguration precedence: CLI > covrecon.toml > defaults.",
    after_help = "Examples:\n  covrecon reconcile --stream main --snapshot defects.json --profile rules.toml\n  covrecon reconcile --project acme --strip-prefix /build --output json\n  covrecon explain --domain STATIC_C --checker \"MISRA C 2004 Rule 1.1\" --language c",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue, help = "Log progress notices")]
    pub verbose: bool,
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Log every resolution step")]
    pub debug: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current covrecon version.")]
    Version,
    /// Run one reconciliation pass
    #[command(
        about = "Run a reconciliation pass",
        long_about = "Fetch defects for the configured stream or project, resolve each to a local file and active rule, and print the resulting issues and measures.",
        after_help = "Examples:\n  covrecon reconcile --stream main\n  covrecon reconcile --project acme --source-dirs src,lib --check"
    )]
    Reconcile {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Stream to fetch defects from (wins over --project)")]
        stream: Option<String>,
        #[arg(long, help = "Project to fetch defects from")]
        project: Option<String>,
        #[arg(long, help = "Comma-separated directories searched by path suffix")]
        source_dirs: Option<String>,
        #[arg(long, help = "Build path prefix to strip from remote paths")]
        strip_prefix: Option<String>,
        #[arg(long, help = "Local path style: posix|windows (default: posix)")]
        path_style: Option<String>,
        #[arg(long, help = "Defect snapshot JSON file")]
        snapshot: Option<String>,
        #[arg(long, help = "Active rule profile TOML file")]
        profile: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Force the pass on even when config disables it")]
        force: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if any issue is emitted")]
        check: bool,
    },
    /// Show the rule keys tried for a checker
    #[command(
        about = "Explain rule resolution",
        long_about = "Print, in order, every rule key the resolver tries for a domain, checker, subcategory and language."
    )]
    Explain {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        checker: String,
        #[arg(long, default_value = "none")]
        subcategory: String,
        #[arg(long)]
        language: String,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vendiff_common::{
    config_to_string, ensure_config, load_config, AppConfig, ModificationReport,
    ModificationType, ModifiedFile,
};
use vendiff_core::ModificationDetector;

#[derive(Parser)]
#[command(name = "vendiff")]
#[command(author = "Vendiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Detect local edits to a vendored SDK and capture them as a patch", long_about = None)]
struct Cli {
    /// Use the vendiff.toml next to the executable, even if it does not exist yet
    #[arg(long, global = true)]
    portable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a vendored directory against its pristine release archive
    Check(CheckArgs),

    /// Show the configuration file location and effective settings
    Config {
        /// Write the default configuration file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Local vendored directory (e.g. ./MetaplaySDK)
    local: PathBuf,

    /// Reference release archive (.zip)
    reference: PathBuf,

    /// Archive prefix the vendored directory corresponds to
    #[arg(short, long)]
    prefix: Option<String>,

    /// Lines of context around each hunk
    #[arg(short = 'C', long)]
    context: Option<usize>,

    /// Maximum number of modified files listed in the summary
    #[arg(long)]
    max_listed: Option<usize>,

    /// Write the patch to this file
    #[arg(short = 'o', long, conflicts_with = "patch_dir")]
    patch_out: Option<PathBuf>,

    /// Write the patch into this directory using the configured file name
    #[arg(long)]
    patch_dir: Option<PathBuf>,

    /// Print the patch to stdout instead of the summary
    #[arg(long, conflicts_with = "json")]
    stdout_patch: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Extra ignore patterns (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,
}

fn main() {
    // Initialize tracing to stderr (so JSON and patch output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => run_check(args, cli.portable),
        Commands::Config { init } => run_config(init, cli.portable),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_check(args: CheckArgs, portable: bool) -> Result<()> {
    let loaded = load_config(portable).context("Failed to load configuration")?;
    let config = apply_overrides(loaded.config, &args);

    info!("Comparing:");
    info!("  Local:     {}", args.local.display());
    info!("  Reference: {}", args.reference.display());

    let detector = ModificationDetector::new(config.clone());
    let report = detector
        .detect(&args.local, &args.reference)
        .context("could not check for local SDK modifications")?;

    if args.stdout_patch {
        print!("{}", report.patch_content());
        return Ok(());
    }

    let patch_path = resolve_patch_path(
        args.patch_out.as_deref(),
        args.patch_dir.as_deref(),
        &config.patch_file_name,
    );
    let written = write_patch(&report, &patch_path);

    if args.json {
        let json = build_json_report(
            &args.local,
            &args.reference,
            &report,
            written.then_some(patch_path.as_path()),
        );
        let output = serde_json::to_string_pretty(&json)?;
        println!("{output}");
        return Ok(());
    }

    for line in summary_lines(&report, config.max_listed) {
        println!("{line}");
    }
    if written {
        println!();
        for line in reapply_instructions(&patch_path) {
            println!("{line}");
        }
    }

    Ok(())
}

fn run_config(init: bool, portable: bool) -> Result<()> {
    let loaded = if init {
        ensure_config(portable).context("Failed to write configuration")?
    } else {
        load_config(portable).context("Failed to load configuration")?
    };

    let status = if loaded.exists { "" } else { " (not created, using defaults)" };
    println!("Config file: {}{}", loaded.path.display(), status);
    if loaded.portable {
        println!("Portable mode: yes");
    }
    println!();

    print!("{}", config_to_string(&loaded.config)?);
    Ok(())
}

fn apply_overrides(mut config: AppConfig, args: &CheckArgs) -> AppConfig {
    if let Some(prefix) = &args.prefix {
        config.archive_root_prefix = prefix.clone();
    }
    if let Some(context) = args.context {
        config.context_lines = context;
    }
    if let Some(max_listed) = args.max_listed {
        config.max_listed = max_listed;
    }
    config.extra_ignore_patterns.extend(args.ignore.iter().cloned());
    config
}

fn resolve_patch_path(
    patch_out: Option<&Path>,
    patch_dir: Option<&Path>,
    patch_file_name: &str,
) -> PathBuf {
    match (patch_out, patch_dir) {
        (Some(file), _) => file.to_path_buf(),
        (None, Some(dir)) => dir.join(patch_file_name),
        (None, None) => PathBuf::from(patch_file_name),
    }
}

/// Persist the patch when there is something to persist. A failed write is
/// reported but does not fail the check.
fn write_patch(report: &ModificationReport, path: &Path) -> bool {
    if report.is_empty() {
        return false;
    }

    let content = report.patch_content();
    if content.is_empty() {
        return false;
    }

    match fs::write(path, content) {
        Ok(()) => {
            info!("Saved patch to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Could not save patch file {}: {}", path.display(), e);
            false
        }
    }
}

fn summary_lines(report: &ModificationReport, max_listed: usize) -> Vec<String> {
    if report.is_empty() {
        return vec!["Modifications to SDK: no changes detected".to_string()];
    }

    let mut lines = vec![format!(
        "Modifications to SDK: {} file(s)",
        report.modifications.len()
    )];

    for modification in report.modifications.iter().take(max_listed) {
        lines.push(list_entry(modification));
    }
    if report.modifications.len() > max_listed {
        lines.push(format!(
            "  ... and {} more file(s)",
            report.modifications.len() - max_listed
        ));
    }

    let binary_count = report.binary_count();
    if binary_count > 0 {
        lines.push(String::new());
        lines.push(format!(
            "WARNING: {} binary file(s) cannot be included in the patch and WILL BE LOST!",
            binary_count
        ));
        lines.push("         You must manually back up and restore these files.".to_string());
    }

    lines
}

fn list_entry(modification: &ModifiedFile) -> String {
    let suffix = if modification.is_binary { " (binary)" } else { "" };
    format!(
        "  [{}] {}{}",
        modification.mod_type, modification.relative_path, suffix
    )
}

fn reapply_instructions(patch_path: &Path) -> Vec<String> {
    let path = patch_path.display();
    vec![
        format!("Patch saved to {}", path),
        "Re-apply the changes from the directory containing the SDK with either:".to_string(),
        format!("  patch -p1 < {}", path),
        "or".to_string(),
        format!("  git apply --reject {}", path),
        String::new(),
        "Tip: Use 'patch -p1 --dry-run < <patch>' first to preview what will be applied.".to_string(),
        "Note: Some hunks may fail if there are conflicting changes in the new SDK.".to_string(),
        "      Failed hunks are saved to .rej files for manual resolution.".to_string(),
    ]
}

#[derive(Serialize)]
struct JsonReport {
    local: String,
    reference: String,
    summary: JsonSummary,
    modifications: Vec<ModifiedFile>,
    patch_bytes: usize,
    patch_file: Option<String>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    added: usize,
    modified: usize,
    deleted: usize,
    binary: usize,
}

fn build_json_report(
    local: &Path,
    reference: &Path,
    report: &ModificationReport,
    patch_file: Option<&Path>,
) -> JsonReport {
    JsonReport {
        local: local.to_string_lossy().to_string(),
        reference: reference.to_string_lossy().to_string(),
        summary: JsonSummary {
            total: report.modifications.len(),
            added: report.count(ModificationType::Added),
            modified: report.count(ModificationType::Modified),
            deleted: report.count(ModificationType::Deleted),
            binary: report.binary_count(),
        },
        modifications: report.modifications.clone(),
        patch_bytes: report.patch_content().len(),
        patch_file: patch_file.map(|p| p.to_string_lossy().to_string()),
    }
}

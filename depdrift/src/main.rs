use clap::{Parser, Subcommand};
use depdrift::{scan_installs, CheckConfig, DriftReport, SnapshotDiff};
use history::{HistoricalFile, HistoryInspector};
use manifest::{parse_manifest, ManifestSnapshot};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "depdrift")]
#[command(about = "Checks Poetry manifests against Dockerfile installs across git history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the manifest against the Dockerfile at one reference
    Check {
        /// Repository location (local path or clonable URL)
        #[arg(long, default_value = ".")]
        repo: String,
        /// Reference to inspect
        #[arg(short, long, default_value = "HEAD")]
        reference: String,
        /// Manifest file name
        #[arg(long, default_value = "pyproject.toml")]
        manifest: String,
        /// Build file name
        #[arg(long, default_value = "Dockerfile")]
        dockerfile: String,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare declared dependencies between two references
    Diff {
        /// Repository location (local path or clonable URL)
        #[arg(long, default_value = ".")]
        repo: String,
        /// Older reference
        #[arg(long)]
        from: String,
        /// Newer reference
        #[arg(long)]
        to: String,
        /// Manifest file name
        #[arg(long, default_value = "pyproject.toml")]
        manifest: String,
        /// Emit the diff as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the repository's branches and tags
    Refs {
        /// Repository location (local path or clonable URL)
        #[arg(long, default_value = ".")]
        repo: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let drift_found = match cli.command {
        Commands::Check {
            repo,
            reference,
            manifest,
            dockerfile,
            json,
        } => {
            let config = CheckConfig::new()
                .with_manifest_name(manifest)
                .with_build_file_name(dockerfile);
            config.validate()?;
            run_check(&repo, &reference, &config, json)?
        }
        Commands::Diff {
            repo,
            from,
            to,
            manifest,
            json,
        } => run_diff(&repo, &from, &to, &manifest, json)?,
        Commands::Refs { repo } => {
            run_refs(&repo)?;
            false
        }
    };

    if drift_found {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(
    repo: &str,
    reference: &str,
    config: &CheckConfig,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let inspector = HistoryInspector::open(repo, config.build_file_name.clone())?;

    let manifest_file = inspector.file_at(reference, &config.manifest_name)?;
    let build_file = inspector.build_file_at(reference)?;

    let Some(manifest_text) = manifest_file.text() else {
        println!("{}", not_present(&manifest_file));
        return Ok(false);
    };
    let Some(build_text) = build_file.text() else {
        println!("{}", not_present(&build_file));
        return Ok(false);
    };

    let snapshot = parse_manifest(&manifest_text)?;
    let installs = scan_installs(&build_text);
    info!(
        reference,
        declared = snapshot.dependencies().count(),
        installed = installs.len(),
        "comparing manifest against build file"
    );

    let report = DriftReport::compare(reference, &snapshot, &installs);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }
    Ok(!report.is_clean())
}

fn run_diff(
    repo: &str,
    from: &str,
    to: &str,
    manifest_name: &str,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let inspector = HistoryInspector::open(repo, "Dockerfile")?;
    let (old_file, new_file) = inspector.diff_references(from, to, manifest_name)?;

    let old = snapshot_or_empty(&old_file)?;
    let new = snapshot_or_empty(&new_file)?;

    let diff = SnapshotDiff::between(from, to, &old, &new);
    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        println!("{}", diff.render());
    }
    Ok(!diff.is_empty())
}

fn run_refs(repo: &str) -> Result<(), Box<dyn std::error::Error>> {
    let inspector = HistoryInspector::open(repo, "Dockerfile")?;
    let mut refs = inspector.list_references()?;
    refs.sort_by(|a, b| a.name.cmp(&b.name));

    for info in refs {
        let short = info.target.get(..8).unwrap_or(&info.target);
        match info.committed_at {
            Some(time) => println!("{:?}\t{}\t{}\t{}", info.kind, info.name, short, time),
            None => println!("{:?}\t{}\t{}", info.kind, info.name, short),
        }
    }
    Ok(())
}

/// An absent manifest at a reference is history, not a failure: it parses
/// as an empty snapshot so the diff reports every later entry as added.
fn snapshot_or_empty(file: &HistoricalFile) -> Result<ManifestSnapshot, manifest::ParseError> {
    match file.text() {
        Some(text) => parse_manifest(&text),
        None => {
            warn!(reference = %file.reference, path = %file.path, "file not present at reference");
            println!("{}", not_present(file));
            Ok(ManifestSnapshot::default())
        }
    }
}

fn not_present(file: &HistoricalFile) -> String {
    format!(
        "{}: {} not present at this point in history",
        file.reference, file.path
    )
}

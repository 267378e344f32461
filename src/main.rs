use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use packrat::report::print_summary;
use packrat::{
    confirm_deletion, discover_projects, resolve_root, run_batch, ArchiveConfig, ConsoleReporter,
    PipelineOptions,
};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Archive every project under a root directory into its own zip file",
    long_about = None
)]
struct Args {
    /// Root directory containing the projects (defaults to current directory)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Remove cache folders (Library, Temp, obj, Logs, .git, .vs) before archiving
    #[arg(long, short)]
    clean: bool,

    /// Delete each original project after its archive is verified (irreversible)
    #[arg(long, short)]
    delete: bool,

    /// Additional folder names to leave out of archives (can be repeated)
    #[arg(long, short = 'x', value_name = "NAME")]
    exclude: Vec<String>,

    /// Use a folder configuration file instead of the built-in defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show every file as it is added
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ArchiveConfig::from_file(path)?,
        None => ArchiveConfig::load_default()?,
    }
    .with_extra_exclusions(args.exclude.iter().cloned())?;

    // Nothing is touched before both checks pass
    let root = resolve_root(&args.root)?;

    if args.delete {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        if !confirm_deletion(&mut input, &mut output)? {
            anyhow::bail!("Aborted: deletion was not confirmed");
        }
    }

    if args.clean {
        println!("Cache cleaning enabled: {}", config.prune_targets.join(", "));
    }
    println!("Root path: {}", root.display());
    println!("Looking for projects (folders containing '{}')...", config.marker);

    let projects = discover_projects(&root, &config.marker)?;
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    let mut options = PipelineOptions::new(&config, &root);
    options.clean = args.clean;
    options.delete_after = args.delete;

    let mut reporter = ConsoleReporter::new(args.verbose);
    let summary = run_batch(&projects, &options, &mut reporter);
    print_summary(&summary);

    if summary.has_issues() {
        anyhow::bail!(
            "{} of {} projects had issues",
            summary.projects_with_issues().len(),
            summary.total()
        );
    }

    println!("{}", format!("Archived {} projects.", summary.archived_count()).green());
    Ok(())
}

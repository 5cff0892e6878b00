use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use filetree_core::human::human_bytes;
use filetree_core::scanner::{ScanMsg, Scanner};
use filetree_core::{build_tree_with, BuildOptions, EmptySegments, FileRecord, Progress, TreeNode};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "filetree", about = "Build size-aggregated file trees from path lists")]
struct Args {
    /// Default log level; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a tree from a JSON array of {"path", "size"} records
    Build {
        /// Manifest file, or - for stdin
        manifest: PathBuf,
        #[arg(long, value_enum, default_value_t = EmptySegmentsArg::Keep)]
        empty_segments: EmptySegmentsArg,
        #[command(flatten)]
        output: Output,
    },
    /// Scan a directory on disk
    Scan {
        /// Root directory to scan
        root: PathBuf,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(ClapArgs, Debug)]
struct Output {
    /// Write the nested tree as JSON
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Write one CSV row per node
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print nodes whose path fuzzy-matches this text
    #[arg(long)]
    find: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmptySegmentsArg {
    Keep,
    Collapse,
    Reject,
}

impl From<EmptySegmentsArg> for EmptySegments {
    fn from(arg: EmptySegmentsArg) -> Self {
        match arg {
            EmptySegmentsArg::Keep => EmptySegments::Keep,
            EmptySegmentsArg::Collapse => EmptySegments::Collapse,
            EmptySegmentsArg::Reject => EmptySegments::Reject,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    filetree_core::logging::init(&args.log_level);

    match args.command {
        Command::Build {
            manifest,
            empty_segments,
            output,
        } => {
            let records = read_manifest(&manifest)?;
            let options = BuildOptions {
                empty_segments: empty_segments.into(),
            };
            let tree = build_tree_with(&records, options)
                .with_context(|| format!("building tree from {}", manifest.display()))?;
            report(&tree, &output)
        }
        Command::Scan { root, output } => {
            let tree = scan(root)?;
            report(&tree, &output)
        }
    }
}

fn read_manifest(path: &Path) -> Result<Vec<FileRecord>> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading manifest from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?
    };
    serde_json::from_str(&text).context("manifest must be a JSON array of {path, size}")
}

fn scan(root: PathBuf) -> Result<TreeNode> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let cancel = Arc::new(AtomicBool::new(false));
    let paused = Arc::new(AtomicBool::new(false));
    let (tx, rx) = crossbeam_channel::unbounded::<ScanMsg>();
    let scanner = Scanner::new(cancel, paused);
    std::thread::spawn(move || scanner.scan(root, tx));

    let mut last = None;
    while let Ok(msg) = rx.recv() {
        match msg {
            ScanMsg::Progress(p) => {
                if p.files % 1000 == 0 {
                    eprint!("\r{}", progress_line(&p));
                }
                last = Some(p);
            }
            ScanMsg::Error(e) => tracing::warn!("{e}"),
            ScanMsg::File { .. } => {}
            ScanMsg::Done(tree) => {
                if let Some(p) = last {
                    eprintln!("\r{}", progress_line(&p));
                }
                return Ok(*tree);
            }
            ScanMsg::Failed(e) => return Err(e).context("building scanned tree"),
            ScanMsg::Cancelled => bail!("scan cancelled"),
        }
    }
    bail!("scanner stopped without a result")
}

fn progress_line(p: &Progress) -> String {
    format!(
        "scanned {} / {} files, {}",
        p.files,
        p.discovered.max(p.files),
        human_bytes(p.bytes)
    )
}

fn report(tree: &TreeNode, output: &Output) -> Result<()> {
    if let Some(path) = &output.json {
        let json = filetree_core::export::to_json(tree);
        let text = serde_json::to_string_pretty(&json)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &output.csv {
        let file =
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        filetree_core::export::to_csv(tree, std::io::BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(needle) = &output.find {
        for hit in filetree_core::search::search(tree, needle) {
            println!(
                "{:>6}  {:>12}  {}",
                hit.score,
                human_bytes(hit.node.size),
                hit.node.path
            );
        }
    }

    let stats = filetree_core::stats::stats(tree);
    println!(
        "{} files in {} directories, depth {}, {}",
        stats.files,
        stats.dirs,
        stats.depth,
        human_bytes(stats.bytes)
    );
    Ok(())
}

//! Binary entry point for the `btf` command-line inspector.
//!
//! Two operations over a file holding one encoded message:
//!
//! - `btf check <file>` — parse under configurable limits and report the
//!   outcome (optionally validating every string as UTF-8).
//! - `btf stat <file>` — parse and print structural statistics: byte size,
//!   node count, maximum depth, and per-kind node counts.
//!
//! Exit code 0 means the file parsed clean; 1 means it did not.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use btf::tag::Kind;
use btf::tree::{Limits, Node, Tree};

#[derive(Parser)]
#[command(name = "btf", version, about = "Inspect BTF binary tagged format files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate that a file holds exactly one well-formed message.
    Check(CheckArgs),
    /// Print structural statistics for a message.
    Stat(StatArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// File holding one encoded message.
    file: PathBuf,
    /// Also require every string payload to be valid UTF-8.
    #[arg(long)]
    utf8: bool,
    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
struct StatArgs {
    /// File holding one encoded message.
    file: PathBuf,
    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
struct LimitArgs {
    /// Cap on the message size in bytes.
    #[arg(long)]
    max_size: Option<usize>,
    /// Cap on the node count.
    #[arg(long)]
    max_nodes: Option<usize>,
}

impl LimitArgs {
    fn to_limits(&self) -> Limits {
        let mut limits = Limits::default();
        if let Some(n) = self.max_size {
            limits.max_size = n;
        }
        if let Some(n) = self.max_nodes {
            limits.max_nodes = n;
        }
        limits
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Check(args) => check(&args),
        Command::Stat(args) => stat(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("btf: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn check(args: &CheckArgs) -> anyhow::Result<()> {
    let data = fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut tree = Tree::from_slice_with_limits(&data, args.limits.to_limits());
    if let Err(e) = tree.parse() {
        bail!("{}: parse failed: {e}", args.file.display());
    }
    if tree.size() != data.len() {
        bail!(
            "{}: {} trailing byte(s) after the message",
            args.file.display(),
            data.len() - tree.size()
        );
    }
    if args.utf8 {
        let root = tree.root().map_err(|e| anyhow::anyhow!("{e}"))?;
        let mut bad = 0usize;
        walk(root, &mut |node, _| {
            if node.kind() == Kind::Str && !node.check_utf8().unwrap_or(false) {
                bad += 1;
            }
        });
        if bad > 0 {
            bail!("{}: {bad} string(s) are not valid UTF-8", args.file.display());
        }
    }
    println!(
        "{}: ok ({} bytes, {} nodes)",
        args.file.display(),
        tree.size(),
        tree.node_count()
    );
    Ok(())
}

fn stat(args: &StatArgs) -> anyhow::Result<()> {
    let data = fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut tree = Tree::from_slice_with_limits(&data, args.limits.to_limits());
    tree.parse()
        .map_err(|e| anyhow::anyhow!("{}: parse failed: {e}", args.file.display()))?;
    let root = tree.root().map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut max_depth = 0usize;
    let mut kinds: Vec<(Kind, usize)> = Vec::new();
    walk(root, &mut |node, depth| {
        max_depth = max_depth.max(depth + 1);
        match kinds.iter_mut().find(|(k, _)| *k == node.kind()) {
            Some((_, n)) => *n += 1,
            None => kinds.push((node.kind(), 1)),
        }
    });

    println!("size:      {} bytes", tree.size());
    println!("nodes:     {}", tree.node_count());
    println!("max depth: {max_depth}");
    for (kind, n) in &kinds {
        println!("  {kind:<8} {n}");
    }
    Ok(())
}

/// Depth-first visit of every node, iteratively (input nesting depth must
/// not become call-stack depth).
fn walk<'t, 'a>(root: Node<'t, 'a>, visit: &mut impl FnMut(&Node<'t, 'a>, usize)) {
    let mut stack: Vec<(Node<'t, 'a>, u32, usize)> = vec![(root, 0, 0)];
    visit(&root, 0);
    while let Some((node, next, depth)) = stack.pop() {
        let children = match node.kind() {
            Kind::Array => node.array_length().unwrap_or(0),
            Kind::Map => node.map_count().unwrap_or(0) * 2,
            _ => 0,
        };
        if next >= children {
            continue;
        }
        let child = match node.kind() {
            Kind::Array => node.array_at(next),
            // Alternate keys and values in wire order.
            _ if next % 2 == 0 => node.map_key_at(next / 2),
            _ => node.map_value_at(next / 2),
        };
        stack.push((node, next + 1, depth));
        if let Ok(child) = child {
            visit(&child, depth + 1);
            stack.push((child, 0, depth + 1));
        }
    }
}

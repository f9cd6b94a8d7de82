//! `studio` command line.
//!
//! `studio compile <snapshot.json> [--out <file.css>] [--class-selectors]`
//! `studio push <snapshot.json> <transactions.json> --project <id> --build <id>`

use anyhow::{Result, anyhow};
use css_engine::SelectorStrategy;
use std::env;
use std::io::{Write as _, stderr, stdout};
use std::path::PathBuf;
use studio::{StudioConfig, compile, load_snapshot, load_transactions, push_http};
use tokio::runtime::Runtime;

fn print_usage() {
    drop(writeln!(
        stderr(),
        "Usage:\n  studio compile <snapshot.json> [--out <file.css>] [--class-selectors]\n  studio push <snapshot.json> <transactions.json> --project <id> --build <id>"
    ));
}

#[derive(Default)]
struct Args {
    positional: Vec<String>,
    out: Option<PathBuf>,
    project: Option<String>,
    build: Option<String>,
    class_selectors: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--class-selectors" => parsed.class_selectors = true,
            "--out" | "--project" | "--build" => {
                let value = args
                    .get(index + 1)
                    .cloned()
                    .ok_or_else(|| anyhow!("{flag} needs a value"))?;
                index += 1;
                match flag {
                    "--out" => parsed.out = Some(PathBuf::from(value)),
                    "--project" => parsed.project = Some(value),
                    _ => parsed.build = Some(value),
                }
            }
            other if other.starts_with("--") => return Err(anyhow!("unknown option {other}")),
            other => parsed.positional.push(other.to_owned()),
        }
        index += 1;
    }
    Ok(parsed)
}

fn cmd_compile(config: &StudioConfig, args: Args) -> Result<()> {
    let [snapshot] = args.positional.as_slice() else {
        return Err(anyhow!("compile takes exactly one snapshot file"));
    };
    let mut options = config.compiler_options();
    if args.class_selectors {
        options.selector = SelectorStrategy::Class;
    }
    let artifact = compile(snapshot.as_ref(), args.out.as_deref(), options)?;
    if args.out.is_none() {
        stdout().write_all(artifact.css_text().as_bytes())?;
    }
    Ok(())
}

fn cmd_push(config: &StudioConfig, args: Args) -> Result<()> {
    let [snapshot, transactions] = args.positional.as_slice() else {
        return Err(anyhow!("push takes a snapshot file and a transactions file"));
    };
    let project = args.project.ok_or_else(|| anyhow!("--project is required"))?;
    let build = args.build.ok_or_else(|| anyhow!("--build is required"))?;
    let snapshot = load_snapshot(snapshot.as_ref())?;
    let transactions = load_transactions(transactions.as_ref(), snapshot)?;

    let runtime = Runtime::new()?;
    let report = runtime.block_on(push_http(config, &project, &build, transactions))?;
    writeln!(
        stderr(),
        "Delivered {} transactions to project {project}",
        report.delivered
    )?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Err(anyhow!("missing command"));
    }
    let command = args.remove(0);
    let config = StudioConfig::from_env()?;
    let parsed = parse_args(&args)?;
    match command.as_str() {
        "compile" => cmd_compile(&config, parsed),
        "push" => cmd_push(&config, parsed),
        _ => {
            print_usage();
            Err(anyhow!("unknown command {command}"))
        }
    }
}

use anyhow::Context;
use pathguard::{check_path, config::Config, logging, secure_join, PathError};
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "usage: pathguard <PATH> [--base DIR] [--config FILE] [--explain]";

struct Args {
    path: String,
    base: Option<PathBuf>,
    config: Option<PathBuf>,
    explain: bool,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}\n{USAGE}");
    std::process::exit(2);
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut path = None;
    let mut base = None;
    let mut config = None;
    let mut explain = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--base" => {
                i += 1;
                if i >= args.len() { usage_error("--base requires a directory"); }
                base = Some(PathBuf::from(&args[i]));
            }
            "--config" => {
                i += 1;
                if i >= args.len() { usage_error("--config requires a path"); }
                config = Some(PathBuf::from(&args[i]));
            }
            "--explain" => explain = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => usage_error(&format!("unknown flag {flag}")),
            other => {
                if path.is_some() { usage_error("only one PATH may be given"); }
                path = Some(other.to_string());
            }
        }
        i += 1;
    }
    let Some(path) = path else { usage_error("missing PATH") };
    Args { path, base, config, explain }
}

fn run(args: Args) -> anyhow::Result<()> {
    let cfg = Config::discover(args.config.as_deref()).context("loading config")?;
    cfg.validate().context("validating config")?;
    logging::init(&cfg.logging);

    let base = args.base.or(cfg.validator.allowed_base);
    match check_path(&args.path, base.as_deref()) {
        Ok(resolved) => {
            info!(path = %args.path, resolved = %resolved.display(), "path accepted");
            println!("Path '{}' is SAFE", args.path);
            if let Some(base) = &base {
                let joined = secure_join(base, &[args.path.as_str()]).context("joining path")?;
                println!("Secure joined path: {}", joined.display());
            }
        }
        Err(PathError::UnsafePath { reason, .. }) => {
            println!("Path '{}' is UNSAFE", args.path);
            if args.explain {
                println!("Reason: {reason}");
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn main() {
    let args = parse_args();
    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

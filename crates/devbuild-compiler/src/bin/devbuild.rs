/// devbuild CLI

use std::process;

use clap::Parser;
use devbuild_compiler::{BuildOptions, Builder, CONFIG_ENV_VAR};
use devbuild_host::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "devbuild")]
#[command(about = "Transform source files into an output directory and report their dependencies")]
#[command(version)]
struct Args {
    /// Source files followed by the output directory
    #[arg(value_name = "PATH", required = true, num_args = 1.., allow_hyphen_values = true)]
    paths: Vec<String>,
}

fn run(args: Args) -> anyhow::Result<String> {
    let argv0 = std::env::args().next().unwrap_or_else(|| "devbuild".to_string());
    let runtime = Runtime::detect(std::iter::once(argv0).chain(args.paths).collect());

    let mut options = BuildOptions::from_invocation(runtime.invocation())?;
    if let Ok(specifier) = std::env::var(CONFIG_ENV_VAR) {
        options = options.config(specifier);
    }

    let report = Builder::new(runtime, options).build()?;
    Ok(report.render())
}

fn main() {
    // stdout carries the dependency report, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(deps) => println!("{}", deps),
        Err(e) => {
            eprintln!("Build failed: {}", e);
            process::exit(1);
        }
    }
}

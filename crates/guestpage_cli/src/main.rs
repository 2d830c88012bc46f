use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guestpage_cli::config_loader::load_config_for_build;
use guestpage_cli::logging::init_tracing;
use guestpage_cli::render::{BuildOptions, build_site};

#[derive(Debug, Parser)]
#[command(name = "guestpage_cli", about = "Render chat templates to static guest-mode HTML.")]
struct Cli {
    #[arg(long = "source-dir", short = 's', global = true)]
    source_dir: Option<PathBuf>,
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Render templates and copy static assets.")]
    Build {
        #[arg(long, short = 'o', value_name = "PATH", default_value = "dist")]
        out: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "templates")]
        templates: PathBuf,
        #[arg(long, value_name = "PATH", default_value = "static")]
        static_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match &cli.command {
        Command::Build {
            out,
            templates,
            static_dir,
        } => {
            let root = root_dir(&cli)?;
            let opts = BuildOptions {
                templates_dir: resolve(&root, templates),
                static_dir: resolve(&root, static_dir),
                out_dir: resolve(&root, out),
            };
            run_build(&cli, &root, &opts)
        }
    }
}

fn run_build(cli: &Cli, root: &Path, opts: &BuildOptions) -> Result<()> {
    let config = load_config_for_build(root, cli.config.as_deref())
        .context("failed to load render config")?;
    let report = build_site(opts, &config)?;
    for document in &report.documents {
        println!("Rendered: {}", document.path.display());
    }
    if let Some(assets) = &report.assets {
        println!("Copied: {} ({} files)", assets.dest.display(), assets.files);
    }
    let out = opts.out_dir.display();
    println!();
    println!("Done! Serve the '{out}' directory to test:");
    println!("  npx serve {out}");
    println!("  # or");
    println!("  python -m http.server 8000 --directory {out}");
    Ok(())
}

fn root_dir(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(match &cli.source_dir {
        Some(path) => resolve(&cwd, path),
        None => cwd,
    })
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

use clap::{Parser, Subcommand};
use inventory_md::pipeline::{self, RunOptions};
use inventory_md::{config, listing, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inventory-md")]
#[command(about = "Build a JSON inventory from a markdown document and photo folders")]
#[command(long_about = "\
Build a JSON inventory from a markdown document and photo folders

Headings are containers, bullets are items, and each container's photos live
in a directory named after it.

Layout:

  storage/
  ├── inventory.md               # The inventory document
  ├── inventory.toml             # Optional config (see gen-config)
  ├── photos/
  │   ├── garage/                # Photos of the container with id 'garage'
  │   └── A78/                   # Shared by every container with photos:A78
  ├── resized/                   # Thumbnails (created, never overwritten)
  └── inventory.json             # Output

Heading and item metadata (anywhere on the line, any case):
  ID:Box1         explicit container id (otherwise derived from the label)
  parent:Garage   explicit parent (otherwise the enclosing heading)
  type:box        free-form type
  tag:a,b         tags, comma separated, may repeat
  photos:A78      photo directory (otherwise the container id)

Run 'inventory-md gen-config' to generate a documented inventory.toml.")]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the document, create missing thumbnails, write the JSON inventory
    Parse {
        /// Inventory document
        file: PathBuf,

        /// Output file (default: output.file from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip thumbnail generation
        #[arg(long)]
        no_thumbnails: bool,
    },
    /// Validate the document without writing anything
    Check {
        /// Inventory document
        file: PathBuf,
    },
    /// Write one text file per photo directory listing its images
    Listings {
        /// Directory holding the document and its photo folders
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print a stock inventory.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Parse {
            file,
            output: out,
            no_thumbnails,
        } => {
            let options = RunOptions {
                output: out,
                check_only: false,
                generate_thumbnails: no_thumbnails.then_some(false),
            };
            println!("==> Parsing {}", file.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline::run(&file, &options, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;
            output::print_warnings(&result.parse_warnings, &result.photo_warnings);
            output::print_run_output(&result);
        }
        Command::Check { file } => {
            println!("==> Checking {}", file.display());
            let options = RunOptions {
                check_only: true,
                ..Default::default()
            };
            let result = pipeline::run(&file, &options, None)?;
            output::print_warnings(&result.parse_warnings, &result.photo_warnings);
            output::print_run_output(&result);
            println!("==> Inventory is valid");
        }
        Command::Listings { dir } => {
            let config = config::load_config(&dir)?;
            let photo_root = dir.join(&config.photos.source_dir);
            let listings_dir = dir.join(&config.output.listings_dir);
            println!(
                "==> Listing {} into {}",
                display_dir(&photo_root),
                display_dir(&listings_dir)
            );
            let summary = listing::write_listings(&photo_root, &listings_dir)?;
            output::print_listing_output(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn display_dir(path: &Path) -> String {
    format!("{}/", path.display())
}

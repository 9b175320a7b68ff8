use bbcards::config::{self, CliOverrides};
use bbcards::generate::{self, GenerateError, GenerateOptions, InputSelection, OutputTarget};
use bbcards::output;
use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::warn;
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "bbcards")]
#[command(about = "Printable PDF sheets of black and white party-game cards")]
#[command(long_about = "\
Printable PDF sheets of black and white party-game cards

Each deck is a plain text file with one card per line. Blank lines are
skipped and <br> starts a new line on the card. Black cards are printed
white on black, white cards black on white, in a grid on US Letter paper
with cut lines around every card.

Deck directory:

  party/
  ├── black.txt        # black cards
  ├── white.txt        # white cards
  ├── icon.png         # drawn in the lower-left corner of each card (optional)
  ├── config.toml      # card size, fonts, backs (optional)
  └── expansion/       # another deck, picked up with --recursive
      └── white.txt

Output is black_card.pdf and white_card.pdf in the output directory, or
both documents on stdout behind a Content-Type header with '--output -'.

Run 'bbcards --gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Deck directory holding black.txt and/or white.txt
    #[arg(short = 'd', long = "directory", visible_alias = "dir")]
    directory: Option<PathBuf>,

    /// White card file (ignored with --directory)
    #[arg(short = 'w', long)]
    white: Option<PathBuf>,

    /// Black card file (ignored with --directory)
    #[arg(short = 'b', long)]
    black: Option<PathBuf>,

    /// Icon image drawn on every card
    #[arg(short = 'i', long)]
    icon: Option<PathBuf>,

    /// Output directory, or '-' to stream both PDFs to stdout
    #[arg(short = 'o', long, default_value = ".")]
    output: String,

    /// 2" x 2" cards
    #[arg(short = 's', long)]
    small: bool,

    /// 2.74" x 3.74" cards (wins over --small)
    #[arg(short = 'l', long)]
    large: bool,

    /// Rounded cut lines
    #[arg(short = 'r', long)]
    rounded: bool,

    /// One card per page, with the page the size of the card
    #[arg(short = 'p', long = "oneperpage")]
    one_per_page: bool,

    /// Config file to use instead of the directory's config.toml
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Render every deck directory under --directory
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Print a stock config.toml with all options documented
    #[arg(long)]
    gen_config: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        if e.is_configuration() {
            eprintln!();
            eprintln!("{}", Cli::command().render_help());
            process::exit(2);
        }
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), GenerateError> {
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let options = generate_options(cli);
    let report = generate::generate(&options, &mut io::stdout().lock())?;

    // In stream mode stdout carries the documents
    if options.output == OutputTarget::Stream {
        return Ok(());
    }
    if cli.json {
        println!("{}", output::format_run_report_json(&report)?);
    } else {
        output::print_run_report(&report);
    }
    Ok(())
}

/// Map flags onto pipeline options. Directory mode wins over explicit files.
fn generate_options(cli: &Cli) -> GenerateOptions {
    let input = match &cli.directory {
        Some(root) => {
            if cli.white.is_some() || cli.black.is_some() {
                warn!("--directory given, ignoring --white/--black");
            }
            InputSelection::Directory {
                root: root.clone(),
                recursive: cli.recursive,
            }
        }
        None => {
            if cli.recursive {
                warn!("--recursive only applies with --directory, ignoring");
            }
            InputSelection::Files {
                black: cli.black.clone(),
                white: cli.white.clone(),
            }
        }
    };

    GenerateOptions {
        input,
        output: OutputTarget::parse(&cli.output),
        config_file: cli.config.clone(),
        icon: cli.icon.clone(),
        overrides: CliOverrides {
            small: cli.small,
            large: cli.large,
            rounded: cli.rounded,
            one_per_page: cli.one_per_page,
        },
    }
}

use anyhow::{Context, Result, bail};
use emsim3d::Deck;
use emsim3d::io::{read_deck, write_deck};
use emsim3d::sim::runner;
use std::env;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "\
Usage: emsim3d [DECK.json] [options]

Without a deck the built-in main board deck is used and solid models are
looked up in the current directory.

Options:
  --setup-only        set up the solver but skip time-stepping
  --debug-pec         dump the PEC skeleton
  --no-viewer         do not open AppCSXCAD
  --xml-only          write the XML description and stop
  --dump-deck PATH    write the deck as JSON and exit
  -q, --quiet         run the solver without console output
  -h, --help          show this message";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    deck: Option<PathBuf>,
    dump_deck: Option<PathBuf>,
    setup_only: bool,
    debug_pec: bool,
    no_viewer: bool,
    xml_only: bool,
    quiet: bool,
    help: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut cli = CliArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--setup-only" => cli.setup_only = true,
                "--debug-pec" => cli.debug_pec = true,
                "--no-viewer" => cli.no_viewer = true,
                "--xml-only" => cli.xml_only = true,
                "-q" | "--quiet" => cli.quiet = true,
                "-h" | "--help" => cli.help = true,
                "--dump-deck" => {
                    let path = iter.next().context("--dump-deck needs a path")?;
                    cli.dump_deck = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => bail!("Unknown option: {flag}\n\n{USAGE}"),
                path => {
                    if cli.deck.is_some() {
                        bail!("Only one deck can be given\n\n{USAGE}");
                    }
                    cli.deck = Some(PathBuf::from(path));
                }
            }
        }
        Ok(cli)
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;
    if cli.help {
        println!("{USAGE}");
        return Ok(());
    }

    emsim3d::init_logging("info");

    let (deck, base_dir) = match &cli.deck {
        Some(path) => {
            let deck = read_deck(path)?;
            let base_dir = path
                .parent()
                .map(PathBuf::from)
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from("."));
            (deck, base_dir)
        }
        None => (
            Deck::board_default(),
            env::current_dir().context("Cannot resolve the current directory")?,
        ),
    };
    let base_dir = base_dir
        .canonicalize()
        .with_context(|| format!("Deck directory not found: {}", base_dir.display()))?;
    info!(dir = %base_dir.display(), deck = %deck.name, "Working directory");

    if let Some(path) = &cli.dump_deck {
        write_deck(path, &deck)?;
        info!(file = %path.display(), "Wrote deck");
        return Ok(());
    }

    let mut opts = deck.run.clone();
    opts.setup_only |= cli.setup_only;
    opts.debug_pec |= cli.debug_pec;
    opts.write_only |= cli.xml_only;
    if cli.no_viewer {
        opts.show_geometry = false;
    }
    if cli.quiet {
        opts.verbose = 0;
    }

    let fdtd = deck.build(&base_dir)?;
    let report = runner::run(&fdtd, &base_dir, &opts)?;
    info!(
        output = %report.sim_path.display(),
        solids = report.solids.len(),
        solver_ran = report.solver_ran,
        "Done"
    );
    Ok(())
}

use anyhow::{Context, Result, bail, format_err};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use log::LevelFilter;
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use wrpl::{DecodeResult, DecoderSettings, MatchRecord, ReplayDecoder};

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

#[derive(Copy, Clone, PartialEq, Eq)]
enum OutputFormat {
    Json,
    JsonLines,
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    file: &'a str,
    records: &'a [MatchRecord],
}

#[derive(Serialize)]
struct RecordLine<'a> {
    file: &'a str,
    #[serde(flatten)]
    record: &'a MatchRecord,
}

struct WrplDump {
    decoder: ReplayDecoder,
    inputs: Vec<PathBuf>,
    output_format: OutputFormat,
    // Only `run` writes to the output, one replay at a time.
    output: RefCell<Box<dyn Write>>,
    verbosity_level: Option<LevelFilter>,
    num_threads: usize,
}

impl WrplDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let inputs: Vec<PathBuf> = matches
            .get_many::<PathBuf>("INPUT")
            .ok_or_else(|| format_err!("at least one input is required"))?
            .cloned()
            .collect();

        let output_format = match matches
            .get_one::<String>("output-format")
            .map(String::as_str)
        {
            Some("jsonl") => OutputFormat::JsonLines,
            _ => OutputFormat::Json,
        };

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(LevelFilter::Info),
            2 => Some(LevelFilter::Debug),
            3 => Some(LevelFilter::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(LevelFilter::Trace)
            }
        };

        let num_threads = matches.get_one::<usize>("num-threads").copied().unwrap_or(0);
        let num_threads = match (cfg!(feature = "multithreading"), num_threads) {
            (true, number) => number,
            (false, 0 | 1) => 1,
            (false, _) => {
                eprintln!(
                    "turned on threads, but binary was compiled without `multithreading` feature! decoding sequentially"
                );
                1
            }
        };

        let mut settings = DecoderSettings::new();
        if let Some(catalog) = matches.get_one::<PathBuf>("catalog") {
            settings = settings.catalog_path(catalog);
        }
        if matches.get_flag("no-nations") {
            settings = settings.resolve_nations(false);
        }

        let output: Box<dyn Write> = match matches.get_one::<PathBuf>("output-target") {
            Some(path) => Box::new(
                Self::create_output_file(path, !matches.get_flag("no-confirm-overwrite"))
                    .with_context(|| {
                        format!("failed to create output file at `{}`", path.display())
                    })?,
            ),
            None => Box::new(io::stdout()),
        };

        Ok(WrplDump {
            decoder: ReplayDecoder::with_configuration(settings),
            inputs,
            output_format,
            output: RefCell::new(output),
            verbosity_level,
            num_threads,
        })
    }

    /// Main entry point for `WrplDump`.
    ///
    /// Returns `false` if any of the inputs failed to decode.
    pub fn run(&self) -> Result<bool> {
        self.try_to_initialize_logging();

        let results = self.decode_all()?;
        let mut all_ok = true;

        for (path, result) in self.inputs.iter().zip(results) {
            match result {
                Ok(records) => self.dump_replay(path, &records)?,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    all_ok = false;
                }
            }
        }

        self.output.borrow_mut().flush()?;
        Ok(all_ok)
    }

    #[cfg(feature = "multithreading")]
    fn decode_all(&self) -> Result<Vec<DecodeResult<Vec<MatchRecord>>>> {
        use rayon::prelude::*;

        if self.num_threads == 1 || self.inputs.len() < 2 {
            return Ok(self.decode_sequentially());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .context("failed to start worker threads")?;

        let decoder = &self.decoder;
        let inputs = &self.inputs;
        Ok(pool.install(|| {
            inputs
                .par_iter()
                .map(|path| decoder.decode_path(path))
                .collect()
        }))
    }

    #[cfg(not(feature = "multithreading"))]
    fn decode_all(&self) -> Result<Vec<DecodeResult<Vec<MatchRecord>>>> {
        Ok(self.decode_sequentially())
    }

    fn decode_sequentially(&self) -> Vec<DecodeResult<Vec<MatchRecord>>> {
        self.inputs
            .iter()
            .map(|path| self.decoder.decode_path(path))
            .collect()
    }

    fn dump_replay(&self, path: &Path, records: &[MatchRecord]) -> Result<()> {
        let file = path.to_string_lossy();
        let mut output = self.output.borrow_mut();

        match self.output_format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(
                    &mut *output,
                    &ReplayOutput {
                        file: &file,
                        records,
                    },
                )?;
                writeln!(output)?;
            }
            OutputFormat::JsonLines => {
                for record in records {
                    serde_json::to_writer(&mut *output, &RecordLine { file: &file, record })?;
                    writeln!(output)?;
                }
            }
        }

        Ok(())
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!(
                "There is a directory at {}, refusing to overwrite",
                p.display()
            );
        }

        if p.exists() {
            if prompt {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        p.display()
                    ))
                    .default(false)
                    .interact()
                    .context("Failed to write confirmation prompt to term")?;

                if !confirmed {
                    bail!("Cancelled");
                }
            }
            return Ok(File::create(p)?);
        }

        match p.parent() {
            Some(parent) => {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
                Ok(File::create(p)?)
            }
            None => bail!("Output file cannot be root."),
        }
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            if let Err(e) = TermLogger::init(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
    }
}

fn cli() -> Command {
    Command::new("wrpl_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to dump the match results of War Thunder replays")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Replay files to decode"),
        )
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Nation catalog used for vehicles without a nation prefix, defaults to the bundled one"),
        )
        .arg(
            Arg::new("no-nations")
                .long("no-nations")
                .action(ArgAction::SetTrue)
                .help("When set, vehicle nations are not resolved"),
        )
        .arg(
            Arg::new("num-threads")
                .short('t')
                .long("threads")
                .default_value("0")
                .value_parser(clap::value_parser!(usize))
                .help("Sets the number of worker threads, defaults to number of CPU cores."),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["json", "jsonl"])
                .default_value("json")
                .help("Sets the output format")
                .long_help(
                    "Sets the output format:
    \"json\"  - one indented document per replay, written back to back (not wrapped in an array).
    \"jsonl\" - one line per player, tagged with the replay file.",
                ),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_parser(clap::value_parser!(PathBuf))
                .help("Writes output to the file specified instead of stdout, errors will still be printed to stderr. \
                       Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`. \
                       Will create parent directories if needed."),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
}

fn main() {
    let matches = cli().get_matches();

    let app = match WrplDump::from_cli_matches(&matches) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{:?}", e);
            exit(1)
        }
    };

    match app.run() {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("{:?}", e);
            exit(1)
        }
    }
}

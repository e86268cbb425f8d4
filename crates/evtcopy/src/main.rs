//! `evtcopy`: list, verify and selectively copy events between raw event
//! storage files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eformat::compression::CompressionType;
use eventstore::filename::{RawFileName, RawFileNameCallback};
use eventstore::header::RunParameters;
use eventstore::reader::{ReadStatus, StorageReader};
use eventstore::writer::{StorageWriter, WriterLimits, WriterMetadata};

/// Which events to act on.
#[derive(Debug, Clone)]
enum EventSelection {
    All,
    Indices(Vec<u64>),
}

impl std::str::FromStr for EventSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(EventSelection::All);
        }
        let indices = s
            .split(',')
            .map(|tok| tok.trim().parse::<u64>().map_err(|_| anyhow::anyhow!("not a number: {tok}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(EventSelection::Indices(indices))
    }
}

impl EventSelection {
    fn includes(&self, index: u64) -> bool {
        match self {
            EventSelection::All => true,
            EventSelection::Indices(v) => v.contains(&index),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "evtcopy", about = "List, check and copy events between raw event storage files")]
struct Args {
    /// Output file path; copies selected events there if given.
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// List each event's run number, lvl1 id and size instead of copying.
    #[arg(short = 'l', long = "listevents")]
    list_events: bool,

    /// Verify every record against the file trailer's Adler-32 checksum.
    #[arg(short = 't', long = "checkevents")]
    check_events: bool,

    /// Comma-separated 0-based event indices to select, or "all".
    #[arg(short = 'e', long = "event", default_value = "all")]
    event: EventSelection,

    /// Zlib compression level (0-9) applied to the output file, if any.
    #[arg(short = 'c', long = "compress")]
    compress: Option<u32>,

    /// Shorthand for `--compress 6`.
    #[arg(short = 'd', long = "deflate")]
    deflate: bool,

    /// Run number to stamp on the output file's header (defaults to the
    /// first input file's run number).
    #[arg(short = 'r', long = "run")]
    run: Option<u32>,

    /// Input files, read as a sequence (multi-file runs are read in order).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let compression_level = args.compress.or(args.deflate.then_some(6));
    let compression = if compression_level.is_some() { CompressionType::Zlib } else { CompressionType::None };

    let mut writer = match &args.out {
        Some(out_path) => {
            let first = StorageReader::<eventstore::LocalFileSource>::open(&args.inputs[0])
                .with_context(|| format!("opening {:?}", args.inputs[0]))?;
            let run_number = args.run.unwrap_or_else(|| first.run_number());
            let metadata = WriterMetadata {
                run_parameters: RunParameters {
                    run_number,
                    max_events: first.max_events(),
                    rec_enable: first.rec_enable(),
                    trigger_type: first.trigger_type(),
                    detector_mask_lsb: first.detector_mask().0,
                    detector_mask_msb: first.detector_mask().1,
                    beam_type: first.beam_type(),
                    beam_energy: first.beam_energy(),
                },
                project: first.project().to_string(),
                stream_type: first.stream_type().to_string(),
                stream_name: first.stream_name().to_string(),
                prod_step: "copy".to_string(),
                data_type: "RAW".to_string(),
                lumi_block: first.lumi_block(),
                app_name: "evtcopy".to_string(),
                free_metadata: first.free_metadata().to_vec(),
            };
            let directory = out_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
            let template = RawFileName::new(
                first.project(),
                run_number,
                first.stream_type(),
                first.stream_name(),
                "copy",
                "RAW",
                first.lumi_block(),
                "evtcopy",
            );
            let callback = RawFileNameCallback::new(directory, template);
            let mut writer = StorageWriter::new(callback, metadata, WriterLimits::default());
            if let Some(level) = compression_level {
                writer = writer.with_compression(compression, level);
            }
            Some(writer)
        }
        None => None,
    };

    let mut total_events = 0u64;
    for input in &args.inputs {
        // Positional arguments already enumerate the sequence explicitly, so
        // each file is read to its own end rather than auto-following to a
        // next file the caller didn't list.
        let mut reader = StorageReader::<eventstore::LocalFileSource>::open(input)
            .with_context(|| format!("opening {input:?}"))?;

        if args.list_events {
            println!(
                "{:?}: run {} stream {}_{} guid {}",
                input,
                reader.run_number(),
                reader.stream_type(),
                reader.stream_name(),
                reader.guid()
            );
        }

        let mut index = 0u64;
        loop {
            let (status, data) = reader.get_data(None).with_context(|| format!("reading {input:?}"))?;
            match status {
                ReadStatus::Ok => {
                    let payload = data.expect("Ok carries a payload");
                    if args.event.includes(index) {
                        if args.list_events {
                            println!("  event {index}: {} bytes", payload.len());
                        }
                        if let Some(w) = writer.as_mut() {
                            w.put_data(&payload)?;
                        }
                        total_events += 1;
                    }
                    index += 1;
                }
                ReadStatus::Wait | ReadStatus::Woff | ReadStatus::NoSeq => break,
            }
        }

        if args.check_events {
            let expected = reader.events_in_file().with_context(|| format!("reading trailer of {input:?}"))?;
            if u64::from(expected) != index {
                bail!("{input:?}: trailer claims {expected} events, read {index}");
            }
            println!("{input:?}: {index} events verified against trailer");
        }
    }

    if let Some(writer) = writer {
        writer.finalize().context("closing output file")?;
        println!("wrote {total_events} events to {:?}", args.out.unwrap());
    }

    Ok(())
}

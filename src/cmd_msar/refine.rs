use anyhow::{bail, Context};
use clap::*;
use std::io::Write;

use msar::libs::align::{self, MsaProgram};
use msar::libs::trim;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("refine")
        .about("Realign indel regions and trim uninformative columns")
        .after_help(
            r###"
Refines blocked FA alignments with an external MSA program, then trims
columns that carry no information.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* `--msa none` skips realignment and only trims
* `--quick` realigns only the indel windows
    * windows grow by `--pad` columns on both sides
    * windows closer than `--fill` columns merge into one
    * columns outside every window are written back byte for byte
* Trimming:
    * all-gap columns are always removed
    * with `--outgroup`, the last sequence of each block anchors the
      terminal trim and the complex indel trim; single-sequence blocks
      pass through with the all-gap trim only
* `--msa muscle` drives muscle 3.x (`-in`/`-out` flags); muscle 5
  changed its command line and is not supported
* `--parallel` hands one input file to one worker; a failing file is
  reported and skipped, the remaining files still finish
* `--outdir` writes one output per input file under the same base name;
  a pre-existing directory is an error

Examples:
1. Realign with MAFFT:
   msar refine tests/fas/example.fas

2. Realign only the indel regions:
   msar refine tests/fas/example.fas --quick --pad 20 --fill 10

3. Trim only, with an outgroup:
   msar refine tests/fas/example.fas --msa none --outgroup

4. Four files at a time, one output per input:
   msar refine *.fas --parallel 4 --outdir refined

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input block FA file(s) to process"),
        )
        .arg(
            Arg::new("msa")
                .long("msa")
                .value_parser(["mafft", "muscle", "clustalw", "none"])
                .default_value("mafft")
                .help("MSA program to use, or `none` to trim only"),
        )
        .arg(
            Arg::new("quick")
                .long("quick")
                .action(ArgAction::SetTrue)
                .help("Realign only indel regions"),
        )
        .arg(
            Arg::new("pad")
                .long("pad")
                .value_parser(value_parser!(i32))
                .default_value("50")
                .help("In quick mode, expand indel regions by this many columns"),
        )
        .arg(
            Arg::new("fill")
                .long("fill")
                .value_parser(value_parser!(i32))
                .default_value("50")
                .help("In quick mode, join indel regions separated by this many columns or fewer"),
        )
        .arg(
            Arg::new("has_outgroup")
                .long("outgroup")
                .action(ArgAction::SetTrue)
                .help("The last sequence of each block is the outgroup"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of files processed at the same time"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .num_args(1)
                .help("Write one output per input file into this directory"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

/// Read-only per-run configuration, shared by all workers.
struct RefineOpt {
    program: Option<MsaProgram>,
    is_quick: bool,
    pad: i32,
    fill: i32,
    has_outgroup: bool,
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let opt_msa = args.get_one::<String>("msa").unwrap();
    let opt = RefineOpt {
        program: if opt_msa == "none" {
            None
        } else {
            Some(opt_msa.parse::<MsaProgram>()?)
        },
        is_quick: args.get_flag("quick"),
        pad: *args.get_one::<i32>("pad").unwrap(),
        fill: *args.get_one::<i32>("fill").unwrap(),
        has_outgroup: args.get_flag("has_outgroup"),
    };
    if opt.pad < 0 || opt.fill < 0 {
        bail!("--pad and --fill must be non-negative");
    }

    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    let opt_outdir = args.get_one::<String>("outdir");
    let infiles: Vec<String> = args
        .get_many::<String>("infiles")
        .unwrap()
        .cloned()
        .collect();

    if let Some(outdir) = opt_outdir {
        if std::path::Path::new(outdir).exists() {
            bail!("output directory `{}` already exists", outdir);
        }
        std::fs::create_dir_all(outdir)
            .with_context(|| format!("could not create `{}`", outdir))?;
    }

    //----------------------------
    // Operating
    //----------------------------
    // One file is one unit of work; results keep the input order
    let mut results: Vec<(usize, anyhow::Result<String>)> = vec![];

    if opt_parallel == 1 {
        for (i, infile) in infiles.iter().enumerate() {
            results.push((i, proc_file(infile, &opt)));
        }
    } else {
        // Channel 1 - work items
        let (snd1, rcv1) = crossbeam::channel::bounded::<(usize, &str)>(10);
        // Channel 2 - results
        let (snd2, rcv2) = crossbeam::channel::bounded(10);

        crossbeam::scope(|s| {
            //----------------------------
            // Dispatcher thread
            //----------------------------
            s.spawn(|_| {
                for (i, infile) in infiles.iter().enumerate() {
                    snd1.send((i, infile.as_str())).unwrap();
                }
                // Close the channel - this is necessary to exit the for-loop in the worker
                drop(snd1);
            });

            //----------------------------
            // Worker threads
            //----------------------------
            for _ in 0..opt_parallel {
                // Send to sink, receive from source
                let (sendr, recvr) = (snd2.clone(), rcv1.clone());
                let opt = &opt;
                // Spawn workers in separate threads
                s.spawn(move |_| {
                    // Receive until channel closes
                    for (i, infile) in recvr.iter() {
                        sendr.send((i, proc_file(infile, opt))).unwrap();
                    }
                });
            }
            // Close the channel, otherwise sink will never exit the for-loop
            drop(snd2);

            //----------------------------
            // Collector
            //----------------------------
            for piece in rcv2.iter() {
                results.push(piece);
            }
        })
        .unwrap();

        results.sort_by_key(|(i, _)| *i);
    }

    //----------------------------
    // Output
    //----------------------------
    let mut writer = match opt_outdir {
        Some(_) => None,
        None => Some(msar::writer(args.get_one::<String>("outfile").unwrap())?),
    };

    let mut failed = 0usize;
    for (i, result) in results {
        let infile = &infiles[i];
        match result {
            Ok(out_string) => {
                if let Some(outdir) = opt_outdir {
                    let out_path = output_path(outdir, infile);
                    std::fs::write(&out_path, out_string)
                        .with_context(|| format!("could not write `{}`", out_path.display()))?;
                } else {
                    writer
                        .as_mut()
                        .unwrap()
                        .write_all(out_string.as_ref())?;
                }
            }
            Err(err) => {
                eprintln!("{}: {:#}", infile, err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, infiles.len());
    }

    Ok(())
}

/// Output name: input base name, `.gz` stripped.
fn output_path(outdir: &str, infile: &str) -> std::path::PathBuf {
    let base = std::path::Path::new(infile)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "stdin".to_string());
    let base = base.strip_suffix(".gz").unwrap_or(&base);
    std::path::Path::new(outdir).join(base)
}

/// Runs the whole parse-realign-trim pipeline for one file.
fn proc_file(infile: &str, opt: &RefineOpt) -> anyhow::Result<String> {
    let mut reader = msar::reader(infile)?;
    let mut out_string = String::new();

    while let Some(mut block) = msar::next_fas_block(&mut reader)? {
        if block.entries.is_empty() {
            continue;
        }
        out_string += &proc_block(&mut block, opt)?;
    }

    Ok(out_string)
}

fn proc_block(block: &mut msar::FasBlock, opt: &RefineOpt) -> anyhow::Result<String> {
    let mut seqs: Vec<String> = vec![];
    for entry in &block.entries {
        seqs.push(String::from_utf8(entry.seq().clone())?);
    }
    align::ensure_same_length(&seqs)
        .with_context(|| format!("ragged block at `{}`", block.entries[0].header()))?;

    //----------------------------
    // Realigning
    //----------------------------
    if let Some(program) = opt.program {
        seqs = if opt.is_quick {
            align::align_seqs_quick(&seqs, program, opt.pad, opt.fill)?
        } else {
            align::align_seqs_full(&seqs, program)?
        };
    }

    //----------------------------
    // Trimming
    //----------------------------
    trim::trim_pure_dash(&mut seqs)?;
    // a single-sequence block has nothing to anchor the outgroup trims on
    if opt.has_outgroup && block.entries.len() > 1 {
        block.set_outgroup_last()?;
        let outgroup = block.outgroup.unwrap();
        trim::trim_outgroup(&mut seqs, outgroup)?;
        trim::trim_complex_indel(&mut seqs, outgroup)?;
    }

    //----------------------------
    // Output
    //----------------------------
    let mut out_string = String::new();
    for (entry, seq) in block.entries.iter().zip(seqs.iter()) {
        out_string += &format!(">{}\n{}\n", entry.header(), seq);
    }

    // end of a block
    out_string += "\n";

    Ok(out_string)
}

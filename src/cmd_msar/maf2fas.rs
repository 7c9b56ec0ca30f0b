use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("maf2fas")
        .about("Convert MAF files to block FA format")
        .after_help(
            r###"
Converts MAF (Multiple Alignment Format) files into block FA format.

Input files can be gzipped. If the input file is 'stdin', data is read from standard input.

Notes:
* MAF starts are 0-based; headers in the output carry 1-based inclusive ranges
* Lines with tags other than `a` and `s` are ignored
* The --required file lists species names, one per line
    * A block is kept only when it holds at least that many sequences and
      every listed name matches the block's names
    * Kept blocks are written in the order of the name list
    * Rejected blocks are skipped whole; a count goes to stderr

Examples:
1. Convert a MAF file to block FA format:
   msar maf2fas tests/maf/example.maf

2. Keep only blocks covering all wanted species:
   msar maf2fas tests/maf/example.maf -r tests/maf/name.lst

3. Output results to a file:
   msar maf2fas tests/maf/example.maf -o output.fas

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input MAF file(s) to process"),
        )
        .arg(
            Arg::new("name.lst")
                .short('r')
                .long("required")
                .num_args(1)
                .help("File with a list of species names to keep"),
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

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = msar::writer(args.get_one::<String>("outfile").unwrap())?;

    let needed = args
        .get_one::<String>("name.lst")
        .map(|f| intspan::read_first_column(f));

    //----------------------------
    // Ops
    //----------------------------
    for infile in args.get_many::<String>("infiles").unwrap() {
        let mut reader = msar::reader(infile)?;
        let mut skipped = 0usize;

        'BLOCK: while let Some(ali) = msar::libs::maf::next_maf_block(&mut reader)? {
            if ali.components.is_empty() {
                continue;
            }

            let ordered: Vec<&msar::libs::maf::MafComp> = match &needed {
                None => ali.components.iter().collect(),
                Some(needed) => {
                    // all-or-nothing: substring match against the joined names
                    if ali.components.len() < needed.len() {
                        skipped += 1;
                        continue 'BLOCK;
                    }
                    let joined: String = ali
                        .components
                        .iter()
                        .map(|comp| comp.name_chr().0)
                        .collect();

                    let mut ordered = vec![];
                    for name in needed {
                        if !joined.contains(name) {
                            skipped += 1;
                            continue 'BLOCK;
                        }
                        // emit in the requested order
                        let found = ali
                            .components
                            .iter()
                            .find(|comp| comp.name_chr().0.contains(name));
                        match found {
                            Some(comp) => ordered.push(comp),
                            None => {
                                // matched only across a name boundary
                                skipped += 1;
                                continue 'BLOCK;
                            }
                        }
                    }
                    ordered
                }
            };

            //----------------------------
            // Output
            //----------------------------
            for comp in ordered {
                writer.write_all(format!(">{}\n{}\n", comp.to_range(), comp.text).as_ref())?;
            }

            // end of a block
            writer.write_all("\n".as_ref())?;
        }

        if skipped > 0 {
            eprintln!("{}: skipped {} block(s) failing the name filter", infile, skipped);
        }
    }

    Ok(())
}

use anyhow::{bail, Context};
use indexmap::IndexMap;
use std::io::{BufRead, BufReader, Write};
use std::process::Stdio;

/// Selector for the external MSA program.
///
/// The literal "none" is a caller-side sentinel for skipping realignment
/// and never reaches this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsaProgram {
    Mafft,
    Muscle,
    ClustalW,
}

impl std::str::FromStr for MsaProgram {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mafft" => Ok(Self::Mafft),
            "muscle" => Ok(Self::Muscle),
            "clustalw" => Ok(Self::ClustalW),
            _ => bail!("unknown MSA program `{}`", s),
        }
    }
}

impl MsaProgram {
    fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Mafft => &["mafft"],
            Self::Muscle => &["muscle"],
            Self::ClustalW => &["clustalw", "clustal-w", "clustalw2"],
        }
    }

    pub fn find_bin(&self) -> anyhow::Result<String> {
        for e in self.candidates() {
            if let Ok(pth) = which::which(e) {
                return Ok(pth.to_string_lossy().to_string());
            }
        }
        bail!("could not find {:?} in $PATH", self)
    }
}

/// Checks that all sequences have the same length and returns it.
pub fn ensure_same_length(seqs: &[String]) -> anyhow::Result<usize> {
    let Some(first) = seqs.first() else {
        return Ok(0);
    };
    let len = first.len();
    for (i, seq) in seqs.iter().enumerate() {
        if seq.len() != len {
            bail!(
                "alignment length mismatch: sequence {} has {} chars, expected {}",
                i,
                seq.len(),
                len
            );
        }
    }
    Ok(len)
}

/// 1-based positions of gap characters in a sequence.
pub fn indel_intspan(seq: &[u8]) -> intspan::IntSpan {
    let mut ints = intspan::IntSpan::new();
    let mut start = 0; // 1-based, 0 means "not in a run"

    for (i, base) in seq.iter().enumerate() {
        if *base == b'-' {
            if start == 0 {
                start = i as i32 + 1;
            }
        } else if start != 0 {
            ints.add_pair(start, i as i32);
            start = 0;
        }
    }
    if start != 0 {
        ints.add_pair(start, seq.len() as i32);
    }

    ints
}

/// Columns (1-based) to send through the external aligner.
///
/// Gap-bearing columns are unioned over all sequences, each span grows by
/// `pad` on both sides, holes of `fill` or fewer columns are closed, and
/// the result is clipped to the alignment bounds.
pub fn realign_intspan(seqs: &[String], pad: i32, fill: i32) -> anyhow::Result<intspan::IntSpan> {
    let len = ensure_same_length(seqs)? as i32;

    let mut indel_ints = intspan::IntSpan::new();
    for seq in seqs {
        indel_ints.merge(&indel_intspan(seq.as_bytes()));
    }
    if indel_ints.is_empty() {
        return Ok(indel_ints);
    }

    Ok(indel_ints
        .inset(-pad)
        .fill(fill)
        .intersect(&intspan::IntSpan::from_pair(1, len)))
}

/// Runs an external MSA program on a set of sequences.
///
/// Sequences are written with numeric headers (0..n-1) so punctuation in
/// real names cannot collide, then matched back by index, as aligners are
/// free to reorder their output. Returned sequences are upper-cased and
/// verified to be of equal count and length.
pub fn align_seqs(seqs: &[String], program: MsaProgram) -> anyhow::Result<Vec<String>> {
    let bin = program.find_bin()?;

    let dir = tempfile::tempdir()?;
    let in_path = dir.path().join("seqs.fa");
    let out_path = dir.path().join("aligned.fa");

    {
        let mut file = std::fs::File::create(&in_path)?;
        for (i, seq) in seqs.iter().enumerate() {
            writeln!(file, ">{}\n{}", i, seq)?;
        }
    }

    let status = match program {
        MsaProgram::Mafft => {
            let out_file = std::fs::File::create(&out_path)?;
            std::process::Command::new(&bin)
                .arg("--quiet")
                .arg("--auto")
                .arg(&in_path)
                .stdout(out_file)
                .stderr(Stdio::null())
                .status()
        }
        MsaProgram::Muscle => std::process::Command::new(&bin)
            .arg("-quiet")
            .arg("-in")
            .arg(&in_path)
            .arg("-out")
            .arg(&out_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
        MsaProgram::ClustalW => std::process::Command::new(&bin)
            .arg("-align")
            .arg(format!("-infile={}", in_path.display()))
            .arg(format!("-outfile={}", out_path.display()))
            .arg("-output=fasta")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    }
    .with_context(|| format!("failed to run `{}`", bin))?;

    if !status.success() {
        bail!("`{}` exited with {}", bin, status);
    }

    // Aligners wrap sequences and may reorder records
    let mut seq_of: IndexMap<usize, String> = IndexMap::new();
    let reader = BufReader::new(
        std::fs::File::open(&out_path)
            .with_context(|| format!("`{}` produced no output", bin))?,
    );
    let mut cur: Option<usize> = None;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let idx: usize = header
                .split_whitespace()
                .next()
                .unwrap_or("")
                .parse()
                .with_context(|| format!("unparsable `{}` output header: {}", bin, line))?;
            seq_of.insert(idx, String::new());
            cur = Some(idx);
        } else {
            let Some(idx) = cur else {
                bail!("unparsable `{}` output: sequence before header", bin);
            };
            seq_of
                .get_mut(&idx)
                .unwrap()
                .push_str(&line.to_ascii_uppercase());
        }
    }

    if seq_of.len() != seqs.len() {
        bail!(
            "`{}` returned {} sequences, expected {}",
            bin,
            seq_of.len(),
            seqs.len()
        );
    }
    let mut results = vec![];
    for i in 0..seqs.len() {
        let Some(seq) = seq_of.get(&i) else {
            bail!("`{}` output misses sequence {}", bin, i);
        };
        results.push(seq.clone());
    }
    ensure_same_length(&results)?;

    Ok(results)
}

/// Full realignment: strip all gaps and realign the whole block.
pub fn align_seqs_full(seqs: &[String], program: MsaProgram) -> anyhow::Result<Vec<String>> {
    let stripped: Vec<String> = seqs.iter().map(|s| s.replace('-', "")).collect();
    align_seqs(&stripped, program)
}

/// Cuts each window (1-based inclusive span) out of every sequence.
///
/// `windows` must be disjoint and ascending, as produced by
/// `IntSpan::spans()`. Returns one piece per sequence per window.
fn cut_windows(seqs: &[String], windows: &[(i32, i32)]) -> Vec<Vec<String>> {
    windows
        .iter()
        .map(|&(lower, upper)| {
            seqs.iter()
                .map(|seq| seq[lower as usize - 1..upper as usize].to_string())
                .collect()
        })
        .collect()
}

/// Replaces each window of every sequence with its realigned piece.
///
/// Splicing runs back-to-front so the remaining span coordinates stay
/// valid. Columns outside every window are left byte-identical,
/// including their case.
fn splice_windows(
    seqs: &[String],
    windows: &[(i32, i32)],
    pieces_of: &[Vec<String>],
) -> Vec<String> {
    let mut results = seqs.to_vec();
    for ((lower, upper), pieces) in windows.iter().zip(pieces_of.iter()).rev() {
        for (seq, piece) in results.iter_mut().zip(pieces.iter()) {
            seq.replace_range(*lower as usize - 1..*upper as usize, piece);
        }
    }
    results
}

/// Quick realignment: realign only the indel windows.
///
/// Windows come from [`realign_intspan`]; each is cut out of every
/// sequence, stripped of embedded gaps, realigned from scratch and
/// spliced back at the same span.
pub fn align_seqs_quick(
    seqs: &[String],
    program: MsaProgram,
    pad: i32,
    fill: i32,
) -> anyhow::Result<Vec<String>> {
    let realign_ints = realign_intspan(seqs, pad, fill)?;
    if realign_ints.is_empty() {
        return Ok(seqs.to_vec());
    }

    let windows = realign_ints.spans();
    let mut pieces_of = vec![];
    for pieces in cut_windows(seqs, &windows) {
        let stripped: Vec<String> = pieces.iter().map(|p| p.replace('-', "")).collect();
        pieces_of.push(align_seqs(&stripped, program)?);
    }

    let results = splice_windows(seqs, &windows, &pieces_of);
    ensure_same_length(&results)?;
    Ok(results)
}

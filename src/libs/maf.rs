use anyhow::bail;
use std::io::BufRead;

/// One `s` line of a MAF block.
///
/// `start` and `size` are kept as found in the file, i.e. 0-based
/// half-open. `to_range()` performs the 1-based conversion.
#[derive(Debug, Clone, Default)]
pub struct MafComp {
    pub src: String,
    pub start: usize,
    pub size: usize,
    pub strand: char,
    pub src_size: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct MafAli {
    pub score: Option<f64>,
    pub components: Vec<MafComp>,
}

impl MafComp {
    /// Splits `src` on the first `.` into (name, chr). Sources without a
    /// dot use the whole string for both.
    pub fn name_chr(&self) -> (&str, &str) {
        match self.src.split_once('.') {
            Some((name, chr)) => (name, chr),
            None => (self.src.as_str(), self.src.as_str()),
        }
    }

    /// 1-based inclusive range of this component.
    ///
    /// MAF records 0-based starts, so `start = raw + 1` and
    /// `end = raw + size`.
    pub fn to_range(&self) -> intspan::Range {
        let (name, chr) = self.name_chr();
        intspan::Range::from_full(
            name,
            chr,
            &self.strand.to_string(),
            (self.start + 1) as i32,
            (self.start + self.size) as i32,
        )
    }
}

/// Reads the next alignment block from a MAF stream.
///
/// `s` lines become components; `a` lines may carry a score; comments and
/// other tags (`i`, `e`, `q`, `track`, ...) are dropped. A blank line ends
/// the block. Returns `Ok(None)` at a clean EOF.
pub fn next_maf_block(reader: &mut dyn BufRead) -> anyhow::Result<Option<MafAli>> {
    let mut ali = MafAli::default();

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if ali.components.is_empty() {
                return Ok(None);
            }
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            if ali.components.is_empty() {
                continue;
            }
            break;
        }
        if line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields[0] {
            "a" => {
                for f in &fields[1..] {
                    if let Some(value) = f.strip_prefix("score=") {
                        ali.score = value.parse::<f64>().ok();
                    }
                }
            }
            "s" => {
                if fields.len() != 7 {
                    bail!("malformed `s` line, expected 7 fields: {}", line);
                }
                let comp = MafComp {
                    src: fields[1].to_string(),
                    start: fields[2].parse()?,
                    size: fields[3].parse()?,
                    strand: fields[4].chars().next().unwrap_or('+'),
                    src_size: fields[5].parse()?,
                    text: fields[6].to_string(),
                };
                let (name, _) = comp.name_chr();
                for prev in &ali.components {
                    if prev.name_chr().0 == name {
                        bail!("duplicated name `{}` in one block", name);
                    }
                }
                ali.components.push(comp);
            }
            // i, e, q, track and friends carry no alignment text
            _ => {}
        }
    }

    Ok(Some(ali))
}

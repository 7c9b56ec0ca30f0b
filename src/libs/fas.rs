use anyhow::bail;
use std::io::BufRead;

/// One named, gapped sequence of a block.
///
/// Headers in the `name.chr(strand):start-end` form carry genomic
/// coordinates; anything else is kept verbatim as a bare name.
#[derive(Debug, Clone, Default)]
pub struct FasEntry {
    header: String,
    range: intspan::Range,
    seq: Vec<u8>,
}

impl FasEntry {
    pub fn from(header: &str, seq: &[u8]) -> Self {
        Self {
            header: header.to_string(),
            range: intspan::Range::from_str(header),
            seq: seq.to_vec(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn range(&self) -> &intspan::Range {
        &self.range
    }

    pub fn seq(&self) -> &Vec<u8> {
        &self.seq
    }

    /// Species/sample name: the range name when the header carries
    /// coordinates, the whole header otherwise.
    pub fn name(&self) -> &str {
        if self.range.is_valid() && !self.range.name().is_empty() {
            self.range.name()
        } else {
            &self.header
        }
    }
}

impl std::fmt::Display for FasEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ">{}", self.header)?;
        writeln!(f, "{}", String::from_utf8_lossy(&self.seq))?;
        Ok(())
    }
}

/// One alignment: entries in encounter order.
///
/// The outgroup, when set, is an explicit validated index instead of the
/// bare "last entry" convention.
#[derive(Debug, Clone, Default)]
pub struct FasBlock {
    pub entries: Vec<FasEntry>,
    pub names: Vec<String>,
    pub outgroup: Option<usize>,
}

impl FasBlock {
    /// Marks the last entry as the outgroup. Blocks with fewer than two
    /// entries cannot have one.
    pub fn set_outgroup_last(&mut self) -> anyhow::Result<()> {
        if self.entries.len() < 2 {
            bail!(
                "block of {} sequence(s) cannot designate an outgroup",
                self.entries.len()
            );
        }
        self.outgroup = Some(self.entries.len() - 1);
        Ok(())
    }
}

/// Reads the next block from a blocked FA stream.
///
/// Each record is a `>header` line followed by exactly one sequence line;
/// a blank line ends the block. Unbalanced header/sequence pairs are a
/// parse error. Returns `Ok(None)` at a clean EOF.
pub fn next_fas_block(reader: &mut dyn BufRead) -> anyhow::Result<Option<FasBlock>> {
    let mut block = FasBlock::default();
    let mut header: Option<String> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            if block.entries.is_empty() && header.is_none() {
                return Ok(None);
            }
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            if block.entries.is_empty() && header.is_none() {
                continue;
            }
            break;
        }

        if let Some(stripped) = line.strip_prefix('>') {
            if let Some(prev) = &header {
                bail!("header `>{}` without a sequence line", prev);
            }
            header = Some(stripped.to_string());
        } else {
            let Some(hd) = header.take() else {
                bail!("sequence line without a header: {}", line);
            };
            let entry = FasEntry::from(&hd, line.as_bytes());
            block.names.push(entry.name().to_string());
            block.entries.push(entry);
        }
    }

    if let Some(hd) = header {
        bail!("header `>{}` without a sequence line", hd);
    }

    Ok(Some(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAS: &str = r###">S288c.VIII(+):1-10
ACGTACGTAC
>YJM789.chr8(+):21-30
ACGTACGTAC

>S288c.VIII(+):101-105
AC-GT
>Spar
ACTGT
"###;

    #[test]
    fn read_blocks() {
        let mut reader = std::io::Cursor::new(FAS);

        let block = next_fas_block(&mut reader).unwrap().unwrap();
        assert_eq!(block.names, vec!["S288c", "YJM789"]);
        assert_eq!(block.entries[0].range().to_string(), "S288c.VIII(+):1-10");

        let block = next_fas_block(&mut reader).unwrap().unwrap();
        assert_eq!(block.names, vec!["S288c", "Spar"]);
        assert_eq!(block.entries[1].header(), "Spar");
        assert_eq!(block.entries[1].seq(), b"ACTGT");

        assert!(next_fas_block(&mut reader).unwrap().is_none());
    }

    #[test]
    fn round_trip() {
        let mut reader = std::io::Cursor::new(FAS);
        let mut out = String::new();
        while let Some(block) = next_fas_block(&mut reader).unwrap() {
            for entry in &block.entries {
                out += &entry.to_string();
            }
            out += "\n";
        }
        // the writer closes every block with a blank line
        assert_eq!(out, format!("{}\n", FAS));
    }

    #[test]
    fn unbalanced_pair() {
        let mut reader = std::io::Cursor::new(">S288c\nACGT\n>Spar\n");
        assert!(next_fas_block(&mut reader).is_err());
    }

    #[test]
    fn outgroup_needs_two() {
        let mut reader = std::io::Cursor::new(">S288c\nACGT\n");
        let mut block = next_fas_block(&mut reader).unwrap().unwrap();
        assert!(block.set_outgroup_last().is_err());

        let mut reader = std::io::Cursor::new(">S288c\nACGT\n>Spar\nACGT\n");
        let mut block = next_fas_block(&mut reader).unwrap().unwrap();
        block.set_outgroup_last().unwrap();
        assert_eq!(block.outgroup, Some(1));
    }
}

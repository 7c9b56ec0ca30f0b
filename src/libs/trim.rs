use anyhow::bail;

use crate::libs::align::ensure_same_length;

/// Removes the given 1-based columns from every sequence.
fn strip_columns(seqs: &mut [String], ints: &intspan::IntSpan) {
    for (lower, upper) in ints.spans().into_iter().rev() {
        for seq in seqs.iter_mut() {
            seq.replace_range(lower as usize - 1..upper as usize, "");
        }
    }
}

/// Drops every column where all sequences hold a gap.
pub fn trim_pure_dash(seqs: &mut [String]) -> anyhow::Result<()> {
    let len = ensure_same_length(seqs)?;
    if seqs.is_empty() {
        return Ok(());
    }

    let mut trim_ints = intspan::IntSpan::new();
    'COL: for col in 1..=len {
        for seq in seqs.iter() {
            if seq.as_bytes()[col - 1] != b'-' {
                continue 'COL;
            }
        }
        trim_ints.add_pair(col as i32, col as i32);
    }

    strip_columns(seqs, &trim_ints);
    Ok(())
}

/// Trims the alignment back to the span covered by the outgroup.
///
/// Walks inward from each end while the outgroup column is a gap and
/// removes those terminal columns from every sequence.
pub fn trim_outgroup(seqs: &mut [String], outgroup: usize) -> anyhow::Result<()> {
    let len = ensure_same_length(seqs)?;
    if outgroup >= seqs.len() {
        bail!(
            "outgroup index {} out of bounds for {} sequences",
            outgroup,
            seqs.len()
        );
    }

    let og = seqs[outgroup].as_bytes();
    let head = og.iter().take_while(|&&b| b == b'-').count();
    let tail = og[head..].iter().rev().take_while(|&&b| b == b'-').count();

    let mut trim_ints = intspan::IntSpan::new();
    if head > 0 {
        trim_ints.add_pair(1, head as i32);
    }
    if tail > 0 {
        trim_ints.add_pair((len - tail + 1) as i32, len as i32);
    }

    strip_columns(seqs, &trim_ints);
    Ok(())
}

/// Removes internal columns with indels that cannot be called as a single
/// event against the outgroup.
///
/// A column qualifies when the outgroup holds a gap while the ingroup
/// carries both gaps and residues. Columns where the outgroup and every
/// ingroup sequence agree are never touched, and reapplying the pass
/// changes nothing: after removal, every remaining outgroup-gap column
/// has a uniform ingroup.
pub fn trim_complex_indel(seqs: &mut [String], outgroup: usize) -> anyhow::Result<()> {
    let len = ensure_same_length(seqs)?;
    if outgroup >= seqs.len() {
        bail!(
            "outgroup index {} out of bounds for {} sequences",
            outgroup,
            seqs.len()
        );
    }

    let ingroup_count = seqs.len() - 1;
    if ingroup_count < 2 {
        return Ok(());
    }

    let mut trim_ints = intspan::IntSpan::new();
    for col in 1..=len {
        if seqs[outgroup].as_bytes()[col - 1] != b'-' {
            continue;
        }
        let gaps = seqs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != outgroup)
            .filter(|(_, seq)| seq.as_bytes()[col - 1] == b'-')
            .count();
        if gaps > 0 && gaps < ingroup_count {
            trim_ints.add_pair(col as i32, col as i32);
        }
    }

    strip_columns(seqs, &trim_ints);
    Ok(())
}

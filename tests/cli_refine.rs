use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn command_refine_trim_outgroup() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .arg("--outgroup")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    let expected = r###">human.chr1(+):1-8
ACGT
>mouse.chr1(+):11-18
ACGT
>rat.chr2(+):21-24
ACGT

>human.chr1(+):101-104
AAT
>mouse.chr1(+):111-113
AAT
>rat.chr2(+):121-122
A-T

"###;
    assert_eq!(stdout, expected);

    Ok(())
}

#[test]
fn command_refine_trim_only() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    // without an outgroup only the all-gap columns go away
    assert!(stdout.contains("TTACGTTT"));
    assert!(stdout.contains("--ACGT--"));
    assert!(stdout.contains("AA-T"));
    assert!(stdout.contains("A--T"));

    Ok(())
}

#[test]
fn command_refine_outgroup_single_seq_block() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/single.fas")
        .arg("--msa")
        .arg("none")
        .arg("--outgroup")
        .output()
        .unwrap();

    // a single-sequence block keeps the all-gap trim and nothing else;
    // the following block still gets the outgroup trims
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    let expected = r###">human.chr9(+):1-4
ACGT

>human.chr1(+):1-8
ACGT
>mouse.chr1(+):11-18
ACGT
>rat.chr2(+):21-24
ACGT

"###;
    assert_eq!(stdout, expected);

    Ok(())
}

#[test]
fn command_refine_outdir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let outdir = dir.path().join("refined");
    let outdir = outdir.to_str().unwrap();

    let mut cmd = Command::cargo_bin("msar")?;
    cmd.arg("refine")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .arg("--outdir")
        .arg(outdir)
        .assert()
        .success();

    let out_path = std::path::Path::new(outdir).join("example.fas");
    let content = std::fs::read_to_string(&out_path)?;
    assert!(content.contains(">human.chr1(+):1-8"));

    // a pre-existing output directory is refused
    let mut cmd = Command::cargo_bin("msar")?;
    cmd.arg("refine")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .arg("--outdir")
        .arg(outdir)
        .assert()
        .failure()
        .stderr(predicates::str::contains("already exists"));

    Ok(())
}

#[test]
fn command_refine_parallel() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/example.fas")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .arg("--parallel")
        .arg("2")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    // both files survive, in input order
    assert_eq!(stdout.matches(">human.chr1(+):1-8").count(), 2);
    assert_eq!(stdout.matches('>').count(), 12);

    Ok(())
}

#[test]
fn command_refine_missing_file_keeps_going() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/does_not_exist.fas")
        .arg("tests/fas/example.fas")
        .arg("--msa")
        .arg("none")
        .output()
        .unwrap();

    // the bad file is reported, the good one still completes
    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does_not_exist.fas"));
    assert_eq!(stdout.matches('>').count(), 6);

    Ok(())
}

#[test]
fn command_refine_quick_mafft() -> anyhow::Result<()> {
    if which::which("mafft").is_err() {
        return Ok(());
    }

    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("refine")
        .arg("tests/fas/example.fas")
        .arg("--quick")
        .arg("--pad")
        .arg("2")
        .arg("--fill")
        .arg("2")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    // every block keeps its cardinality and stays flush
    for block in stdout.split("\n\n").filter(|s| !s.trim().is_empty()) {
        let seqs: Vec<&str> = block
            .lines()
            .filter(|line| !line.starts_with('>'))
            .collect();
        assert_eq!(seqs.len(), 3);
        assert!(seqs.iter().all(|s| s.len() == seqs[0].len()));
    }

    // headers pass through untouched
    assert!(stdout.contains(">human.chr1(+):1-8"));
    assert_eq!(stdout.matches('>').count(), 6);

    Ok(())
}

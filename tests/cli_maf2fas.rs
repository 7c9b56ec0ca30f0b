use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn command_maf2fas() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("maf2fas")
        .arg("tests/maf/example.maf")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(stdout.matches('>').count(), 7); // 3 + 2 + 2 sequences
    assert_eq!(stdout.lines().count(), 17);

    // coordinates transformed to 1-based inclusive
    assert!(stdout.contains(">human.chr1(+):11-14"));
    assert!(stdout.contains("AC-GT"));
    assert!(stdout.contains(">mouse.chr1(+):21-25"));
    assert!(stdout.contains(">rat.chr2(-):31-35"), "minus strand kept");
    assert!(stdout.contains(">human.chr1(+):51-55"));
    assert!(stdout.contains(">rat.chr2(-):91-94"));

    Ok(())
}

#[test]
fn command_maf2fas_subset() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("maf2fas")
        .arg("tests/maf/example.maf")
        .arg("--required")
        .arg("tests/maf/name.lst")
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    // the third block lacks mouse and is skipped whole
    assert_eq!(stdout.matches('>').count(), 4);
    assert!(!stdout.contains(">rat"), "no partial emission");
    assert!(stderr.contains("skipped 1"));

    // output follows the order of the name list
    let headers: Vec<&str> = stdout
        .lines()
        .filter(|line| line.starts_with('>'))
        .collect();
    assert_eq!(headers[0], ">mouse.chr1(+):21-25");
    assert_eq!(headers[1], ">human.chr1(+):11-14");
    assert_eq!(headers[2], ">mouse.chr3(+):71-75");
    assert_eq!(headers[3], ">human.chr1(+):51-55");

    Ok(())
}

#[test]
fn command_maf2fas_subset_rejects_unknown() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lst = dir.path().join("name.lst");
    std::fs::write(&lst, "human\nchimp\n")?;

    let mut cmd = Command::cargo_bin("msar")?;
    let output = cmd
        .arg("maf2fas")
        .arg("tests/maf/example.maf")
        .arg("--required")
        .arg(lst.to_str().unwrap())
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(stdout.matches('>').count(), 0);
    assert!(stderr.contains("skipped 3"));

    Ok(())
}

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use super::{CheckParams, TranslateParams, build_cli};

#[test]
fn translate_params_round_trip() {
    let matches = build_cli()
        .try_get_matches_from([
            "javamp",
            "translate",
            "--out-dir",
            "out",
            "--threads",
            "4",
            "A.java",
            "B.java",
        ])
        .unwrap();
    let (_, m) = matches.subcommand().unwrap();
    let params = TranslateParams::from_matches(m);
    assert_eq!(
        params.files,
        vec![PathBuf::from("A.java"), PathBuf::from("B.java")]
    );
    assert_eq!(params.out_dir, Some(PathBuf::from("out")));
    assert_eq!(params.threads, Some(4));
}

#[test]
fn translate_defaults() {
    let matches = build_cli()
        .try_get_matches_from(["javamp", "translate", "A.java"])
        .unwrap();
    let (_, m) = matches.subcommand().unwrap();
    let params = TranslateParams::from_matches(m);
    assert_eq!(params.out_dir, None);
    assert_eq!(params.threads, None);
}

#[test]
fn check_format_selection() {
    let matches = build_cli()
        .try_get_matches_from(["javamp", "check", "--format", "json", "A.java"])
        .unwrap();
    let (_, m) = matches.subcommand().unwrap();
    assert!(CheckParams::from_matches(m).json);

    let matches = build_cli()
        .try_get_matches_from(["javamp", "check", "A.java"])
        .unwrap();
    let (_, m) = matches.subcommand().unwrap();
    assert!(!CheckParams::from_matches(m).json);
}

#[test]
fn rejects_missing_files_and_bad_values() {
    assert!(build_cli().try_get_matches_from(["javamp", "translate"]).is_err());
    assert!(
        build_cli()
            .try_get_matches_from(["javamp", "translate", "--threads", "0", "A.java"])
            .is_err()
    );
    assert!(
        build_cli()
            .try_get_matches_from(["javamp", "check", "--format", "xml", "A.java"])
            .is_err()
    );
}

#[test]
fn verbosity_is_global_and_counted() {
    let matches = build_cli()
        .try_get_matches_from(["javamp", "translate", "-vv", "A.java"])
        .unwrap();
    assert_eq!(matches.get_count("verbose"), 2);
}

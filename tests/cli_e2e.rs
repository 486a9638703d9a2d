use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn hessian2_bin() -> &'static str {
    env!("CARGO_BIN_EXE_hessian2")
}

fn test_temp_dir(tag: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("hessian2-cli-e2e-{tag}-{}-{ts}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn run_hessian2(args: &[&str]) -> Output {
    Command::new(hessian2_bin())
        .args(args)
        .output()
        .expect("run hessian2")
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("utf-8 path")
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}

const SAMPLE: &str = r#"[
    1,
    5000000000,
    "text",
    2.5,
    [true, null, "x"],
    {"k": 2},
    {"$binary": "AQID"},
    {"$date": 894621091000},
    {"$class": "Point", "$fields": {"x": 1, "y": -1}},
    {"$list": "[int", "$items": [1, 2]}
]"#;

#[test]
fn cli_encode_decode_round_trip() {
    let dir = test_temp_dir("roundtrip");
    let input = dir.join("in.json");
    let bin = dir.join("out.hessian");
    let back = dir.join("back.json");
    fs::write(&input, SAMPLE).expect("write json");

    let enc = run_hessian2(&["encode", "-i", path_str(&input), "-o", path_str(&bin)]);
    assert!(enc.status.success(), "encode failed: {}", String::from_utf8_lossy(&enc.stderr));
    assert!(!dir.join("out.hessian.tmp").exists());

    let dec = run_hessian2(&["decode", "-i", path_str(&bin), "-o", path_str(&back), "--pretty"]);
    assert!(dec.status.success(), "decode failed: {}", String::from_utf8_lossy(&dec.stderr));

    let expected: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
    assert_eq!(read_json(&back), expected);
}

#[test]
fn cli_output_path_derived_from_input() {
    let dir = test_temp_dir("derived");
    let input = dir.join("data.json");
    fs::write(&input, "[\"a\"]").expect("write json");

    let enc = run_hessian2(&["encode", "-i", path_str(&input)]);
    assert!(enc.status.success(), "encode failed: {}", String::from_utf8_lossy(&enc.stderr));
    assert_eq!(fs::read(dir.join("data.hessian")).unwrap(), b"\x01a");
}

#[test]
fn cli_decode_to_stdout() {
    let dir = test_temp_dir("stdout");
    let bin = dir.join("in.hessian");
    fs::write(&bin, [0x91, 0x05, b'h', b'e', b'l', b'l', b'o', b'N']).unwrap();

    let dec = run_hessian2(&["decode", "-i", path_str(&bin), "-o", "-"]);
    assert!(dec.status.success(), "decode failed: {}", String::from_utf8_lossy(&dec.stderr));
    assert_eq!(String::from_utf8_lossy(&dec.stdout).trim(), r#"[1,"hello",null]"#);
}

#[test]
fn cli_packets_round_trip() {
    let dir = test_temp_dir("packets");
    let input = dir.join("in.json");
    let bin = dir.join("out.hessian");
    let back = dir.join("back.json");
    fs::write(&input, r#"[[1, 2], "second"]"#).unwrap();

    let enc = run_hessian2(&["encode", "-i", path_str(&input), "-o", path_str(&bin), "--packets"]);
    assert!(enc.status.success(), "encode failed: {}", String::from_utf8_lossy(&enc.stderr));
    let bytes = fs::read(&bin).unwrap();
    assert_eq!(bytes[0], 0x80);
    assert!(bytes.ends_with(&[0x80, 0x00]));

    let dec = run_hessian2(&["decode", "-i", path_str(&bin), "-o", path_str(&back), "--packets"]);
    assert!(dec.status.success(), "decode failed: {}", String::from_utf8_lossy(&dec.stderr));
    assert_eq!(read_json(&back), serde_json::json!([[1, 2], "second"]));
}

#[test]
fn cli_inspect_lists_values() {
    let dir = test_temp_dir("inspect");
    let bin = dir.join("in.hessian");
    fs::write(&bin, [0x91, 0x05, b'h', b'e', b'l', b'l', b'o']).unwrap();

    let out = run_hessian2(&["inspect", "-i", path_str(&bin)]);
    assert!(out.status.success(), "inspect failed: {}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[0].starts_with("#0 @0: 0x91"), "{text}");
    assert!(lines[0].ends_with("-> int"), "{text}");
    assert!(lines[1].starts_with("#1 @1: 0x05"), "{text}");
    assert!(lines[1].ends_with("-> string"), "{text}");
    assert_eq!(lines[2], "2 value(s), 7 bytes");
}

#[test]
fn cli_malformed_input_fails() {
    let dir = test_temp_dir("malformed");
    let bin = dir.join("bad.hessian");
    let out_path = dir.join("bad.json");
    fs::write(&bin, [0x91, 0x40]).unwrap();

    let dec = run_hessian2(&["decode", "-i", path_str(&bin), "-o", path_str(&out_path)]);
    assert!(!dec.status.success());
    assert_eq!(dec.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&dec.stderr).is_empty());
    assert!(!out_path.exists());
}

#[test]
fn cli_encode_rejects_non_array() {
    let dir = test_temp_dir("non-array");
    let input = dir.join("in.json");
    fs::write(&input, "{\"a\": 1}").unwrap();

    let enc = run_hessian2(&["encode", "-i", path_str(&input), "-o", path_str(&dir.join("x.hessian"))]);
    assert_eq!(enc.status.code(), Some(1));
}

#[test]
fn cli_missing_input_file_fails() {
    let dir = test_temp_dir("missing");
    let out = run_hessian2(&["inspect", "-i", path_str(&dir.join("nope.hessian"))]);
    assert_eq!(out.status.code(), Some(1));
}

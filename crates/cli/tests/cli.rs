// RVModel - RISC-V Architectural Test Target
// Copyright (C) 2026 RVModel Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use rvmodel_loader::testing::{arch_test_elf, ElfBuilder, LOAD_ADDR};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const BEGIN_SIGNATURE: u64 = LOAD_ADDR + 0x18;

fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("rvmodel-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    dir.join(format!("{}-{}.{}", prefix, nonce, ext))
}

fn write_temp_file(prefix: &str, ext: &str, contents: &[u8]) -> PathBuf {
    let path = temp_path(prefix, ext);
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

fn rvmodel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rvmodel"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_layout_json_defaults() {
    let output = rvmodel(&["layout", "--json"]);
    assert!(output.status.success());

    let layout = json(&output);
    assert_eq!(layout["header"]["regstate_size"], 128);
    assert_eq!(layout["header"]["signature_word_size"], 4);
    assert_eq!(layout["header"]["align"], 8);
    assert_eq!(layout["data_align"], 4);
    assert_eq!(layout["msip"]["addr"], 0x0200_0000);
    assert_eq!(layout["msip"]["set"], 1);
    assert_eq!(layout["symbols"]["halt"], "_halt");
    assert_eq!(layout["symbols"]["begin_signature"], "begin_signature");
}

#[test]
fn test_layout_text() {
    let output = rvmodel(&["layout"]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("begin_regstate = 128"));
    assert!(text.contains("0x02000000"));
}

#[test]
fn test_layout_honours_platform() {
    let platform = write_temp_file(
        "platform-moved",
        "yaml",
        br#"
name: moved
ram:
  base: 2147483648
  size: "65536"
clint:
  base: 34603008
"#,
    );
    let output = rvmodel(&["layout", "--platform", arg(&platform), "--json"]);
    assert!(output.status.success());

    let layout = json(&output);
    assert_eq!(layout["platform"], "moved");
    assert_eq!(layout["msip"]["addr"], 0x0210_0000);
    assert_eq!(layout["ram"]["size"], 65536);
}

#[test]
fn test_bad_platform_is_input_error() {
    let platform = write_temp_file(
        "platform-bad",
        "yaml",
        br#"
name: bad
ram:
  base: 2147483648
  size: "65536"
uart: yes
"#,
    );
    let output = rvmodel(&["layout", "--platform", arg(&platform)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_check_passes_conforming_elf() {
    let elf = write_temp_file("good", "elf", &arch_test_elf(&[0xDEAD_BEEF, 0]).build());
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert!(output.status.success());

    let report = json(&output);
    assert_eq!(report["status"], "pass");
    assert_eq!(report["signature_words"], 2);
    assert_eq!(report["entry_point"], LOAD_ADDR);
    assert_eq!(report["symbols"]["begin_signature"], BEGIN_SIGNATURE);
    assert_eq!(report["sha256"].as_str().unwrap().len(), 64);
    assert!(report["violations"].as_array().unwrap().is_empty());
}

#[test]
fn test_check_empty_region_is_only_a_warning() {
    let elf = write_temp_file("empty", "elf", &arch_test_elf(&[]).build());
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert!(output.status.success());

    let report = json(&output);
    assert_eq!(report["signature_words"], 0);
    assert_eq!(report["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_check_missing_label_is_violation() {
    let elf = write_temp_file(
        "no-signature",
        "elf",
        &ElfBuilder::new(LOAD_ADDR)
            .label("_start")
            .label("_halt")
            .word(0x13)
            .build(),
    );
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let report = json(&output);
    assert_eq!(report["status"], "fail");
    assert!(report["violations"][0]
        .as_str()
        .unwrap()
        .contains("begin_regstate"));
}

#[test]
fn test_check_duplicate_label_is_violation() {
    let elf = write_temp_file(
        "duplicate",
        "elf",
        &arch_test_elf(&[1]).symbol("end_signature", LOAD_ADDR).build(),
    );
    let output = rvmodel(&["check", arg(&elf)]);
    assert_eq!(output.status.code(), Some(1));
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("not unique"));
}

#[test]
fn test_check_misaligned_header_is_violation() {
    let elf = write_temp_file(
        "misaligned",
        "elf",
        &ElfBuilder::new(LOAD_ADDR)
            .label("_start")
            .label("_halt")
            .word(0x13)
            .label("begin_regstate")
            .word(128)
            .label("end_regstate")
            .word(4)
            .label("begin_signature")
            .word(0)
            .label("end_signature")
            .build(),
    );
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(json(&output)["violations"][0]
        .as_str()
        .unwrap()
        .contains("8-byte aligned"));
}

#[test]
fn test_check_wrong_header_word_is_violation() {
    let elf = write_temp_file(
        "bad-header",
        "elf",
        &ElfBuilder::new(LOAD_ADDR)
            .label("_start")
            .label("_halt")
            .word(0x13)
            .word(0)
            .label("begin_regstate")
            .word(64)
            .label("end_regstate")
            .word(4)
            .label("begin_signature")
            .label("end_signature")
            .build(),
    );
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(json(&output)["violations"][0]
        .as_str()
        .unwrap()
        .contains("expected 128"));
}

#[test]
fn test_check_missing_file_is_input_error() {
    let output = rvmodel(&["check", "/nonexistent/test.elf"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_check_garbage_is_input_error() {
    let elf = write_temp_file("garbage", "elf", b"definitely not an ELF file");
    let output = rvmodel(&["check", arg(&elf)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_signature_to_stdout() {
    let elf = write_temp_file("sig", "elf", &arch_test_elf(&[0xDEAD_BEEF, 0]).build());
    let output = rvmodel(&["signature", arg(&elf)]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "deadbeef\n00000000\n");
}

#[test]
fn test_signature_over_memory_dump() {
    let elf = write_temp_file("sig-dump", "elf", &arch_test_elf(&[0, 0]).build());
    let dump = write_temp_file("dump", "bin", &[0x78, 0x56, 0x34, 0x12]);
    let base = format!("{:#x}", BEGIN_SIGNATURE);
    let out = temp_path("sig-dump", "signature");

    let output = rvmodel(&[
        "signature",
        arg(&elf),
        "--dump",
        arg(&dump),
        "--dump-base",
        &base,
        "-o",
        arg(&out),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "12345678\n00000000\n"
    );
}

#[test]
fn test_signature_dump_requires_base() {
    let elf = write_temp_file("sig-nobase", "elf", &arch_test_elf(&[0]).build());
    let dump = write_temp_file("dump-nobase", "bin", &[0; 4]);
    let output = rvmodel(&["signature", arg(&elf), "--dump", arg(&dump)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_signature_empty_region_writes_nothing() {
    let elf = write_temp_file("sig-empty", "elf", &arch_test_elf(&[]).build());
    let output = rvmodel(&["signature", arg(&elf)]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_signature_with_renamed_halt() {
    let elf = write_temp_file(
        "sig-renamed",
        "elf",
        &arch_test_elf(&[7]).rename("_halt", "rvtest_halt").build(),
    );
    let platform = write_temp_file(
        "platform-renamed",
        "yaml",
        br#"
name: renamed
ram:
  base: 2147483648
  size: "2MiB"
symbols:
  halt: rvtest_halt
"#,
    );

    let output = rvmodel(&["signature", arg(&elf)]);
    assert_eq!(output.status.code(), Some(1));

    let output = rvmodel(&["signature", arg(&elf), "--platform", arg(&platform)]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "00000007\n");
}

#[test]
fn test_check_warns_when_entry_is_not_start() {
    let elf = write_temp_file(
        "entry-moved",
        "elf",
        &arch_test_elf(&[1]).entry(LOAD_ADDR + 4).build(),
    );
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert!(output.status.success());

    let report = json(&output);
    let warnings = report["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("_start"));
}

fn oversized_region_elf() -> Vec<u8> {
    ElfBuilder::new(LOAD_ADDR)
        .label("_start")
        .label("_halt")
        .word(0x13)
        .word(0)
        .label("begin_regstate")
        .word(128)
        .label("end_regstate")
        .word(4)
        .label("begin_signature")
        .symbol("end_signature", LOAD_ADDR + 0x10 + 0x400_0000)
        .build()
}

#[test]
fn test_check_region_larger_than_ram_is_violation() {
    let elf = write_temp_file("oversized", "elf", &oversized_region_elf());
    let output = rvmodel(&["check", arg(&elf), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(json(&output)["violations"][0]
        .as_str()
        .unwrap()
        .contains("larger than platform RAM"));
}

#[test]
fn test_signature_region_larger_than_ram_is_refused() {
    let elf = write_temp_file("oversized-sig", "elf", &oversized_region_elf());
    let output = rvmodel(&["signature", arg(&elf)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

const PASSING_DUMP: &str = r#".debug_info contents:
0x0000000b: DW_TAG_compile_unit
              DW_AT_producer	[DW_FORM_strp]	("clang")

0x0000002a:   DW_TAG_subprogram
                DW_AT_low_pc	[DW_FORM_addr]	(0x0000000000000010)

0x00000043:     DW_TAG_formal_parameter
                  DW_AT_location	[DW_FORM_sec_offset]	(0x00000000:
                     [0x0000000000000010, 0x0000000000000020) ".text": DW_OP_reg5 RDI
                     [0x0000000000000020, 0x0000000000000030) ".text": DW_OP_reg3 RBX)
                  DW_AT_name	[DW_FORM_strp]	("b")

.debug_line contents:
Address            Line   Column File   ISA Discriminator OpIndex Flags
------------------ ------ ------ ------ --- ------------- ------- -------------
0x0000000000000010      3      0      0   0             0       0  is_stmt
0x0000000000000012      4      5      0   0             0       0  is_stmt prologue_end
0x0000000000000028      6      1      0   0             0       0  is_stmt epilogue_begin
0x0000000000000030      6      1      0   0             0       0  is_stmt end_sequence
"#;

fn run_on(contents: &str, extra: &[&str]) -> Output {
    let mut file = NamedTempFile::new().expect("create temp dump");
    file.write_all(contents.as_bytes()).expect("write temp dump");
    Command::new(env!("CARGO_BIN_EXE_loccheck"))
        .arg(file.path())
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .expect("run loccheck")
}

#[test]
fn covering_list_exits_zero_silently() {
    let out = run_on(PASSING_DUMP, &[]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
}

#[test]
fn gap_is_reported_with_addresses() {
    let dump = PASSING_DUMP.replace(
        "[0x0000000000000020, 0x0000000000000030)",
        "[0x0000000000000025, 0x0000000000000030)",
    );
    let out = run_on(&dump, &["--parameter", "x"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Location list for 'x' is discontinuous from [0x20, 0x25)"));
}

#[test]
fn missing_sections_report_sequence_error() {
    let out = run_on("not a dwarf dump\n", &[]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error in expected sequence of DWARF information"));
}

#[test]
fn same_input_gives_same_diagnostic() {
    let dump = PASSING_DUMP.replace("0x0000000000000028      6", "0x0000000000000038      6");
    let first = run_on(&dump, &[]);
    let second = run_on(&dump, &[]);
    assert_eq!(first.status.code(), Some(1));
    assert_eq!(first.status.code(), second.status.code());
    assert_eq!(first.stderr, second.stderr);
    assert!(String::from_utf8_lossy(&first.stderr).contains("does not cover the whole function"));
}

#[test]
fn unreadable_dump_exits_two() {
    let out = Command::new(env!("CARGO_BIN_EXE_loccheck"))
        .arg("/nonexistent/loccheck/dump.txt")
        .env_remove("RUST_LOG")
        .output()
        .expect("run loccheck");
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(
        String::from_utf8_lossy(&out.stderr),
        "loccheck: cannot scan /nonexistent/loccheck/dump.txt: failed to read dump: \
         No such file or directory (os error 2)\n"
    );
}

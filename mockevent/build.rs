// Reject lint suppressions and leftover debugging macros in mockevent/src.
// Set MOCKEVENT_SOURCE_GUARD=0 to skip the scan.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN: [(&str, &str); 4] = [
    ("#[allow", "lint suppression"),
    ("#![allow", "lint suppression"),
    ("dbg!(", "debugging macro"),
    ("todo!(", "unfinished code"),
];

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=MOCKEVENT_SOURCE_GUARD");

    if env::var("MOCKEVENT_SOURCE_GUARD").is_ok_and(|v| v == "0") {
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let mut findings = Vec::new();
    collect_findings(&manifest_dir.join("src"), &mut findings);

    if findings.is_empty() {
        return;
    }

    eprintln!("ERROR: forbidden constructs in mockevent sources:");
    for (file, line, what, content) in &findings {
        eprintln!("  {}:{line}: {what}: {}", file.display(), content.trim());
    }
    panic!("{} forbidden construct(s) found", findings.len());
}

fn collect_findings(path: &Path, findings: &mut Vec<(PathBuf, usize, &'static str, String)>) {
    if path.is_dir() {
        let Ok(entries) = fs::read_dir(path) else {
            return;
        };
        for entry in entries.flatten() {
            collect_findings(&entry.path(), findings);
        }
        return;
    }

    if path.extension().map_or(true, |ext| ext != "rs") {
        return;
    }

    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    for (idx, line) in content.lines().enumerate() {
        if line.trim_start().starts_with("//") {
            continue;
        }
        for (pattern, what) in FORBIDDEN {
            if line.contains(pattern) {
                findings.push((path.to_path_buf(), idx + 1, what, line.to_string()));
            }
        }
    }
}

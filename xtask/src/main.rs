// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::Path;
use std::process::{Command, ExitCode};

const CHECKS: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    &["test", "--workspace"],
];

fn cargo(root: &Path, args: &[&str]) -> Result<(), String> {
    let shown = args.join(" ");
    let status = Command::new(env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run `cargo {shown}`: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("command failed: cargo {shown}"))
    }
}

fn ci(root: &Path) -> Result<(), String> {
    for args in CHECKS {
        cargo(root, args)?;
    }
    Ok(())
}

fn demo(root: &Path) -> Result<(), String> {
    let data_dir = root.join("target").join("demo-data");
    let data_dir = data_dir
        .to_str()
        .ok_or_else(|| "demo data dir is not valid UTF-8".to_string())?;
    cargo(
        root,
        &["run", "-p", "midcert-cli", "--", "run", "--data-dir", data_dir],
    )
}

fn main() -> ExitCode {
    let arg = env::args().nth(1).unwrap_or_else(|| "help".to_string());
    let Some(root) = Path::new(env!("CARGO_MANIFEST_DIR")).parent() else {
        eprintln!("failed to resolve workspace root");
        return ExitCode::FAILURE;
    };

    let result = match arg.as_str() {
        "fmt" => cargo(root, CHECKS[0]),
        "lint" => cargo(root, CHECKS[1]),
        "test" => cargo(root, CHECKS[2]),
        "ci" => ci(root),
        "demo" => demo(root),
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            eprintln!("  fmt     check formatting");
            eprintln!("  lint    clippy with warnings denied");
            eprintln!("  test    workspace tests");
            eprintln!("  ci      fmt, lint and test in order");
            eprintln!("  demo    full pipeline into target/demo-data");
            Ok(())
        }
        _ => Err(format!(
            "unknown xtask command: {arg} (try `cargo run --manifest-path xtask/Cargo.toml -- help`)"
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

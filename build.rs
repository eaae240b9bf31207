use chrono::DateTime;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn commit_date() -> Option<String> {
    let timestamp = git(&["log", "-1", "--format=%ct"])?.parse::<i64>().ok()?;
    let date = DateTime::from_timestamp(timestamp, 0)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn main() {
    let version = match (git(&["rev-parse", "--short", "HEAD"]), commit_date()) {
        (Some(sha), Some(date)) => format!("{} ({} {})", env!("CARGO_PKG_VERSION"), sha, date),
        (Some(sha), None) => format!("{} ({})", env!("CARGO_PKG_VERSION"), sha),
        _ => env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rustc-env=APP_VERSION={}", version);
}

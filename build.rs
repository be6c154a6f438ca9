use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "current".to_string());

    let build_time = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    println!("cargo:rustc-env=HPI_UPDATE_GIT_HASH={git_hash}");
    println!("cargo:rustc-env=HPI_UPDATE_BUILD_TIME={build_time}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}

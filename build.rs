use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let described = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty());

    let version = match described {
        Some(tag) => tag.trim_start_matches('v').to_string(),
        None => env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("cargo:rustc-env=TASKBOARD_VERSION={version}");
}

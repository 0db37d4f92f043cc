use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

static BLENDRNA_BIN: OnceLock<PathBuf> = OnceLock::new();

pub(crate) fn fixture(name: &str) -> String {
	blendrna_testkit::fixture_path(name).to_string_lossy().into_owned()
}

pub(crate) fn run_blendrna(args: &[&str]) -> Output {
	Command::new(blendrna_bin()).args(args).output().expect("blendrna command executes")
}

pub(crate) fn run_blendrna_json(args: &[&str]) -> serde_json::Value {
	let output = run_blendrna(args);
	assert!(
		output.status.success(),
		"blendrna command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn blendrna_bin() -> &'static PathBuf {
	BLENDRNA_BIN.get_or_init(resolve_blendrna_bin)
}

fn resolve_blendrna_bin() -> PathBuf {
	if let Some(path) = option_env!("CARGO_BIN_EXE_blendrna") {
		return PathBuf::from(path);
	}

	let mut bin = blendrna_testkit::target_dir().join("debug");
	bin.push(if cfg!(windows) { "blendrna.exe" } else { "blendrna" });

	let status = Command::new("cargo")
		.current_dir(blendrna_testkit::workspace_root())
		.args(["build", "--quiet", "--bin", "blendrna"])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build blendrna binary at {}", bin.display());

	bin
}

//! Run provenance sidecars: which code produced which outputs, with which
//! parameters.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a run consumed and produced.
#[derive(Debug)]
pub struct Payload {
    pub params: Value,
    pub outputs: Vec<PathBuf>,
    /// Score, optimality and sizes; `None` when the solve failed.
    pub result: Option<Value>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            outputs: Vec::new(),
            result: None,
        }
    }
}

/// Write `<input stem>.provenance.json` next to `input` containing the git
/// commit, callsite, params, outputs and result.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(input: P, payload: Payload) -> Result<PathBuf> {
    let input = input.as_ref();
    let provenance_path = provenance_path(input);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = json!({
        "code_rev": current_git_rev(),
        "version": mwcs::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": payload.params,
        "outputs": payload.outputs,
        "result": payload.result,
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("run"));
    let mut name = stem;
    name.push(".provenance.json");
    input.with_file_name(name)
}

pub fn current_git_rev() -> String {
    if let Some(from_env) = option_env!("GIT_COMMIT") {
        if !from_env.is_empty() {
            return from_env.to_string();
        }
    }
    if let Ok(env_override) = std::env::var("GIT_COMMIT") {
        if !env_override.is_empty() {
            return env_override;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_replaces_extension() {
        let base = Path::new("/tmp/run/nodes.txt");
        assert_eq!(
            provenance_path(base),
            Path::new("/tmp/run/nodes.provenance.json")
        );
    }

    #[test]
    fn sidecar_lists_outputs_and_result() {
        let dir = tempdir().unwrap();
        let nodes = dir.path().join("nodes.txt");
        fs::write(&nodes, "A\t1\n").unwrap();
        let mut payload = Payload::new(json!({"threads": 2}));
        payload.outputs.push(dir.path().join("nodes.txt.out"));
        payload.result = Some(json!({"score": 1.0, "optimal": true}));
        let prov_path = write_sidecar(&nodes, payload).unwrap();
        assert!(prov_path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["params"]["threads"], 2);
        assert_eq!(parsed["result"]["optimal"], true);
        assert_eq!(
            parsed["outputs"][0],
            dir.path().join("nodes.txt.out").to_string_lossy().as_ref()
        );
        assert_eq!(parsed["version"], mwcs::VERSION);
    }
}

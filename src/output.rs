use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize as _;

use crate::formats::RunResult;

/// Serializes with 4-space indentation, leaving non-ASCII text unescaped.
pub fn to_pretty_json(result: &RunResult) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    result
        .serialize(&mut serializer)
        .context("serialize run result")?;
    Ok(out)
}

/// Writes the document to a temporary file next to `path` and renames it
/// into place, so a failed run never leaves a partial output.
pub fn write_run_result(path: &Path, result: &RunResult, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("output already exists: {}", path.display());
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create output dir: {}", parent.display()))?;

    let bytes = to_pretty_json(result)?;
    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp output in: {}", parent.display()))?;
    temp.write_all(&bytes)
        .with_context(|| format!("write temp output: {}", temp.path().display()))?;
    temp.flush().context("flush temp output")?;

    let persisted = if force {
        temp.persist(path)
    } else {
        temp.persist_noclobber(path)
    };
    persisted
        .map_err(|err| err.error)
        .with_context(|| format!("persist output: {}", path.display()))?;

    Ok(())
}

pub fn read_run_result(path: &Path) -> anyhow::Result<RunResult> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read output: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse output: {}", path.display()))
}

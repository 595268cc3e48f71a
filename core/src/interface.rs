//! JSON (de)serialization of public parameters.

use std::fs::File;
use std::path::Path;

use anyhow::Context;

use crate::params::PublicParams;

/// Default path to the public parameters of a deployment.
pub const PUBLIC_PARAMS_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../templates/public_params.json"
);

/// Reads public parameters from the JSON file at `path` and validates them.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be read or parsed, or if
/// the parameters are inconsistent.
pub fn load_public_params<P: AsRef<Path>>(path: P) -> anyhow::Result<PublicParams> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("loading public params: {:?}", path))?;
    let params: PublicParams =
        serde_json::from_str(&content).with_context(|| format!("parsing JSON from {:?}", path))?;
    params
        .validate()
        .with_context(|| format!("validating public params from {:?}", path))?;
    Ok(params)
}

/// Writes `params` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an `anyhow::Error` if the file cannot be created or written.
pub fn save_public_params<P: AsRef<Path>>(path: P, params: &PublicParams) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, params)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}

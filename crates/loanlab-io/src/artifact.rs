use std::fs;
use std::path::Path;

use loanlab_core::{LabError, LabResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Save any serializable artifact as pretty-printed JSON. Search runners
/// use this for best-parameter dumps and score traces.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> LabResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| LabError::Serialize(e.to_string()))?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Load a JSON artifact back into its typed form.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> LabResult<T> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| LabError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

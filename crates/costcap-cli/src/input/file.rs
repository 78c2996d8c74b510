use std::fs;
use std::path::PathBuf;

/// Contents of a scenario or investment file given by `--input`.
pub fn read_text(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let resolved = resolve(path)?;
    let text = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {e}", resolved.display()))?;
    log::info!("read {}", resolved.display());
    Ok(text)
}

/// Relative paths resolve against the working directory; directories and
/// missing files are rejected before reading.
fn resolve(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let resolved = std::env::current_dir()?.join(path);
    let meta = fs::metadata(&resolved)
        .map_err(|_| format!("File not found: {}", resolved.display()))?;
    if !meta.is_file() {
        return Err(format!("Not a file: {}", resolved.display()).into());
    }
    Ok(resolved)
}

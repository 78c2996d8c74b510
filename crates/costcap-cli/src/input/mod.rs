pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Where a command's JSON input came from, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    File(&'a str),
    Stdin,
}

impl std::fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(path) => write!(f, "'{path}'"),
            Source::Stdin => write!(f, "stdin"),
        }
    }
}

/// Typed input from `--input`, else from piped stdin. `None` means the
/// caller falls back to its own flags.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let (text, source) = match path {
        Some(path) => (file::read_text(path)?, Source::File(path)),
        None => match stdin::read_piped()? {
            Some(text) => (text, Source::Stdin),
            None => return Ok(None),
        },
    };
    parse(&text, source).map(Some)
}

pub fn parse<T: DeserializeOwned>(
    text: &str,
    source: Source<'_>,
) -> Result<T, Box<dyn std::error::Error>> {
    let value = serde_json::from_str(text)
        .map_err(|e| format!("Failed to parse {source} at line {}: {e}", e.line()))?;
    log::debug!("parsed {} bytes of JSON from {source}", text.len());
    Ok(value)
}

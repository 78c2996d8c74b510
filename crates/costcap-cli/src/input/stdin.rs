use std::io::{self, Read};

/// Piped stdin as text. `None` for an interactive terminal or an empty pipe.
pub fn read_piped() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(non_empty(buffer))
}

fn non_empty(buffer: String) -> Option<String> {
    if buffer.trim().is_empty() {
        None
    } else {
        Some(buffer)
    }
}

use serde_json::Value;
use std::io::{self, Write};

/// Pretty JSON, newline-terminated so piped output stays line-oriented.
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_survive_verbatim() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"result": {"cost_of_capital": "0.0513000"}})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"0.0513000\""));
        assert!(text.ends_with("}\n"));
    }
}

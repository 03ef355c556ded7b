//! Wire protocol (C9): one JSON request per line in, one JSON response per
//! line out. Malformed JSON and unknown commands are protocol-level
//! concerns handled here, before a request ever reaches dispatch.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

/// Reads one line and parses it as JSON. `Ok(None)` means the connection
/// closed cleanly (EOF) before a request arrived.
pub fn read_request(reader: &mut impl BufRead) -> std::io::Result<Option<Result<Value, String>>> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line)?;
    if bytes_read == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Some(Err("empty request".to_string())));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Ok(Some(Ok(value))),
        Err(e) => Ok(Some(Err(e.to_string()))),
    }
}

pub fn invalid_json_response(message: &str) -> Value {
    json!({"status": "error", "message": format!("Invalid JSON: {message}")})
}

pub fn unknown_command_response(cmd: &str) -> Value {
    json!({"status": "error", "message": format!("Unknown command: {cmd}")})
}

/// Writes one response per line. Errors here (a broken pipe mid-write) are
/// the caller's to log and swallow — never to crash the daemon over.
pub fn write_response(writer: &mut impl Write, response: &Value) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_request_parses_one_line() {
        let mut cursor = Cursor::new(b"{\"cmd\":\"ping\"}\n{\"cmd\":\"status\"}\n".to_vec());
        let first = read_request(&mut cursor).unwrap().unwrap().unwrap();
        assert_eq!(first["cmd"], "ping");
        let second = read_request(&mut cursor).unwrap().unwrap().unwrap();
        assert_eq!(second["cmd"], "status");
        assert!(read_request(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_read_request_surfaces_malformed_json() {
        let mut cursor = Cursor::new(b"not json\n".to_vec());
        let result = read_request(&mut cursor).unwrap().unwrap();
        assert!(result.is_err());
    }
}

use std::io::{BufRead, Write};

pub const PROMPT: &str = "progboard> ";

/// Prompt until a non-blank line is entered. `None` once stdin is closed.
pub fn readline() -> Result<Option<String>, String> {
    let stdin = std::io::stdin();
    loop {
        write!(std::io::stdout(), "{PROMPT}").map_err(|e| e.to_string())?;
        std::io::stdout().flush().map_err(|e| e.to_string())?;

        let mut buffer = String::new();
        let read = stdin.lock().read_line(&mut buffer).map_err(|e| e.to_string())?;
        if read == 0 {
            return Ok(None);
        }
        let line = buffer.trim();
        if !line.is_empty() {
            return Ok(Some(line.to_string()));
        }
    }
}

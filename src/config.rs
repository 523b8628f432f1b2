//! Resolution of settings that come from outside the session itself.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Default location of the dedicated server log.
pub const DEFAULT_LOG_FILE: &str = "/home/steam/stationeers/logs/server.log";

/// Default game port.
pub const DEFAULT_GAME_PORT: u16 = 27016;

const VERSION_MARKER: &str = "Version : ";

/// Scans a server log for the first `Version : <x>` line and returns `<x>`.
pub fn detect_version(path: &Path) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    detect_version_from(BufReader::new(file))
}

pub fn detect_version_from(reader: impl BufRead) -> io::Result<Option<String>> {
    for line in reader.lines() {
        let line = line?;
        if let Some(version) = parse_version_line(&line) {
            return Ok(Some(version.to_string()));
        }
    }
    Ok(None)
}

fn parse_version_line(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(VERSION_MARKER)?;
    let version = rest.trim();
    (!version.is_empty()).then_some(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_version_line() {
        let log = "\
Loading world...
12:00:01: Version : 0.2.5954.26174
12:00:02: Version : 9.9.9
";
        assert_eq!(
            detect_version_from(log.as_bytes()).unwrap().as_deref(),
            Some("0.2.5954.26174")
        );
    }

    #[test]
    fn missing_or_blank_version_is_none() {
        assert_eq!(detect_version_from("no marker\n".as_bytes()).unwrap(), None);
        assert_eq!(detect_version_from("Version :   \n".as_bytes()).unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(detect_version(Path::new("/nonexistent/server.log")).is_err());
    }
}

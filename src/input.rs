//! Input lists - one URL or file path per line

use std::path::Path;
use crate::{Error, Result};

/// Parse identifiers from list text: lines are trimmed and blank lines dropped
pub fn parse_identifiers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read identifiers from an input list file
pub fn read_identifiers(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::InputMissing(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_identifiers(&contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifiers() {
        let ids = parse_identifiers("a.jpg\n\n  b.jpg  \r\nhttp://x.org/c.png\n   \n");
        assert_eq!(ids, vec!["a.jpg", "b.jpg", "http://x.org/c.png"]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_identifiers(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, Error::InputMissing(_)));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "a.jpg\nb.jpg\na.jpg\n").unwrap();
        assert_eq!(read_identifiers(&path).unwrap(), vec!["a.jpg", "b.jpg", "a.jpg"]);
    }
}

//! Line sequences: loading, normalization, and rendering.
//!
//! All comparisons in the merge engine operate on lines with their trailing
//! line-ending characters stripped, so a file saved with `\r\n` compares equal
//! to the same file saved with `\n`.

use std::path::Path;

use tracing::debug;

use crate::errors::UpdateError;

/// Line-ending style of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the dominant line ending of `content`. Ties go to `Lf`.
    pub fn detect(content: &str) -> Self {
        let total = content.matches('\n').count();
        let crlf = content.matches("\r\n").count();
        if crlf > 0 && crlf * 2 > total {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

/// Split `content` into lines, stripping `\n`, `\r\n`, and stray trailing `\r`.
///
/// A trailing newline does not produce an empty last line.
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Render a line sequence, terminating every line with `ending`.
pub fn render_lines(lines: &[String], ending: LineEnding) -> String {
    let sep = ending.as_str();
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + sep.len()).sum());
    for line in lines {
        out.push_str(line);
        out.push_str(sep);
    }
    out
}

/// One revision of a text file, loaded from disk.
#[derive(Debug, Clone)]
pub struct TextFile {
    lines: Vec<String>,
    ending: LineEnding,
}

impl TextFile {
    /// Read and normalize the file at `path`.
    ///
    /// Invalid UTF-8 is decoded lossily; binary files are not detected here.
    pub fn load(path: &Path) -> Result<Self, UpdateError> {
        let bytes = std::fs::read(path).map_err(|e| UpdateError::io(path, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let file = Self::from_content(&content);
        debug!(
            path = %path.display(),
            lines = file.lines.len(),
            crlf = file.ending == LineEnding::CrLf,
            "loaded text file"
        );
        Ok(file)
    }

    pub fn from_content(content: &str) -> Self {
        Self {
            lines: split_lines(content),
            ending: LineEnding::detect(content),
        }
    }

    /// An empty file; used as the ancestor of paths that never existed.
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            ending: LineEnding::Lf,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// Normalized equality: same lines, regardless of line endings.
    pub fn same_lines(&self, other: &TextFile) -> bool {
        self.lines == other.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_strips_line_endings() {
        assert_eq!(split_lines("a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a"]);
        assert_eq!(split_lines("a\r"), vec!["a"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_split_keeps_blank_lines() {
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_detect_line_ending() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\r\nb\nc\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::Lf);
    }

    #[test]
    fn test_render_terminates_every_line() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(render_lines(&lines, LineEnding::Lf), "a\nb\n");
        assert_eq!(render_lines(&lines, LineEnding::CrLf), "a\r\nb\r\n");
        assert_eq!(render_lines(&[], LineEnding::Lf), "");
    }

    #[test]
    fn test_same_lines_ignores_line_endings() {
        let unix = TextFile::from_content("x\ny\n");
        let dos = TextFile::from_content("x\r\ny\r\n");
        let no_trailing = TextFile::from_content("x\ny");
        assert!(unix.same_lines(&dos));
        assert!(unix.same_lines(&no_trailing));
        assert!(!unix.same_lines(&TextFile::from_content("x\nz\n")));
    }

    #[test]
    fn test_load_reads_lossy_utf8() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"ok\n\xff\xfe\n").unwrap();
        let file = TextFile::load(&path).unwrap();
        assert_eq!(file.lines().len(), 2);
        assert_eq!(file.lines()[0], "ok");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TextFile::load(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, UpdateError::Io { .. }));
    }
}

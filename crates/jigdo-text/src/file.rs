use crate::line::{Line, LineEnding};

/// A parsed `.jigdo` text file: an ordered sequence of lines, kept exactly
/// as read so an unmodified file serializes back byte-for-byte (spec.md
/// §4.6 "Round-trip preservation").
#[derive(Debug, Clone, Default)]
pub struct JigdoFile {
    lines: Vec<(Line, LineEnding)>,
}

impl JigdoFile {
    /// An empty file with no lines.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Parse `data` as a `.jigdo` text file. Input is treated as UTF-8,
    /// lossily replacing any invalid byte sequences; CRLF and LF line
    /// endings are both recognised and preserved per-line.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                let mut end = i;
                let ending = if end > start && bytes[end - 1] == b'\r' {
                    end -= 1;
                    LineEnding::CrLf
                } else {
                    LineEnding::Lf
                };
                lines.push((Line::parse(&text[start..end]), ending));
                start = i + 1;
            }
            i += 1;
        }
        if start < bytes.len() {
            lines.push((Line::parse(&text[start..]), LineEnding::None));
        }
        Self { lines }
    }

    /// Serialize back to bytes, reproducing the original line endings
    /// exactly for any line that has not been replaced.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (line, ending) in &self.lines {
            out.extend_from_slice(line.raw().as_bytes());
            match ending {
                LineEnding::Lf => out.push(b'\n'),
                LineEnding::CrLf => {
                    out.push(b'\r');
                    out.push(b'\n');
                }
                LineEnding::None => {}
            }
        }
        out
    }

    /// All lines, in file order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().map(|(line, _)| line)
    }

    /// The line at `index`, if any.
    pub fn line_at(&self, index: usize) -> Option<&Line> {
        self.lines.get(index).map(|(line, _)| line)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the file has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a line terminated with `\n`. Useful when building a file
    /// programmatically rather than parsing one.
    pub fn push_line(&mut self, text: &str) {
        self.lines.push((Line::parse(text), LineEnding::Lf));
    }

    /// True if the section header at `index` matches `name`, special-
    /// casing `[Comment]`/`[comment]` as interchangeable (spec.md §4.6).
    pub(crate) fn section_matches(&self, index: usize, name: &str) -> bool {
        let Some(actual) = self.line_at(index).and_then(Line::section_name) else {
            return false;
        };
        let is_comment_name = |s: &str| s == "Comment" || s == "comment";
        if is_comment_name(name) && is_comment_name(actual) {
            return true;
        }
        actual == name
    }

    /// Iterate `label=value` entries belonging to the section starting at
    /// `section_index` (exclusive of the header line itself, up to but
    /// not including the next `[Section]` header or end of file).
    pub fn entries_in_section(&self, section_index: usize) -> impl Iterator<Item = (&str, &str)> {
        self.lines[section_index + 1..]
            .iter()
            .take_while(|(line, _)| line.section_name().is_none())
            .filter_map(|(line, _)| line.entry())
    }

    /// First `label=value` entry with the given label within the section
    /// starting at `section_index`.
    pub fn find_entry(&self, section_index: usize, label: &str) -> Option<&str> {
        self.entries_in_section(section_index)
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_line_endings() {
        let data = b"[Jigdo]\r\nVersion=1.1\n# comment\n\n[Parts]\r\n";
        let file = JigdoFile::parse(data);
        assert_eq!(file.serialize(), data);
    }

    #[test]
    fn round_trips_without_trailing_newline() {
        let data = b"[Jigdo]\nVersion=1.1";
        let file = JigdoFile::parse(data);
        assert_eq!(file.serialize(), data);
    }

    #[test]
    fn finds_entries_scoped_to_section() {
        let data = b"[Jigdo]\nVersion=1.1\n[Parts]\nVersion=bogus\n";
        let file = JigdoFile::parse(data);
        let jigdo_section = file
            .lines()
            .position(|l| l.section_name() == Some("Jigdo"))
            .unwrap();
        assert_eq!(file.find_entry(jigdo_section, "Version"), Some("1.1"));
    }

    #[test]
    fn comment_section_names_are_interchangeable() {
        let data = b"[comment]\nanything\n";
        let file = JigdoFile::parse(data);
        assert!(file.section_matches(0, "Comment"));
    }
}

//! Round-trip-preserving model of a single line in a `.jigdo` text file.

/// How a line was terminated in the source bytes, preserved so
/// [`crate::JigdoFile::serialize`] can reproduce the file byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// No terminator; only valid for the last line of a file.
    None,
}

/// A single classified line of a `.jigdo` file. The original source text
/// is always kept verbatim in `raw` so re-serializing an unmodified file
/// reproduces it exactly, whitespace and all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A line containing only whitespace.
    Blank(String),
    /// A comment line, first non-whitespace character `#`.
    Comment(String),
    /// A `[Section Name]` header.
    Section {
        /// Full source text of the line.
        raw: String,
        /// The section name, with surrounding whitespace trimmed.
        name: String,
    },
    /// A `[Include url]` special section header (spec.md §4.6).
    Include {
        /// Full source text of the line.
        raw: String,
        /// The URL following `Include`, whitespace-trimmed.
        url: String,
    },
    /// A `label=value` entry line.
    Entry {
        /// Full source text of the line.
        raw: String,
        /// The label, with surrounding whitespace trimmed.
        label: String,
        /// Byte offset into `raw` where the value starts (just after `=`).
        value_offset: usize,
    },
    /// A non-blank, non-comment line that is not section or entry syntax
    /// (e.g. malformed input). Kept so parsing never loses data.
    Other(String),
}

impl Line {
    /// Parse a single line of text (no line terminator) into its
    /// classified form.
    pub fn parse(text: &str) -> Line {
        let trimmed = text.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() {
            return Line::Blank(text.to_string());
        }
        match trimmed.as_bytes()[0] {
            b'#' => Line::Comment(text.to_string()),
            b'[' => parse_section(text),
            _ => parse_entry(text),
        }
    }

    /// The original source text of this line, without its terminator.
    pub fn raw(&self) -> &str {
        match self {
            Line::Blank(s) | Line::Comment(s) | Line::Other(s) => s,
            Line::Section { raw, .. } | Line::Include { raw, .. } | Line::Entry { raw, .. } => raw,
        }
    }

    /// If this is a `[Section]` header, its name.
    pub fn section_name(&self) -> Option<&str> {
        match self {
            Line::Section { name, .. } => Some(name),
            _ => None,
        }
    }

    /// If this is an `Include` header, its URL.
    pub fn include_url(&self) -> Option<&str> {
        match self {
            Line::Include { url, .. } => Some(url),
            _ => None,
        }
    }

    /// If this is a `label=value` entry, its `(label, value)` pair.
    pub fn entry(&self) -> Option<(&str, &str)> {
        match self {
            Line::Entry {
                raw, label, value_offset,
            } => Some((label.as_str(), &raw[*value_offset..])),
            _ => None,
        }
    }
}

fn is_name_stop(b: u8) -> bool {
    matches!(b, b']' | b' ' | b'\t' | b'[' | b'=' | b'#')
}

fn parse_section(text: &str) -> Line {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    // bytes[i] == b'['
    i += 1;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && !is_name_stop(bytes[i]) {
        i += 1;
    }
    let name = text[name_start..i].to_string();
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }

    if name == "Include" {
        let url_start = i;
        let mut j = i;
        while j < bytes.len() && bytes[j] != b']' {
            j += 1;
        }
        let url = text[url_start..j].trim_end_matches([' ', '\t']).to_string();
        return Line::Include {
            raw: text.to_string(),
            url,
        };
    }

    Line::Section {
        raw: text.to_string(),
        name,
    }
}

fn parse_entry(text: &str) -> Line {
    match text.find('=') {
        Some(eq) => {
            let label = text[..eq]
                .trim_start_matches([' ', '\t'])
                .trim_end_matches([' ', '\t'])
                .to_string();
            Line::Entry {
                raw: text.to_string(),
                label,
                value_offset: eq + 1,
            }
        }
        None => Line::Other(text.to_string()),
    }
}

/// Offsets of the label within an entry line's raw text, per the
/// original `setLabelOffsets`: `(label_start, label_end, value_start)`.
/// Returns `None` for lines with no `=`.
pub fn label_offsets(line: &str) -> Option<(usize, usize, usize)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i == bytes.len() {
        return None;
    }
    let begin = i;
    let mut end = begin;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            return Some((begin, end, i + 1));
        }
        if bytes[i] != b' ' && bytes[i] != b'\t' {
            end = i + 1;
        }
        i += 1;
    }
    None
}

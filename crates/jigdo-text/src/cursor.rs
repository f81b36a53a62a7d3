use crate::file::JigdoFile;
use crate::line::Line;

/// Sequential cursor over the `[Section]` headers of a [`JigdoFile`],
/// mirroring the original reader's single forward pass through the file
/// (sections of the same name, e.g. repeated `[Parts]` blocks, are
/// processed in file order and accumulate into the same model).
pub struct SectionCursor<'a> {
    file: &'a JigdoFile,
    pos: usize,
}

impl<'a> SectionCursor<'a> {
    /// Start a cursor at the beginning of `file`.
    pub fn new(file: &'a JigdoFile) -> Self {
        Self { file, pos: 0 }
    }

    /// Advance to the next `[Section]` header of any name, returning its
    /// line index.
    pub fn next_section(&mut self) -> Option<usize> {
        for i in self.pos..self.file.len() {
            if matches!(self.file.line_at(i), Some(Line::Section { .. })) {
                self.pos = i + 1;
                return Some(i);
            }
        }
        self.pos = self.file.len();
        None
    }

    /// Advance to the next `[Section]` header named `name`, skipping any
    /// others along the way.
    pub fn next_section_named(&mut self, name: &str) -> Option<usize> {
        while let Some(i) = self.next_section() {
            if self.file.section_matches(i, name) {
                return Some(i);
            }
        }
        None
    }

    /// Remaining unvisited line index (for resuming after a manual
    /// section lookup).
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_sections_in_order() {
        let file = JigdoFile::parse(b"[Jigdo]\na=1\n[Parts]\nb=2\n[Parts]\nc=3\n");
        let mut cursor = SectionCursor::new(&file);
        let mut names = Vec::new();
        while let Some(i) = cursor.next_section() {
            names.push(file.line_at(i).unwrap().section_name().unwrap().to_string());
        }
        assert_eq!(names, vec!["Jigdo", "Parts", "Parts"]);
    }

    #[test]
    fn finds_section_by_name_skipping_others() {
        let file = JigdoFile::parse(b"[Jigdo]\n[Servers]\nA=x\n[Parts]\n");
        let mut cursor = SectionCursor::new(&file);
        let idx = cursor.next_section_named("Parts").unwrap();
        assert_eq!(file.line_at(idx).unwrap().section_name(), Some("Parts"));
    }
}

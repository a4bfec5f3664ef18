//! Directive markers recognized at the start of a line.

/// Line prefixes whose presence at column zero removes the line from the final artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveMarker {
    Include,
    Pragma,
}

impl DirectiveMarker {
    /// Fixed marker set, in the order lines are tested against it.
    pub const ALL: [DirectiveMarker; 2] = [DirectiveMarker::Include, DirectiveMarker::Pragma];

    /// Literal prefix matched against the raw line.
    pub fn literal(&self) -> &'static str {
        match self {
            DirectiveMarker::Include => "#include",
            DirectiveMarker::Pragma => "#pragma",
        }
    }

    fn matches(&self, line: &[u8]) -> bool {
        line.starts_with(self.literal().as_bytes())
    }
}

/// Return the marker a raw line starts with, if any.
///
/// The test is a literal byte prefix on the untrimmed line: indentation, case differences, or a
/// marker appearing mid-line never match.
pub fn classify_line(line: &[u8]) -> Option<DirectiveMarker> {
    DirectiveMarker::ALL
        .into_iter()
        .find(|marker| marker.matches(line))
}

use std::fmt;

/// Fatal errors raised by a layout or hit-test pass.
///
/// Every variant signals an internal invariant violation: either the upstream
/// producer handed the engine something it does not support, or the run list
/// and its geometry disagree. Hosts may abort the pass or skip the paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    UnsupportedHardBreak { index: usize },
    ImpossibleSplit { text: String },
    EmptyParagraph,
    InconsistentGeometry { pointer_y: f32 },
}

impl LayoutError {
    pub fn is_internal(&self) -> bool {
        match self {
            LayoutError::UnsupportedHardBreak { .. }
            | LayoutError::ImpossibleSplit { .. }
            | LayoutError::EmptyParagraph
            | LayoutError::InconsistentGeometry { .. } => true,
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnsupportedHardBreak { index } => {
                write!(f, "hard break at item {index} is not supported by the wrapping engine")
            }
            LayoutError::ImpossibleSplit { text } => {
                write!(f, "unable to split run {text:?} even when breaking words")
            }
            LayoutError::EmptyParagraph => write!(f, "paragraph has no text runs"),
            LayoutError::InconsistentGeometry { pointer_y } => write!(
                f,
                "pointer y {pointer_y} is neither inside, before nor after any run"
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Recoverable errors raised while activating a link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    Malformed { target: String, reason: String },
    Open { target: String, reason: String },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Malformed { target, reason } => {
                write!(f, "malformed link target {target:?}: {reason}")
            }
            LinkError::Open { target, reason } => {
                write!(f, "failed to open {target}: {reason}")
            }
        }
    }
}

impl std::error::Error for LinkError {}

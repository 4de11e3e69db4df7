use crate::parser::Word;

/// One `|`-separated segment of an input line, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStage {
    pub words: Vec<Word>,
    /// Trimmed source text of the segment, for job display.
    pub text: String,
}

/// A tokenized input line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub stages: Vec<RawStage>,
    /// A trailing `&` was present (and removed from `text`).
    pub background: bool,
    pub text: String,
}

/// One program invocation within a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub program: String,
    pub args: Vec<String>,
    pub text: String,
}

/// A fully expanded command line, ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub background: bool,
    pub text: String,
}

impl Pipeline {
    /// Display text for a backgrounded pipeline: the stage texts joined with
    /// a pipe separator.
    pub fn display_text(&self) -> String {
        self.stages
            .iter()
            .map(|stage| stage.text.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

//! Scan position and operator commands.

/// Whether the operator is prompted before each acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Prompt before every offset.
    Manual,
    /// Acquire without prompting until the current hole is exhausted.
    Auto,
}

/// Where the executor is in the holes × offsets iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    /// Index of the hole being visited.
    pub hole_index: usize,
    /// Index of the offset within the current hole.
    pub offset_index: usize,
    /// Prompting mode; reset to manual at every hole.
    pub mode: ScanMode,
    /// Display flag toggled by the operator; survives hole changes.
    pub plotting: bool,
}

impl Default for ScanCursor {
    fn default() -> Self {
        Self {
            hole_index: 0,
            offset_index: 0,
            mode: ScanMode::Manual,
            plotting: false,
        }
    }
}

impl ScanCursor {
    /// Moves to hole `index` and rewinds the offset; prompting resumes.
    pub fn enter_hole(&mut self, index: usize) {
        debug_assert!(index >= self.hole_index);
        self.hole_index = index;
        self.offset_index = 0;
        self.mode = ScanMode::Manual;
    }

    /// Moves to offset `index` of the current hole.
    pub fn enter_offset(&mut self, index: usize) {
        debug_assert!(index >= self.offset_index);
        self.offset_index = index;
    }

    /// True when the operator must be asked before acquiring.
    pub fn needs_prompt(&self) -> bool {
        self.mode == ScanMode::Manual
    }

    /// Applies an operator command to the cursor state.
    pub fn apply(&mut self, command: OperatorCommand) {
        match command {
            OperatorCommand::Auto => self.mode = ScanMode::Auto,
            OperatorCommand::Plot => self.plotting = !self.plotting,
            OperatorCommand::Next | OperatorCommand::Exit | OperatorCommand::Proceed => {}
        }
    }
}

/// Answer to the per-offset prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Skip the remaining offsets of this hole.
    Next,
    /// Terminate the scan.
    Exit,
    /// Stop prompting until the next hole.
    Auto,
    /// Toggle the display flag.
    Plot,
    /// Anything else: acquire at this offset.
    Proceed,
}

impl OperatorCommand {
    /// Parses an answer; only exact keywords are commands.
    pub fn parse(answer: &str) -> Self {
        match answer.trim() {
            "next" => OperatorCommand::Next,
            "exit" => OperatorCommand::Exit,
            "auto" => OperatorCommand::Auto,
            "plot" => OperatorCommand::Plot,
            _ => OperatorCommand::Proceed,
        }
    }
}

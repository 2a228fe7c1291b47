use thiserror::Error;

/// Fatal and terminal conditions raised by the market model and the
/// accounting engine. Configuration and accounting variants abort a run;
/// `EndOfHistory` is the normal termination signal the harness consumes.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("horizon {horizon} is out of range for `{instrument}` ({len} observations)")]
    OutOfRange {
        instrument: String,
        horizon: usize,
        len: usize,
    },

    #[error("resolved index {index} reads past horizon {horizon} on `{instrument}`")]
    LookaheadViolation {
        instrument: String,
        index: i64,
        horizon: usize,
    },

    #[error("window [{from}, {to}] on `{instrument}` is empty")]
    EmptyWindow {
        instrument: String,
        from: i64,
        to: i64,
    },

    #[error("no further observation to advance into on `{instrument}`")]
    EndOfHistory { instrument: String },

    #[error("unknown instrument `{0}`")]
    UnknownInstrument(String),

    #[error("duplicate instrument `{0}`")]
    DuplicateInstrument(String),

    #[error("sell of {requested} exceeds {held} held shares of `{instrument}`")]
    Oversell {
        instrument: String,
        requested: u32,
        held: u32,
    },

    #[error("unknown strategy template: {0}")]
    UnknownTemplate(String),

    #[error("invalid parameter space: {0}")]
    InvalidParameterSpace(String),

    #[error("scenario contains no instruments")]
    EmptyScenario,
}

//! Error taxonomy for the pair-chain parser.
//!
//! The core surfaces every failure synchronously to the caller and never retries or silently
//! skips a bad successor; see [`ParseError`] for the full set of ways a chain walk can fail.

use thiserror::Error;

/// All errors the parser can raise while constructing pairs, walking tails, or touching fields.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The buffer is smaller than the layout's declared head size.
    #[error("layout `{layout}` needs {head_size} head bytes but only {buffer_len} are available")]
    HeadOverflow {
        layout: &'static str,
        head_size: usize,
        buffer_len: usize,
    },

    /// A successor rule could not decide what follows a head, or an ancestor's indexed rule
    /// could not be evaluated at all (missing/mistyped count field, user rule signalling an
    /// invalid state).
    #[error("successor for layout `{layout}` is undecidable: {reason}")]
    SuccessorUnresolved {
        layout: &'static str,
        reason: String,
    },

    /// `name` is not a head field of the current layout, not a CDR-map slot, and not reachable
    /// by walking the tail chain.
    #[error("field `{name}` is not present in layout `{layout}` or its tail chain")]
    UnknownField { layout: &'static str, name: String },

    /// Indexed access past the declared `count` of a CDR-map slot.
    #[error("index {index} is out of range for `{name}` (count = {count})")]
    OutOfRange {
        name: String,
        index: usize,
        count: usize,
    },

    /// A mutation value does not fit the width of the target field.
    #[error("value does not fit in the {width}-byte field `{name}`")]
    ValueOutOfRange { name: String, width: usize },
}

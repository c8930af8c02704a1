//! A pair-chain parser: presents a raw byte buffer as a chain of fixed-layout heads with
//! runtime-determined tails, without copying the backing bytes.
//!
//! A [`pair::Pair`] borrows a window of the input buffer and a [`layout::HeadLayout`] describing
//! its fixed-offset fields. What comes after a head — another pair, an array element, or nothing
//! — is decided at walk time by the layout's [`layout::SuccessorRule`]: a function of the head's
//! own values, an ordered map of named sub-chains, or a delegation up the parent chain
//! (responsibility handover) for array elements that don't carry enough information to decide on
//! their own.

pub mod error;
pub mod head;
pub mod layout;
pub mod pair;
pub mod primitive;

pub use error::ParseError;
pub use head::HeadView;
pub use layout::{CdrCount, CdrEntry, FieldSpec, HeadLayout, NextHead, SuccessorRule};
pub use pair::{Lookup, Pair};
pub use primitive::{FieldValue, PrimitiveKind, Scalar};

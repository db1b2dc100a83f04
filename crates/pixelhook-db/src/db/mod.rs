//! Caption persistence
//!
//! The caption pipeline opens one connection per invocation with freshly
//! resolved credentials, runs a single keyed update and closes it again.

pub mod caption;

pub use caption::{
    CaptionRepository, CaptionSession, CaptionTable, MySqlCaptionRepository, PersistOutcome,
    PersistenceError,
};

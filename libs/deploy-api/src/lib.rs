//! Wire models shared with the deploy runner and the conversation service.

pub mod models;

pub use models::*;

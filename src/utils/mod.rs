//! Helpers shared by the client, reducer and dispatcher.

pub mod constants;
pub mod parts;

pub use constants::*;
pub use parts::*;

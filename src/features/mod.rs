//! Feature slices: state, actions and async operations per screen
//!
//! Every slice follows the same shape: a state record owned by its reducer,
//! a closed action enum, a [Slice](`crate::slice::Slice`) impl folding the
//! actions, and async operations on [Store](`crate::store::Store`) driving
//! the started/settled request protocol against the backend client.

pub mod jobs;
pub mod models;
pub mod quality;
pub mod tasks;

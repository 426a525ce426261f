//! The canonical snapshot sent to companion apps, and the rules that build it.

pub mod format;
mod watch_state;

pub use watch_state::{GlucoseMerge, WatchState, EVENTUAL_GLUCOSE_PLACEHOLDER};

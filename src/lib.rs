//! LoopWatch host: configuration, tracing, wiring and the telemetry replay
//! used by the `loopwatch` binary.

pub mod bootstrap;
pub mod replay;

//! Synchronous execution strategy for sandwich fulfilment.
//!
//! Drives the six shared stage handlers strictly in order on the caller's
//! task: the call returns only once the order is completed, stalled on a
//! missing ingredient, or failed. There is no retry and no compensation in
//! this strategy; the first error aborts the run.

mod pipeline;

pub use pipeline::SandwichPipeline;

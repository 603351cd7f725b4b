//! Commit lifecycle: `EditCommand` records intent, `CommitPipeline` turns it
//! into exactly one storage write followed by an asynchronous notification.

mod command;
mod context;
mod pipeline;


pub use command::EditCommand;
pub use context::{ActionType, CommitPhase, CommitRequest, UpdateContext};
pub use pipeline::CommitPipeline;

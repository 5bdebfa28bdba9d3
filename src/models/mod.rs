pub mod project;
pub mod task;
pub mod completion;
pub mod event;

pub use project::*;
pub use task::*;
pub use completion::*;
pub use event::*;

pub mod guard;
pub mod confirmation;
pub mod completion;
pub mod status;
pub mod board;

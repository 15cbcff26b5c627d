pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod instruction;
pub mod memory;
pub mod observable;
pub mod program;
pub mod registers;

pub use engine::{Engine, RunReport};
pub use error::{Error, Result};
pub use observable::Output;
pub use program::ProgramData;

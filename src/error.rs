use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A program-region cell holds something that is not a storable word.
    #[error("cell {address} holds {value}, outside the program word range [0, 9999)")]
    ValueOutOfRange { address: usize, value: i32 },
    #[error("program image has {found} cells, expected {expected}")]
    WrongLength { expected: usize, found: usize },
    #[error("address {0} is outside the 100-cell memory")]
    AddressOutOfRange(usize),
    #[error("program has {0} instructions, the program region holds 50")]
    ProgramTooLong(usize),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

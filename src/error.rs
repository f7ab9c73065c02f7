use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("self-test failure: {0}")]
    SelfTest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScannerError>;

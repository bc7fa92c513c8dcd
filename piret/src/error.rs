// Errors surfaced to hosts driving Piret through a session

use crate::config::ConfigError;
use crate::reader::ReadError;
use crate::runtime::error::EvalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PiretError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

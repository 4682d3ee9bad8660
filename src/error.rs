/// Errors raised while parsing binding declarations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unterminated string literal in `{0}`")]
    UnterminatedString(String),
    #[error("empty keypath in declaration `{0}`")]
    EmptyKeypath(String),
    #[error("empty segment in keypath `{0}`")]
    EmptySegment(String),
    #[error("empty formatter in declaration `{0}`")]
    EmptyFormatter(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

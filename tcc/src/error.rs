//! The three fatal error kinds a compilation can fail with.

use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LexError {
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for LexError {}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SyntaxError {
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for SyntaxError {}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResourceError {
    pub message: String,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ResourceError {}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Error {
    Lex(LexError),
    Syntax(SyntaxError),
    Resource(ResourceError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{}", e),
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Resource(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Error {
        Error::Lex(e)
    }
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Error {
        Error::Syntax(e)
    }
}

impl From<ResourceError> for Error {
    fn from(e: ResourceError) -> Error {
        Error::Resource(e)
    }
}

pub fn lex_error<S: Into<String>>(message: S) -> LexError {
    LexError { message: message.into() }
}

pub fn syntax_error<S: Into<String>>(message: S) -> SyntaxError {
    SyntaxError { message: message.into() }
}

pub fn resource_error<S: Into<String>>(message: S) -> ResourceError {
    ResourceError { message: message.into() }
}

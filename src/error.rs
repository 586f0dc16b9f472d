use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// A variable request or run configuration was missing a required value or
/// held an invalid one. Surfaced before any catalog work starts.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub msg: String,
}

impl ConfigError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        ConfigError { msg: msg.into() }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "configuration error: {}", self.msg)
    }
}

impl Error for ConfigError {}

/// A storage root could not be read, so no trustworthy catalog snapshot
/// exists. Aborts the whole run.
#[derive(Debug, Clone)]
pub struct CatalogError {
    pub msg: String,
}

impl CatalogError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        CatalogError { msg: msg.into() }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "catalog unavailable: {}", self.msg)
    }
}

impl Error for CatalogError {}

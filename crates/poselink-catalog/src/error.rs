/// Errors that can occur building a catalogue.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A catalogue string contained a character that names no device kind.
    #[error("unknown device token {0:?}")]
    UnknownToken(char),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

//! Error handling for the application

use thiserror::Error;

/// Coarse error classes shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    SigningFailure,
    NetworkFailure,
    QuoteUnavailable,
    Configuration,
}

/// dApp errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DappError {
    #[error("{0}")]
    InputValidation(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{0}")]
    SigningFailure(String),

    #[error("No transaction signing method found on wallet object")]
    UnsupportedWalletShape,

    #[error("No message signing method found")]
    UnsupportedMessageSigner,

    #[error("{0}")]
    NetworkFailure(String),

    #[error("{0}")]
    QuoteUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DappError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DappError::InputValidation(_)
            | DappError::InvalidAddress { .. }
            | DappError::WalletNotConnected => ErrorKind::InputValidation,
            DappError::SigningFailure(_)
            | DappError::UnsupportedWalletShape
            | DappError::UnsupportedMessageSigner => ErrorKind::SigningFailure,
            DappError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            DappError::QuoteUnavailable(_) => ErrorKind::QuoteUnavailable,
            DappError::Config(_) => ErrorKind::Configuration,
        }
    }

    pub fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        DappError::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub fn network(context: &str, err: impl std::fmt::Display) -> Self {
        DappError::NetworkFailure(format!("{}: {}", context, err))
    }
}

impl From<reqwest::Error> for DappError {
    fn from(err: reqwest::Error) -> Self {
        DappError::NetworkFailure(err.to_string())
    }
}

impl From<solana_client::client_error::ClientError> for DappError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        DappError::NetworkFailure(err.to_string())
    }
}

pub type DappResult<T> = Result<T, DappError>;

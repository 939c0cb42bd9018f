use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::commands::{Quantity, Setting, State};

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod mp71077x;
pub mod quantity_control;
pub mod reading;
pub mod sweep;
pub mod transport;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to bind local address {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),
    #[error("Received data does not match expected format: {0}")]
    ResponseDecoding(String),
    #[error("Value {0} cannot be sent to the device")]
    InvalidValue(f64),
    #[error("Verification failed: {0}")]
    Verification(VerificationFailure),
    #[error("Session is not open")]
    NotOpen,
    #[error("Underlying I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for the failures the device reports by silently clamping or
    /// ignoring a write, detected by re-querying.
    pub fn is_verification(&self) -> bool {
        matches!(self, Error::Verification(_))
    }
}

/// What a re-query returned when it did not confirm a write.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationFailure {
    Numeric {
        quantity: Quantity,
        setting: Setting,
        requested: f64,
        confirmed: f64,
    },
    Input {
        expected: State,
        reply: String,
    },
}

impl std::fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationFailure::Numeric {
                quantity,
                setting,
                requested,
                confirmed,
            } => {
                let unit = quantity.unit();
                write!(
                    f,
                    "{} SET: {requested}{unit}, but GET: {confirmed}{unit}",
                    setting.describe(*quantity)
                )
            }
            VerificationFailure::Input { expected, reply } => {
                let expected = match expected {
                    State::On => "ON",
                    State::Off => "OFF",
                };
                write!(
                    f,
                    "input expected {expected}, but device replied `{}`",
                    reply.trim_end()
                )
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ScpiSerialize {
    fn serialize(&self, out: &mut String);
}

pub trait ScpiDeserialize
where
    Self: Sized,
{
    fn deserialize(input: &mut &str) -> Result<Self>;
}

pub trait ScpiRequest: ScpiSerialize {
    type Response: ScpiDeserialize;
}

/// Writes are fire-and-forget, the device sends nothing back.
pub struct EmptyResponse;
impl ScpiDeserialize for EmptyResponse {
    fn deserialize(_input: &mut &str) -> Result<Self> {
        Ok(EmptyResponse)
    }
}

#[macro_export]
macro_rules! impl_scpi_serialize {
    ($type:ty, [ $( $part:tt ),* $(,)? ]) => {
        impl $crate::ScpiSerialize for $type {
            fn serialize(&self, out: &mut String) {
                $(
                    impl_scpi_serialize!(@part self, out, $part);
                )*
            }
        }
    };

    // Handle string literals
    (@part $self:ident, $out:ident, $lit:literal) => {
        $out.push_str($lit);
    };

    // Handle field names
    (@part $self:ident, $out:ident, $field:ident) => {
        $self.$field.serialize($out);
    };
}

#[macro_export]
macro_rules! impl_scpi_request {
    ($request:ty, $response:ty) => {
        impl $crate::ScpiRequest for $request {
            type Response = $response;
        }
    };
}

/// Consumes the rest of the input.
pub fn read_all<'a>(input: &mut &'a str) -> &'a str {
    let all = *input;
    *input = "";
    all
}

#[macro_export]
macro_rules! scpi_enum {
    (
        $(#[$enum_meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $literal:expr
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::ScpiSerialize for $name {
            fn serialize(&self, out: &mut String) {
                match self {
                    $(
                        Self::$variant => out.push_str($literal),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_all() {
        let input = &mut "STATE: ON\n";
        assert_eq!(read_all(input), "STATE: ON\n");
        assert!(input.is_empty());
    }

    #[test]
    fn test_verification_message() {
        let failure = VerificationFailure::Numeric {
            quantity: Quantity::Voltage,
            setting: Setting::UpperLimit,
            requested: 150.0,
            confirmed: 150.001,
        };
        assert_eq!(
            failure.to_string(),
            "upper voltage limit SET: 150V, but GET: 150.001V"
        );
        assert!(Error::Verification(failure).is_verification());
        assert!(!Error::NotOpen.is_verification());
    }
}

//! Values carried into terminal handlers, and how they are rendered.
//!
//! Panic payloads and task errors are arbitrary values. Rendering them goes
//! through [`Fault`]'s `Display` impl, which has a fixed fallback for
//! payloads that are neither strings nor errors.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

/// Rendering used when a panic payload is not a string.
pub const NON_STRING_PAYLOAD: &str = "non-string panic payload";

/// A failure delivered to a terminal handler.
#[derive(Debug)]
pub enum Fault {
    /// Plain message (string panic payloads, ad-hoc reasons)
    Message(String),
    /// Error value; rendered with its source chain
    Error(Box<dyn StdError + Send + Sync>),
    /// Value with no textual form; holds a description of its type
    Opaque(String),
}

impl Fault {
    /// Wrap an error value.
    pub fn from_error(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Error(err.into())
    }

    /// Interpret a panic payload.
    pub fn from_panic_payload(payload: &(dyn Any + Send)) -> Self {
        if let Some(s) = payload.downcast_ref::<&'static str>() {
            Self::Message((*s).to_string())
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Self::Message(s.clone())
        } else {
            Self::Opaque(NON_STRING_PAYLOAD.to_string())
        }
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Error(err) => {
                write!(f, "{}", err)?;
                let mut source = err.source();
                while let Some(cause) = source {
                    write!(f, ": {}", cause)?;
                    source = cause.source();
                }
                Ok(())
            }
            Self::Opaque(kind) => write!(f, "<opaque value: {}>", kind),
        }
    }
}

/// Describe where a panic happened.
pub fn panic_origin(location: Option<&std::panic::Location<'_>>) -> String {
    match location {
        Some(loc) => format!("panic at {}:{}:{}", loc.file(), loc.line(), loc.column()),
        None => "panic".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl StdError for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to write journal")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_message() {
        assert_eq!(Fault::from("boom").to_string(), "boom");
    }

    #[test]
    fn test_error_chain() {
        let fault = Fault::from_error(Outer(Inner));
        assert_eq!(fault.to_string(), "failed to write journal: disk full");
    }

    #[test]
    fn test_anyhow_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("sync failed");
        let fault = Fault::from_error(err);
        assert_eq!(fault.to_string(), "sync failed: connection reset");
    }

    #[test]
    fn test_static_str_payload() {
        let payload: Box<dyn Any + Send> = Box::new("test error");
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.to_string(), "test error");
    }

    #[test]
    fn test_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(format!("index {} out of range", 7));
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.to_string(), "index 7 out of range");
    }

    #[test]
    fn test_opaque_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42u32);
        let fault = Fault::from_panic_payload(payload.as_ref());
        assert_eq!(fault.to_string(), "<opaque value: non-string panic payload>");
    }

    #[test]
    fn test_panic_origin() {
        assert_eq!(panic_origin(None), "panic");

        let loc = std::panic::Location::caller();
        let origin = panic_origin(Some(loc));
        assert!(origin.starts_with("panic at "));
        assert!(origin.contains("fault.rs"));
    }
}

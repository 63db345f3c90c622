//! Console error types

use std::fmt;

/// Console result type
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors raised synchronously to the embedding code.
///
/// Routine user mistakes (a bad reload index, a script that throws) are
/// not errors; they come back as values or printed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A facade operation was called before `init`
    NotInitialized,
    /// A required UI element is missing or has the wrong type
    InvalidElement(String),
    /// A required argument was empty
    MissingArgument(&'static str),
    /// The options object could not be read
    InvalidConfig(String),
    /// A host call failed
    Platform(String),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::NotInitialized => write!(f, "console not initiated!"),
            ConsoleError::InvalidElement(what) => {
                write!(f, "{} must be an instance of HTMLElement!", what)
            }
            ConsoleError::MissingArgument(name) => write!(f, "{} is null or empty!", name),
            ConsoleError::InvalidConfig(msg) => write!(f, "invalid options: {}", msg),
            ConsoleError::Platform(msg) => write!(f, "platform error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::InvalidConfig(e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ConsoleError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ConsoleError::Platform(format!("{:?}", value))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ConsoleError> for wasm_bindgen::JsValue {
    fn from(e: ConsoleError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}

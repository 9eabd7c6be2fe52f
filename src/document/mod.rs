//! # Documents
//!
//! Untyped, insertion-ordered documents as they flow between application
//! code, the gateway and the native driver. Field access is always a keyed
//! lookup; no object hydration happens here.

mod map;
mod value;

pub use map::Document;
pub use value::Value;

/// Build a [`Document`] from JSON-like syntax.
///
/// ```ignore
/// let query = doc! { "username": "jwage", "age": { "$in": [30, 31] } };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };
    ($($body:tt)+) => {
        match $crate::__private::serde_json::json!({ $($body)+ }) {
            $crate::__private::serde_json::Value::Object(map) => {
                $crate::document::Document::from(map)
            }
            _ => $crate::document::Document::new(),
        }
    };
}

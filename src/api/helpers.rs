//! Shared helpers for WASM API operations
//!
//! Console output, serde conversion to and from `JsValue`, and error
//! conversion at the JavaScript boundary.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::console;

// ============================================================================
// Console Output
// ============================================================================

/// Console method a boundary message is written with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    fn marker(self) -> &'static str {
        match self {
            ConsoleLevel::Info => "",
            ConsoleLevel::Warn => "⚠️ ",
            ConsoleLevel::Error => "❌ ",
        }
    }
}

/// `[WASM]`-prefixed console line
pub fn console_line(level: ConsoleLevel, msg: &str) {
    let line = JsValue::from_str(&format!("[WASM] {}{}", level.marker(), msg));
    match level {
        ConsoleLevel::Info => console::info_1(&line),
        ConsoleLevel::Warn => console::warn_1(&line),
        ConsoleLevel::Error => console::error_1(&line),
    }
}

#[macro_export]
macro_rules! wasm_info {
    ($($arg:tt)*) => {
        $crate::api::helpers::console_line(
            $crate::api::helpers::ConsoleLevel::Info,
            &format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! wasm_warn {
    ($($arg:tt)*) => {
        $crate::api::helpers::console_line(
            $crate::api::helpers::ConsoleLevel::Warn,
            &format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! wasm_error {
    ($($arg:tt)*) => {
        $crate::api::helpers::console_line(
            $crate::api::helpers::ConsoleLevel::Error,
            &format!($($arg)*),
        )
    };
}

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        console_line(ConsoleLevel::Error, &msg);
        JsValue::from_str(&msg)
    })
}

/// Serialize a value to JavaScript with automatic error handling.
///
/// Maps come out as plain objects so option bags can be handed straight to
/// JS libraries.
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        console_line(ConsoleLevel::Error, &msg);
        JsValue::from_str(&msg)
    })
}

// ============================================================================
// Error Conversion Helpers
// ============================================================================

/// Log an error and turn it into a JS exception value
pub fn js_error(err: impl Display) -> JsValue {
    let msg = err.to_string();
    console_line(ConsoleLevel::Error, &msg);
    JsValue::from_str(&msg)
}

/// Best-effort message from a thrown JS value
pub fn describe_js_error(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

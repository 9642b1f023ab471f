//! Placeholder and expression resolution for template run text.
//!
//! A template run may contain two kinds of tokens:
//!
//! - `{key}` placeholders, replaced by the value stored under `key`
//! - `{{...}}` expressions, evaluated as arithmetic after placeholders are
//!   resolved and rendered with thousands separators
//!
//! Resolution never fails: anything that cannot be resolved becomes the
//! [`NOT_AVAILABLE`] sentinel in the output text.
//!
//! # Example
//!
//! ```
//! use docfill::template::{resolve_run_text, ValueMap};
//!
//! let mut values = ValueMap::new();
//! values.insert("a", "1000");
//! values.insert("b", "500");
//!
//! let text = resolve_run_text("Total {{{a}+{b}}} from {a}", &values);
//! assert_eq!(text, "Total 1,500 from 1000");
//! ```

mod expr;
mod format;
mod resolve;
mod token;
mod values;

pub use expr::{evaluate, EvalError};
pub use format::format_number;
pub use resolve::{
    evaluate_expression, find_expression_tokens, resolve_placeholders, resolve_run_text,
    MissingValue, Resolution, Resolver,
};
pub use values::{is_valid_key, ValueMap, NOT_AVAILABLE};

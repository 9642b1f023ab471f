//! Insurance products: which illustrations fill which template keys.
//!
//! A [`ProductProfile`] describes, per input illustration, the numbers taken
//! from its file name and the cells read from its tables. The
//! [`Generator`] applies a profile to supplied [`Illustration`]s, builds the
//! [`ValueMap`](crate::template::ValueMap) and fills the product's template.
//!
//! Built-in profiles cover the savings and critical illness products; JSON
//! profile files can add products or override built-ins by name.

mod builtin;
mod config;
mod generate;
mod registry;

pub use builtin::{builtin_profiles, BUILTIN_NAMES, STAGED_SECTION_END, STAGED_SECTION_START};
pub use config::{
    FieldSource, FieldSpec, FilenameSpec, InputRole, InputSpec, OutputMode, ProductProfile,
};
pub use generate::{input_values, Generator, Illustration};
pub use registry::{ProductRegistry, ProfileFile};

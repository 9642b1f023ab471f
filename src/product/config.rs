//! Product profile configuration.

use crate::error::{Error, Result};
use crate::extract::{ColumnRef, PageRef, RowRef};
use crate::fill::{DeletionRange, DeletionStrategy, FillOptions};
use crate::template::{is_valid_key, MissingValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The part an illustration plays in a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    /// Main illustration of a single-person product
    Primary,
    /// Staged withdrawal illustration of a savings plan
    Staged,
    /// First insured person
    Person1,
    /// Second insured person
    Person2,
    /// Third insured person
    Person3,
    /// Fourth insured person
    Person4,
}

impl InputRole {
    /// All roles, in the order they are listed in profiles.
    pub const ALL: [InputRole; 6] = [
        InputRole::Primary,
        InputRole::Staged,
        InputRole::Person1,
        InputRole::Person2,
        InputRole::Person3,
        InputRole::Person4,
    ];

    /// Role name as used on the command line and in profile files.
    pub fn as_str(self) -> &'static str {
        match self {
            InputRole::Primary => "primary",
            InputRole::Staged => "staged",
            InputRole::Person1 => "person1",
            InputRole::Person2 => "person2",
            InputRole::Person3 => "person3",
            InputRole::Person4 => "person4",
        }
    }
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        InputRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Other(format!("Unknown input role: {}", s)))
    }
}

/// Values taken from the numbers in an illustration's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameSpec {
    /// Keys receiving the numbers, in order
    pub keys: Vec<String>,

    /// 0-based positions of the numbers to use; the leading numbers when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<usize>>,

    /// Minimum count of numbers the name must contain
    #[serde(default)]
    pub min_count: usize,
}

impl FilenameSpec {
    /// Map the first numbers of the name onto `keys`.
    pub fn leading(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            positions: None,
            min_count: keys.len(),
        }
    }

    /// Map the numbers at `positions` onto `keys`.
    pub fn at(keys: &[&str], positions: &[usize]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            positions: Some(positions.to_vec()),
            min_count: positions.iter().max().map_or(0, |p| p + 1),
        }
    }

    /// Set the minimum count of numbers.
    pub fn with_min_count(mut self, count: usize) -> Self {
        self.min_count = count;
        self
    }

    /// Count of numbers actually required: the explicit minimum or what the
    /// keys and positions need, whichever is larger.
    pub fn required_count(&self) -> usize {
        let needed = match &self.positions {
            Some(positions) => positions.iter().max().map_or(0, |p| p + 1),
            None => self.keys.len(),
        };
        needed.max(self.min_count)
    }
}

/// Where a table value is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// A cell at fixed coordinates
    Cell {
        /// Page holding the table
        page: PageRef,
        /// Row of the cell
        row: RowRef,
        /// Column of the cell
        column: ColumnRef,
    },

    /// A number in the first row mentioning one of the keywords
    KeywordRow {
        /// Page holding the table
        page: PageRef,
        /// Keywords tried in order until one matches a row
        keywords: Vec<String>,
        /// Index into the row's numbers
        position: usize,
    },
}

/// A value read from an illustration's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key receiving the value
    pub key: String,

    /// Where the value comes from
    pub source: FieldSource,

    /// Keep only the digits of the cell text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub digits_only: bool,
}

impl FieldSpec {
    /// A value at fixed table coordinates.
    pub fn cell(key: &str, page: PageRef, row: RowRef, column: ColumnRef) -> Self {
        Self {
            key: key.to_string(),
            source: FieldSource::Cell { page, row, column },
            digits_only: false,
        }
    }

    /// A number from the row mentioning one of `keywords`.
    pub fn keyword_row(key: &str, page: PageRef, keywords: &[&str], position: usize) -> Self {
        Self {
            key: key.to_string(),
            source: FieldSource::KeywordRow {
                page,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                position,
            },
            digits_only: false,
        }
    }

    /// Keep only the digits of the value.
    pub fn digits(mut self) -> Self {
        self.digits_only = true;
        self
    }
}

/// One illustration a product consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Role of the illustration
    pub role: InputRole,

    /// Whether generation fails without it
    #[serde(default = "default_required")]
    pub required: bool,

    /// Appended to every key of this input (`"1"` turns `a` into `a1`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_suffix: String,

    /// Values from the file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<FilenameSpec>,

    /// Values from the tables
    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    /// Template sections removed when this input is not supplied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when_absent: Vec<DeletionRange>,
}

fn default_required() -> bool {
    true
}

impl InputSpec {
    /// A required input with no rules yet.
    pub fn new(role: InputRole) -> Self {
        Self {
            role,
            required: true,
            key_suffix: String::new(),
            filename: None,
            fields: Vec::new(),
            when_absent: Vec::new(),
        }
    }

    /// Mark the input optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the key suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.key_suffix = suffix.into();
        self
    }

    /// Set the file name rule.
    pub fn with_filename(mut self, spec: FilenameSpec) -> Self {
        self.filename = Some(spec);
        self
    }

    /// Add a table field rule.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Remove a template section when the input is absent.
    pub fn with_absent_deletion(mut self, range: DeletionRange) -> Self {
        self.when_absent.push(range);
        self
    }

    /// Final key name for `key` under this input's suffix.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", key, self.key_suffix)
    }

    /// Every key this input produces, suffix applied.
    pub fn keys(&self) -> Vec<String> {
        let filename = self.filename.iter().flat_map(|f| f.keys.iter());
        let fields = self.fields.iter().map(|f| &f.key);
        filename.chain(fields).map(|k| self.key(k)).collect()
    }
}

/// What happens with the filled template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Write the filled template to the output path
    #[default]
    Replace,

    /// Append the filled template's body to the document at the output path
    Append,
}

/// How one insurance product's illustrations fill its template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductProfile {
    /// Name used to select the profile
    pub name: String,

    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// Illustrations consumed, in merge order
    pub inputs: Vec<InputSpec>,

    /// Replace or append output
    #[serde(default)]
    pub output: OutputMode,

    /// Substitution for keys missing inside expressions
    #[serde(default)]
    pub missing: MissingValue,

    /// How marker ranges are deleted
    #[serde(default)]
    pub strategy: DeletionStrategy,

    /// Template sections always removed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<DeletionRange>,
}

impl ProductProfile {
    /// Create an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            inputs: Vec::new(),
            output: OutputMode::default(),
            missing: MissingValue::default(),
            strategy: DeletionStrategy::default(),
            deletions: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an input.
    pub fn with_input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    /// Set the output mode.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Look up the rules for a role.
    pub fn input(&self, role: InputRole) -> Option<&InputSpec> {
        self.inputs.iter().find(|input| input.role == role)
    }

    /// Fill options for a run where `present` tells which inputs were supplied.
    pub fn fill_options(&self, present: impl Fn(InputRole) -> bool) -> FillOptions {
        let absent = self
            .inputs
            .iter()
            .filter(|input| !present(input.role))
            .flat_map(|input| input.when_absent.iter().cloned());

        FillOptions::new()
            .with_missing(self.missing)
            .with_strategy(self.strategy)
            .with_deletions(self.deletions.iter().cloned().chain(absent))
    }

    /// Check the profile for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Error::InvalidProfile(format!("{}: {}", self.name, msg));

        if self.name.trim().is_empty() {
            return Err(Error::InvalidProfile("profile name is empty".into()));
        }
        if self.inputs.is_empty() {
            return Err(invalid("no inputs".into()));
        }

        let mut roles = BTreeSet::new();
        for input in &self.inputs {
            if !roles.insert(input.role) {
                return Err(invalid(format!("input {} listed twice", input.role)));
            }
            if input.required && !input.when_absent.is_empty() {
                return Err(invalid(format!(
                    "required input {} has deletions for when it is absent",
                    input.role
                )));
            }
            if let Some(spec) = &input.filename {
                if let Some(positions) = &spec.positions {
                    if positions.len() != spec.keys.len() {
                        return Err(invalid(format!(
                            "input {} has {} file name keys but {} positions",
                            input.role,
                            spec.keys.len(),
                            positions.len()
                        )));
                    }
                }
            }
            for key in input.keys() {
                if !is_valid_key(&key) {
                    return Err(Error::InvalidKey(key));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("staged".parse::<InputRole>().unwrap(), InputRole::Staged);
        assert_eq!("Person2".parse::<InputRole>().unwrap(), InputRole::Person2);
        assert!("nobody".parse::<InputRole>().is_err());
    }

    #[test]
    fn test_filename_required_count() {
        assert_eq!(FilenameSpec::leading(&["a", "b", "c"]).required_count(), 3);
        assert_eq!(FilenameSpec::at(&["n", "o", "p"], &[5, 7, 10]).required_count(), 11);
        assert_eq!(
            FilenameSpec::leading(&["a"]).with_min_count(4).required_count(),
            4
        );
    }

    #[test]
    fn test_input_keys_with_suffix() {
        let input = InputSpec::new(InputRole::Person2)
            .with_suffix("1")
            .with_filename(FilenameSpec::leading(&["a", "b"]))
            .with_field(FieldSpec::cell(
                "e",
                PageRef::Index(4),
                RowRef::FromBottom(8),
                ColumnRef::Index(8),
            ));
        assert_eq!(input.keys(), vec!["a1", "b1", "e1"]);
    }

    #[test]
    fn test_fill_options_for_absent_input() {
        let profile = ProductProfile::new("p")
            .with_input(InputSpec::new(InputRole::Primary))
            .with_input(
                InputSpec::new(InputRole::Staged)
                    .optional()
                    .with_absent_deletion(DeletionRange::new("start", "end")),
            );

        let options = profile.fill_options(|role| role == InputRole::Primary);
        assert_eq!(options.deletions, vec![DeletionRange::new("start", "end")]);

        let options = profile.fill_options(|_| true);
        assert!(options.deletions.is_empty());
    }

    #[test]
    fn test_validate() {
        let ok = ProductProfile::new("p").with_input(
            InputSpec::new(InputRole::Primary).with_filename(FilenameSpec::leading(&["a"])),
        );
        assert!(ok.validate().is_ok());

        let empty = ProductProfile::new("p");
        assert!(matches!(empty.validate(), Err(Error::InvalidProfile(_))));

        let duplicate = ProductProfile::new("p")
            .with_input(InputSpec::new(InputRole::Primary))
            .with_input(InputSpec::new(InputRole::Primary));
        assert!(matches!(duplicate.validate(), Err(Error::InvalidProfile(_))));

        let bad_key = ProductProfile::new("p").with_input(
            InputSpec::new(InputRole::Primary).with_filename(FilenameSpec::leading(&["a-b"])),
        );
        assert!(matches!(bad_key.validate(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_profile_json() {
        let json = r#"{
            "name": "custom",
            "inputs": [{
                "role": "primary",
                "filename": { "keys": ["a", "b"] },
                "fields": [{
                    "key": "d",
                    "source": { "kind": "keyword_row", "page": { "index": 3 }, "keywords": ["CIP2"], "position": 0 }
                }, {
                    "key": "e",
                    "source": { "kind": "cell", "page": { "from_end": 6 }, "row": { "from_bottom": 2 }, "column": { "index": 8 } },
                    "digits_only": true
                }]
            }],
            "output": "append"
        }"#;
        let profile: ProductProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.output, OutputMode::Append);
        let input = profile.input(InputRole::Primary).unwrap();
        assert!(input.required);
        assert_eq!(input.fields.len(), 2);
        assert!(input.fields[1].digits_only);
        assert_eq!(
            input.fields[1].source,
            FieldSource::Cell {
                page: PageRef::FromEnd(6),
                row: RowRef::FromBottom(2),
                column: ColumnRef::Index(8),
            }
        );
        assert!(profile.validate().is_ok());
    }
}

//! Value collection and document generation for one product.

use super::config::{
    FieldSource, FieldSpec, FilenameSpec, InputRole, InputSpec, OutputMode, ProductProfile,
};
use crate::docx::{DocxTemplate, TemplateSource};
use crate::error::{Error, Result};
use crate::extract::{
    cell_value, digits_only, keyword_numbers, numbers_in, TableDump, TableSource,
};
use crate::fill::{fill, FillOptions, FillReport};
use crate::template::{ValueMap, NOT_AVAILABLE};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// An illustration: its file name and the tables detected in it.
pub struct Illustration {
    file_name: String,
    tables: Box<dyn TableSource>,
}

impl fmt::Debug for Illustration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Illustration")
            .field("file_name", &self.file_name)
            .field("page_count", &self.tables.page_count())
            .finish()
    }
}

impl Illustration {
    /// Create an illustration from a file name and its tables.
    pub fn new(file_name: impl Into<String>, tables: impl TableSource + 'static) -> Self {
        Self {
            file_name: file_name.into(),
            tables: Box::new(tables),
        }
    }

    /// Read a JSON table dump.
    ///
    /// The dump's `source_name` is the file name numbers are read from; the
    /// dump's own file name is used when it has none.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let dump = TableDump::open(path)?;
        let file_name = match &dump.source_name {
            Some(name) => name.clone(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Ok(Self::new(file_name, dump))
    }

    /// File name the filename rules read.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Detected tables.
    pub fn tables(&self) -> &dyn TableSource {
        self.tables.as_ref()
    }
}

/// Turns a product's illustrations into values and a filled document.
///
/// # Example
///
/// ```no_run
/// use docfill::docx::TemplateSource;
/// use docfill::product::{Generator, Illustration, InputRole, ProductRegistry};
///
/// fn main() -> docfill::Result<()> {
///     let registry = ProductRegistry::with_defaults();
///     let generator = Generator::new(registry.get("critical-illness")?)
///         .with_input(InputRole::Person1, Illustration::open("person1.json")?);
///     let report = generator.generate(&TemplateSource::path("ci.docx"), "out.docx")?;
///     println!("{} placeholders", report.placeholders);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Generator<'a> {
    profile: &'a ProductProfile,
    inputs: BTreeMap<InputRole, Illustration>,
}

impl<'a> Generator<'a> {
    /// Create a generator for `profile` with no inputs yet.
    pub fn new(profile: &'a ProductProfile) -> Self {
        Self {
            profile,
            inputs: BTreeMap::new(),
        }
    }

    /// Supply the illustration for a role.
    pub fn with_input(mut self, role: InputRole, illustration: Illustration) -> Self {
        self.add_input(role, illustration);
        self
    }

    /// Supply the illustration for a role, replacing an earlier one.
    pub fn add_input(&mut self, role: InputRole, illustration: Illustration) {
        self.inputs.insert(role, illustration);
    }

    /// Check if an illustration was supplied for a role.
    pub fn has_input(&self, role: InputRole) -> bool {
        self.inputs.contains_key(&role)
    }

    /// The profile driving this generator.
    pub fn profile(&self) -> &ProductProfile {
        self.profile
    }

    /// Collect the values of all supplied inputs, in profile order.
    pub fn collect_values(&self) -> Result<ValueMap> {
        for role in self.inputs.keys() {
            if self.profile.input(*role).is_none() {
                log::warn!(
                    "Product {} has no {} input; ignoring it",
                    self.profile.name,
                    role
                );
            }
        }

        let mut values = ValueMap::new();
        for spec in &self.profile.inputs {
            match self.inputs.get(&spec.role) {
                Some(illustration) => values.merge(input_values(spec, illustration)?),
                None if spec.required => {
                    return Err(Error::MissingInput(spec.role.to_string()));
                }
                None => log::debug!("Optional input {} not supplied", spec.role),
            }
        }
        Ok(values)
    }

    /// Fill options for the supplied inputs.
    pub fn fill_options(&self) -> FillOptions {
        self.profile.fill_options(|role| self.has_input(role))
    }

    /// Fill a template without writing it anywhere.
    pub fn fill_template(&self, template: &TemplateSource) -> Result<(DocxTemplate, FillReport)> {
        let values = self.collect_values()?;
        let mut document = DocxTemplate::load(template)?;
        let report = fill(&mut document, &values, &self.fill_options());
        Ok((document, report))
    }

    /// Fill a template and write it to `output` according to the profile's
    /// output mode.
    pub fn generate<P: AsRef<Path>>(
        &self,
        template: &TemplateSource,
        output: P,
    ) -> Result<FillReport> {
        let output = output.as_ref();
        let (document, report) = self.fill_template(template)?;

        match self.profile.output {
            OutputMode::Replace => document.save(output)?,
            OutputMode::Append => {
                let base = if output.exists() {
                    DocxTemplate::open(output)?
                } else {
                    log::debug!("{} does not exist; starting a new document", output.display());
                    DocxTemplate::from_docx(docx_rs::Docx::new())
                };
                document.append_to(base).save(output)?;
            }
        }
        Ok(report)
    }
}

/// Values of one input: file name numbers first, then table fields.
pub fn input_values(spec: &InputSpec, illustration: &Illustration) -> Result<ValueMap> {
    let mut values = ValueMap::new();
    if let Some(filename) = &spec.filename {
        let numbers = filename_values(filename, illustration.file_name())?;
        for (key, number) in filename.keys.iter().zip(numbers) {
            values.insert(spec.key(key), number);
        }
    }
    for field in &spec.fields {
        values.insert(spec.key(&field.key), field_value(field, illustration.tables()));
    }
    values.validate()?;
    Ok(values)
}

fn filename_values(spec: &FilenameSpec, name: &str) -> Result<Vec<String>> {
    let numbers = numbers_in(name);
    let expected = spec.required_count();
    if numbers.len() < expected {
        return Err(Error::FilenameValues {
            name: name.to_string(),
            expected,
            found: numbers.len(),
        });
    }

    let selected = match &spec.positions {
        Some(positions) => positions.iter().map(|&i| numbers[i].clone()).collect(),
        None => numbers.into_iter().take(spec.keys.len()).collect(),
    };
    Ok(selected)
}

fn field_value(field: &FieldSpec, tables: &dyn TableSource) -> String {
    let value = match &field.source {
        FieldSource::Cell { page, row, column } => cell_value(tables, *page, *row, *column),
        FieldSource::KeywordRow {
            page,
            keywords,
            position,
        } => {
            let numbers = keywords
                .iter()
                .map(|keyword| keyword_numbers(tables, *page, keyword))
                .find(|numbers| !numbers.is_empty())
                .unwrap_or_default();
            match numbers.get(*position) {
                Some(number) => number.clone(),
                None => {
                    log::warn!(
                        "No number {} in rows matching {:?} for {}",
                        position,
                        keywords,
                        field.key
                    );
                    NOT_AVAILABLE.to_string()
                }
            }
        }
    };

    if field.digits_only {
        digits_only(&value)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ColumnRef, PageRef, RowRef};

    fn tables() -> TableDump {
        let mut dump = TableDump::new(4);
        dump.add_table(
            2,
            vec![
                vec!["CIM3".into(), "500,000".into(), "20".into()],
                vec!["第 30 年".into(), "1,200".into(), "".into()],
            ],
        );
        dump
    }

    #[test]
    fn test_filename_values_positions() {
        let spec = FilenameSpec::at(&["n", "o", "p"], &[1, 3, 4]);
        assert_eq!(
            filename_values(&spec, "x1_2_3_4_5").unwrap(),
            vec!["2", "4", "5"]
        );
        assert!(matches!(
            filename_values(&spec, "x1_2"),
            Err(Error::FilenameValues { expected: 5, found: 2, .. })
        ));
    }

    #[test]
    fn test_field_value_keyword_fallback() {
        let field = FieldSpec::keyword_row("d", PageRef::Index(2), &["CIP2", "CIM3"], 0);
        assert_eq!(field_value(&field, &tables()), "500000");

        let field = FieldSpec::keyword_row("d", PageRef::Index(2), &["CIP2"], 0);
        assert_eq!(field_value(&field, &tables()), NOT_AVAILABLE);
    }

    #[test]
    fn test_field_value_digits_only() {
        let field =
            FieldSpec::cell("s", PageRef::Index(2), RowRef::Index(1), ColumnRef::Index(0)).digits();
        assert_eq!(field_value(&field, &tables()), "30");
    }

    #[test]
    fn test_input_values_with_suffix() {
        let spec = InputSpec::new(InputRole::Person2)
            .with_suffix("1")
            .with_filename(FilenameSpec::leading(&["a", "b"]))
            .with_field(FieldSpec::cell(
                "e",
                PageRef::FromEnd(2),
                RowRef::FromBottom(1),
                ColumnRef::Index(1),
            ));
        let illustration = Illustration::new("45岁_10万.pdf", tables());
        let values = input_values(&spec, &illustration).unwrap();
        assert_eq!(values.get("a1"), Some("45"));
        assert_eq!(values.get("b1"), Some("10"));
        assert_eq!(values.get("e1"), Some("1200"));
    }

    #[test]
    fn test_collect_values_missing_required() {
        let profile = ProductProfile::new("p").with_input(InputSpec::new(InputRole::Primary));
        let generator = Generator::new(&profile);
        assert!(matches!(
            generator.collect_values(),
            Err(Error::MissingInput(role)) if role == "primary"
        ));
    }
}

//! Built-in product profiles.

use super::config::{FieldSpec, FilenameSpec, InputRole, InputSpec, OutputMode, ProductProfile};
use crate::extract::{ColumnRef, PageRef, RowRef};
use crate::fill::DeletionRange;

/// First paragraph of the staged withdrawal section in savings templates.
pub const STAGED_SECTION_START: &str = "在人生的重要阶段提取：";

/// Last paragraph of the staged withdrawal section in savings templates.
pub const STAGED_SECTION_END: &str = "不提取分红，在某年，把累积的本金";

/// Page holding the summary table of savings illustrations, counted from the end.
const SAVINGS_SUMMARY_FROM_END: usize = 6;

/// Page of the surrender value table in savings illustrations.
const SURRENDER_PAGE: usize = 6;

/// Page with the plan rows of critical illness illustrations.
const CI_PLAN_PAGE: usize = 3;

/// Page with the benefit table of critical illness illustrations.
const CI_BENEFIT_PAGE: usize = 4;

/// Names of the built-in profiles.
pub const BUILTIN_NAMES: [&str; 6] = [
    "savings",
    "savings-append",
    "critical-illness",
    "critical-illness-2",
    "critical-illness-3",
    "critical-illness-4",
];

/// All built-in profiles.
pub fn builtin_profiles() -> Vec<ProductProfile> {
    vec![
        savings(OutputMode::Replace),
        savings(OutputMode::Append),
        critical_illness(1),
        critical_illness(2),
        critical_illness(3),
        critical_illness(4),
    ]
}

fn summary_cell(key: &str, row: usize, column: usize) -> FieldSpec {
    FieldSpec::cell(
        key,
        PageRef::FromEnd(SAVINGS_SUMMARY_FROM_END),
        RowRef::Index(row),
        ColumnRef::Index(column),
    )
}

/// Savings plan: withdrawal illustration plus an optional staged withdrawal
/// illustration. In append mode the withdrawal year `s` comes from the main
/// illustration.
fn savings(output: OutputMode) -> ProductProfile {
    let append = output == OutputMode::Append;

    // Surrender values at ANB 56, 66, 76, 86 and 96.
    let surrender = [("i", 10), ("j", 8), ("k", 6), ("l", 4), ("m", 2)];

    let mut primary = InputSpec::new(InputRole::Primary)
        .with_filename(FilenameSpec::leading(&["a", "b", "c", "d", "e", "f"]))
        .with_field(summary_cell("g", 11, 5))
        .with_field(summary_cell("h", 12, 5));
    for (key, from_bottom) in surrender {
        primary = primary.with_field(FieldSpec::cell(
            key,
            PageRef::Index(SURRENDER_PAGE),
            RowRef::FromBottom(from_bottom),
            ColumnRef::FromEnd(2),
        ));
    }

    let mut staged = InputSpec::new(InputRole::Staged)
        .optional()
        .with_filename(FilenameSpec::at(&["n", "o", "p"], &[5, 7, 10]))
        .with_field(summary_cell("q", 11, 5))
        .with_field(summary_cell("r", 12, 5))
        .with_absent_deletion(DeletionRange::new(STAGED_SECTION_START, STAGED_SECTION_END));

    if append {
        primary = primary.with_field(summary_cell("s", 11, 0).digits());
    } else {
        staged = staged.with_field(summary_cell("s", 11, 0).digits());
    }

    let (name, description) = if append {
        ("savings-append", "Savings plan, appended to an existing document")
    } else {
        ("savings", "Savings plan with optional staged withdrawals")
    };

    ProductProfile::new(name)
        .with_description(description)
        .with_input(primary)
        .with_input(staged)
        .with_output(output)
}

/// Critical illness cover for `persons` insured people. The second person's
/// keys carry suffix `1`, the third `2`, and so on.
fn critical_illness(persons: usize) -> ProductProfile {
    let roles = [
        InputRole::Person1,
        InputRole::Person2,
        InputRole::Person3,
        InputRole::Person4,
    ];

    let (name, description) = match persons {
        1 => (
            "critical-illness".to_string(),
            "Critical illness cover, one person".to_string(),
        ),
        n => (
            format!("critical-illness-{}", n),
            format!("Critical illness cover, {} people", n),
        ),
    };

    let mut profile = ProductProfile::new(name).with_description(description);
    for (index, role) in roles.into_iter().take(persons).enumerate() {
        let suffix = if index == 0 {
            String::new()
        } else {
            index.to_string()
        };

        let mut input = InputSpec::new(role)
            .with_suffix(suffix)
            .with_filename(FilenameSpec::leading(&["a", "b", "c"]))
            .with_field(FieldSpec::keyword_row(
                "d",
                PageRef::Index(CI_PLAN_PAGE),
                &["CIP2", "CIM3"],
                0,
            ));
        for (key, from_bottom) in [("e", 8), ("f", 6), ("g", 4), ("h", 2)] {
            input = input.with_field(FieldSpec::cell(
                key,
                PageRef::Index(CI_BENEFIT_PAGE),
                RowRef::FromBottom(from_bottom),
                ColumnRef::Index(8),
            ));
        }
        profile = profile.with_input(input);
    }
    profile
}

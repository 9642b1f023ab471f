//! Run-level resolution: placeholders first, then expressions.

use super::expr::evaluate;
use super::format::format_number;
use super::token::{expression_spans, replace_placeholders};
use super::values::{ValueMap, NOT_AVAILABLE};
use serde::{Deserialize, Serialize};

/// How a key absent from the value map is substituted inside an expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValue {
    /// Substitute "N/A", so the whole expression evaluates to "N/A".
    #[default]
    NotAvailable,

    /// Substitute "0" and keep evaluating.
    Zero,
}

impl MissingValue {
    fn substitute(self) -> &'static str {
        match self {
            MissingValue::NotAvailable => NOT_AVAILABLE,
            MissingValue::Zero => "0",
        }
    }
}

/// Resolved run text together with what happened while resolving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved text
    pub text: String,

    /// Placeholders replaced with a value
    pub placeholders: usize,

    /// Expressions evaluated (successfully or not)
    pub expressions: usize,

    /// Expressions that resolved to "N/A"
    pub failed_expressions: usize,

    /// Placeholder keys not present in the value map
    pub unknown_keys: Vec<String>,
}

/// Resolves template tokens against a [`ValueMap`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    values: &'a ValueMap,
    missing: MissingValue,
}

impl<'a> Resolver<'a> {
    /// Create a resolver with the default missing-value policy.
    pub fn new(values: &'a ValueMap) -> Self {
        Self {
            values,
            missing: MissingValue::default(),
        }
    }

    /// Set how missing keys are substituted inside expressions.
    pub fn with_missing(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    /// Replace `{key}` placeholders whose key is in the value map.
    ///
    /// Unknown keys are left untouched so they remain visible in the output.
    pub fn resolve_placeholders(&self, text: &str) -> String {
        replace_placeholders(text, |key| self.values.get(key).map(str::to_string))
    }

    /// Evaluate the body of a `{{...}}` expression (braces already stripped).
    ///
    /// Returns the formatted number, or "N/A" if the body does not evaluate.
    pub fn evaluate_expression(&self, body: &str) -> String {
        let substituted = replace_placeholders(body, |key| {
            Some(
                self.values
                    .get(key)
                    .unwrap_or_else(|| self.missing.substitute())
                    .to_string(),
            )
        });

        match evaluate(&substituted) {
            Ok(value) => format_number(value),
            Err(e) => {
                log::warn!("Expression {:?} evaluated to N/A: {}", substituted, e);
                NOT_AVAILABLE.to_string()
            }
        }
    }

    /// Resolve one run's text, reporting what was substituted.
    pub fn resolve(&self, text: &str) -> Resolution {
        let mut resolution = Resolution::default();

        let substituted = replace_placeholders(text, |key| match self.values.get(key) {
            Some(value) => {
                resolution.placeholders += 1;
                Some(value.to_string())
            }
            None => {
                resolution.unknown_keys.push(key.to_string());
                None
            }
        });

        let spans = expression_spans(&substituted);
        if spans.is_empty() {
            resolution.text = substituted;
            return resolution;
        }

        let mut out = String::with_capacity(substituted.len());
        let mut last = 0;
        for span in spans {
            out.push_str(&substituted[last..span.start]);
            let value = self.evaluate_expression(&substituted[span.start + 2..span.end - 2]);
            resolution.expressions += 1;
            if value == NOT_AVAILABLE {
                resolution.failed_expressions += 1;
            }
            out.push_str(&value);
            last = span.end;
        }
        out.push_str(&substituted[last..]);

        resolution.text = out;
        resolution
    }

    /// Resolve one run's text: placeholders, then expressions.
    pub fn resolve_run_text(&self, text: &str) -> String {
        self.resolve(text).text
    }
}

/// Replace `{key}` placeholders for every key present in `values`.
pub fn resolve_placeholders(text: &str, values: &ValueMap) -> String {
    Resolver::new(values).resolve_placeholders(text)
}

/// Raw `{{...}}` tokens in `text`, outer braces included, left to right.
pub fn find_expression_tokens(text: &str) -> Vec<&str> {
    expression_spans(text)
        .into_iter()
        .map(|span| &text[span])
        .collect()
}

/// Evaluate an expression body against `values`.
pub fn evaluate_expression(body: &str, values: &ValueMap) -> String {
    Resolver::new(values).evaluate_expression(body)
}

/// Resolve placeholders and then expressions in one run's text.
pub fn resolve_run_text(text: &str, values: &ValueMap) -> String {
    Resolver::new(values).resolve_run_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> ValueMap {
        ValueMap::from_pairs(["a", "b", "a1", "g"], ["1000", "500", "7", NOT_AVAILABLE])
    }

    #[test]
    fn test_evaluate_expression() {
        let empty = ValueMap::new();
        assert_eq!(evaluate_expression("2+2", &empty), "4");
        assert_eq!(evaluate_expression("10/0", &empty), "N/A");
        assert_eq!(evaluate_expression("{a}+{b}", &values()), "1,500");
        assert_eq!(evaluate_expression("{a}/3", &values()), "333.3");
    }

    #[test]
    fn test_missing_value_policy() {
        let values = values();
        let strict = Resolver::new(&values);
        let lenient = Resolver::new(&values).with_missing(MissingValue::Zero);

        assert_eq!(strict.evaluate_expression("{a}+{zz}"), "N/A");
        assert_eq!(lenient.evaluate_expression("{a}+{zz}"), "1,000");
        // an explicit N/A value is never replaced by zero
        assert_eq!(lenient.evaluate_expression("{a}+{g}"), "N/A");
    }

    #[test]
    fn test_prefix_keys_do_not_collide() {
        assert_eq!(resolve_placeholders("{a}-{a1}", &values()), "1000-7");
    }

    #[test]
    fn test_resolve_run_text() {
        let values = values();
        assert_eq!(
            resolve_run_text("共{a}美金，合计{{{a}*{b}}}", &values),
            "共1000美金，合计500,000"
        );
        assert_eq!(resolve_run_text("{{{g}+1}}", &values), "N/A");
        assert_eq!(resolve_run_text("{{{zz}+1}}", &values), "N/A");
        assert_eq!(resolve_run_text("{zz} stays", &values), "{zz} stays");
    }

    #[test]
    fn test_find_expression_tokens() {
        assert_eq!(
            find_expression_tokens("{{1+1}} and {{ (2*3) }}"),
            vec!["{{1+1}}", "{{ (2*3) }}"]
        );
        assert!(find_expression_tokens("{a} {b}").is_empty());
    }

    #[test]
    fn test_resolution_counts() {
        let values = values();
        let resolution = Resolver::new(&values).resolve("{a} {zz} {{{a}/0}} {{1+1}}");

        assert_eq!(resolution.text, "1000 {zz} N/A 2");
        assert_eq!(resolution.placeholders, 2);
        assert_eq!(resolution.expressions, 2);
        assert_eq!(resolution.failed_expressions, 1);
        assert_eq!(resolution.unknown_keys, vec!["zz"]);
    }

    #[test]
    fn test_resolved_text_is_stable() {
        let values = values();
        let once = resolve_run_text("{a} plus {{{a}+{b}}}", &values);
        assert_eq!(resolve_run_text(&once, &values), once);
    }
}

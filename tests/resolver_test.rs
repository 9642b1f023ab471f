//! Integration tests for placeholder and expression resolution.

use docfill::template::{
    evaluate, evaluate_expression, find_expression_tokens, format_number, resolve_placeholders,
    resolve_run_text, EvalError, MissingValue, Resolver, ValueMap, NOT_AVAILABLE,
};

fn savings_values() -> ValueMap {
    ValueMap::from_pairs(
        ["a", "b", "c", "d", "e", "f", "g", "h", "a1", "b1"],
        [
            "4", "20000", "5", "19", "85", "12000", "188210", "205004", "45", "100000",
        ],
    )
}

#[test]
fn test_documented_examples() {
    let empty = ValueMap::new();
    assert_eq!(evaluate_expression("2+2", &empty), "4");
    assert_eq!(evaluate_expression("10/0", &empty), "N/A");

    let values = ValueMap::from_pairs(["a", "b"], ["1000", "500"]);
    assert_eq!(evaluate_expression("{a}+{b}", &values), "1,500");

    assert_eq!(format_number(3008582.0), "3,008,582");
    assert_eq!(format_number(1234.5), "1,234.5");
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(1234567.0), "1,234,567");
}

#[test]
fn test_known_keys_leave_no_placeholders() {
    let values = savings_values();
    let texts = [
        "{a}岁人士，每年存{b}美金，存{c}年",
        "{a}{b}{c}{d}{e}{f}{g}{h}",
        "prefix {a1} and {a} and {b1}{b}",
        "{{{b}*{c}}} total",
    ];

    for text in texts {
        let resolved = resolve_run_text(text, &values);
        for (key, _) in values.iter() {
            let token = format!("{{{}}}", key);
            assert!(
                !resolved.contains(&token),
                "{:?} still contains {} after resolving {:?}",
                resolved,
                token,
                text
            );
        }
    }
}

#[test]
fn test_plain_text_is_identity() {
    let values = savings_values();
    let texts = [
        "",
        "不提取分红，在某年，把累积的本金",
        "Total: 1,000 USD (approx.)",
        "a } stray { brace",
        "{not a key}",
        "{}",
        "{{}}",
        "{{unterminated",
    ];

    for text in texts {
        assert_eq!(resolve_run_text(text, &values), text, "text {:?}", text);
    }
}

#[test]
fn test_prefix_keys_resolve_exactly() {
    let values = savings_values();
    assert_eq!(resolve_placeholders("{a}-{a1}", &values), "4-45");
    assert_eq!(resolve_placeholders("{b1}/{b}", &values), "100000/20000");
}

#[test]
fn test_withdrawal_sentence() {
    let values = savings_values();
    assert_eq!(
        resolve_run_text(
            "从{d}岁到{e}岁，每年提取{f}美金，共提取{{({e}-{d}+1)*{f}}}美金",
            &values
        ),
        "从19岁到85岁，每年提取12000美金，共提取804,000美金"
    );
}

#[test]
fn test_unavailable_values() {
    let mut values = savings_values();
    values.insert_unavailable("g");

    assert_eq!(resolve_run_text("value {g}", &values), "value N/A");
    assert_eq!(resolve_run_text("{{{g}-{h}}}", &values), NOT_AVAILABLE);

    let zero = Resolver::new(&values).with_missing(MissingValue::Zero);
    // Zero only applies to keys absent from the map, not to "N/A" values.
    assert_eq!(zero.resolve_run_text("{{{g}-{h}}}"), NOT_AVAILABLE);
    assert_eq!(zero.resolve_run_text("{{{zz}+{h}}}"), "205,004");
}

#[test]
fn test_expression_safety() {
    let empty = ValueMap::new();
    let hostile = [
        "__import__('os').system('ls')",
        "open('x')",
        "1; 2",
        "2**10",
        "abs(-1)",
        "1e3",
        "x",
    ];
    for body in hostile {
        assert_eq!(evaluate_expression(body, &empty), NOT_AVAILABLE, "{:?}", body);
    }
}

#[test]
fn test_evaluator_errors() {
    assert!(matches!(evaluate(""), Err(EvalError::Empty)));
    assert!(matches!(evaluate("1/0"), Err(EvalError::DivisionByZero)));
    assert!(matches!(evaluate("(1+2"), Err(EvalError::UnexpectedEnd)));
    assert!(evaluate("1 2").is_err());

    let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert!(matches!(evaluate(&deep), Err(EvalError::TooDeep)));
}

#[test]
fn test_evaluator_precedence() {
    assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
    assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
    assert_eq!(evaluate("-2*-3").unwrap(), 6.0);
    assert_eq!(evaluate("10-4-3").unwrap(), 3.0);
    assert_eq!(evaluate("8/4/2").unwrap(), 1.0);
    assert_eq!(evaluate(" 1.5 * 2 ").unwrap(), 3.0);
}

#[test]
fn test_find_expression_tokens() {
    assert_eq!(
        find_expression_tokens("a {{1+1}} b {{{x}*2}}"),
        vec!["{{1+1}}", "{{{x}*2}}"]
    );
    assert!(find_expression_tokens("no tokens {a}").is_empty());
}

#[test]
fn test_resolving_twice_is_stable() {
    let values = savings_values();
    let once = resolve_run_text("{a} {{{b}*{c}}} {zz}", &values);
    assert_eq!(once, "4 100,000 {zz}");
    assert_eq!(resolve_run_text(&once, &values), once);
}

#[test]
fn test_values_from_json() {
    let values = ValueMap::from_json(r#"{"a": "4", "b": 20000, "g": null}"#).unwrap();
    assert_eq!(values.get("b"), Some("20000"));
    assert_eq!(values.get("g"), Some(NOT_AVAILABLE));
    assert!(!values.is_available("g"));

    assert!(ValueMap::from_json(r#"{"a-b": "1"}"#).is_err());
    assert!(ValueMap::from_json(r#"{"a": [1]}"#).is_err());
}

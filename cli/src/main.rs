//! docfill CLI - fill Word illustration templates

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use docfill::product::{Generator, Illustration, InputRole, ProductRegistry};
use docfill::render::{report_summary, to_json, values_to_text};
use docfill::{
    evaluate_expression, resolve_run_text, DeletionRange, DeletionStrategy, FillOptions,
    FillReport, JsonFormat, MissingValue, TemplateSource, ValueMap,
};

#[derive(Parser)]
#[command(name = "docfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill Word illustration templates with placeholder values", long_about = None)]
struct Cli {
    /// Product profile file adding to or overriding the built-in products
    #[arg(long, global = true, env = "DOCFILL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template with values from a JSON file or the command line
    Fill {
        /// Template .docx file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Output .docx file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON object of key/value pairs
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Single value, overriding the JSON file (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
        set: Vec<(String, String)>,

        /// Remove the paragraphs from START through END (repeatable)
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        delete: Vec<String>,

        /// Keep deleted paragraphs as empty paragraphs
        #[arg(long)]
        clear: bool,

        /// Substitution for keys missing inside expressions
        #[arg(long, value_enum, default_value = "na")]
        missing: Missing,

        /// Print the fill report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Generate a product document from its illustrations
    #[command(alias = "gen")]
    Generate {
        /// Product name (see `docfill products`)
        #[arg(value_name = "PRODUCT")]
        product: String,

        /// Template .docx file
        #[arg(short, long, value_name = "FILE")]
        template: PathBuf,

        /// Output .docx file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Illustration table dump for a role (repeatable)
        #[arg(short, long = "input", value_name = "ROLE=FILE", value_parser = parse_input)]
        inputs: Vec<(InputRole, PathBuf)>,

        /// Print the fill report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Show the values a product collects from its illustrations
    Values {
        /// Product name
        #[arg(value_name = "PRODUCT")]
        product: String,

        /// Illustration table dump for a role (repeatable)
        #[arg(short, long = "input", value_name = "ROLE=FILE", value_parser = parse_input)]
        inputs: Vec<(InputRole, PathBuf)>,

        /// Output JSON instead of key = value lines
        #[arg(long)]
        json: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Resolve a piece of template text, e.g. "{{{b}*{c}}}"
    Eval {
        /// Template text
        #[arg(value_name = "TEXT")]
        text: String,

        /// JSON object of key/value pairs
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Single value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
        set: Vec<(String, String)>,

        /// Treat TEXT as a bare expression body
        #[arg(long)]
        expr: bool,
    },

    /// Print the visible text of a .docx file
    Text {
        /// Input .docx file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List known products
    Products {
        /// Show each product's inputs and keys
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Missing {
    /// Substitute "N/A", failing the expression
    Na,
    /// Substitute 0
    Zero,
}

impl From<Missing> for MissingValue {
    fn from(missing: Missing) -> Self {
        match missing {
            Missing::Na => MissingValue::NotAvailable,
            Missing::Zero => MissingValue::Zero,
        }
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    if !docfill::template::is_valid_key(key) {
        return Err(format!("invalid key {:?}", key));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_input(s: &str) -> Result<(InputRole, PathBuf), String> {
    let (role, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=FILE, got {:?}", s))?;
    let role = role.parse::<InputRole>().map_err(|e| e.to_string())?;
    Ok((role, PathBuf::from(path)))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Fill {
            template,
            output,
            values,
            set,
            delete,
            clear,
            missing,
            report,
        } => cmd_fill(
            &template,
            &output,
            values.as_deref(),
            set,
            &delete,
            clear,
            missing,
            report,
        ),
        Commands::Generate {
            product,
            template,
            output,
            inputs,
            report,
        } => cmd_generate(config, &product, &template, &output, inputs, report),
        Commands::Values {
            product,
            inputs,
            json,
            output,
        } => cmd_values(config, &product, inputs, json, output.as_deref()),
        Commands::Eval {
            text,
            values,
            set,
            expr,
        } => cmd_eval(&text, values.as_deref(), set, expr),
        Commands::Text { input, output } => cmd_text(&input, output.as_deref()),
        Commands::Products { verbose } => cmd_products(config, verbose),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_values(
    file: Option<&Path>,
    pairs: Vec<(String, String)>,
) -> Result<ValueMap, Box<dyn std::error::Error>> {
    let mut values = match file {
        Some(path) => ValueMap::from_json(&fs::read_to_string(path)?)?,
        None => ValueMap::new(),
    };
    values.extend(pairs);
    values.validate()?;
    Ok(values)
}

fn load_registry(config: Option<&Path>) -> Result<ProductRegistry, Box<dyn std::error::Error>> {
    let mut registry = ProductRegistry::with_defaults();
    if let Some(path) = config {
        let count = registry.load_file(path)?;
        log::info!("Loaded {} product profiles from {}", count, path.display());
    }
    Ok(registry)
}

fn load_inputs(inputs: Vec<(InputRole, PathBuf)>) -> docfill::Result<Vec<(InputRole, Illustration)>> {
    inputs
        .into_iter()
        .map(|(role, path)| Ok((role, Illustration::open(&path)?)))
        .collect()
}

fn print_report(report: &FillReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", to_json(report, JsonFormat::Pretty)?);
    } else {
        println!("{}", report_summary(report).dimmed());
    }
    if report.failed_expressions > 0 {
        println!(
            "{} {} expressions evaluated to N/A",
            "Warning:".yellow().bold(),
            report.failed_expressions
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_fill(
    template: &Path,
    output: &Path,
    values: Option<&Path>,
    set: Vec<(String, String)>,
    delete: &[String],
    clear: bool,
    missing: Missing,
    report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = load_values(values, set)?;

    let strategy = if clear {
        DeletionStrategy::ClearText
    } else {
        DeletionStrategy::Remove
    };
    let options = FillOptions::new()
        .with_missing(missing.into())
        .with_strategy(strategy)
        .with_deletions(
            delete
                .chunks_exact(2)
                .map(|pair| DeletionRange::new(pair[0].as_str(), pair[1].as_str())),
        );

    let result = docfill::Docfill::new()
        .with_options(options)
        .fill(&TemplateSource::path(template), &values)?;
    let fill_report = result.report.clone();
    result.save(output)?;

    println!("{} {}", "Saved to".green(), output.display());
    print_report(&fill_report, report)
}

fn cmd_generate(
    config: Option<&Path>,
    product: &str,
    template: &Path,
    output: &Path,
    inputs: Vec<(InputRole, PathBuf)>,
    report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(config)?;
    let profile = registry.get(product)?;

    let mut generator = Generator::new(profile);
    for (role, illustration) in load_inputs(inputs)? {
        generator.add_input(role, illustration);
    }

    let fill_report = generator.generate(&TemplateSource::path(template), output)?;

    let verb = match profile.output {
        docfill::product::OutputMode::Replace => "Saved to",
        docfill::product::OutputMode::Append => "Appended to",
    };
    println!(
        "{} {} {}",
        profile.name.cyan().bold(),
        verb.green(),
        output.display()
    );
    print_report(&fill_report, report)
}

fn cmd_values(
    config: Option<&Path>,
    product: &str,
    inputs: Vec<(InputRole, PathBuf)>,
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(config)?;
    let mut generator = Generator::new(registry.get(product)?);
    for (role, illustration) in load_inputs(inputs)? {
        generator.add_input(role, illustration);
    }

    let values = generator.collect_values()?;
    let content = if json {
        to_json(&values, JsonFormat::Pretty)?
    } else {
        values_to_text(&values)
    };

    if let Some(path) = output {
        fs::write(path, &content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        print!("{}", content);
        if json {
            println!();
        }
    }

    let unavailable = values.unavailable_keys();
    if !unavailable.is_empty() {
        eprintln!(
            "{} no value for {}",
            "Warning:".yellow().bold(),
            unavailable.join(", ")
        );
    }
    Ok(())
}

fn cmd_eval(
    text: &str,
    values: Option<&Path>,
    set: Vec<(String, String)>,
    expr: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = load_values(values, set)?;
    let resolved = if expr {
        evaluate_expression(text, &values)
    } else {
        resolve_run_text(text, &values)
    };
    println!("{}", resolved);
    Ok(())
}

fn cmd_text(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let text = docfill::extract_text(input)?;

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn cmd_products(config: Option<&Path>, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(config)?;

    println!("{}", "Products".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for profile in registry.profiles() {
        println!("{}: {}", profile.name.bold(), profile.description);
        if !verbose {
            continue;
        }
        for input in &profile.inputs {
            let required = if input.required { "required" } else { "optional" };
            println!(
                "  {} {} ({}): {}",
                "├─".dimmed(),
                input.role,
                required,
                input.keys().join(" ")
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Word illustration template filler");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("a=4").unwrap(),
            ("a".to_string(), "4".to_string())
        );
        assert_eq!(
            parse_pair("b=1=2").unwrap(),
            ("b".to_string(), "1=2".to_string())
        );
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("a-b=1").is_err());
    }

    #[test]
    fn test_parse_input() {
        let (role, path) = parse_input("staged=dump.json").unwrap();
        assert_eq!(role, InputRole::Staged);
        assert_eq!(path, PathBuf::from("dump.json"));
        assert!(parse_input("nobody=dump.json").is_err());
        assert!(parse_input("dump.json").is_err());
    }

    #[test]
    fn test_load_values_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        fs::write(&path, r#"{"a": "4", "b": 20000}"#).unwrap();

        let values = load_values(Some(&path), vec![("a".into(), "5".into())]).unwrap();
        assert_eq!(values.get("a"), Some("5"));
        assert_eq!(values.get("b"), Some("20000"));
    }

    #[test]
    fn test_load_values_rejects_bad_keys() {
        let result = load_values(None, vec![("a b".into(), "1".into())]);
        assert!(result.is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        fs::write(&path, r#"{"a": "4"}"#).unwrap();
        assert!(load_values(Some(&path), vec![("{x}".into(), "1".into())]).is_err());
    }

    #[test]
    fn test_cli_parses_fill() {
        let cli = Cli::try_parse_from([
            "docfill", "fill", "t.docx", "-o", "out.docx", "--set", "a=4", "--delete", "S", "E",
        ])
        .unwrap();
        match cli.command {
            Commands::Fill { set, delete, .. } => {
                assert_eq!(set, vec![("a".to_string(), "4".to_string())]);
                assert_eq!(delete, vec!["S", "E"]);
            }
            _ => panic!("expected fill"),
        }
    }
}

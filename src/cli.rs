/*!
mapclass Command Line Interface

Classifies a column of numbers into choropleth classes and prints breakpoints,
legend labels and class sizes.
*/

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mapclass::{
    assign_with_oob, classify, format_labels_with, ClassCountPolicy, ClassifyOptions, Closed,
    LabelFormat, Oob, Strategy, DEFAULT_CLASS_COUNT, VERSION,
};

#[derive(Parser)]
#[command(name = "mapclass")]
#[command(about = "Interval classification for choropleth maps")]
#[command(version = VERSION)]
pub struct Cli {
    /// Log debug details to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute breakpoints, labels and class sizes for a sample
    Classify {
        /// File with numbers (JSON array, or separated by whitespace/commas); stdin if omitted
        file: Option<PathBuf>,

        /// Number of classes
        #[arg(short, long, default_value_t = DEFAULT_CLASS_COUNT)]
        k: usize,

        /// Classification strategy (equal-width, quantile, natural-breaks)
        #[arg(short, long, default_value = "natural-breaks")]
        strategy: Strategy,

        /// Which side of each interval is closed (left, right)
        #[arg(long, default_value = "left")]
        closed: Closed,

        /// Lower k to the number of distinct values instead of failing
        #[arg(long)]
        cap: bool,

        #[command(flatten)]
        labels: LabelArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Assign values to classes for the given breakpoints
    Assign {
        /// Values to classify
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,

        /// Comma-separated breakpoints, e.g. 0,10,20,30
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        breaks: Vec<f64>,

        /// Which side of each interval is closed (left, right)
        #[arg(long, default_value = "left")]
        closed: Closed,

        /// Out-of-bounds handling (error, censor, squish)
        #[arg(long, default_value = "error")]
        oob: Oob,
    },

    /// Print one legend label per class for the given breakpoints
    Labels {
        /// Comma-separated breakpoints, e.g. 0,10,20,30
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        breaks: Vec<f64>,

        /// Which side of each interval is closed (left, right)
        #[arg(long, default_value = "left")]
        closed: Closed,

        #[command(flatten)]
        labels: LabelArgs,
    },
}

/// Label flags shared by `classify` and `labels`
#[derive(Args)]
pub struct LabelArgs {
    /// Decimal digits in labels (chosen automatically if omitted)
    #[arg(short, long)]
    pub precision: Option<usize>,

    /// Unit suffix appended to labels, e.g. "%"
    #[arg(long, default_value = "")]
    pub unit: String,

    /// Label template with {lower}, {upper}, {unit} and {index}
    #[arg(long, default_value = mapclass::format::DEFAULT_LABEL_TEMPLATE)]
    pub template: String,

    /// Render the first and last classes as open-ended ("< 20", "≥ 80")
    #[arg(long)]
    pub open_ends: bool,
}

impl LabelArgs {
    fn to_format(&self) -> LabelFormat {
        LabelFormat {
            precision: self.precision,
            unit: self.unit.clone(),
            template: self.template.clone(),
            open_ends: self.open_ends,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "mapclass=debug"
    } else {
        "mapclass=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Classify {
            file,
            k,
            strategy,
            closed,
            cap,
            labels,
            output,
        } => {
            let text = read_input(file.as_ref())?;
            let sample = parse_values(&text)?;
            tracing::info!(values = sample.len(), "read sample");

            let options = ClassifyOptions {
                closed,
                class_count_policy: if cap {
                    ClassCountPolicy::Cap
                } else {
                    ClassCountPolicy::Strict
                },
            };
            cmd_classify(&sample, k, strategy, &options, &labels.to_format(), output)
        }

        Commands::Assign {
            values,
            breaks,
            closed,
            oob,
        } => cmd_assign(&values, &breaks, closed, oob),

        Commands::Labels {
            breaks,
            closed,
            labels,
        } => {
            let labels = format_labels_with(&breaks, &labels.to_format(), closed)?;
            for label in labels {
                println!("{}", label);
            }
            Ok(())
        }
    }
}

fn cmd_classify(
    sample: &[f64],
    k: usize,
    strategy: Strategy,
    options: &ClassifyOptions,
    format: &LabelFormat,
    output: OutputFormat,
) -> Result<()> {
    let result = classify(sample, k, strategy, options)
        .with_context(|| format!("Failed to classify {} values into {} classes", sample.len(), k))?;
    let labels = format_labels_with(result.breaks(), format, result.closed())?;

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "classification": result,
                "labels": labels,
                "counts": result.counts(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print!("{}", render_text_report(&result, &labels));
        }
    }
    Ok(())
}

fn render_text_report(result: &mapclass::Classification, labels: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "strategy: {} ({} classes, closed {})\n",
        result.strategy(),
        result.classes(),
        result.closed()
    ));
    if result.was_capped() {
        out.push_str(&format!(
            "note: {} classes requested, capped to the number of distinct values\n",
            result.requested_classes()
        ));
    }

    let breaks: Vec<String> = result.breaks().iter().map(|b| b.to_string()).collect();
    out.push_str(&format!("breaks: {}\n", breaks.join(", ")));

    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).max(5);
    out.push_str(&format!("{:<5}  {:<width$}  {:>5}\n", "class", "label", "count"));
    for (i, (label, count)) in labels.iter().zip(result.counts()).enumerate() {
        out.push_str(&format!("{:<5}  {:<width$}  {:>5}\n", i + 1, label, count));
    }

    out.push_str(&format!(
        "goodness of variance fit: {:.4}\n",
        result.goodness_of_variance_fit()
    ));
    out
}

fn cmd_assign(values: &[f64], breaks: &[f64], closed: Closed, oob: Oob) -> Result<()> {
    for &value in values {
        match assign_with_oob(value, breaks, closed, oob)
            .with_context(|| format!("Failed to assign {}", value))?
        {
            Some(class) => println!("{}\t{}", value, class),
            None => println!("{}\t-", value),
        }
    }
    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Parse a JSON array of numbers, or numbers separated by whitespace, commas or semicolons.
fn parse_values(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse JSON array of numbers");
    }

    trimmed
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("Invalid number '{}'", token))
        })
        .collect()
}

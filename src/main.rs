use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dealchart::aggregate::YearRange;
use dealchart::config::ChartConfig;
use dealchart::placement::LineLabelMode;
use dealchart::runtime::{self, ChartSession};
use dealchart::{parser, OutputFormat};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "dealchart")]
#[command(about = "Render yearly deal totals and counts as an annotated bar + line chart", long_about = None)]
struct Args {
    /// Delimited text or JSON input file, or '-' for stdin
    input: String,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// First year to include
    #[arg(long)]
    start: Option<i32>,

    /// Last year to include
    #[arg(long)]
    end: Option<i32>,

    /// Year range, e.g. 2015..2020, 2015-2020 or 2018
    #[arg(long, conflicts_with_all = ["start", "end"])]
    years: Option<String>,

    /// Column whose values stack the bars
    #[arg(long)]
    category: Option<String>,

    /// e.g. 'include(column: "Region", values: ["North", "South"])'
    #[arg(long)]
    filter: Option<String>,

    /// e.g. 'category(label: "North", color: "#1f77b4", order: 0)'; repeatable
    #[arg(long)]
    style: Vec<String>,

    #[arg(long)]
    no_bars: bool,

    #[arg(long)]
    no_line: bool,

    #[arg(long)]
    title: Option<String>,

    /// Draw buckets from this year on as predictions
    #[arg(long)]
    predict_from: Option<i32>,

    /// Place line labels with the neighbor-only rule
    #[arg(long)]
    legacy_labels: bool,

    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Field delimiter for delimited input
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    // 1. Configuration file
    let mut config = match &args.config {
        Some(path) => ChartConfig::from_path(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => ChartConfig::default(),
    };

    // 2. Input
    let delimiter = u8::try_from(args.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter '{}' must be a single ASCII character", args.delimiter))?;
    let data = read_input(&args.input, delimiter)?;
    let mut session = ChartSession::load(&data, &config.schema).context("Failed to normalize input")?;

    // 3. Flags override file values
    let span = YearRange::spanning(session.records());
    apply_overrides(&mut config, &args, span)?;

    // 4. Render
    let artifact = session.render(&config).context("Failed to render chart")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, artifact.as_bytes())
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "Wrote chart");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(artifact.as_bytes())
                .context("Failed to write chart to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "dealchart=debug" } else { "dealchart=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(source: &str, delimiter: u8) -> Result<dealchart::data::PlotData> {
    let reader: Box<dyn Read> = if source == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(source).with_context(|| format!("Failed to open input '{}'", source))?)
    };
    runtime::load_data(reader, delimiter).with_context(|| format!("Failed to read input '{}'", source))
}

fn apply_overrides(config: &mut ChartConfig, args: &Args, span: Option<YearRange>) -> Result<()> {
    if let Some(expr) = &args.years {
        config.years = Some(parser::parse_years(expr)?);
    } else if args.start.is_some() || args.end.is_some() {
        let base = match config.years.or(span) {
            Some(range) => range,
            None => bail!("No dated rows to derive a year range from"),
        };
        config.years = Some(YearRange::new(
            args.start.unwrap_or(base.start),
            args.end.unwrap_or(base.end),
        ));
    }

    if let Some(column) = &args.category {
        config.category_column = Some(column.clone());
    }
    if let Some(expr) = &args.filter {
        config.filter = Some(parser::parse_filter(expr)?);
    }
    for expr in &args.style {
        let style = parser::parse_style(expr)?;
        // a flag replaces a file entry for the same label
        config.categories.retain(|s| s.label != style.label);
        config.categories.push(style);
    }

    if args.no_bars {
        config.show_bars = false;
    }
    if args.no_line {
        config.show_line = false;
    }
    if let Some(title) = &args.title {
        config.title = Some(title.clone());
    }
    if let Some(year) = args.predict_from {
        config.prediction_start_year = Some(year);
    }
    if args.legacy_labels {
        config.line_label_mode = LineLabelMode::Neighbor;
    }
    match args.format {
        Some(Format::Png) => config.render.format = OutputFormat::Png,
        Some(Format::Svg) => config.render.format = OutputFormat::Svg,
        None => {}
    }

    config.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(extra: &[&str]) -> Args {
        let mut argv = vec!["dealchart", "deals.csv"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_overrides_partial_year_range() {
        let mut config = ChartConfig::default();
        let args = make_args(&["--start", "2017"]);
        apply_overrides(&mut config, &args, Some(YearRange::new(2015, 2021))).unwrap();
        assert_eq!(config.years, Some(YearRange::new(2017, 2021)));
    }

    #[test]
    fn test_overrides_years_expression() {
        let mut config = ChartConfig::default();
        let args = make_args(&["--years", "2015-2020", "--format", "svg", "--no-line"]);
        apply_overrides(&mut config, &args, None).unwrap();
        assert_eq!(config.years, Some(YearRange::new(2015, 2020)));
        assert_eq!(config.render.format, OutputFormat::Svg);
        assert!(!config.show_line);
    }

    #[test]
    fn test_overrides_style_replaces_file_entry() {
        let mut config = ChartConfig::from_json_str(
            r##"{"categories": [{"label": "North", "order": 3}]}"##,
        )
        .unwrap();
        let args = make_args(&["--style", r##"category(label: "North", color: "#000000")"##]);
        apply_overrides(&mut config, &args, None).unwrap();
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].order, None);
    }

    #[test]
    fn test_overrides_reject_hiding_everything() {
        let mut config = ChartConfig::default();
        let args = make_args(&["--no-bars", "--no-line"]);
        assert!(apply_overrides(&mut config, &args, None).is_err());
    }

    #[test]
    fn test_years_conflicts_with_start() {
        let argv = ["dealchart", "deals.csv", "--years", "2015..2020", "--start", "2016"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}

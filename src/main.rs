use anyhow::{Context, Result};
use chartsmith::classify::classify;
use chartsmith::csv_reader;
use chartsmith::data::Dataset;
use chartsmith::eligibility::{eligible_columns, ChartType};
use chartsmith::{graph, runtime, OutputFormat, RenderOptions};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "chartsmith")]
#[command(about = "Build bar, line, pie and histogram charts from CSV or JSON data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show column types and the columns each chart type accepts
    Columns {
        /// CSV or JSON file, or '-' for CSV on stdin
        file: PathBuf,
    },

    /// Build a chart from a request such as 'bar(x: region, y: sales, agg: mean)'
    Plot {
        /// CSV or JSON file, or '-' for CSV on stdin
        file: PathBuf,

        /// Chart request
        request: String,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render options as JSON, e.g. '{"width": 1024, "type": "svg"}'
        #[arg(long)]
        options: Option<String>,

        /// What to produce
        #[arg(long, value_enum, default_value_t = Emit::Image)]
        emit: Emit,
    },

    /// List the supported chart types
    Charts,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    /// Encoded PNG or SVG
    Image,
    /// The resolved plot instruction as JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Columns { file } => {
            let dataset = load(&file)?;
            print_columns(&dataset);
        }
        Commands::Plot {
            file,
            request,
            output,
            options,
            emit,
        } => {
            let dataset = load(&file)?;
            let mut render_options = match options {
                Some(json) => RenderOptions::from_json(&json)?,
                None => RenderOptions::default(),
            };
            if let Some(format) = output.as_deref().and_then(OutputFormat::from_path) {
                render_options.format = format;
            }

            let instruction = runtime::prepare(&request, &dataset)?;
            let bytes = match emit {
                Emit::Image => graph::render(&instruction, &render_options)
                    .context("Failed to render plot")?,
                Emit::Json => {
                    let mut json = serde_json::to_vec_pretty(&instruction)
                        .context("Failed to serialize plot instruction")?;
                    json.push(b'\n');
                    json
                }
            };

            write_output(output.as_deref(), &bytes)?;
        }
        Commands::Charts => {
            for chart in ChartType::ALL {
                println!("{} ({})", chart.label(), chart.keyword());
                println!("  {}", chart.description());
            }
        }
    }

    Ok(())
}

fn load(file: &Path) -> Result<Dataset> {
    if file == Path::new("-") {
        csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")
    } else {
        csv_reader::read_dataset_from_path(file)
    }
}

fn print_columns(dataset: &Dataset) {
    let classification = classify(dataset);

    println!("Columns:");
    for (name, column_type) in classification.iter() {
        match column_type {
            Some(t) => println!("  {}: {}", name, t),
            None => println!("  {}: unclassified", name),
        }
    }

    for chart in ChartType::ALL {
        let eligible = eligible_columns(&classification, chart);
        println!("{}:", chart.label());
        println!("  X: {}", eligible.x_options().join(", "));
        if chart.uses_y_axis() {
            println!("  Y: {}", eligible.y_options().join(", "));
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
            Ok(())
        }
    }
}

//! Stock research CLI
//!
//! Pick a company and a date window, then let the crew write the report.
//!
//! # Usage
//!
//! ```bash
//! # Required: OPENAI_API_KEY. Optional: FINNHUB_API_KEY, OPENAI_MODEL, OPENAI_API_BASE
//! cargo run --bin stock-research -- --company AAPL --start-date 2024-01-01
//!
//! # Interactive form
//! cargo run --bin stock-research
//! ```

use agent_crew::{CrewEventHandler, CrewOutput, Process, TaskOutput};
use agent_llm::providers::OpenAIProvider;
use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use stock_research::api::{FinnhubClient, YahooFinanceClient};
use stock_research::dates::{format_date, parse_date};
use stock_research::{
    DataSources, ResearchConfig, ResearchCrew, ResearchForm, ResearchRequest, companies,
};

#[derive(Parser, Debug)]
#[command(name = "stock-research")]
#[command(about = "Research a listed company with a crew of analyst agents", long_about = None)]
struct Args {
    /// Company name or ticker (interactive form when omitted)
    #[arg(short, long)]
    company: Option<String>,

    /// Start of the research window (YYYY-MM-DD); defaults to 366 days ago
    #[arg(long, value_parser = parse_date_arg)]
    start_date: Option<NaiveDate>,

    /// End of the research window (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_date_arg)]
    end_date: Option<NaiveDate>,

    /// List the companies that can be researched and exit
    #[arg(long)]
    list_companies: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Also write the result to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run tasks directly on their agents instead of through a manager
    #[arg(long)]
    sequential: bool,

    /// Override OPENAI_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Log agent prompts, tool calls and answers
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Prints task progress to stderr
struct Progress;

#[async_trait]
impl CrewEventHandler for Progress {
    async fn on_task_start(&self, task: &str, agent: &str) {
        eprintln!("> {task} ({agent})");
    }

    async fn on_task_done(&self, output: &TaskOutput) {
        eprintln!("  done: {}", output.name);
    }
}

/// JSON report: the request plus every task output
#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    request: &'a ResearchRequest,
    #[serde(flatten)]
    output: &'a CrewOutput,
}

fn print_companies() {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["#", "Company", "Ticker"]);
    for (i, (name, ticker)) in companies::COMPANIES.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), (*name).to_string(), (*ticker).to_string()]);
    }
    println!("{table}");
}

fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_company() -> io::Result<Option<String>> {
    for (i, name) in companies::choices().enumerate() {
        println!("{i:>3}. {name}");
    }

    let Some(answer) = prompt("Company (number, name or ticker): ")? else {
        return Ok(None);
    };
    let selected = match answer.parse::<usize>() {
        Ok(n) => companies::choices().nth(n).map(str::to_string),
        Err(_) => Some(answer).filter(|a| !a.is_empty()),
    };
    Ok(selected)
}

fn prompt_date(label: &str, default: NaiveDate) -> io::Result<NaiveDate> {
    loop {
        let Some(answer) = prompt(&format!("{label} [{}]: ", format_date(default)))? else {
            return Ok(default);
        };
        if answer.is_empty() {
            return Ok(default);
        }
        match parse_date(&answer) {
            Ok(date) => return Ok(date),
            Err(_) => println!("Please enter a date as YYYY-MM-DD"),
        }
    }
}

fn fill_form(args: &Args, today: NaiveDate) -> io::Result<ResearchForm> {
    let mut form = ResearchForm::new(today);

    match &args.company {
        Some(company) => {
            form.company = Some(company.clone());
            if let Some(start) = args.start_date {
                form.start_date = start;
            }
            if let Some(end) = args.end_date {
                form.end_date = end;
            }
        }
        None => {
            form.company = prompt_company()?;
            form.start_date = prompt_date("Start date", args.start_date.unwrap_or(form.start_date))?;
            form.end_date = prompt_date("End date", args.end_date.unwrap_or(form.end_date))?;
        }
    }

    Ok(form)
}

fn load_config(args: &Args) -> stock_research::Result<ResearchConfig> {
    let mut config = ResearchConfig::from_env()?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    config.validate()?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

async fn research(
    args: &Args,
    config: &ResearchConfig,
    request: &ResearchRequest,
) -> anyhow::Result<()> {
    let provider = Arc::new(OpenAIProvider::with_config(config.openai_config())?);

    let mut sources = DataSources::new(Arc::new(YahooFinanceClient::new()?));
    match &config.finnhub_api_key {
        Some(key) => {
            let finnhub = Arc::new(FinnhubClient::new(
                key.clone(),
                config.finnhub_rate_limit,
                config.request_timeout,
            )?);
            sources = sources.with_metrics(finnhub.clone()).with_news(finnhub);
        }
        None => tracing::warn!(
            "FINNHUB_API_KEY not set: risk assessment uses default values and news search is unavailable"
        ),
    }

    let process = if args.sequential {
        Process::Sequential
    } else {
        Process::Hierarchical
    };

    let crew = ResearchCrew::builder(provider, sources)
        .model(config.model.clone())
        .process(process)
        .verbose(args.verbose)
        .cache_ttl(config.cache_ttl)
        .event_handler(Arc::new(Progress))
        .build()?;

    eprintln!("Researching {} ({})...", request.company, request.ticker);
    let output = crew.run(request).await?;

    let rendered = match args.format {
        Format::Text => format!("{}\n\n{}", request.heading(), output.final_output),
        Format::Json => serde_json::to_string_pretty(&Report {
            request,
            output: &output,
        })?,
    };

    println!("{rendered}");

    if let Some(path) = &args.output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Saved to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    agent_utils::init_tracing(if args.verbose {
        "warn,stock_research=info,agent_crew=info,agent_runtime=info"
    } else {
        "warn"
    });
    agent_utils::load_dotenv();

    if args.list_companies {
        print_companies();
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let today = Local::now().date_naive();
    let form = match fill_form(&args, today) {
        Ok(form) => form,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            return ExitCode::FAILURE;
        }
    };

    let request = match form.validate(today) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match research(&args, &config, &request).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("An error occurred during research: {e}");
            ExitCode::FAILURE
        }
    }
}

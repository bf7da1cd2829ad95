mod climate {
    pub mod cascade;
    pub mod catalog;
    pub mod cie;
    pub mod compare;
    pub mod fetch;
    pub mod series;
    pub mod shapes;
}
mod hazard {
    pub mod thinkhazard;
}
mod locate {
    pub mod directory;
    pub mod division;
    pub mod fuzzy;
    pub mod iso_index;
    pub mod normalize;
    pub mod resolver;
}
mod service {
    pub mod http_service;
    pub mod var_service;
}
mod util {
    pub mod cache_service;
    pub mod log_service;
}
mod error;
mod prelude;

use anyhow::anyhow;
use clap::Parser;
use climate::catalog::{
    is_known_scenario, scenario_label, variable_label, variables_for_hazard, DEFAULT_SCENARIO, DEFAULT_VARIABLE,
};
use climate::cie::CieClient;
use climate::compare::{compare_projections, Comparison};
use climate::fetch::fetch_projection;
use climate::series::{MedianPair, ProjectionSeries};
use dotenvy::dotenv;
use hazard::thinkhazard::{fetch_hazard_report, HazardAssessment};
use locate::directory::{admin_directory, AdminDirectory};
use locate::division::{first_match, search};
use locate::resolver::region_info_for;
use prelude::*;
use service::http_service::get_http_client;
use util::log_service::set_logging;

/// Find a place, show its hazard levels and chart its climate projections.
#[derive(Parser, Debug)]
#[command(name = "climate-locate", version)]
struct Args {
    /// Country, region or district name (e.g. Lisboa, Wien, Portugal)
    query: String,

    /// Which of the listed matches to use
    #[arg(long, default_value_t = 0)]
    pick: usize,

    /// Hazard whose projections to fetch (defaults to the first in the report)
    #[arg(long)]
    hazard: Option<String>,

    /// Projection variable id, overriding the hazard's default
    #[arg(long)]
    variable: Option<String>,

    #[arg(long, default_value = DEFAULT_SCENARIO)]
    scenario: String,

    /// Only list matching locations
    #[arg(long)]
    list: bool,

    /// First projection year to report
    #[arg(long)]
    from: Option<i32>,

    /// Last projection year to report
    #[arg(long)]
    to: Option<i32>,

    /// Print every row of the projection
    #[arg(long)]
    rows: bool,

    /// Second location to compare QUERY against
    #[arg(long, value_name = "QUERY")]
    compare: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    set_logging().await?;
    let args = Args::parse();

    if !is_known_scenario(&args.scenario) {
        tracing::warn!("Scenario '{}' is not in the catalog, querying anyway", args.scenario);
    }

    let client = get_http_client().await?;
    let directory = admin_directory(&client).await?;
    if let Some(other) = &args.compare {
        return run_comparison(&client, directory, &args, other).await;
    }

    let found = search(directory, &args.query)?;
    if found.is_national_fallback() {
        println!("No city or region found, showing national level.");
    }

    for (i, row) in found.rows().iter().enumerate() {
        println!("[{}] {}", i, row.label());
    }
    if args.list {
        return Ok(());
    }

    let Some(row) = found.rows().get(args.pick) else {
        let err = format!("--pick {} is out of range ({} matches)", args.pick, found.rows().len());
        tracing::error!(err);
        return Err(anyhow!(err));
    };

    let info = region_info_for(&client, row).await?;
    println!(
        "\n{}: country {} / {}, region code '{}'",
        info.display_name, info.country_iso3, info.country_iso2, info.code
    );

    let hazards = match fetch_hazard_report(&client, row.report_id()).await {
        Ok(hazards) => hazards,
        Err(e) => {
            tracing::warn!("Hazard report unavailable: {}", e);
            Vec::new()
        }
    };
    print_hazards(&hazards);

    let hazard = match &args.hazard {
        Some(hazard) => Some(hazard.clone()),
        None => hazards.first().map(|h| h.hazard.clone()),
    };
    let variable = match (&args.variable, &hazard) {
        (Some(variable), _) => variable.clone(),
        (None, hazard) => {
            let defaults = variables_for_hazard(hazard.as_deref().unwrap_or(""));
            defaults.first().copied().unwrap_or(DEFAULT_VARIABLE).to_string()
        }
    };

    let cie = CieClient::new(client.clone()).await?;
    let outcome = fetch_projection(&cie, &info, &variable, &args.scenario).await;
    println!(
        "\n{} | {} | {}",
        variable_label(&variable),
        scenario_label(&args.scenario),
        info.display_name
    );

    let outcome = match outcome.into_found() {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("No projection data available for this hazard/variable/scenario.");
            return Err(e.into());
        }
    };

    let series = match (args.from, args.to) {
        (None, None) => outcome.series.clone(),
        (from, to) => outcome.series.restrict(from.unwrap_or(i32::MIN), to.unwrap_or(i32::MAX)),
    };
    println!(
        "Data source: country={} region='{}' ({} candidates tried)",
        info.country(),
        outcome.chosen.as_deref().unwrap_or(""),
        outcome.tried.len()
    );
    if let Some((from, to)) = series.year_range() {
        println!("Years {}-{}, {} rows", from, to, series.len());
    }
    if args.rows {
        print_rows(&series);
    }
    for (year, median) in series.milestones() {
        match median {
            Some(median) => println!("  {}: {:.2}", year, median),
            None => println!("  {}: N/A", year),
        }
    }
    for (band, summary) in series.summary() {
        if let Some(s) = summary {
            println!(
                "  {:<6} n={} mean={:.3} min={:.3} max={:.3}",
                band, s.count, s.mean, s.min, s.max
            );
        }
    }

    Ok(())
}

async fn run_comparison(client: &reqwest::Client, directory: &AdminDirectory, args: &Args, other: &str) -> Result<()> {
    let left = region_info_for(client, &first_match(directory, &args.query)?).await?;
    let right = region_info_for(client, &first_match(directory, other)?).await?;
    println!("Comparing {} and {}", left.display_name, right.display_name);

    let variable = args.variable.as_deref().unwrap_or(DEFAULT_VARIABLE);
    let cie = CieClient::new(client.clone()).await?;
    let comparison = compare_projections(&cie, left, right, variable, &args.scenario).await?;
    println!(
        "\n{} | {}",
        variable_label(variable),
        scenario_label(&args.scenario)
    );
    for side in [&comparison.left, &comparison.right] {
        println!(
            "  {}: region '{}' ({} candidates tried)",
            side.info.display_name,
            side.outcome.chosen.as_deref().unwrap_or(""),
            side.outcome.tried.len()
        );
    }

    println!("\nSnapshot values:");
    print_pairs(&comparison, &comparison.snapshot());
    if args.rows {
        let rows = comparison.rows_between(args.from.unwrap_or(i32::MIN), args.to.unwrap_or(i32::MAX));
        println!("\nJoined medians:");
        print_pairs(&comparison, &rows);
    }

    Ok(())
}

fn print_pairs(comparison: &Comparison, pairs: &[MedianPair]) {
    let cell = |v: Option<f64>| v.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "N/A".to_string());
    println!(
        "  {:<6} {:>16} {:>16}",
        "year", comparison.left.info.display_name, comparison.right.info.display_name
    );
    for pair in pairs {
        println!("  {:<6} {:>16} {:>16}", pair.year, cell(pair.left), cell(pair.right));
    }
}

fn print_rows(series: &ProjectionSeries) {
    let cell = |v: Option<f64>| v.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string());
    println!("  {:<6} {:>10} {:>10} {:>10}", "year", "lower", "median", "upper");
    for (i, year) in series.years().iter().enumerate() {
        println!(
            "  {:<6} {:>10} {:>10} {:>10}",
            year,
            cell(series.lower()[i]),
            cell(series.median()[i]),
            cell(series.upper()[i])
        );
    }
}

fn print_hazards(hazards: &[HazardAssessment]) {
    if hazards.is_empty() {
        println!("No hazard levels available for this location.");
        return;
    }

    println!("\nHazard levels:");
    for assessment in hazards {
        println!("  {:<16} {}", assessment.hazard, assessment.level);
    }
}

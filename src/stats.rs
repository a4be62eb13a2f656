//! Console statistics report.
//!
//! Prints the same numbers `GET /api/stats` serves, plus how many distinct
//! values each filter field has. Used by `insights stats` to check a seed
//! run without starting the server.

use anyhow::Result;

use crate::query::{self, DashboardStats, FilterOptions};
use crate::store::Store;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(store: &dyn Store) -> Result<()> {
    let (stats, options) = tokio::try_join!(
        query::dashboard_stats(store),
        query::filter_options(store)
    )?;
    print!("{}", render_report(&stats, &options));
    Ok(())
}

fn render_report(stats: &DashboardStats, options: &FilterOptions) -> String {
    let mut out = String::new();
    out.push_str("Insights - Collection Stats\n");
    out.push_str("===========================\n\n");
    out.push_str(&format!("  Insights:        {}\n", stats.total_insights));
    out.push_str(&format!(
        "  Avg intensity:   {}\n",
        format_average(stats.avg_intensity)
    ));
    out.push_str(&format!(
        "  Avg relevance:   {}\n",
        format_average(stats.avg_relevance)
    ));
    out.push_str(&format!(
        "  Avg likelihood:  {}\n",
        format_average(stats.avg_likelihood)
    ));

    out.push_str("\n  Distinct filter values:\n");
    out.push_str(&format!("  {:<12} {:>6}\n", "FIELD", "VALUES"));
    out.push_str(&format!("  {}\n", "-".repeat(19)));
    for (name, values) in [
        ("topic", &options.topics),
        ("sector", &options.sectors),
        ("region", &options.regions),
        ("pestle", &options.pestles),
        ("source", &options.sources),
        ("country", &options.countries),
    ] {
        out.push_str(&format!("  {:<12} {:>6}\n", name, values.len()));
    }
    out.push('\n');
    out
}

/// Two decimals, trailing zeros trimmed (`3`, `2.5`, `1.33`).
fn format_average(value: f64) -> String {
    let s = format!("{:.2}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

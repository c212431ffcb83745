use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;
use tide_core::entities::StoredBriefing;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Print a briefing; the table format gets a readable digest instead of a grid.
pub fn output_briefing(stored: &StoredBriefing, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Table {
        println!("{}", render_briefing(stored, ui::prefs().table_color));
        return Ok(());
    }
    output(stored, format)
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    match serde_json::to_value(value)? {
        Value::Array(items) => Ok(render_array_table(&items)),
        Value::Object(map) => {
            let rows = map
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_rows(&["key", "value"], &rows, options()))
        }
        scalar => Ok(value_to_cell(&scalar)),
    }
}

fn render_array_table(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render_rows(&["value"], &rows, options());
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .map(|item| {
            headers
                .iter()
                .map(|header| item.get(header).map_or_else(|| String::from("-"), value_to_cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::render_rows(&header_refs, &rows, options())
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

/// Plain-text digest of a stored briefing.
#[must_use]
pub fn render_briefing(stored: &StoredBriefing, color: bool) -> String {
    let paint = |label: &str| {
        if color {
            table::colorize_sentiment(label)
        } else {
            label.to_string()
        }
    };
    let briefing = &stored.briefing;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Briefing {}  ({} newsletters, {} .. {})",
        stored.id,
        stored.email_count,
        stored.time_window_start.format("%Y-%m-%d %H:%M"),
        stored.time_window_end.format("%Y-%m-%d %H:%M"),
    );

    out.push_str("\nExecutive summary\n");
    for bullet in &briefing.executive_summary {
        let _ = writeln!(out, "  * {bullet}");
    }

    if !briefing.narrative_clusters.is_empty() {
        out.push_str("\nNarratives\n");
    }
    for cluster in &briefing.narrative_clusters {
        let counts = &cluster.sentiment_breakdown;
        let _ = writeln!(
            out,
            "  {} [{}; +{} -{} ={}]",
            cluster.title,
            paint(cluster.consensus_sentiment.as_str()),
            counts.positive,
            counts.negative,
            counts.neutral,
        );
        let _ = writeln!(out, "    {}", cluster.synthesis);
        if let Some(counter) = &cluster.counter_point {
            let _ = writeln!(out, "    Counterpoint: {counter}");
        }
        for source in &cluster.sources {
            let _ = writeln!(
                out,
                "    - {}: {} ({})",
                source.publisher,
                source.subject,
                paint(source.sentiment.as_str()),
            );
        }
    }

    if !briefing.serendipity_corner.is_empty() {
        out.push_str("\nSerendipity\n");
    }
    for item in &briefing.serendipity_corner {
        let _ = writeln!(out, "  {} ({}): {}", item.title, item.publisher, item.insight);
    }

    if !briefing.radar_signals.is_empty() {
        let _ = writeln!(out, "\nRadar: {}", briefing.radar_signals.join(", "));
    }

    if !briefing.quality_issues.is_empty() {
        out.push_str("\nQuality issues\n");
    }
    for issue in &briefing.quality_issues {
        let _ = writeln!(out, "  {} {}: {}", issue.kind, issue.action, issue.detail);
    }

    out.trim_end().to_string()
}

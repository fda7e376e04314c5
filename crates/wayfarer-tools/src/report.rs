use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::info;

use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::state::WorkflowState;
use wayfarer_core::traits::ReportRenderer;
use wayfarer_core::trip::{FlightOption, FlightStatus, Place};
use wayfarer_core::types::ArtifactPaths;

const STYLE: &str = r#"
body { font-family: 'Segoe UI', sans-serif; padding: 20px; background: #f0f2f5; color: #333; }
h1 { color: #2c3e50; text-align: center; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
.card { background: white; padding: 20px; margin-bottom: 20px; border-radius: 10px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }
h2 { color: #e67e22; }
.place { margin-top: 15px; padding: 10px; background: #f9f9f9; border-left: 5px solid #3498db; border-radius: 4px; }
.place.unverified { border-left-color: #e74c3c; }
.name { font-size: 1.1em; font-weight: bold; }
.rating { color: #f1c40f; font-weight: bold; }
.address { font-style: italic; color: #555; margin: 5px 0; }
a.btn { display: inline-block; margin-top: 5px; background: #3498db; color: white; padding: 5px 10px; text-decoration: none; border-radius: 4px; font-size: 0.9em; }
"#;

/// Universal map search link for a place, or `None` when there is nothing to search.
pub fn maps_search_link(name: &str, address: &str) -> Option<String> {
    let query = format!("{} {}", name.trim(), address.trim());
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    Some(format!(
        "https://www.google.com/maps/search/?api=1&query={}",
        urlencoding::encode(query)
    ))
}

/// Writes an HTML page and a Markdown document per run.
pub struct FileReportRenderer {
    output_dir: PathBuf,
}

impl FileReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn slug(destination: &str) -> String {
    let slug: String = destination
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if slug.is_empty() {
        "trip".to_string()
    } else {
        slug
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flight_line(option: &FlightOption) -> String {
    let price = option
        .price_text
        .clone()
        .or_else(|| option.price.map(|p| format!("{:.2}", p)))
        .unwrap_or_else(|| "price n/a".into());
    let status = match option.status {
        FlightStatus::Confirmed => "confirmed",
        FlightStatus::Proposed => "proposed",
    };
    let mut line = format!(
        "{} ({} -> {}, {}{}) {} [{}]",
        option.title,
        option.origin,
        option.destination,
        option.depart_date,
        option
            .depart_time
            .as_deref()
            .map(|t| format!(" {}", t))
            .unwrap_or_default(),
        price,
        status
    );
    if let Some(ret) = &option.return_leg {
        let _ = write!(line, "; return {} on {}", ret.title, ret.date);
    }
    line
}

fn place_badge(place: &Place) -> &'static str {
    if place.is_verified() {
        "verified"
    } else {
        "unverified"
    }
}

pub(crate) fn render_html(state: &WorkflowState) -> String {
    let destination = state
        .request
        .as_ref()
        .map(|r| r.destination.as_str())
        .unwrap_or("Trip");
    let dest = escape_html(destination);

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Trip to {}</title>\n<style>{}</style>\n</head>\n<body>\n<h1>Itinerary: {}</h1>\n",
        dest,
        STYLE,
        dest.to_uppercase()
    );

    if let Some(style) = &state.travel_style {
        let _ = writeln!(html, "<p>Travel style: {}</p>", style.label());
    }

    if !state.flight_options.is_empty() {
        html.push_str("<div class='card'><h2>Flights</h2><ul>\n");
        for option in &state.flight_options {
            let _ = writeln!(html, "<li>{}</li>", escape_html(&flight_line(option)));
        }
        html.push_str("</ul></div>\n");
    }

    for day in &state.itinerary {
        let _ = writeln!(
            html,
            "<div class='card'><h2>Day {}: {}</h2>",
            day.day_number,
            escape_html(&day.focus)
        );
        for place in &day.places {
            let _ = write!(
                html,
                "<div class='place {}'>\n<div class='name'>{} <span class='rating'>&#9733; {}</span></div>\n<div class='address'>{}</div>\n",
                place_badge(place),
                escape_html(&place.name),
                place.rating,
                escape_html(&place.address)
            );
            if let Some(cost) = &place.cost {
                let _ = writeln!(html, "<div class='cost'>{}</div>", escape_html(cost));
            }
            if let Some(link) = maps_search_link(&place.name, &place.address) {
                let _ = writeln!(
                    html,
                    "<a href='{}' class='btn' target='_blank'>View on Maps</a>",
                    escape_html(&link)
                );
            }
            html.push_str("</div>\n");
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub(crate) fn render_markdown(state: &WorkflowState) -> String {
    let destination = state
        .request
        .as_ref()
        .map(|r| r.destination.as_str())
        .unwrap_or("Trip");

    let mut md = String::new();
    let _ = writeln!(md, "# Itinerary: {}\n", destination.to_uppercase());
    if let Some(request) = &state.request {
        let _ = writeln!(md, "_{}_\n", request.summary());
    }

    if !state.flight_options.is_empty() {
        md.push_str("## Flights\n\n");
        for option in &state.flight_options {
            let _ = writeln!(md, "- {}", flight_line(option));
        }
        md.push('\n');
    }

    for day in &state.itinerary {
        let _ = writeln!(md, "## Day {}: {}\n", day.day_number, day.focus);
        for place in &day.places {
            let _ = writeln!(
                md,
                "- **{}** (rating: {}, {})",
                place.name,
                place.rating,
                place_badge(place)
            );
            if !place.address.is_empty() {
                let _ = writeln!(md, "  - Address: {}", place.address);
            }
            if let Some(cost) = &place.cost {
                let _ = writeln!(md, "  - Cost: {}", cost);
            }
            if let Some(link) = maps_search_link(&place.name, &place.address) {
                let _ = writeln!(md, "  - [Open in Maps]({})", link);
            }
        }
        md.push('\n');
    }
    md
}

impl ReportRenderer for FileReportRenderer {
    fn render(&self, state: &WorkflowState) -> BoxFuture<'_, Result<ArtifactPaths>> {
        let html = render_html(state);
        let markdown = render_markdown(state);
        let base = format!(
            "trip_{}",
            slug(
                state
                    .request
                    .as_ref()
                    .map(|r| r.destination.as_str())
                    .unwrap_or_default()
            )
        );

        Box::pin(async move {
            tokio::fs::create_dir_all(&self.output_dir)
                .await
                .map_err(|e| WayfarerError::Render(format!("{}: {}", self.output_dir.display(), e)))?;

            let html_path = self.output_dir.join(format!("{}.html", base));
            let md_path = self.output_dir.join(format!("{}.md", base));

            tokio::fs::write(&html_path, html)
                .await
                .map_err(|e| WayfarerError::Render(e.to_string()))?;
            tokio::fs::write(&md_path, markdown)
                .await
                .map_err(|e| WayfarerError::Render(e.to_string()))?;

            info!(html = %html_path.display(), markdown = %md_path.display(), "Reports written");
            Ok(vec![html_path, md_path])
        })
    }
}

//! CLI UI utilities for terminal output.
//!
//! Colored status lines, section headers, researcher cards and a spinner for
//! the long fetch stage.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{PaperStore, ResearcherProfile};
use crate::pipeline::{CoauthorGraph, RunReport};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Pending,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Pending => "○",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Pending => println!("{} {}", icon.white().dimmed(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(80).dimmed());
}

/// Format a number with commas.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncate text to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<12} {}", format!("{}:", label).dimmed(), value);
    }
}

fn coordinates_line(affiliation: &crate::models::AffiliationProfile) -> Option<String> {
    if !affiliation.has_coordinates() {
        return None;
    }
    Some(format!(
        "{:.4}, {:.4}",
        affiliation.lat.unwrap_or_default(),
        affiliation.lon.unwrap_or_default()
    ))
}

fn topic_list(topics: &[(String, u64)]) -> String {
    topics
        .iter()
        .map(|(topic, count)| format!("{} ({})", topic, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print one researcher as a card.
///
/// Paper titles are looked up in `store` when it is given; co-authors are
/// named from `profiles` when known.
pub fn print_researcher(
    profile: &ResearcherProfile,
    profiles: &indexmap::IndexMap<String, ResearcherProfile>,
    store: Option<&PaperStore>,
) {
    let author = &profile.author;

    print_section(author.name());
    print_field("ID", &author.id);
    print_field("ORCID", author.orcid.as_deref().unwrap_or_default());
    print_field("Affiliation", &profile.affiliation.affiliation_line());
    print_field("Location", &profile.affiliation.location_line());
    print_field(
        "Coordinates",
        &coordinates_line(&profile.affiliation).unwrap_or_default(),
    );
    print_field(
        "Papers",
        &format!(
            "{} ({} first, {} last)",
            format_number(author.publication_count.total),
            author.publication_count.first,
            author.publication_count.last
        ),
    );
    print_field("Citations", &format_number(author.citation_count.total));
    print_field("Tech", &topic_list(&profile.top_tech_topics));
    print_field("Health", &topic_list(&profile.top_health_topics));

    let coauthors: Vec<(String, u64)> = profile
        .top_coauthors
        .iter()
        .map(|(id, count)| {
            let name = profiles.get(id).map(|p| p.author.name()).unwrap_or(id.as_str());
            (name.to_string(), *count)
        })
        .collect();
    print_field("Co-authors", &topic_list(&coauthors));

    if let Some(summary) = &profile.ai_summary {
        println!();
        println!("  {}", summary.italic());
    }

    for (label, ids) in [
        ("Most cited", &profile.most_cited_papers),
        ("Most recent", &profile.most_recent_papers),
    ] {
        if ids.is_empty() {
            continue;
        }
        println!();
        println!("  {}", label.bold());
        for id in ids {
            match store.and_then(|s| s.get(id)) {
                Some(paper) => println!("   • {}", truncate_with_ellipsis(&paper.citation(), 160)),
                None => println!("   • {}", id),
            }
        }
    }
}

/// Print the outcome of a pipeline run.
pub fn print_report(report: &RunReport) {
    print_section("Run complete");
    print_status(
        Status::Success,
        &format!(
            "{} papers, {} authors, {} researchers selected",
            format_number(report.papers as u64),
            format_number(report.authors as u64),
            report.selected
        ),
    );
    print_status(
        Status::Info,
        &format!("{} new affiliations resolved", report.new_affiliations),
    );
    match report.new_summaries {
        Some(n) => print_status(Status::Info, &format!("{} new summaries", n)),
        None => print_status(Status::Pending, "Summaries skipped"),
    }
}

/// Print a co-author graph as an indented edge list.
pub fn print_graph(
    graph: &CoauthorGraph,
    profiles: &indexmap::IndexMap<String, ResearcherProfile>,
) {
    let name = |id: &str| {
        profiles
            .get(id)
            .map(|p| p.author.name().to_string())
            .unwrap_or_else(|| id.to_string())
    };

    print_section(&format!("{} researchers", graph.nodes.len()));
    for node in &graph.nodes {
        println!(
            "  {} {}",
            name(&node.id).bold(),
            format!("({} citations)", format_number(node.citations)).dimmed()
        );
    }

    print_section(&format!("{} links", graph.edges.len()));
    for edge in &graph.edges {
        println!(
            "  {} ─ {} {}",
            name(&edge.source),
            name(&edge.target),
            format!("×{}", edge.weight).yellow()
        );
    }
}

/// A loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner; hidden spinners never draw.
    pub fn new(msg: &str, visible: bool) -> Self {
        let pb = if visible {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.finish_and_clear();
        print_status(Status::Success, msg);
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.finish_and_clear();
        print_status(Status::Error, msg);
    }
}

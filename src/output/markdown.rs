//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, the downloaded pages and an error report.

use crate::output::summary::CrawlSummary;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Maximum number of downloaded pages listed individually
const MAX_LISTED_PAGES: usize = 200;

/// Writes a markdown summary of a crawl to `output_path`
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();
    let stats = &summary.statistics;

    md.push_str("# Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!("- **Depth**: {}\n", summary.depth));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n\n",
        summary.duration().num_milliseconds() as f64 / 1000.0
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Attempted**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Downloaded**: {}\n", stats.downloaded));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed));
    md.push_str(&format!("- **Unique Hosts**: {}\n", stats.unique_hosts));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    // Error summary
    if !stats.error_summary.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");

        for (kind, count) in &stats.error_summary {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    // Downloaded pages
    if !summary.downloaded.is_empty() {
        md.push_str("## Downloaded Pages\n\n");
        for url in summary.downloaded.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("- {}\n", url));
        }
        if summary.downloaded.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.downloaded.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    // Failed pages
    if !summary.failed.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");

        for failed in &summary.failed {
            md.push_str(&format!(
                "| {} | {} |\n",
                failed.url,
                failed.message.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

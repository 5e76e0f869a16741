//! CLI presentation: human-readable run summaries.

use crate::book::RunReport;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Per-category prompt counts in first-seen order.
fn category_counts(report: &RunReport) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in &report.prompts {
        match counts.iter_mut().find(|(category, _)| *category == record.category) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.category.clone(), 1)),
        }
    }
    counts
}

pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", report.topic.as_str().bold().underline()));

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Category", "Prompts"]);
    for (category, count) in category_counts(report) {
        let label = if category.is_empty() {
            "(from prompts.csv)".to_string()
        } else {
            category
        };
        table.add_row(vec![label, count.to_string()]);
    }
    out.push_str(&format!("{}\n", table));

    out.push_str(&format!(
        "{} {} prompts saved to {}\n",
        "\u{2713}".green(),
        report.prompts.len(),
        report.prompts_path.display()
    ));

    if let Some(ref images) = report.images {
        out.push_str(&format!(
            "{} {} images saved to {}\n",
            "\u{2713}".green(),
            images.written.len(),
            report.images_dir.display()
        ));
        if images.upscale_fallbacks > 0 {
            out.push_str(&format!(
                "{} {} images were saved without upscaling\n",
                "!".yellow(),
                images.upscale_fallbacks
            ));
        }
    }
    out.trim_end().to_string()
}

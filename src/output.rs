use crate::cleaner::CleanSummary;
use crate::report::CleanReport;
use crate::size::format_size;
use crate::stats::CleanupStats;
use crate::theme::Theme;
use crate::tree::CleanNode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // Group contents one level deep
    VeryVerbose, // Every node
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => OutputMode::Quiet,
            (false, 0) => OutputMode::Normal,
            (false, 1) => OutputMode::Verbose,
            (false, _) => OutputMode::VeryVerbose,
        }
    }

    /// Tree depth printed below each top-level node
    fn depth(self) -> usize {
        match self {
            OutputMode::Quiet | OutputMode::Normal => 1,
            OutputMode::Verbose => 2,
            OutputMode::VeryVerbose => usize::MAX,
        }
    }
}

pub fn print_report(report: &CleanReport, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("Reclaimable Space"));
    println!("{}", Theme::divider_bold(60));

    for (section, nodes) in report.sections() {
        let total: u64 = nodes.iter().map(|n| n.size_bytes).sum();
        println!();
        println!(
            "{}  {}",
            Theme::section(section.title()),
            Theme::size(&format_size(total))
        );
        println!("{}", Theme::divider(60));
        if nodes.is_empty() {
            println!("  {}", Theme::muted("nothing to clean"));
        }
        for node in nodes {
            print_node(node, 0, mode.depth());
        }
    }

    println!();
    println!("{}", Theme::divider_bold(60));
    println!(
        "{} {}",
        Theme::header("Total:"),
        Theme::size(&format_size(report.total_bytes()))
    );
}

fn print_node(node: &CleanNode, depth: usize, max_depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let recommended = if node.is_recommended {
        String::new()
    } else {
        format!(" {}", Theme::muted("(review)"))
    };
    println!(
        "{}{} {:<40} {}{}",
        indent,
        Theme::selected(node.is_selected_by_default),
        Theme::category(&node.label),
        Theme::size(&format_size(node.size_bytes)),
        recommended
    );

    if depth + 1 >= max_depth {
        if !node.children.is_empty() {
            println!(
                "{}  {}",
                indent,
                Theme::muted(&format!("... {} more", node.children.len()))
            );
        }
        return;
    }
    for child in &node.children {
        print_node(child, depth + 1, max_depth);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    version: &'static str,
    timestamp: String,
    total_bytes: u64,
    #[serde(flatten)]
    report: &'a CleanReport,
}

pub fn print_json(report: &CleanReport) -> anyhow::Result<()> {
    let json = JsonReport {
        version: "1.0",
        timestamp: chrono::Utc::now().to_rfc3339(),
        total_bytes: report.total_bytes(),
        report,
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn print_summary(summary: &CleanSummary, dry_run: bool, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    if dry_run {
        println!("{}", Theme::warning("Dry run: nothing was removed"));
        for path in &summary.deleted {
            println!("  {}", Theme::muted(&path.display().to_string()));
        }
    } else if mode != OutputMode::Normal {
        for path in &summary.deleted {
            println!("  {} {}", Theme::success("removed"), Theme::muted(&path.display().to_string()));
        }
    }

    println!(
        "{} {} items, {}",
        Theme::header(if dry_run { "Would clean:" } else { "Cleaned:" }),
        Theme::value(&summary.item_count.to_string()),
        Theme::size(&format_size(summary.total_bytes))
    );
    if summary.skipped > 0 {
        println!("  {} skipped", Theme::muted(&summary.skipped.to_string()));
    }
    if summary.failed > 0 {
        println!(
            "  {}",
            Theme::error(&format!("{} failed, see log", summary.failed))
        );
    }
    if summary.records_purged > 0 {
        println!("  {} task records removed", summary.records_purged);
    }
    if summary.restart_requested && !dry_run {
        println!("  {}", Theme::muted("service restart requested"));
    }
}

pub fn print_stats(stats: &CleanupStats) {
    match &stats.last_clean_time {
        Some(time) => {
            println!("{} {}", Theme::header("Last clean:"), time);
            println!("  {} {}", Theme::muted("size: "), Theme::size(&format_size(stats.last_clean_size)));
            println!("  {} {}", Theme::muted("items:"), Theme::value(&stats.last_clean_data.to_string()));
        }
        None => println!("{}", Theme::muted("No clean recorded yet")),
    }
}

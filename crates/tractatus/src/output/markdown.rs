use std::io::{self, Write};

use chrono::{DateTime, Utc};
use tractatus_inventory::Inventory;

use super::{Render, layout_for};

/// Markdown report: title, summary counts and a pipe table
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    generated: DateTime<Utc>,
}

impl MarkdownRenderer {
    /// Create a renderer stamped with the current time
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a renderer stamped with a fixed time
    #[must_use]
    pub fn at(generated: DateTime<Utc>) -> Self {
        Self { generated }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, inventory: &Inventory, out: &mut dyn Write) -> io::Result<()> {
        let is_github = inventory
            .resources
            .first()
            .is_some_and(|r| r.is_repository());
        let title = if is_github {
            "GitHub Repository Inventory"
        } else {
            "AWS Resource Inventory"
        };

        writeln!(out, "# {title}")?;
        writeln!(out)?;
        writeln!(
            out,
            "**Generated**: {}",
            self.generated.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out)?;

        if inventory.is_empty() {
            return writeln!(out, "No resources found.");
        }

        let with_cicd = inventory.cicd_count();
        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(out, "- **Total Resources**: {}", inventory.len())?;
        for (platform, count) in inventory.platform_counts() {
            writeln!(out, "- **{}**: {count}", escape(&platform))?;
        }
        writeln!(out)?;
        writeln!(out, "- **Resources with CI/CD**: {with_cicd}")?;
        writeln!(out, "- **Resources without CI/CD**: {}", inventory.len() - with_cicd)?;
        writeln!(out)?;

        let layout = layout_for(inventory);
        writeln!(out, "## Resources")?;
        writeln!(out)?;
        writeln!(out, "| {} |", layout.headers.join(" | "))?;
        writeln!(out, "|{}", "---|".repeat(layout.headers.len()))?;
        for res in &inventory.resources {
            let cells: Vec<String> = (layout.row)(res).iter().map(|c| escape(c)).collect();
            writeln!(out, "| {} |", cells.join(" | "))?;
        }
        Ok(())
    }
}

/// Escape characters that would break a table cell
fn escape(value: &str) -> String {
    value.replace('|', "\\|")
}

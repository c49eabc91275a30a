//! Inventory rendering and output destinations

mod markdown;
mod table;

use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use eyre::WrapErr;
use tractatus_inventory::{Inventory, ResourceInfo, UNKNOWN};

pub use markdown::MarkdownRenderer;
pub use table::TableRenderer;

/// Renders an inventory into a byte sink
pub trait Render {
    /// Write the whole inventory
    ///
    /// # Errors
    /// Returns error if the sink fails
    fn render(&self, inventory: &Inventory, out: &mut dyn Write) -> io::Result<()>;
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Padded plain-text table
    #[default]
    Table,
    /// Markdown report with summary
    Markdown,
}

impl Format {
    /// Renderer for this format
    #[must_use]
    pub fn renderer(self) -> Box<dyn Render> {
        match self {
            Format::Table => Box::new(TableRenderer),
            Format::Markdown => Box::new(MarkdownRenderer::new()),
        }
    }
}

/// Where rendered output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output
    Stdout,
    /// A file, created or truncated
    File(PathBuf),
}

impl FromStr for Destination {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stdout" || s == "-" {
            Ok(Destination::Stdout)
        } else {
            Ok(Destination::File(PathBuf::from(s)))
        }
    }
}

/// Render an inventory to its destination
///
/// # Errors
/// Returns error if the file cannot be created or writing fails
pub fn write_inventory(
    inventory: &Inventory,
    format: Format,
    destination: &Destination,
) -> eyre::Result<()> {
    let renderer = format.renderer();
    match destination {
        Destination::Stdout => {
            let mut out = io::stdout().lock();
            renderer.render(inventory, &mut out)?;
            out.flush()?;
        }
        Destination::File(path) => {
            let file = File::create(path)
                .wrap_err_with(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            renderer.render(inventory, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

// ============================================================================
// Column layouts
// ============================================================================

/// Columns for one kind of record
pub(crate) struct Layout {
    pub headers: &'static [&'static str],
    pub row: fn(&ResourceInfo) -> Vec<String>,
}

static GITHUB_LAYOUT: Layout = Layout {
    headers: &[
        "Repo Name",
        "Owner",
        "Last Committer",
        "CODEOWNERS",
        "Platform",
        "CI/CD",
        "Tests",
    ],
    row: github_row,
};

static AWS_LAYOUT: Layout = Layout {
    headers: &[
        "App Name", "Owner", "Team", "Platform", "Stack", "CI/CD", "Account",
    ],
    row: aws_row,
};

/// Pick the layout matching the inventory's records
pub(crate) fn layout_for(inventory: &Inventory) -> &'static Layout {
    match inventory.resources.first() {
        Some(res) if res.is_repository() => &GITHUB_LAYOUT,
        _ => &AWS_LAYOUT,
    }
}

/// Owners shown in a row; at most three, then a count
fn owners_cell(res: &ResourceInfo) -> String {
    match res.code_owners.as_slice() {
        [] => UNKNOWN.to_string(),
        owners if owners.len() <= 3 => owners.join(", "),
        owners => format!("{} (+{} more)", owners[..3].join(", "), owners.len() - 3),
    }
}

fn yes_no(value: bool) -> String {
    let label = if value { "Yes" } else { "No" };
    label.to_string()
}

fn github_row(res: &ResourceInfo) -> Vec<String> {
    let cicd = if res.cicd_platform.is_empty() {
        yes_no(false)
    } else {
        res.cicd_platform.clone()
    };
    let tests = match (res.has_tests, res.test_framework.as_str()) {
        (false, _) => yes_no(false),
        (true, "") => yes_no(true),
        (true, reason) => format!("Yes ({reason})"),
    };

    vec![
        res.app_name.clone(),
        owners_cell(res),
        res.last_committer.clone(),
        yes_no(res.has_code_owners),
        res.platform.clone(),
        cicd,
        tests,
    ]
}

fn aws_row(res: &ResourceInfo) -> Vec<String> {
    vec![
        res.app_name.clone(),
        res.owner.clone(),
        res.team.clone(),
        res.platform.clone(),
        res.stack_name.clone(),
        yes_no(res.has_cicd),
        res.account.clone(),
    ]
}

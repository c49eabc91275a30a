use std::io::{self, Write};

use tractatus_inventory::Inventory;

use super::{Render, layout_for};

/// Plain-text table with padded columns
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRenderer;

impl Render for TableRenderer {
    fn render(&self, inventory: &Inventory, out: &mut dyn Write) -> io::Result<()> {
        if inventory.is_empty() {
            return writeln!(out, "No resources found.");
        }

        let layout = layout_for(inventory);
        let rows: Vec<Vec<String>> = inventory.resources.iter().map(layout.row).collect();

        let mut widths: Vec<usize> = layout.headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_row(out, &widths, layout.headers.iter().copied())?;
        write!(out, "|")?;
        for width in &widths {
            write!(out, "-{}-|", "-".repeat(*width))?;
        }
        writeln!(out)?;

        for row in &rows {
            write_row(out, &widths, row.iter().map(String::as_str))?;
        }
        Ok(())
    }
}

fn write_row<'a>(
    out: &mut dyn Write,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    write!(out, "|")?;
    for (cell, width) in cells.zip(widths.iter().copied()) {
        write!(out, " {cell:<width$} |")?;
    }
    writeln!(out)
}

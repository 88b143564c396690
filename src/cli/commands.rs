use crate::core::{EditOp, GridStore};
use crate::error::GridResult;
use crate::parser;
use crate::types::Table;
use crate::writer;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the show command - print a CSV file as a grid
pub fn show(file: PathBuf, json: bool) -> GridResult<()> {
    let table = parser::parse_file(&file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("{}", "📄 csvgrid - Show".bold().green());
    println!("   File: {}", file.display());
    println!(
        "   {} columns, {} rows\n",
        table.column_count(),
        table.row_count()
    );

    if table.is_empty() {
        println!("{}", "   Nothing loaded (file has no records)".yellow());
        return Ok(());
    }

    let ragged = table.ragged_rows();
    for (idx, line) in render_table(&table).lines().enumerate() {
        // line 0 is the header, line 1 the separator
        let row_index = idx.checked_sub(2);
        match row_index {
            None if idx == 0 => println!("   {}", line.bold()),
            Some(r) if ragged.contains(&r) => {
                println!("   {}  {}", line, "⚠ length differs from header".yellow())
            }
            _ => println!("   {}", line),
        }
    }

    Ok(())
}

/// Execute the inspect command - report shape problems a load would fix
pub fn inspect(file: PathBuf) -> GridResult<()> {
    let table = parser::parse_file(&file)?;

    println!("{}", "🔍 csvgrid - Inspect".bold().green());
    println!("   File: {}", file.display());
    println!("   Columns: {}", table.column_count());
    println!("   Data rows: {}", table.row_count());

    let ragged = table.ragged_rows();
    if ragged.is_empty() {
        println!("{}", "✅ Every row matches the header width".green());
    } else {
        println!(
            "{}",
            format!(
                "⚠️  {} row(s) differ from the header width and would be padded or truncated:",
                ragged.len()
            )
            .yellow()
        );
        for idx in ragged {
            println!(
                "      row {} has {} field(s)",
                idx.to_string().bright_blue(),
                table.rows[idx].len()
            );
        }
    }

    Ok(())
}

/// Execute the edit command - load, apply edits in order, export
pub fn edit(
    file: PathBuf,
    commands: Vec<String>,
    output: Option<PathBuf>,
    dry_run: bool,
) -> GridResult<()> {
    let mut store = GridStore::from_table(parser::parse_file(&file)?);

    let applied = apply_commands(&mut store, &commands)?;
    let csv_text = store.export_csv()?;

    if dry_run {
        print!("{}", csv_text);
        return Ok(());
    }

    let output_path = resolve_output_path(&file, output);
    std::fs::write(&output_path, csv_text)?;

    println!("{}", "✏️  csvgrid - Edit".bold().green());
    println!("   Input:  {}", file.display());
    println!("   Applied {} edit(s)", applied);
    println!(
        "   {} columns, {} rows",
        store.column_count(),
        store.row_count()
    );
    println!(
        "{}",
        format!("✅ Written to {}", output_path.display()).green()
    );

    Ok(())
}

/// Parse every command first, then apply them all as one unit.
///
/// Returns the number of edits applied. On error nothing is applied.
pub fn apply_commands(store: &mut GridStore, commands: &[String]) -> GridResult<usize> {
    let ops = commands
        .iter()
        .map(|c| c.parse::<EditOp>())
        .collect::<GridResult<Vec<_>>>()?;

    for op in &ops {
        debug!(%op, "queued edit");
    }

    store.apply_all(&ops)?;
    Ok(ops.len())
}

/// Where `edit` writes its result.
///
/// An explicit output path gets a `.csv` extension if it lacks one; without
/// one, the default export name is used next to the input file. The default
/// never overwrites the input: when the input is itself `edited.csv`, a
/// numbered name (`edited-1.csv`, ...) is used instead.
pub fn resolve_output_path(input: &Path, output: Option<PathBuf>) -> PathBuf {
    match output {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            path.with_file_name(writer::export_file_name(&name))
        }
        None => {
            let dir = input.parent().unwrap_or_else(|| Path::new(""));
            let mut candidate = dir.join(writer::DEFAULT_EXPORT_NAME);
            let mut n = 1;
            while is_same_file(&candidate, input) {
                candidate = dir.join(format!("edited-{n}.csv"));
                n += 1;
            }
            candidate
        }
    }
}

/// Path equality, resolving both sides when they exist on disk
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Render a table as aligned plain text: header, separator, one line per row
pub fn render_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.header.iter().map(|h| display_width(h)).collect();
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            let w = display_width(cell);
            match widths.get_mut(idx) {
                Some(current) => *current = (*current).max(w),
                None => widths.push(w),
            }
        }
    }

    let render_line = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let shown = cell.replace('\n', "⏎");
                format!("{:width$}", shown, width = widths[idx])
            })
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_line(&table.header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .take(table.header.len().max(1))
            .map(|w| "─".repeat((*w).max(1)))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    out.push('\n');
    for row in &table.rows {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out
}

fn display_width(cell: &str) -> usize {
    cell.replace('\n', "⏎").chars().count()
}

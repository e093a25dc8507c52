use anyhow::{anyhow, Result};
use bat::PrettyPrinter;

use kgx::models::triple::Triple;
use kgx::store::TripleRecord;

const PREVIEW_CHARS: usize = 600;

pub fn print_markdown(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .map_err(|e| anyhow!("Failed to render output: {}", e))?;
    Ok(())
}

/// The first few hundred characters of the page text
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

pub fn triples_table(triples: &[Triple]) -> String {
    markdown_table(
        &["head", "relation", "tail", "evidence"],
        triples
            .iter()
            .map(|t| vec![t.head(), t.relation(), t.tail(), t.evidence()]),
    )
}

pub fn records_table(records: &[TripleRecord]) -> String {
    markdown_table(
        &["head", "relation", "tail", "evidence", "url", "timestamp"],
        records.iter().map(|r| {
            vec![
                r.head.as_str(),
                r.relation.as_str(),
                r.tail.as_str(),
                r.evidence.as_str(),
                r.url.as_str(),
                r.timestamp.as_str(),
            ]
        }),
    )
}

fn markdown_table<'a>(headers: &[&str], rows: impl Iterator<Item = Vec<&'a str>>) -> String {
    let mut table = format!("| {} |\n", headers.join(" | "));
    table.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
    for row in rows {
        let cells: Vec<String> = row.into_iter().map(escape_cell).collect();
        table.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    table
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

//! Plain text cheat sheet.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::model::ExtractedDocument;

use super::sheet::{CheatSheet, Item, ListStyle, Section, Table};
use super::{CleanupPipeline, RenderOptions};

/// Render the sheet followed by the rulebook's full text.
pub fn render_cheat_sheet(doc: &ExtractedDocument, sheet: &CheatSheet, options: &RenderOptions) -> String {
    let rule = "=".repeat(options.banner_width);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{} CHEAT SHEET", sheet.full_title().to_uppercase());
    let _ = writeln!(out, "{}\n", rule);

    for (i, section) in sheet.sections.iter().enumerate() {
        if i == 0 {
            let _ = writeln!(out, "{}", section.heading.to_uppercase());
            let _ = writeln!(out, "{}", "-".repeat(options.banner_width));
            write_section_body(&mut out, section, "");
        } else {
            let _ = writeln!(out, "{}:", section.heading.to_uppercase());
            write_section_body(&mut out, section, "  ");
        }
        out.push('\n');
    }

    if options.include_reference_text {
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "COMPLETE TEXT FOR REFERENCE:");
        let _ = writeln!(out, "{}\n", rule);

        let pipeline = options.cleanup.clone().map(CleanupPipeline::new);
        for (number, text) in doc.all_text() {
            let text = match &pipeline {
                Some(p) => p.process(&text),
                None => text,
            };
            let _ = write!(out, "\n--- PAGE {} ---\n\n{}\n", number, text);
        }
    }

    out
}

/// Write the plain-text cheat sheet to `output_path`.
pub fn create_cheat_sheet<P: AsRef<Path>>(
    doc: &ExtractedDocument,
    sheet: &CheatSheet,
    output_path: P,
    options: &RenderOptions,
) -> Result<()> {
    let output_path = output_path.as_ref();
    std::fs::write(output_path, render_cheat_sheet(doc, sheet, options))?;
    log::info!("Cheat sheet created: {}", output_path.display());
    Ok(())
}

fn write_section_body(out: &mut String, section: &Section, indent: &str) {
    for (i, item) in section.items.iter().enumerate() {
        let marker = match section.style {
            ListStyle::Numbered => format!("{}. ", i + 1),
            ListStyle::Bullets => "- ".to_string(),
            ListStyle::Plain | ListStyle::Callout => String::new(),
        };
        write_item(out, item, &format!("{}{}", indent, marker), indent);
    }

    if let Some(table) = &section.table {
        for line in table_lines(table) {
            let _ = writeln!(out, "{}{}", indent, line);
        }
    }

    for note in &section.notes {
        write_item(out, note, indent, indent);
    }
}

fn write_item(out: &mut String, item: &Item, lead: &str, indent: &str) {
    let _ = writeln!(out, "{}{}", lead, item.line());
    for child in &item.children {
        let _ = writeln!(out, "{}  - {}", indent, child.line());
    }
}

/// Box-drawing rendition of a table.
pub fn table_lines(table: &Table) -> Vec<String> {
    let widths = table.column_widths();
    let border = |left: &str, mid: &str, right: &str| {
        let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}", left, cells.join(mid), right)
    };
    let row = |cells: &[String]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| format!(" {:<w$} ", cells.get(i).map(String::as_str).unwrap_or(""), w = w))
            .collect();
        format!("│{}│", padded.join("│"))
    };

    let mut lines = vec![border("┌", "┬", "┐")];
    if !table.headers.is_empty() {
        lines.push(row(&table.headers));
        lines.push(border("├", "┼", "┤"));
    }
    lines.extend(table.rows.iter().map(|r| row(r)));
    lines.push(border("└", "┴", "┘"));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, ExtractedPage, TextObject};
    use crate::render::CleanupOptions;

    fn doc() -> ExtractedDocument {
        let mut doc = ExtractedDocument::new();
        let mut page = ExtractedPage::new(2, 612.0, 792.0);
        page.push(TextObject::new("Reinforcements  ", BBox::default(), 11.0, "Times-Roman"));
        page.push(TextObject::new("7", BBox::default(), 11.0, "Times-Roman"));
        page.push(TextObject::new("armies per turn", BBox::default(), 11.0, "Times-Roman"));
        doc.add_page(page);
        doc
    }

    #[test]
    fn test_banner_and_sections() {
        let text = render_cheat_sheet(&doc(), &CheatSheet::default(), &RenderOptions::default());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=".repeat(70));
        assert_eq!(lines[1], "RISK: LORD OF THE RINGS - QUICK REFERENCE CHEAT SHEET");
        assert_eq!(lines[4], "QUICK RULES OVERVIEW");
        assert_eq!(lines[5], "-".repeat(70));
        assert_eq!(lines[6], "Players: 2-4 | Age: 10+");
        assert!(text.contains("THE 8 STEPS OF YOUR TURN:\n  1. Receive and place reinforcements\n"));
        assert!(text.contains("  8. Move the Fellowship\n"));
        assert!(text.contains("COMBAT RULES:\n  - Need at least 2 battalions"));
        assert!(text.contains("  Mission: Complete by getting Leader to specified location\n"));
        assert!(text.contains("  When Fellowship reaches Mount Doom, roll 1 die:\n    - 3 or less:"));
    }

    #[test]
    fn test_reference_text_per_page() {
        let text = render_cheat_sheet(&doc(), &CheatSheet::default(), &RenderOptions::default());
        assert!(text.contains("COMPLETE TEXT FOR REFERENCE:\n"));
        assert!(text.ends_with("\n--- PAGE 2 ---\n\nReinforcements\n7\narmies per turn\n"));

        let standard = render_cheat_sheet(
            &doc(),
            &CheatSheet::default(),
            &RenderOptions::default().with_cleanup(CleanupOptions::standard()),
        );
        assert!(standard.ends_with("--- PAGE 2 ---\n\nReinforcements\n7\narmies per turn\n"));

        let raw = render_cheat_sheet(
            &doc(),
            &CheatSheet::default(),
            &RenderOptions::default().without_cleanup(),
        );
        assert!(raw.ends_with("--- PAGE 2 ---\n\nReinforcements\n7\narmies per turn\n"));

        let bare = render_cheat_sheet(
            &doc(),
            &CheatSheet::default(),
            &RenderOptions::default().with_reference_text(false),
        );
        assert!(!bare.contains("COMPLETE TEXT"));
    }

    #[test]
    fn test_table_lines() {
        let table = Table::new(&["Territories", "Reinforcements"], &[&["1-11", "3"], &["21+", "÷3, round up"]]);
        let lines = table_lines(&table);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "┌─────────────┬────────────────┐");
        assert_eq!(lines[1], "│ Territories │ Reinforcements │");
        assert_eq!(lines[2], "├─────────────┼────────────────┤");
        assert_eq!(lines[4], "│ 21+         │ ÷3, round up   │");
        assert_eq!(lines[5], "└─────────────┴────────────────┘");
    }

    #[test]
    fn test_create_cheat_sheet_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");
        create_cheat_sheet(&doc(), &CheatSheet::default(), &path, &RenderOptions::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("======"));
    }
}

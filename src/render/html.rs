//! HTML cheat sheet with rulebook figures.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ExtractedDocument;

use super::images::{extract_images, ImagePaths};
use super::sheet::{CheatSheet, Item, ListStyle, Section, Table};
use super::RenderOptions;

const STYLE: &str = r#"        body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
        .container { max-width: 900px; margin: 0 auto; background: white; padding: 20px; border-radius: 8px; }
        h1 { text-align: center; border-bottom: 3px solid #333; padding-bottom: 10px; }
        h2 { border-left: 4px solid #007bff; padding-left: 10px; margin-top: 20px; }
        table { border-collapse: collapse; margin: 10px 0; width: 100%; }
        th, td { border: 1px solid #ddd; padding: 8px 12px; text-align: left; }
        th { background-color: #007bff; color: white; }
        tr:nth-child(even) { background-color: #f9f9f9; }
        .image-section { margin: 20px 0; text-align: center; }
        .image-section img { max-width: 100%; height: auto; border: 1px solid #ddd; margin: 10px 0; }
        ul { margin: 10px 0; padding-left: 20px; }
        li { margin: 5px 0; }
        .info-box { background: #e7f3ff; padding: 10px; border-left: 4px solid #2196F3; margin: 10px 0; }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the sheet as a self-contained HTML page.
///
/// `figure_src` gives, per page, the `src` values of that page's images.
pub fn render_html<F>(sheet: &CheatSheet, figure_src: F) -> String
where
    F: Fn(u32) -> Vec<String>,
{
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"UTF-8\">\n    <title>{}</title>\n    <style>\n{}    </style>\n</head>\n<body>\n    <div class=\"container\">\n",
        escape_html(&sheet.full_title()),
        STYLE
    );
    let _ = writeln!(html, "        <h1>{}</h1>", escape_html(&sheet.full_title().to_uppercase()));

    for section in &sheet.sections {
        write_section(&mut html, section);

        if let Some(page) = section.figures {
            let sources = figure_src(page);
            if !sources.is_empty() {
                html.push_str("        <h3>Visual Reference from Rulebook</h3>\n");
                html.push_str("        <div class=\"image-section\">\n");
                for src in sources {
                    let _ = writeln!(
                        html,
                        "            <img src=\"{}\" alt=\"{}\">",
                        escape_html(&src),
                        escape_html(&section.heading)
                    );
                }
                html.push_str("        </div>\n");
            }
        }
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

/// Extract images into `options.image_dir`, then write the HTML sheet.
///
/// Returns the paths of the extracted images.
pub fn create_html_cheatsheet<P: AsRef<Path>>(
    doc: &ExtractedDocument,
    sheet: &CheatSheet,
    output_path: P,
    options: &RenderOptions,
) -> Result<ImagePaths> {
    let output_path = output_path.as_ref();
    let image_paths = extract_images(doc, &options.image_dir)?;
    let html_dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let html = render_html(sheet, |page| {
        image_paths
            .range((page, 0)..=(page, usize::MAX))
            .filter(|((number, idx), _)| {
                let displayable = doc
                    .page(*number)
                    .and_then(|p| p.objects.get(*idx))
                    .and_then(|o| o.as_image())
                    .is_some_and(|img| img.format.is_displayable());
                if !displayable {
                    log::debug!("Page {} image {} cannot be shown in HTML", number, idx);
                }
                displayable
            })
            .map(|(_, path)| relative_src(path, html_dir))
            .collect()
    });

    std::fs::write(output_path, html)?;
    log::info!("HTML cheat sheet created: {}", output_path.display());
    Ok(image_paths)
}

/// `path` relative to `base` when it lies beneath it, with `/` separators.
fn relative_src(path: &Path, base: &Path) -> String {
    let absolute = |p: &Path| -> PathBuf { p.canonicalize().unwrap_or_else(|_| p.to_path_buf()) };
    let path_abs = absolute(path);
    let relative = path_abs
        .strip_prefix(absolute(base))
        .map(Path::to_path_buf)
        .unwrap_or(path_abs);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}

fn write_section(html: &mut String, section: &Section) {
    let _ = writeln!(html, "\n        <h2>{}</h2>", escape_html(&section.heading));

    match section.style {
        ListStyle::Plain => {
            for item in &section.items {
                let _ = writeln!(html, "        <p>{}</p>", item_html(item));
                write_children(html, item);
            }
        }
        ListStyle::Bullets => write_list(html, "ul", &section.items),
        ListStyle::Numbered => write_list(html, "ol", &section.items),
        ListStyle::Callout if !section.items.is_empty() => {
            html.push_str("        <div class=\"info-box\">\n");
            for item in &section.items {
                let _ = writeln!(html, "            <p>{}</p>", item_html(item));
            }
            html.push_str("        </div>\n");
        }
        ListStyle::Callout => {}
    }

    if let Some(table) = &section.table {
        write_table(html, table);
    }
    write_list(html, "ul", &section.notes);
}

fn write_list(html: &mut String, tag: &str, items: &[Item]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(html, "        <{}>", tag);
    for item in items {
        let _ = writeln!(html, "            <li>{}</li>", item_html(item));
    }
    let _ = writeln!(html, "        </{}>", tag);
}

fn write_children(html: &mut String, item: &Item) {
    write_list(html, "ul", &item.children);
}

fn item_html(item: &Item) -> String {
    match &item.label {
        Some(label) => format!("<strong>{}:</strong> {}", escape_html(label), escape_html(&item.text)),
        None => escape_html(&item.text),
    }
}

fn write_table(html: &mut String, table: &Table) {
    html.push_str("        <table>\n");
    if !table.headers.is_empty() {
        html.push_str("            <tr>\n");
        for header in &table.headers {
            let _ = writeln!(html, "                <th>{}</th>", escape_html(header));
        }
        html.push_str("            </tr>\n");
    }
    for row in &table.rows {
        html.push_str("            <tr>\n");
        for cell in row {
            let _ = writeln!(html, "                <td>{}</td>", escape_html(cell));
        }
        html.push_str("            </tr>\n");
    }
    html.push_str("        </table>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, ExtractedPage, ImageObject};

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("Strongholds & <Sites> \"of\" 'Power'"),
            "Strongholds &amp; &lt;Sites&gt; &quot;of&quot; &#39;Power&#39;"
        );
    }

    #[test]
    fn test_render_html_sections() {
        let html = render_html(&CheatSheet::default(), |_| Vec::new());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>RISK: Lord of the Rings - Quick Reference</title>"));
        assert!(html.contains("<h2>Strongholds &amp; Sites of Power</h2>"));
        assert!(html.contains("<li>Move the Fellowship</li>\n        </ol>"));
        assert!(html.contains("<th>Reinforcements</th>"));
        assert!(html.contains("<td>÷3, round up</td>"));
        assert!(html.contains("<div class=\"info-box\">"));
        assert!(html.contains("<li><strong>Region Control:</strong> +7-11 pts per region</li>"));
        assert!(html.contains("<li><strong>4+:</strong> Fellowship succeeds"));
        assert!(!html.contains("Visual Reference"));
    }

    #[test]
    fn test_figures_are_embedded_for_their_page() {
        let html = render_html(&CheatSheet::default(), |page| {
            if page == 3 {
                vec!["img/page3_img0.png".to_string()]
            } else {
                Vec::new()
            }
        });
        let figure = html.find("Visual Reference from Rulebook").unwrap();
        assert!(figure > html.find("<h2>Strongholds").unwrap());
        assert!(figure < html.find("<h2>Adventure Cards").unwrap());
        assert!(html.contains(
            "<img src=\"img/page3_img0.png\" alt=\"Strongholds &amp; Sites of Power\">"
        ));
    }

    #[test]
    fn test_create_html_uses_relative_image_paths() {
        let mut doc = ExtractedDocument::new();
        let mut page = ExtractedPage::new(3, 612.0, 792.0);
        page.push(ImageObject::new(PNG.to_vec(), BBox::default(), (8, 0)));
        page.push(ImageObject::new(vec![1, 2, 3], BBox::default(), (9, 0)));
        doc.add_page(page);

        let dir = tempfile::tempdir().unwrap();
        let options = RenderOptions::default().with_image_dir(dir.path().join("cheatsheet_images"));
        let out = dir.path().join("sheet.html");

        let paths = create_html_cheatsheet(&doc, &CheatSheet::default(), &out, &options).unwrap();
        assert_eq!(paths.len(), 2);

        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("src=\"cheatsheet_images/page3_img0.png\""));
        // raw samples are written to disk but not shown
        assert!(!html.contains("page3_img1.raw"));
    }
}

//! Pure export formatting over a resolved selection snapshot. No business
//! logic lives here; rendering to an actual PDF or download is the caller's
//! problem.

use crate::model::{CategoryDocument, SelectionHeader};

/// CSV serialization: one row per item, columns
/// `Category,ItemIndex,Link,Type,Notes,ImagesCount`. Newlines inside notes
/// are flattened to spaces before quoting.
pub fn to_csv(categories: &[CategoryDocument]) -> String {
    let mut rows: Vec<String> = Vec::new();
    rows.push(csv_row(&[
        "Category",
        "ItemIndex",
        "Link",
        "Type",
        "Notes",
        "ImagesCount",
    ]));
    for doc in categories {
        for (i, item) in doc.items.iter().enumerate() {
            let notes = item.notes.replace("\r\n", " ").replace('\n', " ");
            rows.push(csv_row(&[
                &doc.category_label,
                &i.to_string(),
                &item.link_or_sku,
                &item.type_or_model,
                &notes,
                &item.images.len().to_string(),
            ]));
        }
    }
    rows.join("\n")
}

fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(f: &str) -> String {
    let needs_quotes = f.contains('"') || f.contains(',') || f.contains('\n');
    if needs_quotes {
        format!("\"{}\"", f.replace('"', "\"\""))
    } else {
        f.to_string()
    }
}

/// Print-ready HTML document for a selection snapshot, structure only.
pub fn to_print_html(
    header: &SelectionHeader,
    categories: &[CategoryDocument],
    exported_at: &str,
) -> String {
    let mut sections = String::new();
    for doc in categories {
        sections.push_str(&format!("<section><h2>{}</h2>", esc(&doc.category_label)));
        if doc.items.is_empty() {
            sections.push_str("<p class=\"muted\">No items</p>");
        }
        for (i, item) in doc.items.iter().enumerate() {
            sections.push_str(&format!("<div class=\"item\"><h3>Item {}</h3>", i + 1));
            if !item.type_or_model.is_empty() {
                sections.push_str(&format!(
                    "<div>Type/Model: {}</div>",
                    esc(&item.type_or_model)
                ));
            }
            if !item.link_or_sku.is_empty() {
                sections.push_str(&format!("<div>Link/SKU: {}</div>", esc(&item.link_or_sku)));
            }
            if !item.notes.is_empty() {
                sections.push_str(&format!("<div>Notes: {}</div>", esc(&item.notes)));
            }
            if !item.images.is_empty() {
                sections.push_str("<div class=\"gallery\">");
                for url in &item.images {
                    sections.push_str(&format!(
                        "<a href=\"{0}\"><img src=\"{0}\" alt=\"\"></a>",
                        esc(url)
                    ));
                }
                sections.push_str("</div>");
            }
            sections.push_str("</div>");
        }
        sections.push_str("</section>");
    }

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>{title}</title></head><body><header><h1>{title}</h1>\
         <div class=\"meta\"><div>Client: {client}</div><div>Email: {email}</div>\
         <div>Status: {status}</div><div>Exported: {exported}</div></div></header>\
         {sections}</body></html>",
        title = esc("Client Selections"),
        client = esc(if header.display_name.is_empty() {
            "—"
        } else {
            &header.display_name
        }),
        email = esc(if header.contact_email.is_empty() {
            "—"
        } else {
            &header.contact_email
        }),
        status = esc(header.status.as_str()),
        exported = esc(exported_at),
        sections = sections,
    )
}

fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;

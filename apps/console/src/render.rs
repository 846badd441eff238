//! Plain-text rendering of the template views.

use std::fmt::Write as _;

use controller::{AssociationModal, ConfirmDialog, TemplateListController, TemplateRow};

const HEADERS: [&str; 5] = [
    "Template name",
    "Template type",
    "Index patterns",
    "Priority",
    "Associated component templates",
];

fn cells(row: &TemplateRow) -> [String; 5] {
    [
        row.name().to_string(),
        row.template_type().label().to_string(),
        row.index_patterns().to_string(),
        row.priority().to_string(),
        row.associated_component_count().to_string(),
    ]
}

pub fn template_table(list: &TemplateListController) -> String {
    let mut out = String::new();
    if let Some(empty) = list.empty_state() {
        let _ = writeln!(out, "{}", empty.message());
        let _ = writeln!(out, "[{}]", empty.action_label());
        return out;
    }

    let rows: Vec<[String; 5]> = list.rows().iter().map(cells).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |out: &mut String, values: &[&str]| {
        let padded: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };
    line(&mut out, &HEADERS);
    for row in &rows {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        line(&mut out, &values);
    }

    let query = list.query();
    let _ = writeln!(
        out,
        "{} (sizes {:?})",
        page_footer(query.from, query.size, list.total()),
        list.page_size_options()
    );
    out
}

/// `from` comes straight from a shared link, so it is not trusted to be in range.
fn page_footer(from: usize, size: usize, total: usize) -> String {
    let pages = total.div_ceil(size.max(1)).max(1);
    format!(
        "page {} of {} ({} templates, {} per page)",
        from.saturating_add(1),
        pages,
        total,
        size
    )
}

pub fn association_list(modal: &AssociationModal) -> String {
    let mut out = String::new();
    let anchor = modal.anchor();
    let _ = writeln!(out, "{} for {}", anchor.title(), anchor.name());
    let items = modal.page_items();
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  {item}  {}", anchor.item_link(&item));
    }
    if modal.page_count() > 1 {
        let _ = writeln!(
            out,
            "page {} of {}",
            modal.page_index() + 1,
            modal.page_count()
        );
    }
    out
}

pub fn confirm_dialog(dialog: &ConfirmDialog) -> String {
    format!("{}\n{}\n", dialog.title, dialog.body)
}

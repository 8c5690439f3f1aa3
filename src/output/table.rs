use comfy_table::Color;

use crate::asset::Catalog;
use crate::output::format::{create_styled_table, header_cell, styled_cell, tag_value};
use crate::predict::Prediction;

/// Print detected tags and the matched items with their URLs.
///
/// `match_url` turns a relative match path into something the user can open.
pub(crate) fn print_prediction(
    prediction: &Prediction,
    match_url: impl Fn(&str) -> String,
    use_color: bool,
) {
    if prediction.tags.is_empty() {
        println!("No tags detected.");
    } else {
        let mut table = create_styled_table();
        table.set_header(vec![
            header_cell("Tag", use_color),
            header_cell("Value", use_color),
        ]);
        for (name, value) in &prediction.tags {
            let color = match value.as_bool() {
                Some(true) => Some(Color::Green),
                Some(false) => Some(Color::DarkGrey),
                None => None,
            };
            table.add_row(vec![
                styled_cell(name, None, use_color),
                styled_cell(&tag_value(value), color, use_color),
            ]);
        }
        println!("{table}");

        let detected = prediction.positive_tags();
        if !detected.is_empty() {
            println!("Detected: {}", detected.join(", "));
        }
    }

    if prediction.matches.is_empty() {
        println!("No matching items found.");
        return;
    }

    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("#", use_color),
        header_cell("Match", use_color),
        header_cell("URL", use_color),
    ]);
    for (i, path) in prediction.matches.iter().enumerate() {
        table.add_row(vec![
            styled_cell(&(i + 1).to_string(), None, use_color),
            styled_cell(path, Some(Color::Yellow), use_color),
            styled_cell(&match_url(path.as_str()), None, use_color),
        ]);
    }
    println!("{table}");
}

pub(crate) fn print_catalog(catalog: &Catalog, use_color: bool) {
    if catalog.entries.is_empty() && catalog.unlabelled.is_empty() {
        println!("No labelled items found.");
        return;
    }

    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Item", use_color),
        header_cell("Image", use_color),
        header_cell("Tags", use_color),
    ]);
    for entry in &catalog.entries {
        let image = if entry.has_image() {
            styled_cell(&entry.images.join(", "), None, use_color)
        } else {
            styled_cell("missing", Some(Color::Red), use_color)
        };
        let tags = match &entry.label_error {
            Some(e) => styled_cell(&format!("invalid label: {e}"), Some(Color::Red), use_color),
            None => styled_cell(&entry.tags.join(", "), None, use_color),
        };
        table.add_row(vec![styled_cell(&entry.base_name, None, use_color), image, tags]);
    }
    for name in &catalog.unlabelled {
        table.add_row(vec![
            styled_cell(name, None, use_color),
            styled_cell(name, None, use_color),
            styled_cell("no label", Some(Color::Yellow), use_color),
        ]);
    }
    println!("{table}");
}

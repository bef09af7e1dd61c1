//! Classic-mode output: comfy-table listing and CSV export of loaded results.

use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use crate::api_client::Volume;
use crate::ui::results_view::{format_authors, primary_category};

pub fn display_results(items: &[Volume]) {
    if items.is_empty() {
        println!("{}", "No books found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Category").add_attribute(Attribute::Bold),
        Cell::new("Published").add_attribute(Attribute::Bold),
    ]);

    for (idx, volume) in items.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            volume.display_title().to_string(),
            format_authors(&volume.info.authors),
            primary_category(volume).to_string(),
            volume.info.published_date.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    println!("\n{}", format!("{} books found", items.len()).green());
}

pub fn export_to_csv(items: &[Volume], filename: &str) -> Result<()> {
    let mut wtr = csv::Writer::from_path(filename)?;
    wtr.write_record(["id", "title", "authors", "categories", "published"])?;

    for volume in items {
        wtr.write_record([
            volume.id.as_str(),
            volume.display_title(),
            &volume.info.authors.join("; "),
            &volume.info.categories.join("; "),
            volume.info.published_date.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

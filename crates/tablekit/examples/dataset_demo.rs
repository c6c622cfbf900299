//! Demo of the Dataset/Databook model and the format dispatcher
//!
//! Run with: cargo run --example dataset_demo -p tablekit

use std::env;
use tablekit::{detect_format, CellValue, ColumnSource, Databook, Dataset, Options, Registry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Dataset/Databook Demo ===\n");

    let temp_dir = env::temp_dir();

    // =========================================================================
    // Building a dataset
    // =========================================================================
    println!("--- Building a dataset ---\n");

    let mut people = Dataset::with_headers(vec!["name", "age", "city"]).with_title("people");
    people.append(vec![CellValue::from("Alice"), CellValue::Int(30), CellValue::from("NYC")])?;
    people.append(vec![CellValue::from("Bob"), CellValue::Int(25), CellValue::from("LA")])?;
    people.append_tagged(
        vec![CellValue::from("Charlie"), CellValue::Int(35), CellValue::from("Chicago")],
        ["staff"],
    )?;

    people.add_column(
        Some("senior"),
        ColumnSource::from_fn(|row| CellValue::Bool(row[1].as_int().unwrap_or(0) >= 30)),
        None,
    )?;
    people.sort("age", false)?;

    println!("{people}\n");
    println!("Staff only: {} row(s)", people.filter_tag("staff").height());

    // Wrong arity is rejected and the dataset is unchanged
    if let Err(e) = people.append(vec!["too", "short"]) {
        println!("Rejected append: {e}");
    }

    // =========================================================================
    // Exporting
    // =========================================================================
    println!("\n--- Exporting ---\n");

    let csv = people.export("csv")?;
    println!("csv:\n{}", csv.as_text().unwrap_or_default());

    let json = people.export_with("json", &Options::new().with("pretty", true))?;
    println!("json:\n{}\n", json.as_text().unwrap_or_default());

    println!("rst:\n{}\n", people.export("rst")?.as_text().unwrap_or_default());

    let xlsx_path = temp_dir.join("dataset_demo.xlsx");
    people.save(&xlsx_path, "xlsx")?;
    println!("Saved to: {}", xlsx_path.display());

    // =========================================================================
    // Detection
    // =========================================================================
    println!("\n--- Detection ---\n");

    println!("Probe order: {:?}", Registry::builtin().names());
    for (label, payload) in [("csv", &csv), ("json", &json)] {
        println!("{label} export detected as {:?}", detect_format(payload.as_bytes()));
    }

    let reloaded = Dataset::open(&xlsx_path)?;
    println!(
        "Reloaded {:?}: {} rows x {} cols",
        reloaded.title(),
        reloaded.height(),
        reloaded.width()
    );

    // =========================================================================
    // Books
    // =========================================================================
    println!("\n--- Books ---\n");

    let mut book = Databook::new();
    book.add_sheet(people.clone());
    book.add_sheet(people.transpose().with_title("transposed"));

    let book_path = temp_dir.join("dataset_demo_book.xlsx");
    book.save(&book_path, "xlsx")?;
    let loaded = Databook::open(&book_path)?;
    println!("Sheets: {:?}", loaded.titles());

    match book.export("csv") {
        Ok(_) => println!("csv unexpectedly exported a book"),
        Err(e) => println!("csv book export: {e}"),
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}

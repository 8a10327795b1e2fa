use crate::Compounds::authority::OfflineAuthority;
use crate::Compounds::formula::{calculate_molar_mass, format_formula, parse_elements};
use crate::Export::table::{ExportTable, compound_table};
use crate::Export::writers::{save_arff, save_csv};
use crate::laboratory::Laboratory;
use crate::settings::{DrpConfig, with_config};
use log::error;
use prettytable::{Cell, Row, Table, row};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub fn run_interactive_menu() {
    let config = with_config(|manager| manager.config().clone());
    let mut lab = match Laboratory::from_config(&config) {
        Ok(lab) => lab,
        Err(e) => {
            error!("{}; starting without descriptor plugins", e);
            Laboratory::new()
        }
    };
    loop {
        show_main_menu();
        let Some(choice) = get_user_input() else {
            break;
        };

        // None: input ended while a file name or formula was asked for
        let result = match choice.trim() {
            "1" => prompt("Formula: ").map(|formula| check_formula(&formula)),
            "2" => prompt("CSV file: ").map(|path| import_compounds(&mut lab, &config, &path)),
            "3" => {
                show_compounds(&lab);
                Some(Ok(()))
            }
            "4" => prompt("CSV file: ").map(|path| export(&lab, &config, &path, false)),
            "5" => prompt("ARFF file: ").map(|path| export(&lab, &config, &path, true)),
            "6" => {
                show_settings(&config);
                Some(Ok(()))
            }
            "7" => prompt("CSV file: ").map(|path| import_descriptor_values(&mut lab, &config, &path)),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("Invalid choice. Please try again.");
                Some(Ok(()))
            }
        };
        match result {
            Some(Ok(())) => {}
            Some(Err(e)) => println!("\x1b[31mError: {}\x1b[0m", e),
            None => break,
        }
    }
}
/* colors
Blue (\x1b[34m) - Welcome header text
Yellow (\x1b[33m) - Menu options
Cyan (\x1b[36m) - "Enter your choice:" prompt
Red (\x1b[31m) - errors
Reset (\x1b[0m) - Returns to normal color after each colored section
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n drp_data: compound guide, descriptors and model input for the lab \n \x1b[0m"
    );
    println!("\x1b[33m1. Check a molecular formula\x1b[0m");
    println!("\x1b[33m2. Import compounds from CSV\x1b[0m");
    println!("\x1b[33m3. Show compound guide\x1b[0m");
    println!("\x1b[33m4. Export compounds to CSV\x1b[0m");
    println!("\x1b[33m5. Export compounds to ARFF\x1b[0m");
    println!("\x1b[33m6. Show settings\x1b[0m");
    println!("\x1b[33m7. Import compound descriptor values from CSV\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    let _ = io::stdout().flush();
}

/// next line of stdin; `None` once input has ended
fn get_user_input() -> Option<String> {
    read_input(&mut io::stdin().lock())
}

fn read_input<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) => None,
        Ok(_) => Some(input),
        Err(e) => {
            error!("failed to read input: {}", e);
            None
        }
    }
}

fn prompt(text: &str) -> Option<String> {
    print!("{}", text);
    let _ = io::stdout().flush();
    get_user_input().map(|input| input.trim().to_string())
}

/// element table of a formula, with its molar mass in the last row
pub fn formula_table(formula: &str) -> Result<Table, Box<dyn Error>> {
    let (mass, elements) = calculate_molar_mass(formula)?;
    let mut table = Table::new();
    table.add_row(row!["Element", "Count"]);
    for (symbol, count) in &elements {
        table.add_row(row![symbol, count]);
    }
    table.add_row(row!["M, g/mol", format!("{:.3}", mass)]);
    Ok(table)
}

fn check_formula(formula: &str) -> Result<(), Box<dyn Error>> {
    let table = formula_table(formula)?;
    let elements = parse_elements(formula)?;
    println!("Hill order: {}", format_formula(&elements));
    table.printstd();
    Ok(())
}

fn import_compounds(
    lab: &mut Laboratory,
    config: &DrpConfig,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let file = File::open(path)?;
    let count = lab.import_compounds(
        BufReader::new(file),
        &config.default_lab_group,
        &OfflineAuthority,
        true,
    )?;
    println!("{} compounds imported into {}", count, config.default_lab_group);
    Ok(())
}

fn import_descriptor_values(
    lab: &mut Laboratory,
    config: &DrpConfig,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let file = File::open(path)?;
    let count = lab.import_descriptor_values(BufReader::new(file), &config.default_lab_group)?;
    println!("{} descriptor values recorded", count);
    Ok(())
}

/// the export table as a printable table, missing values left blank
pub fn pretty_table(export: &ExportTable) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(
        export.headers().into_iter().map(Cell::new).collect(),
    ));
    for row in &export.rows {
        let cells = export
            .columns
            .iter()
            .map(|c| Cell::new(row.get(&c.header).map(String::as_str).unwrap_or("")))
            .collect();
        table.add_row(Row::new(cells));
    }
    table
}

fn show_compounds(lab: &Laboratory) {
    if lab.guide.is_empty() {
        println!("The compound guide is empty.");
        return;
    }
    match compound_table(&lab.guide, lab.guide.compounds(), true) {
        Ok(export) => {
            pretty_table(&export).printstd();
        }
        Err(e) => println!("\x1b[31mError: {}\x1b[0m", e),
    }
}

fn export(
    lab: &Laboratory,
    config: &DrpConfig,
    path: &str,
    arff: bool,
) -> Result<(), Box<dyn Error>> {
    let table = compound_table(&lab.guide, lab.guide.compounds(), true)?;
    if arff {
        save_arff(&table, &config.arff_relation, Path::new(path))?;
    } else {
        save_csv(&table, Path::new(path))?;
    }
    println!("{} compounds written to {}", table.len(), path);
    Ok(())
}

fn show_settings(config: &DrpConfig) {
    let mut table = Table::new();
    table.add_row(row!["Setting", "Value"]);
    table.add_row(row![
        "Descriptor plugins",
        config.mol_descriptor_plugins.join(", ")
    ]);
    table.add_row(row!["Lab group", config.default_lab_group]);
    table.add_row(row!["ARFF relation", config.arff_relation]);
    table.add_row(row!["Log level", config.log_level]);
    table.add_row(row![
        "Log file",
        config.log_file.as_deref().unwrap_or("-")
    ]);
    table.printstd();
}

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::product::Product;

/// Deduplicate by identifier: a repeat replaces the earlier record's content
/// but keeps its position. Records with an empty identifier are dropped.
pub fn consolidate(records: Vec<Product>) -> Vec<Product> {
    let mut unique: Vec<Product> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if record.identifier.is_empty() {
            continue;
        }
        match index.get(&record.identifier) {
            Some(&i) => unique[i] = record,
            None => {
                index.insert(record.identifier.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

/// Pretty JSON array, one-space indent, non-ASCII written as-is.
pub fn write_json(path: &Path, products: &[Product]) -> Result<()> {
    let file = create(path)?;
    let mut out = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    products
        .serialize(&mut ser)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Headerless CSV: identifier, marketing code, title, source URL.
pub fn write_csv(path: &Path, products: &[Product]) -> Result<()> {
    let file = create(path)?;
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for p in products {
        w.write_record(p.csv_row())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    File::create(path).with_context(|| format!("Failed creating file {}", path.display()))
}

/// Paths that were actually written.
#[derive(Debug, Default)]
pub struct Written {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

/// Write both files. Either may fail on its own (logged); only losing both
/// is an error.
pub fn write_all(json_path: &Path, csv_path: &Path, products: &[Product]) -> Result<Written> {
    let mut written = Written::default();

    match write_json(json_path, products) {
        Ok(()) => {
            info!("Wrote {} products to {}", products.len(), json_path.display());
            written.json = Some(json_path.to_path_buf());
        }
        Err(e) => error!("Unable to create JSON file: {:#}", e),
    }

    match write_csv(csv_path, products) {
        Ok(()) => {
            info!("Wrote {} rows to {}", products.len(), csv_path.display());
            written.csv = Some(csv_path.to_path_buf());
        }
        Err(e) => error!("Unable to create CSV file: {:#}", e),
    }

    if written.json.is_none() && written.csv.is_none() {
        bail!(ScrapeError::NoOutput);
    }
    Ok(written)
}

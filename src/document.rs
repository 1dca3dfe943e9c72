//! Experiment config document loading.
//!
//! Experiment parameters arrive as YAML or CSV files and are normalized
//! into [`bson::Document`] — an insertion-ordered, schema-less mapping
//! whose values cover everything the store can express (the
//! `Null|Bool|Number|String|Array|Map|DateTime|ObjectId` union). Key
//! order survives a load → serialize round trip.

use std::path::Path;

use anyhow::{bail, Context, Result};
use bson::{Bson, Document};

/// Parse a YAML file into a config document.
///
/// Anchors and aliases resolve per the YAML spec, comments are ignored,
/// and mapping order is preserved. The top level must be a mapping.
pub fn load_yaml_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config document: {}", path.display()))?;
    parse_yaml_document(&content)
        .with_context(|| format!("Failed to parse YAML config document: {}", path.display()))
}

/// Parse YAML text into a config document.
pub fn parse_yaml_document(content: &str) -> Result<Document> {
    let value: Bson = serde_yaml::from_str(content)?;
    match value {
        Bson::Document(doc) => Ok(doc),
        other => bail!(
            "config document must be a mapping at the top level, got {:?}",
            other.element_type()
        ),
    }
}

/// Render a config document back to YAML, preserving key order.
pub fn document_to_yaml(doc: &Document) -> Result<String> {
    serde_yaml::to_string(doc).context("Failed to render config document as YAML")
}

/// Parse a CSV file into one document per data row.
///
/// The header row supplies the keys. Cells become integers, floats, or
/// booleans when they parse as such, strings otherwise.
pub fn load_csv_documents(path: &Path) -> Result<Vec<Document>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read config document: {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let mut docs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut doc = Document::new();
        for (key, cell) in headers.iter().zip(record.iter()) {
            doc.insert(key, coerce_scalar(cell));
        }
        docs.push(doc);
    }
    Ok(docs)
}

/// Load a config document, dispatching on the file extension.
///
/// A single-row CSV becomes that row's document; a multi-row CSV is
/// wrapped as `{rows: [...]}` so one run still stores one document.
pub fn load_config_document(path: &Path) -> Result<Document> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => load_yaml_document(path),
        Some("csv") => {
            let mut docs = load_csv_documents(path)?;
            if docs.len() == 1 {
                Ok(docs.remove(0))
            } else {
                let mut wrapper = Document::new();
                wrapper.insert(
                    "rows",
                    Bson::Array(docs.into_iter().map(Bson::Document).collect()),
                );
                Ok(wrapper)
            }
        }
        _ => bail!(
            "Unsupported config document format: '{}'. Must be .yaml, .yml, or .csv.",
            path.display()
        ),
    }
}

fn coerce_scalar(cell: &str) -> Bson {
    if let Ok(value) = cell.parse::<i64>() {
        return Bson::Int64(value);
    }
    if let Ok(value) = cell.parse::<f64>() {
        return Bson::Double(value);
    }
    match cell {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn yaml_round_trip_preserves_pairs_and_key_order() {
        let source = "zeta: 1\nmodel:\n  layers: 4\n  dropout: 0.1\nalpha: [1, 2, 3]\n";
        let doc = parse_yaml_document(source).unwrap();

        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["zeta", "model", "alpha"]
        );

        let rendered = document_to_yaml(&doc).unwrap();
        let reparsed = parse_yaml_document(&rendered).unwrap();
        assert_eq!(doc, reparsed);
        assert_eq!(
            reparsed.keys().collect::<Vec<_>>(),
            vec!["zeta", "model", "alpha"]
        );
    }

    #[test]
    fn yaml_anchors_resolve() {
        let source = "base: &lr 0.001\nfine_tune: *lr\n";
        let doc = parse_yaml_document(source).unwrap();
        assert_eq!(doc.get("base"), doc.get("fine_tune"));
    }

    #[test]
    fn yaml_comments_are_ignored() {
        let source = "# experiment settings\nlr: 0.01 # learning rate\n";
        let doc = parse_yaml_document(source).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["lr"]);
    }

    #[test]
    fn yaml_top_level_scalar_is_rejected() {
        let err = parse_yaml_document("just a string").unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn csv_rows_become_typed_documents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grid.csv");
        std::fs::write(&path, "lr,epochs,decay,optimizer\n0.01,10,true,adam\n0.1,20,false,sgd\n")
            .unwrap();

        let docs = load_csv_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get("lr"), Some(&Bson::Double(0.01)));
        assert_eq!(docs[0].get("epochs"), Some(&Bson::Int64(10)));
        assert_eq!(docs[0].get("decay"), Some(&Bson::Boolean(true)));
        assert_eq!(docs[1].get("optimizer"), Some(&Bson::String("sgd".to_string())));
        assert_eq!(
            docs[0].keys().collect::<Vec<_>>(),
            vec!["lr", "epochs", "decay", "optimizer"]
        );
    }

    #[test]
    fn dispatch_wraps_multi_row_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grid.csv");
        std::fs::write(&path, "lr\n0.01\n0.1\n").unwrap();

        let doc = load_config_document(&path).unwrap();
        let rows = doc.get_array("rows").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn dispatch_rejects_unknown_extension() {
        let err = load_config_document(Path::new("params.toml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config document format"));
    }
}

// Dataset module
// Read-only table of nutrition documents loaded from the preprocessed CSV


use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::{RagError, Result};

pub type DocumentId = i64;

/// A single row of the nutrition dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub description: String,
    /// Every other column of the row, keyed by column name
    pub attributes: BTreeMap<String, String>,
}

impl Document {
    #[inline]
    pub fn new(id: DocumentId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Ordered, immutable collection of documents with lookup by id.
///
/// Iteration order is the row order of the source file and defines the
/// position of each document in a built index.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    positions: HashMap<DocumentId, usize>,
}

impl DocumentStore {
    /// Build a store from documents already in memory.
    ///
    /// Fails on duplicate ids.
    #[inline]
    pub fn from_documents(documents: Vec<Document>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(documents.len());
        for (position, document) in documents.iter().enumerate() {
            if positions.insert(document.id, position).is_some() {
                return Err(RagError::Dataset(format!(
                    "Duplicate document id {}",
                    document.id
                )));
            }
        }
        Ok(Self {
            documents,
            positions,
        })
    }

    /// Load the preprocessed dataset CSV.
    ///
    /// Rows whose id does not parse as an integer are skipped, as are rows
    /// repeating an id already seen.
    #[inline]
    pub fn load_csv<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading dataset from {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            RagError::Dataset(format!("Failed to open dataset {}: {}", path.display(), e))
        })?;

        let store = Self::from_reader(file, config)?;
        info!(
            "Loaded {} documents from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    #[inline]
    pub fn from_reader<R: Read>(reader: R, config: &DatasetConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| RagError::Dataset(format!("Failed to read dataset header: {}", e)))?
            .clone();

        let id_index = column_index(&headers, &config.id_column)?;
        let description_index = column_index(&headers, &config.description_column)?;

        let mut documents = Vec::new();
        let mut positions = HashMap::new();
        let mut skipped_ids = 0usize;
        let mut duplicates = 0usize;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                RagError::Dataset(format!("Malformed dataset row {}: {}", row + 1, e))
            })?;

            let raw_id = record.get(id_index).unwrap_or_default().trim();
            let Some(id) = parse_id(raw_id) else {
                skipped_ids += 1;
                continue;
            };

            if positions.contains_key(&id) {
                duplicates += 1;
                continue;
            }

            let description = record
                .get(description_index)
                .unwrap_or_default()
                .to_string();

            let attributes = headers
                .iter()
                .enumerate()
                .filter(|&(index, _)| index != id_index && index != description_index)
                .filter_map(|(index, name)| {
                    record
                        .get(index)
                        .map(|value| (name.to_string(), value.to_string()))
                })
                .collect();

            positions.insert(id, documents.len());
            documents.push(Document {
                id,
                description,
                attributes,
            });
        }

        if skipped_ids > 0 {
            warn!(
                "Skipped {} dataset rows without a numeric '{}' value",
                skipped_ids, config.id_column
            );
        }
        if duplicates > 0 {
            warn!(
                "Skipped {} dataset rows repeating an existing id",
                duplicates
            );
        }

        Ok(Self {
            documents,
            positions,
        })
    }

    #[inline]
    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.positions
            .get(&id)
            .and_then(|&position| self.documents.get(position))
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Document ids in iteration order
    #[inline]
    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|d| d.id).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<'a> IntoIterator for &'a DocumentStore {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.trim() == column)
        .ok_or_else(|| RagError::Dataset(format!("Dataset has no '{}' column", column)))
}

/// Parses integer ids, accepting the `123.0` form pandas writes for float columns
fn parse_id(raw: &str) -> Option<DocumentId> {
    if let Ok(id) = raw.parse::<DocumentId>() {
        return Some(id);
    }
    raw.strip_suffix(".0")
        .and_then(|integral| integral.parse::<DocumentId>().ok())
}

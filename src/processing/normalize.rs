/*! Record normalization

Rewrites every record of the index in canonical form,
dropping repeated `media_urls` (the first occurrence is kept).
Records that are already canonical are not touched.
!*/
use std::fs;
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};
use serde_json::Value;

use crate::error::Error;
use crate::io::{to_canonical_string, Store};

/// Normalize a single record file. Returns whether the file was rewritten.
///
/// The record is handled as plain json: it does not need to be valid to be normalized.
pub fn normalize_record(store: &Store, path: &Path) -> Result<bool, Error> {
    let blob = fs::read_to_string(path).map_err(|e| Error::ResourceRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut value: Value = serde_json::from_str(&blob).map_err(|e| Error::InvalidRecord {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if let Some(Value::Array(urls)) = value.get_mut("media_urls") {
        let deduped: Vec<Value> = urls.drain(..).unique_by(|url| url.to_string()).collect();
        *urls = deduped;
    }

    if to_canonical_string(&value)? == blob {
        debug!("{:?} is already canonical", path);
        return Ok(false);
    }

    store.write_raw(path, &value)?;
    println!("{}", path.display());
    Ok(true)
}

/// Normalize every record of the index. Returns the number of files rewritten.
pub fn normalize(store: &Store) -> Result<usize, Error> {
    let mut changed = 0;
    for path in store.record_paths()? {
        if normalize_record(store, &path)? {
            changed += 1;
        }
    }

    info!("normalized {} records", changed);
    Ok(changed)
}

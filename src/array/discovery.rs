//! Shared object-store discovery helpers for array files.
//!
//! Both [`crate::array::reader::ArrayObjectReader`] and
//! [`crate::array::writer::ArrayObjectWriter`] need to discover:
//! - the [`ArrayObjectMetadata`] of every array-file object (from `array_meta/*.jsonl`)
//! - the array-file objects themselves (from `array/*`), named `<object_index>.djc`
//! - the next free object index

use futures::TryStreamExt;
use object_store::{ObjectStore, path::Path};

use crate::{array::metadata::ArrayObjectMetadata, consts};

#[derive(Debug, thiserror::Error)]
pub enum ArrayDiscoveryError {
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error(transparent)]
    Json(#[from] simd_json::Error),

    #[error("object index {object_index} described more than once")]
    DuplicateObjectIndex { object_index: usize },
}

/// Location of the array-file object with index `object_index`.
pub fn array_object_path(dir: &Path, object_index: usize) -> Path {
    dir.child(consts::ARRAY_DIR).child(format!(
        "{object_index:020}.{}",
        consts::ARRAY_FILE_EXTENSION
    ))
}

/// Location of the metadata object for `object_index`.
pub fn metadata_object_path(dir: &Path, object_index: usize) -> Path {
    dir.child(consts::ARRAY_META_DIR)
        .child(format!("{object_index:020}.jsonl"))
}

/// Read every metadata line under `array_meta/`, sorted by object index.
///
/// # Errors
/// [`ArrayDiscoveryError::DuplicateObjectIndex`] if two lines describe the same object.
pub async fn read_object_metadatas<S: ObjectStore>(
    store: &S,
    dir: &Path,
) -> Result<Vec<ArrayObjectMetadata>, ArrayDiscoveryError> {
    let metadata_path = dir.child(consts::ARRAY_META_DIR);
    let mut objects = store.list(Some(&metadata_path));

    let mut metadatas = Vec::new();
    while let Some(json_metadata_obj) = objects.try_next().await? {
        let bytes = store.get(&json_metadata_obj.location).await?.bytes().await?;

        // JSONL: one metadata object per line.
        for line in bytes.split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let mut line_buf = line.to_vec();
            let metadata: ArrayObjectMetadata = simd_json::from_slice(&mut line_buf)?;
            metadatas.push(metadata);
        }
    }

    metadatas.sort_by_key(|m| m.object_index);
    if let Some(pair) = metadatas
        .windows(2)
        .find(|w| w[0].object_index == w[1].object_index)
    {
        return Err(ArrayDiscoveryError::DuplicateObjectIndex {
            object_index: pair[0].object_index,
        });
    }
    Ok(metadatas)
}

/// List array-file objects under `array/` as `(object_index, location)`, sorted by index.
///
/// Objects whose name is not `<index>.djc` are skipped.
pub async fn list_array_objects<S: ObjectStore>(
    store: &S,
    dir: &Path,
) -> Result<Vec<(usize, Path)>, ArrayDiscoveryError> {
    let array_path = dir.child(consts::ARRAY_DIR);
    let mut objects = store.list(Some(&array_path));

    let mut found = Vec::new();
    while let Some(obj) = objects.try_next().await? {
        let Some(index) = obj.location.filename().and_then(parse_object_index) else {
            continue;
        };
        found.push((index, obj.location));
    }
    found.sort_by_key(|(index, _)| *index);
    Ok(found)
}

fn parse_object_index(file_name: &str) -> Option<usize> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if extension != consts::ARRAY_FILE_EXTENSION {
        return None;
    }
    stem.parse().ok()
}

/// One past the largest object index present under `array/`, or 0 for an empty directory.
pub async fn next_object_index<S: ObjectStore>(
    store: &S,
    dir: &Path,
) -> Result<usize, ArrayDiscoveryError> {
    let objects = list_array_objects(store, dir).await?;
    Ok(objects.last().map(|(index, _)| index + 1).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_names_parse_back() {
        let dir = Path::from("datasets/train");
        let path = array_object_path(&dir, 12);
        assert_eq!(
            path.as_ref(),
            "datasets/train/array/00000000000000000012.djc"
        );
        assert_eq!(path.filename().and_then(parse_object_index), Some(12));
        assert_eq!(parse_object_index("12.jsonl"), None);
        assert_eq!(parse_object_index("abc.djc"), None);
        assert_eq!(
            metadata_object_path(&dir, 3).as_ref(),
            "datasets/train/array_meta/00000000000000000003.jsonl"
        );
    }
}

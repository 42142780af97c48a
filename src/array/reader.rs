//! Array-file reader.
//!
//! This module contains [`ArrayObjectReader`], an `object_store`-backed reader for array-file
//! objects and their metadata.
//!
//! ## Layout
//! This reader expects the same layout as [`crate::array::writer::ArrayObjectWriter`]:
//! - `array_meta/*.jsonl` contains JSONL [`ArrayObjectMetadata`] entries (one per line).
//! - `array/*` contains array-file objects named `<object_index>.djc`.

use bytes::{Buf, Bytes};
use object_store::ObjectStore;
use tracing::debug;

use crate::{
    array::{
        RaggedArray, datatype::Element, discovery, error::ArrayStoreError, format,
        metadata::ArrayObjectMetadata,
    },
    dtype::DataType,
};

pub struct ArrayObjectReader<S: ObjectStore> {
    store: S,
    dir: object_store::path::Path,
    metadatas: Vec<ArrayObjectMetadata>,
}

impl<S: ObjectStore> ArrayObjectReader<S> {
    /// Create a reader with no known objects.
    ///
    /// This does **not** scan the store. Use [`Self::load_from_store`] to hydrate existing
    /// state.
    pub fn new(store: S, dir: object_store::path::Path) -> Self {
        Self {
            store,
            dir,
            metadatas: Vec::new(),
        }
    }

    /// Hydrate a reader from the metadata objects under `dir`.
    pub async fn load_from_store(
        store: S,
        dir: object_store::path::Path,
    ) -> Result<Self, ArrayStoreError> {
        let metadatas = discovery::read_object_metadatas(&store, &dir).await?;
        debug!(objects = metadatas.len(), dir = %dir, "loaded array metadata");
        Ok(Self {
            store,
            dir,
            metadatas,
        })
    }

    /// Metadata of every known object, sorted by object index.
    pub fn metadatas(&self) -> &[ArrayObjectMetadata] {
        &self.metadatas
    }

    pub fn metadata(&self, object_index: usize) -> Option<&ArrayObjectMetadata> {
        self.metadatas
            .binary_search_by_key(&object_index, |m| m.object_index)
            .ok()
            .map(|i| &self.metadatas[i])
    }

    /// Read every array stored in object `object_index`.
    ///
    /// # Errors
    /// - [`ArrayStoreError::ObjectMetadataMissing`] if the object is unknown.
    /// - [`ArrayStoreError::DataTypeMismatch`] if the object does not hold `T` elements.
    /// - [`ArrayStoreError::ArrayCountMismatch`] if the object holds a different number of
    ///   arrays than its metadata records.
    pub async fn read_arrays<T: Element>(
        &self,
        object_index: usize,
    ) -> Result<Vec<RaggedArray<'static, T>>, ArrayStoreError> {
        let metadata = self.checked_metadata(object_index, Some(T::TYPE))?;
        let mut reader = self.fetch(object_index).await?.reader();

        let mut arrays = Vec::with_capacity(metadata.num_arrays);
        while reader.get_ref().has_remaining() {
            arrays.push(RaggedArray::read_from(&mut reader)?);
        }
        check_count(metadata, arrays.len())?;
        Ok(arrays)
    }

    /// Read the arrays of every known object, concatenated in object order.
    pub async fn read_all<T: Element>(
        &self,
    ) -> Result<Vec<RaggedArray<'static, T>>, ArrayStoreError> {
        let mut arrays = Vec::new();
        for metadata in &self.metadatas {
            arrays.extend(self.read_arrays::<T>(metadata.object_index).await?);
        }
        Ok(arrays)
    }

    /// Read only the row splits of every array in object `object_index`.
    ///
    /// Data blocks are skipped without decompressing them. Regular arrays yield an empty
    /// table.
    pub async fn read_row_splits(
        &self,
        object_index: usize,
    ) -> Result<Vec<Vec<i64>>, ArrayStoreError> {
        let metadata = self.checked_metadata(object_index, None)?;
        let mut reader = self.fetch(object_index).await?.reader();

        let mut tables = Vec::with_capacity(metadata.num_arrays);
        while reader.get_ref().has_remaining() {
            tables.push(format::read_row_splits(&mut reader, true)?);
        }
        check_count(metadata, tables.len())?;
        Ok(tables)
    }

    fn checked_metadata(
        &self,
        object_index: usize,
        data_type: Option<DataType>,
    ) -> Result<&ArrayObjectMetadata, ArrayStoreError> {
        let metadata = self
            .metadata(object_index)
            .ok_or(ArrayStoreError::ObjectMetadataMissing { object_index })?;
        match data_type {
            Some(actual) if actual != metadata.data_type => {
                Err(ArrayStoreError::DataTypeMismatch {
                    expected: metadata.data_type,
                    actual,
                })
            }
            _ => Ok(metadata),
        }
    }

    async fn fetch(&self, object_index: usize) -> Result<Bytes, ArrayStoreError> {
        let path = discovery::array_object_path(&self.dir, object_index);
        let bytes = self.store.get(&path).await?.bytes().await?;
        debug!(object_index, bytes = bytes.len(), "fetched array object");
        Ok(bytes)
    }
}

fn check_count(metadata: &ArrayObjectMetadata, actual: usize) -> Result<(), ArrayStoreError> {
    if actual != metadata.num_arrays {
        return Err(ArrayStoreError::ArrayCountMismatch {
            object_index: metadata.object_index,
            expected: metadata.num_arrays,
            actual,
        });
    }
    Ok(())
}

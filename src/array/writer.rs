//! Array-file writer.
//!
//! [`ArrayObjectWriter`] persists batches of [`RaggedArray`]s in an `object_store`.
//!
//! ## Layout
//! - `array/<object_index>.djc`: the arrays of one batch, serialized back to back.
//! - `array_meta/<object_index>.jsonl`: one [`ArrayObjectMetadata`] line for that object.
//!
//! Object indices are allocated sequentially by the writer. A writer created with
//! [`ArrayObjectWriter::load_from_store`] continues after the objects already present.

use bytes::{BufMut, BytesMut};
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use crate::{
    array::{
        RaggedArray,
        chunking::ChunkLimit,
        datatype::Element,
        discovery,
        error::ArrayStoreError,
        metadata::ArrayObjectMetadata,
    },
    codec::ZstdCodec,
};

pub struct ArrayObjectWriter<S: ObjectStore> {
    store: S,
    dir: object_store::path::Path,
    codec: ZstdCodec,
    next_object_index: usize,
}

impl<S: ObjectStore> ArrayObjectWriter<S> {
    /// Create a writer that starts at object index 0.
    ///
    /// This does **not** scan the store; objects already present with the same indices are
    /// overwritten. Use [`Self::load_from_store`] to append to existing state.
    pub fn new(store: S, dir: object_store::path::Path) -> Self {
        Self {
            store,
            dir,
            codec: ZstdCodec::default(),
            next_object_index: 0,
        }
    }

    /// Create a writer that continues after the last array-file object under `dir`.
    pub async fn load_from_store(
        store: S,
        dir: object_store::path::Path,
    ) -> Result<Self, ArrayStoreError> {
        let next_object_index = discovery::next_object_index(&store, &dir).await?;
        Ok(Self {
            store,
            dir,
            codec: ZstdCodec::default(),
            next_object_index,
        })
    }

    pub fn with_codec(mut self, codec: ZstdCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn next_object_index(&self) -> usize {
        self.next_object_index
    }

    /// Write one array as its own object.
    pub async fn write_array<T: Element>(
        &mut self,
        array: &RaggedArray<'_, T>,
    ) -> Result<ArrayObjectMetadata, ArrayStoreError> {
        self.write_arrays(std::slice::from_ref(array)).await
    }

    /// Write `arrays` back to back into one new object and record its metadata line.
    ///
    /// The array object is written before its metadata, so a reader never sees metadata for
    /// an object that does not exist yet.
    pub async fn write_arrays<T: Element>(
        &mut self,
        arrays: &[RaggedArray<'_, T>],
    ) -> Result<ArrayObjectMetadata, ArrayStoreError> {
        let object_index = self.next_object_index;
        let object_path = discovery::array_object_path(&self.dir, object_index);

        let mut writer = BytesMut::new().writer();
        for array in arrays {
            array.write_to_with(&mut writer, &self.codec)?;
        }
        let payload = writer.into_inner().freeze();
        let payload_len = payload.len();
        self.store
            .put(&object_path, PutPayload::from_bytes(payload))
            .await?;

        let metadata = ArrayObjectMetadata {
            object_index,
            path: object_path.to_string(),
            data_type: T::TYPE,
            num_arrays: arrays.len(),
            rows: arrays.iter().map(|a| a.first_dimension()).collect(),
            elements: arrays.iter().map(|a| a.size()).collect(),
            ragged: arrays.iter().any(|a| a.is_ragged()),
        };
        let mut json_line = simd_json::serde::to_vec(&metadata)?;
        json_line.push(b'\n');
        let metadata_path = discovery::metadata_object_path(&self.dir, object_index);
        self.store
            .put(&metadata_path, PutPayload::from(json_line))
            .await?;

        self.next_object_index += 1;
        debug!(
            object_index,
            arrays = arrays.len(),
            bytes = payload_len,
            path = %object_path,
            "wrote array object"
        );
        Ok(metadata)
    }

    /// Plan chunks over `array` and write each chunk as its own object.
    pub async fn write_chunked<T: Element>(
        &mut self,
        array: &RaggedArray<'_, T>,
        limit: &ChunkLimit,
    ) -> Result<Vec<ArrayObjectMetadata>, ArrayStoreError> {
        let plan = array.plan_chunks(limit)?;
        let mut metadatas = Vec::with_capacity(plan.len());
        for chunk in array.chunks(&plan)? {
            metadatas.push(self.write_array(&chunk).await?);
        }
        Ok(metadatas)
    }
}

use serde::{Deserialize, Serialize};

use crate::dtype::DataType;

/// One JSON line in `array_meta/`, describing one array-file object in `array/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayObjectMetadata {
    pub object_index: usize,
    /// Location of the array-file object, relative to the store root.
    pub path: String,
    pub data_type: DataType,
    pub num_arrays: usize,
    /// Batch extent of each array in the object, in write order.
    pub rows: Vec<usize>,
    /// Element count of each array in the object, in write order.
    pub elements: Vec<usize>,
    pub ragged: bool,
}

impl ArrayObjectMetadata {
    pub fn total_rows(&self) -> usize {
        self.rows.iter().sum()
    }

    pub fn total_elements(&self) -> usize {
        self.elements.iter().sum()
    }
}

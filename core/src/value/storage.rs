use anyhow::{Result, bail};

use super::value::Value;
use crate::error::{IndexKind, VmError};
use crate::util::fast_map::{FastHashMap, fast_hash_map_new, sorted_keys};

/// Sparse register file written by WS and read by RS.
///
/// Locations persist for the lifetime of the VM, so values written by the
/// control value program stay visible to every glyph program.
#[derive(Debug, Clone, Default)]
pub struct StorageArea {
    cells: FastHashMap<u64, Value>,
}

impl StorageArea {
    pub fn new() -> Self {
        Self {
            cells: fast_hash_map_new(),
        }
    }

    pub fn read(&self, location: u64) -> Result<Value> {
        match self.cells.get(&location) {
            Some(value) => Ok(*value),
            None => bail!(VmError::UninitializedStorage(location)),
        }
    }

    #[inline]
    pub fn get(&self, location: u64) -> Option<Value> {
        self.cells.get(&location).copied()
    }

    pub fn write(&mut self, location: u64, value: Value) {
        self.cells.insert(location, value);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Written cells ordered by location.
    pub fn entries(&self) -> Vec<(u64, Value)> {
        sorted_keys(&self.cells)
            .into_iter()
            .map(|loc| (loc, self.cells[&loc]))
            .collect()
    }
}

/// Control value table, seeded from the font's `cvt` and updated by WCVTP/WCVTF.
#[derive(Debug, Clone, Default)]
pub struct ControlValueTable {
    values: Vec<Value>,
}

impl ControlValueTable {
    pub fn from_funits(cvt: &[i16]) -> Self {
        Self {
            values: cvt.iter().map(|&v| Value::Int(v as i64)).collect(),
        }
    }

    pub fn get(&self, index: u32) -> Result<Value> {
        match self.values.get(index as usize) {
            Some(value) => Ok(*value),
            None => bail!(Self::out_of_range(index)),
        }
    }

    pub fn set(&mut self, index: u32, value: Value) -> Result<()> {
        match self.values.get_mut(index as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => bail!(Self::out_of_range(index)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    fn out_of_range(index: u32) -> VmError {
        VmError::InvalidIndex {
            kind: IndexKind::ControlValue,
            index: index as i64,
        }
    }
}

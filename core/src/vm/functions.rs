use std::sync::Arc;

use crate::bytecode::Instruction;
use crate::util::fast_map::{FastHashMap, fast_hash_map_new, sorted_keys};

/// Function id -> captured body.
///
/// Bodies are created once by FDEF/ENDF and never replaced afterwards.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    bodies: FastHashMap<u32, Arc<[Instruction]>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self {
            bodies: fast_hash_map_new(),
        }
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<Arc<[Instruction]>> {
        self.bodies.get(&id).cloned()
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Returns `false` and keeps the existing body when `id` is already defined.
    pub fn define(&mut self, id: u32, body: Vec<Instruction>) -> bool {
        if self.bodies.contains_key(&id) {
            return false;
        }
        self.bodies.insert(id, body.into());
        true
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        sorted_keys(&self.bodies)
    }
}

//! Read-only view of the font tables the VM consumes.
//!
//! Table parsing lives outside this crate; a parser hands the raw `fpgm`,
//! `prep` and `cvt` contents over through [`FontContext`]. One context can be
//! shared by any number of VMs, one per thread.

use std::sync::Arc;

pub trait FontContext: Send + Sync {
    /// Raw `fpgm` bytecode, if the font has one.
    fn font_program(&self) -> Option<&[u8]>;

    /// Raw `prep` bytecode, if the font has one.
    fn control_value_program(&self) -> Option<&[u8]> {
        None
    }

    /// `cvt` entries in font units.
    fn control_values(&self) -> &[i16] {
        &[]
    }
}

/// Owned table contents.
#[derive(Debug, Clone, Default)]
pub struct FontTables {
    pub fpgm: Option<Vec<u8>>,
    pub prep: Option<Vec<u8>>,
    pub cvt: Vec<i16>,
}

impl FontTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_program(mut self, fpgm: impl Into<Vec<u8>>) -> Self {
        self.fpgm = Some(fpgm.into());
        self
    }

    pub fn with_control_value_program(mut self, prep: impl Into<Vec<u8>>) -> Self {
        self.prep = Some(prep.into());
        self
    }

    pub fn with_control_values(mut self, cvt: impl Into<Vec<i16>>) -> Self {
        self.cvt = cvt.into();
        self
    }

    pub fn shared(self) -> Arc<dyn FontContext> {
        Arc::new(self)
    }
}

impl FontContext for FontTables {
    fn font_program(&self) -> Option<&[u8]> {
        self.fpgm.as_deref()
    }

    fn control_value_program(&self) -> Option<&[u8]> {
        self.prep.as_deref()
    }

    fn control_values(&self) -> &[i16] {
        &self.cvt
    }
}

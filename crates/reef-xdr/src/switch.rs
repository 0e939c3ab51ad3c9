use crate::error::{Error, Result};

/// Discriminated-union state for one pass over a tagged structure.
///
/// A `switch` field opens a switch and records its value. Each following
/// `case` arm is active iff the recorded value is among its candidates; a
/// `default` arm is active iff no earlier case matched. Untagged fields
/// inside an open switch follow the currently active arm; outside any
/// switch they are unconditional. A later `switch` resets everything —
/// switches never nest.
#[derive(Debug, Default)]
pub struct SwitchState {
    open: bool,
    value: u32,
    active: bool,
    matched: bool,
}

impl SwitchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch(&mut self, value: u32) {
        self.open = true;
        self.value = value;
        self.active = false;
        self.matched = false;
    }

    pub fn case(&mut self, candidates: &[u32]) -> Result<bool> {
        if !self.open {
            return Err(Error::SchemaMismatch("case arm without a preceding switch"));
        }
        self.active = candidates.contains(&self.value);
        if self.active {
            self.matched = true;
        }
        Ok(self.active)
    }

    pub fn default_arm(&mut self) -> Result<bool> {
        if !self.open {
            return Err(Error::SchemaMismatch(
                "default arm without a preceding switch",
            ));
        }
        self.active = !self.matched;
        Ok(self.active)
    }

    /// Whether an untagged field at this point is encoded.
    pub fn armed(&self) -> bool {
        !self.open || self.active
    }
}

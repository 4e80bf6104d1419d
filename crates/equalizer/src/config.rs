//! Pipeline configuration.
//!
//! All fields have defaults, so an empty document is a valid configuration:
//!
//! ```yaml
//! workers: 8            # dedicated pool; omit to use the global rayon pool
//! builder:
//!   strategy: local_merge
//!   rows_per_task: 16
//!   verify: false
//! mapping: normalized
//! rounding: half_up
//! ```

use equalize_common::{EqualizeError, EqualizeResult};
use serde::{Deserialize, Serialize};

use crate::builder::BuilderConfig;
use crate::mapper::{MappingMode, Rounding};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Size of a dedicated worker pool. `None` runs on the global rayon pool.
    pub workers: Option<usize>,
    pub builder: BuilderConfig,
    pub mapping: MappingMode,
    pub rounding: Rounding,
}

impl PipelineConfig {
    pub fn validate(&self) -> EqualizeResult<()> {
        if self.workers == Some(0) {
            return Err(EqualizeError::InvalidInput(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.builder.rows_per_task == Some(0) {
            return Err(EqualizeError::InvalidInput(
                "rows_per_task must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

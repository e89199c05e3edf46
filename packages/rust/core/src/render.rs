//! Visualization contract for the combined frequency table.

use wordy_shared::Result;
use wordy_text::FrequencyTable;

/// Displays a frequency table (word cloud, chart, ...).
///
/// Rendering is informational: the pipeline logs a failure and carries on.
pub trait FrequencyRenderer: Send + Sync {
    fn render(&self, table: &FrequencyTable) -> Result<()>;
}

//! Terminal bar chart for the combined word frequencies.

use std::fmt::Write as _;

use indicatif::ProgressBar;
use wordy_core::render::FrequencyRenderer;
use wordy_shared::Result;
use wordy_text::FrequencyTable;

/// Words shown in the chart.
const CHART_ROWS: usize = 20;

/// Width of the longest bar, in cells.
const BAR_WIDTH: usize = 40;

/// Prints the most frequent words as horizontal bars.
///
/// The spinner is suspended while printing so the chart is not overdrawn.
pub(crate) struct TerminalChart {
    spinner: ProgressBar,
}

impl TerminalChart {
    pub(crate) fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }
}

impl FrequencyRenderer for TerminalChart {
    fn render(&self, table: &FrequencyTable) -> Result<()> {
        let chart = draw(table, CHART_ROWS);
        self.spinner.suspend(|| println!("{chart}"));
        Ok(())
    }
}

/// Lay out the top `rows` words. Bars scale against the most frequent word.
fn draw(table: &FrequencyTable, rows: usize) -> String {
    let top = table.top(rows);
    let Some(&(_, max)) = top.first() else {
        return "\n  No words to chart.\n".to_string();
    };

    let label_width = top.iter().map(|(w, _)| w.chars().count()).max().unwrap_or(0);
    let mut out = format!(
        "\n  Top {} of {} words ({} occurrences)\n\n",
        top.len(),
        table.len(),
        table.total()
    );

    for (word, count) in top {
        let cells = ((count as u128 * BAR_WIDTH as u128) / max as u128).max(1) as usize;
        let _ = writeln!(
            out,
            "  {word:<label_width$}  {bar} {count}",
            bar = "█".repeat(cells)
        );
    }

    out
}

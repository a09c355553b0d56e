use serde::Serialize;

use crate::line::StocktakeLine;

/// Summary of counted differences, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyReport {
    pub lines: usize,
    pub changed_lines: usize,
    pub surplus_lines: usize,
    pub shortage_lines: usize,
    /// Sum of all discrepancies (units are mixed; indicative only).
    pub net_delta: f64,
}

impl DiscrepancyReport {
    pub fn from_lines(lines: &[StocktakeLine]) -> Self {
        lines.iter().fold(Self::default(), |mut report, line| {
            report.lines += 1;
            let delta = line.discrepancy();
            if line.is_changed() {
                report.changed_lines += 1;
                report.net_delta += delta;
            }
            if delta > 0.0 {
                report.surplus_lines += 1;
            } else if delta < 0.0 {
                report.shortage_lines += 1;
            }
            report
        })
    }
}

//! Post-scan coverage checks over the collected location ranges.

use crate::scanner::{Scan, State};

/// Reason a parameter's location list failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageFailure {
    /// The expected line sequence never completed.
    SequenceIncomplete { state: State },
    LocationListMissing,
    Discontinuous { prev_end: u64, next_start: u64 },
    IncompleteCoverage {
        prologue_end: u64,
        epilogue_begin: u64,
        first_start: u64,
        last_end: u64,
    },
}

impl CoverageFailure {
    /// Human-readable diagnostic naming `parameter`.
    pub fn report(&self, parameter: &str) -> String {
        match *self {
            CoverageFailure::SequenceIncomplete { state } => {
                format!("Error in expected sequence of DWARF information:\n State = {state}")
            }
            CoverageFailure::LocationListMissing => format!(
                "Location list for '{parameter}' not found, did the debug info format change?"
            ),
            CoverageFailure::Discontinuous { prev_end, next_start } => format!(
                "Location list for '{parameter}' is discontinuous from [0x{prev_end:x}, 0x{next_start:x})"
            ),
            CoverageFailure::IncompleteCoverage {
                prologue_end,
                epilogue_begin,
                first_start,
                last_end,
            } => format!(
                "Location list for '{parameter}' does not cover the whole function:\n\
                 Prologue to Epilogue = [0x{prologue_end:x}, 0x{epilogue_begin:x}), \
                 Location range = [0x{first_start:x}, 0x{last_end:x})"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(CoverageFailure),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Run the checks in order; the first failing one decides the verdict.
pub fn validate(scan: &Scan) -> Verdict {
    let values = &scan.values;
    if scan.state != State::Done {
        return Verdict::Fail(CoverageFailure::SequenceIncomplete { state: scan.state });
    }

    // Unreachable from well-formed input once Done, but guards the numbers below.
    let (Some(first_start), Some(last_end)) = (values.first_range_start, values.last_range_end)
    else {
        return Verdict::Fail(CoverageFailure::LocationListMissing);
    };

    if !values.is_contiguous {
        let (prev_end, next_start) = values.discontinuity.unwrap_or((last_end, last_end));
        return Verdict::Fail(CoverageFailure::Discontinuous { prev_end, next_start });
    }

    let (Some(prologue_end), Some(epilogue_begin)) = (values.prologue_end, values.epilogue_begin)
    else {
        return Verdict::Fail(CoverageFailure::SequenceIncomplete { state: scan.state });
    };

    if first_start > prologue_end || last_end < epilogue_begin {
        return Verdict::Fail(CoverageFailure::IncompleteCoverage {
            prologue_end,
            epilogue_begin,
            first_start,
            last_end,
        });
    }
    Verdict::Pass
}

//! Single forward pass over dumper output, driven by a per-state line pattern.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use gimli::{DW_AT_location, DW_FORM_sec_offset, DW_TAG_formal_parameter, DW_TAG_subprogram};
use log::{debug, info, trace};
use regex::{Captures, Regex};

use crate::errors::{LocCheckError, LocCheckResult};

/// Phase of the scan. Order matters: the ordinal indexes the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    SeekingDebugInfoSection,
    SeekingSubprogram,
    SeekingFormalParameter,
    SeekingLocationAttribute,
    ScanningLocationRanges,
    SeekingPrologueEnd,
    SeekingEpilogueBegin,
    Done,
}

/// Next state for each outcome of matching the current state's pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub on_match: State,
    pub on_miss: State,
}

impl State {
    pub const ALL: [State; 8] = [
        State::SeekingDebugInfoSection,
        State::SeekingSubprogram,
        State::SeekingFormalParameter,
        State::SeekingLocationAttribute,
        State::ScanningLocationRanges,
        State::SeekingPrologueEnd,
        State::SeekingEpilogueBegin,
        State::Done,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Transition table. `Done` is absorbing.
    pub fn transition(self) -> Transition {
        use State::*;
        let (on_match, on_miss) = match self {
            SeekingDebugInfoSection => (SeekingSubprogram, SeekingDebugInfoSection),
            SeekingSubprogram => (SeekingFormalParameter, SeekingSubprogram),
            SeekingFormalParameter => (SeekingLocationAttribute, SeekingFormalParameter),
            // A parameter without a section-offset location is skipped.
            SeekingLocationAttribute => (ScanningLocationRanges, SeekingFormalParameter),
            ScanningLocationRanges => (ScanningLocationRanges, SeekingPrologueEnd),
            SeekingPrologueEnd => (SeekingEpilogueBegin, SeekingPrologueEnd),
            SeekingEpilogueBegin => (Done, SeekingEpilogueBegin),
            Done => (Done, Done),
        };
        Transition { on_match, on_miss }
    }

    /// Regex source for the line this state is waiting for.
    ///
    /// Entry headers and line-table rows are anchored at line start; the rest
    /// may match anywhere in the line.
    pub fn pattern(self) -> Option<String> {
        use State::*;
        let source = match self {
            SeekingDebugInfoSection => r"\.debug_info contents:".to_string(),
            SeekingSubprogram => format!(r"^0x[0-9a-f]+:\s+{DW_TAG_subprogram}"),
            SeekingFormalParameter => format!(r"^0x[0-9a-f]+:\s+{DW_TAG_formal_parameter}"),
            SeekingLocationAttribute => {
                format!(r"{DW_AT_location}\s+\[{DW_FORM_sec_offset}\].*0x([a-f0-9]+)")
            }
            ScanningLocationRanges => r#"\[0x([a-f0-9]+),\s+0x([a-f0-9]+)\) ".text":"#.to_string(),
            SeekingPrologueEnd => r"^\s*0x([0-9a-f]+)\s.+prologue_end".to_string(),
            SeekingEpilogueBegin => r"^\s*0x([0-9a-f]+)\s.+epilogue_begin".to_string(),
            Done => return None,
        };
        Some(source)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.ordinal())
    }
}

/// Values pulled out of matching lines while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValues {
    pub first_range_start: Option<u64>,
    pub last_range_end: Option<u64>,
    pub is_contiguous: bool,
    /// First `(previous end, next start)` pair that failed to abut.
    pub discontinuity: Option<(u64, u64)>,
    pub prologue_end: Option<u64>,
    pub epilogue_begin: Option<u64>,
    /// Offset of the parameter's list in the location section.
    pub location_offset: Option<u64>,
}

impl Default for ExtractedValues {
    fn default() -> Self {
        Self {
            first_range_start: None,
            last_range_end: None,
            is_contiguous: true,
            discontinuity: None,
            prologue_end: None,
            epilogue_begin: None,
            location_offset: None,
        }
    }
}

impl ExtractedValues {
    fn record_range(&mut self, start: u64, end: u64) {
        match (self.first_range_start, self.last_range_end) {
            (None, _) => self.first_range_start = Some(start),
            (Some(_), Some(prev_end)) if start != prev_end => {
                self.is_contiguous = false;
                if self.discontinuity.is_none() {
                    self.discontinuity = Some((prev_end, start));
                }
            }
            _ => {}
        }
        self.last_range_end = Some(end);
    }
}

/// In-progress or finished scan: the current state plus what it has collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub state: State,
    pub values: ExtractedValues,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            state: State::SeekingDebugInfoSection,
            values: ExtractedValues::default(),
        }
    }
}

impl Scan {
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }
}

/// Compiled pattern table driving the scan.
#[derive(Debug)]
pub struct Scanner {
    patterns: Vec<Option<Regex>>,
}

impl Scanner {
    pub fn new() -> LocCheckResult<Self> {
        let patterns = State::ALL
            .iter()
            .map(|state| state.pattern().map(|src| Regex::new(&src)).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Advance `scan` by one input line.
    pub fn step(&self, scan: &mut Scan, line: &str) -> LocCheckResult<()> {
        let state = scan.state;
        let transition = state.transition();
        trace!("{state:?}: {line}");

        let Some(caps) = self.patterns[state.ordinal()]
            .as_ref()
            .and_then(|re| re.captures(line))
        else {
            if transition.on_miss != state {
                debug!("{state:?} -> {:?} (no match)", transition.on_miss);
            }
            scan.state = transition.on_miss;
            return Ok(());
        };

        let values = &mut scan.values;
        match state {
            State::SeekingLocationAttribute => {
                let offset = hex_capture(&caps, 1)?;
                info!("location list at offset 0x{offset:x}");
                values.location_offset = Some(offset);
            }
            State::ScanningLocationRanges => {
                let (start, end) = (hex_capture(&caps, 1)?, hex_capture(&caps, 2)?);
                debug!("location range [0x{start:x}, 0x{end:x})");
                values.record_range(start, end);
            }
            State::SeekingPrologueEnd => {
                let addr = hex_capture(&caps, 1)?;
                info!("prologue end at 0x{addr:x}");
                values.prologue_end = Some(addr);
            }
            State::SeekingEpilogueBegin => {
                let addr = hex_capture(&caps, 1)?;
                info!("epilogue begin at 0x{addr:x}");
                values.epilogue_begin = Some(addr);
            }
            _ => {}
        }

        if transition.on_match != state {
            debug!("{state:?} -> {:?}", transition.on_match);
        }
        scan.state = transition.on_match;
        Ok(())
    }

    /// Scan an in-memory sequence of lines.
    pub fn scan_lines<I, S>(&self, lines: I) -> LocCheckResult<Scan>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scan = Scan::default();
        for line in lines {
            if scan.is_done() {
                break;
            }
            self.step(&mut scan, line.as_ref())?;
        }
        Ok(scan)
    }

    /// Scan lines from `reader`, stopping as soon as the scan is done.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn scan_reader<R: BufRead>(&self, mut reader: R) -> LocCheckResult<Scan> {
        let mut scan = Scan::default();
        let mut buf = Vec::new();
        while !scan.is_done() {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            self.step(&mut scan, line.trim_end_matches(['\n', '\r']))?;
        }
        Ok(scan)
    }

    pub fn scan_file(&self, path: &Path) -> LocCheckResult<Scan> {
        let file = File::open(path)?;
        self.scan_reader(BufReader::new(file))
    }
}

fn hex_capture(caps: &Captures<'_>, group: usize) -> LocCheckResult<u64> {
    let text = caps.get(group).map_or("", |m| m.as_str());
    u64::from_str_radix(text, 16).map_err(|_| LocCheckError::InvalidAddress {
        text: text.to_string(),
    })
}

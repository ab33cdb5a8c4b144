//! Line classification and scene accumulation shared by both importers.

/// What a single line means to the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Meta text, discarded entirely.
    Skip,
    /// Consumed without opening or closing a scene (e.g. a bare date).
    Marker,
    /// Finalizes the open scene and opens a new one with this title.
    Boundary(String),
    /// Accumulated into the open scene, or dropped if none is open.
    Body,
}

/// The boundary predicate of one importer profile.
pub trait BoundaryRules {
    /// Classify a line with surrounding whitespace already trimmed.
    fn classify(&self, line: &str) -> LineClass;

    /// Whether the boundary line becomes the first line of the new scene.
    fn keeps_boundary_line(&self) -> bool {
        false
    }

    /// Whether body lines are stored untrimmed.
    fn keeps_raw_lines(&self) -> bool {
        false
    }
}

/// One accumulated line with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLine {
    pub number: usize,
    pub text: String,
}

/// A finalized scene before any profile-specific derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub title: String,
    /// 1-based line number of the boundary line.
    pub start_line: usize,
    pub lines: Vec<SegmentLine>,
}

impl Segment {
    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|l| !l.text.trim().is_empty())
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

/// Scene state threaded through one pass. Each import owns its own
/// accumulator, so concurrent imports share nothing.
#[derive(Debug, Default)]
pub struct SegmentAccumulator {
    finished: Vec<Segment>,
    open: Option<Segment>,
}

impl SegmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize the open scene (if it has content) and open a new one.
    pub fn open(&mut self, title: String, start_line: usize) {
        self.close();
        self.open = Some(Segment {
            title,
            start_line,
            lines: Vec::new(),
        });
    }

    /// Append a line to the open scene. Returns false when no scene is open.
    pub fn push(&mut self, number: usize, text: String) -> bool {
        match self.open.as_mut() {
            Some(segment) => {
                segment.lines.push(SegmentLine { number, text });
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn close(&mut self) {
        if let Some(segment) = self.open.take() {
            if segment.has_content() {
                self.finished.push(segment);
            }
        }
    }

    /// Finalize the last open scene and return every segment in order.
    pub fn finish(mut self) -> Vec<Segment> {
        self.close();
        self.finished
    }
}

/// Run one forward pass over `input` with the given rules.
pub fn segment<R: BoundaryRules + ?Sized>(input: &str, rules: &R) -> Vec<Segment> {
    let mut acc = SegmentAccumulator::new();

    for (index, raw) in input.lines().enumerate() {
        let number = index + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() && !acc.is_open() {
            continue;
        }

        match rules.classify(trimmed) {
            LineClass::Skip | LineClass::Marker => {}
            LineClass::Boundary(title) => {
                acc.open(title, number);
                if rules.keeps_boundary_line() {
                    acc.push(number, stored_text(rules, raw, trimmed));
                }
            }
            LineClass::Body => {
                acc.push(number, stored_text(rules, raw, trimmed));
            }
        }
    }

    acc.finish()
}

fn stored_text<R: BoundaryRules + ?Sized>(rules: &R, raw: &str, trimmed: &str) -> String {
    if rules.keeps_raw_lines() {
        raw.trim_end_matches('\r').to_string()
    } else {
        trimmed.to_string()
    }
}

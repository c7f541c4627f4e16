use thiserror::Error;

/// A single source-level edit: replace byte range [start..end) with replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Byte offset, inclusive.
    pub start: usize,
    /// Byte offset, exclusive.
    pub end: usize,
    /// Replacement text (empty string = deletion).
    pub replacement: String,
    /// Cop that produced this correction.
    pub cop_name: &'static str,
}

impl Correction {
    pub fn delete(start: usize, end: usize, cop_name: &'static str) -> Self {
        Self {
            start,
            end,
            replacement: String::new(),
            cop_name,
        }
    }

    pub fn insert(at: usize, text: &str, cop_name: &'static str) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.to_string(),
            cop_name,
        }
    }
}

/// Two corrections claimed the same bytes. Each edit is computed
/// independently per offense, so this means a cop produced bad edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "overlapping corrections from {first_cop} at {first_start}..{first_end} \
     and {second_cop} at {second_start}..{second_end}"
)]
pub struct OverlappingCorrections {
    pub first_cop: &'static str,
    pub first_start: usize,
    pub first_end: usize,
    pub second_cop: &'static str,
    pub second_start: usize,
    pub second_end: usize,
}

/// A set of non-overlapping corrections, sorted by start offset.
#[derive(Debug)]
pub struct CorrectionSet {
    corrections: Vec<Correction>,
}

impl CorrectionSet {
    /// Build from an unsorted vec of corrections.
    ///
    /// Sorts by (start, end) and rejects the whole set if any two ranges
    /// overlap. Two insertions at the same offset also count as overlapping,
    /// since their relative order would be arbitrary.
    pub fn from_vec(mut raw: Vec<Correction>) -> Result<Self, OverlappingCorrections> {
        raw.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        for pair in raw.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let same_point = a.start == a.end && b.start == b.end && a.start == b.start;
            if b.start < a.end || same_point {
                return Err(OverlappingCorrections {
                    first_cop: a.cop_name,
                    first_start: a.start,
                    first_end: a.end,
                    second_cop: b.cop_name,
                    second_start: b.start,
                    second_end: b.end,
                });
            }
        }

        Ok(Self { corrections: raw })
    }

    /// Apply corrections to source bytes, returning new source.
    ///
    /// Uses a single O(n) linear scan:
    /// ```text
    /// cursor = 0
    /// for each correction c (sorted by start):
    ///     copy source[cursor..c.start]
    ///     copy c.replacement
    ///     cursor = c.end
    /// copy source[cursor..]
    /// ```
    pub fn apply(&self, source: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(source.len() + self.corrections.len());
        let mut cursor = 0;

        for c in &self.corrections {
            if c.start > cursor {
                result.extend_from_slice(&source[cursor..c.start]);
            }
            result.extend_from_slice(c.replacement.as_bytes());
            cursor = c.end;
        }

        if cursor < source.len() {
            result.extend_from_slice(&source[cursor..]);
        }

        result
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }
}

use super::CropRange;

///////////////////////////////
/// Turns the raw sequence line of a read into the barcode written to the tile tables
pub trait SequencePreprocessor {
    fn preprocess(&self, raw: &str) -> String;
}

impl<F> SequencePreprocessor for F
where
    F: Fn(&str) -> String,
{
    fn preprocess(&self, raw: &str) -> String {
        self(raw)
    }
}

///////////////////////////////
/// Watson-Crick complement of a single base. Anything that is not an
/// uppercase A, C, G or T is returned as is.
#[inline]
pub fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement).collect()
}

///////////////////////////////
/// Trim, crop, trim again and optionally reverse complement
#[derive(Debug, Clone, Default)]
pub struct SequenceTransformer {
    pub crop: CropRange,
    pub reverse_complement: bool,
}

impl SequenceTransformer {
    pub fn new(crop: CropRange, reverse_complement: bool) -> Self {
        SequenceTransformer {
            crop,
            reverse_complement,
        }
    }

    pub fn apply(&self, raw: &str) -> String {
        let cropped = self.crop.apply(raw.trim());
        let cropped = cropped.trim();
        if self.reverse_complement {
            reverse_complement(cropped)
        } else {
            cropped.to_string()
        }
    }
}

impl SequencePreprocessor for SequenceTransformer {
    fn preprocess(&self, raw: &str) -> String {
        self.apply(raw)
    }
}

use crate::postings::FieldIndex;
use crate::store::CorpusStats;

/// BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }

    /// Score of one term in one field. Zero whenever any input that appears
    /// in a log or a denominator is zero.
    pub fn term_score(&self, tf: u32, df: usize, dl: usize, avgdl: f64, n: usize) -> f64 {
        if tf == 0 || df == 0 || dl == 0 || avgdl == 0.0 || n == 0 {
            return 0.0;
        }
        let (tf, df, dl, n) = (tf as f64, df as f64, dl as f64, n as f64);
        let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * dl / avgdl))
    }

    /// Sum over `tokens` (duplicates included) for one document in one field.
    pub fn field_score(
        &self,
        doc_id: &str,
        tokens: &[String],
        index: &FieldIndex,
        stats: &CorpusStats,
    ) -> f64 {
        let dl = stats.doc_len(doc_id);
        tokens
            .iter()
            .map(|t| {
                let df = index.doc_frequency(t);
                let tf = index.term_frequency(t, doc_id);
                self.term_score(tf, df, dl, stats.avgdl, stats.n)
            })
            .sum()
    }
}

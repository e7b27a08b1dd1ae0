mod normalizer;

pub use normalizer::{normalize_results, relative_date, ResultNormalizer};

/// Errors raised by classifiers and the ensemble.
///
/// None of these describe input image quality: every tile of a well-formed
/// ensemble always receives a class. They indicate broken or mismatched
/// model weights, or weights that could not be loaded.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("ensemble has no members")]
    EmptyEnsemble,
    #[error("member {member} returned {got} distributions for {expected} tiles")]
    MemberOutput {
        member: String,
        expected: usize,
        got: usize,
    },
    #[error("member {member} returned an invalid distribution for tile {tile}")]
    InvalidDistribution { member: String, tile: usize },
    #[error("model {model} expects {expected} features, got {got}")]
    FeatureSize {
        model: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid weights for model {model}: {reason}")]
    InvalidWeights { model: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

//! Square classification for boardshot.
//!
//! Each of the 64 tiles is labelled with one of 13 classes (six white
//! pieces, six black pieces, empty) by an [`Ensemble`] of independently
//! trained [`TileClassifier`]s. Members run in parallel on the same tiles;
//! their distributions are averaged and the arg-max wins.
//!
//! Model weights are plain JSON ([`EnsembleWeights`]) describing linear
//! softmax models over downsampled luma ([`SoftmaxModel`]). Any other model
//! can join an ensemble by implementing [`TileClassifier`].

mod ensemble;
mod error;
mod features;
mod io;
mod model;

pub use ensemble::{combine, Classification, Ensemble};
pub use error::ClassifyError;
pub use features::tile_features;
pub use io::EnsembleWeights;
pub use model::{ClassProbabilities, ModelWeights, OutputUnit, SoftmaxModel, TileClassifier};

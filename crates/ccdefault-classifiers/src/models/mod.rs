pub mod classifier_trait;
pub mod factory;
pub mod forest;
pub mod linear;
pub mod trained;

pub use classifier_trait::{ClassifierModel, FittedClassifier};
pub use trained::{ClassifierState, TrainedModel};

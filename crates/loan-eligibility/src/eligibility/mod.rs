//! Loan eligibility: form input, feature encoding, and classifier-backed decisions.
//!
//! Data flows one way: a [`RawApplication`] is clamped to its form bounds, encoded into the
//! fixed 22-column [`FeatureVector`] the classifier was trained on, and handed to a
//! [`Classifier`] whose label is rendered as a [`Prediction`] next to a [`ProportionChart`].
//! Nothing is kept between calls.

pub mod batch;
pub mod classifier;
pub mod decision;
pub mod domain;
pub mod encoder;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use batch::{read_applications, read_applications_from_path, BatchError};
pub use classifier::{
    Classifier, ClassifierError, FixedLabelClassifier, SchemaCheck, TreeEnsembleArtifact,
    TreeEnsembleClassifier,
};
pub use decision::{decide, ChartSlice, Prediction, ProportionChart};
pub use domain::{
    loan_to_income_ratio, parse_flag, Category, CategoryParseError, HomeOwnership,
    InputAdjustment, InputBounds, LoanGrade, LoanIntent, RawApplication,
};
pub use encoder::{encode, FeatureEntry, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use router::{eligibility_router, schema_view, BatchRequest, SchemaView};
pub use service::{ApplicationPreview, BatchOutcome, EligibilityReport, EligibilityService};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::encoder::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Opaque decision function consumed by the eligibility service.
pub trait Classifier: Send + Sync {
    /// Column names the model expects, in order.
    fn feature_names(&self) -> &[String];

    /// One label per input row.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError>;
}

/// How strictly artifact column names are compared with the encoder schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCheck {
    #[default]
    Strict,
    Off,
}

impl SchemaCheck {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" | "on" | "true" => Some(Self::Strict),
            "off" | "none" | "false" => Some(Self::Off),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("failed to read classifier artifact {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("classifier artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("classifier artifact is invalid: {0}")]
    InvalidArtifact(String),
    #[error("classifier expects column '{found}' at position {position}, encoder produces '{expected}'")]
    SchemaMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("classifier returned no label")]
    EmptyPrediction,
    #[error("classifier returned {found} labels for {expected} rows")]
    LabelCount { expected: usize, found: usize },
}

/// Serialized random-forest style ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleArtifact {
    pub feature_names: Vec<String>,
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

impl DecisionTree {
    fn leaf_for(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }

    fn validate(&self, tree: usize, width: usize, classes: usize) -> Result<(), ClassifierError> {
        if self.nodes.is_empty() {
            return Err(invalid(format!("tree {tree} has no nodes")));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(invalid(format!(
                            "tree {tree} node {index} splits on feature {feature} of {width}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!(
                            "tree {tree} node {index} has a non-finite threshold"
                        )));
                    }
                    // Children must come later so traversal always terminates.
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(invalid(format!(
                                "tree {tree} node {index} points at child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != classes {
                        return Err(invalid(format!(
                            "tree {tree} leaf {index} has {} weights for {classes} classes",
                            value.len()
                        )));
                    }
                    let total: f64 = value.iter().sum();
                    if value.iter().any(|weight| !weight.is_finite() || *weight < 0.0)
                        || total <= 0.0
                    {
                        return Err(invalid(format!(
                            "tree {tree} leaf {index} has unusable weights"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(detail: String) -> ClassifierError {
    ClassifierError::InvalidArtifact(detail)
}

/// Tree ensemble that averages per-tree class weights.
#[derive(Debug, Clone)]
pub struct TreeEnsembleClassifier {
    artifact: TreeEnsembleArtifact,
}

impl TreeEnsembleClassifier {
    pub fn from_path(path: impl AsRef<Path>, check: SchemaCheck) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let classifier = Self::from_reader(BufReader::new(file), check)?;
        info!(
            path = %path.display(),
            trees = classifier.artifact.trees.len(),
            "loaded classifier artifact"
        );
        Ok(classifier)
    }

    pub fn from_reader<R: Read>(reader: R, check: SchemaCheck) -> Result<Self, ClassifierError> {
        let artifact: TreeEnsembleArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact, check)
    }

    pub fn from_artifact(
        artifact: TreeEnsembleArtifact,
        check: SchemaCheck,
    ) -> Result<Self, ClassifierError> {
        if artifact.feature_names.len() != FEATURE_COUNT {
            return Err(invalid(format!(
                "artifact declares {} features, encoder produces {FEATURE_COUNT}",
                artifact.feature_names.len()
            )));
        }
        if artifact.classes.is_empty() {
            return Err(invalid("artifact declares no classes".to_string()));
        }
        if artifact.trees.is_empty() {
            return Err(invalid("artifact contains no trees".to_string()));
        }

        for (index, tree) in artifact.trees.iter().enumerate() {
            tree.validate(index, FEATURE_COUNT, artifact.classes.len())?;
        }

        if let Some(position) = FEATURE_NAMES
            .iter()
            .zip(artifact.feature_names.iter())
            .position(|(expected, found)| *expected != found.as_str())
        {
            let mismatch = ClassifierError::SchemaMismatch {
                position,
                expected: FEATURE_NAMES[position].to_string(),
                found: artifact.feature_names[position].clone(),
            };
            match check {
                SchemaCheck::Strict => return Err(mismatch),
                SchemaCheck::Off => warn!(%mismatch, "schema check disabled, using artifact as is"),
            }
        }

        Ok(Self { artifact })
    }

    pub fn tree_count(&self) -> usize {
        self.artifact.trees.len()
    }

    fn predict_row(&self, row: &[f64]) -> i64 {
        let classes = &self.artifact.classes;
        let mut mean = vec![0.0; classes.len()];

        for tree in &self.artifact.trees {
            let leaf = tree.leaf_for(row);
            let total: f64 = leaf.iter().sum();
            for (slot, weight) in mean.iter_mut().zip(leaf) {
                *slot += weight / total;
            }
        }

        let mut best = 0;
        for (index, weight) in mean.iter().enumerate().skip(1) {
            if *weight > mean[best] {
                best = index;
            }
        }
        classes[best]
    }
}

impl Classifier for TreeEnsembleClassifier {
    fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError> {
        Ok(rows
            .iter()
            .map(|row| self.predict_row(row.as_slice()))
            .collect())
    }
}

/// Stub that answers every row with the same label.
#[derive(Debug, Clone)]
pub struct FixedLabelClassifier {
    label: i64,
    feature_names: Vec<String>,
}

impl FixedLabelClassifier {
    pub fn new(label: i64) -> Self {
        Self {
            label,
            feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Classifier for FixedLabelClassifier {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, ClassifierError> {
        Ok(vec![self.label; rows.len()])
    }
}

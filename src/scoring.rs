use std::path::Path;
use std::time::Instant;

use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::validation::ValidatedImage;
use crate::{Error, Result};

/// Produces raw class logits for a validated image.
pub trait Scorer: Send + Sync {
    fn logits(&self, image: &ValidatedImage) -> Result<Vec<f32>>;
}

/// Per-class probabilities, in the order of the configured class names.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    labels: Vec<String>,
    scores: Vec<f32>,
}

impl ClassificationResult {
    pub fn new(labels: Vec<String>, scores: Vec<f32>) -> Result<Self> {
        if labels.len() != scores.len() {
            return Err(Error::inference(format!(
                "{} scores for {} classes",
                scores.len(),
                labels.len()
            )));
        }
        Ok(Self { labels, scores })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn scores(&self) -> impl Iterator<Item = f32> + '_ {
        self.scores.iter().copied()
    }

    /// Index and label of the highest score.
    pub fn top(&self) -> Option<(usize, &str)> {
        self.scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| (i, self.labels[i].as_str()))
    }

    /// Highest score.
    pub fn confidence(&self) -> f32 {
        self.scores.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Highest minus lowest score.
    pub fn margin(&self) -> f32 {
        let min = self.scores.iter().copied().fold(f32::INFINITY, f32::min);
        self.confidence() - min
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Run `scorer` and normalize its output over `class_names`.
pub fn score(
    scorer: &dyn Scorer,
    image: &ValidatedImage,
    class_names: &[String],
) -> Result<ClassificationResult> {
    let logits = scorer.logits(image)?;
    if logits.len() != class_names.len() {
        return Err(Error::inference(format!(
            "model produced {} outputs for {} classes",
            logits.len(),
            class_names.len()
        )));
    }
    if logits.iter().any(|x| !x.is_finite()) {
        return Err(Error::inference("model produced non-finite logits"));
    }

    ClassificationResult::new(class_names.to_vec(), softmax(&logits))
}

/// Lay `image` out as a `[1, side, side, 3]` NHWC tensor of raw pixel values.
pub fn to_tensor(image: &ValidatedImage, side: usize) -> Result<Tensor> {
    let pixels = image.pixels();
    if pixels.width() as usize != side || pixels.height() as usize != side {
        return Err(Error::InvalidDimensions {
            width: pixels.width(),
            height: pixels.height(),
            expected: side as u32,
        });
    }

    let input = tract_ndarray::Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        pixels.get_pixel(x as u32, y as u32)[c] as f32
    });
    Ok(input.into_tensor())
}

/// Two-class image classifier backed by an ONNX graph.
///
/// The graph takes a `[1, size, size, 3]` f32 tensor of raw 0..255 pixel
/// values (NHWC, as exported from Keras) and returns one logit per class.
pub struct OnnxScorer {
    model: TypedRunnableModel<TypedModel>,
    size: u32,
}

impl OnnxScorer {
    pub fn load(path: &Path, size: u32) -> Result<Self> {
        let started = Instant::now();
        let side = size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| {
                m.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
                )
            })
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| Error::model_load(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded classification model"
        );

        Ok(Self { model, size })
    }
}

impl Scorer for OnnxScorer {
    fn logits(&self, image: &ValidatedImage) -> Result<Vec<f32>> {
        let started = Instant::now();
        let tensor = to_tensor(image, self.size as usize)?;
        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| Error::inference(e.to_string()))?;

        let output = result
            .first()
            .ok_or_else(|| Error::inference("model returned no outputs"))?
            .to_array_view::<f32>()
            .map_err(|e| Error::inference(e.to_string()))?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model forward pass"
        );

        Ok(output.iter().copied().collect())
    }
}

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::decision::DecisionPolicy;
use crate::models::Prediction;
use crate::scoring::{self, Scorer};
use crate::validation;
use crate::Result;

/// Validate, score and decide for one uploaded image.
///
/// Holds only read-only state, so one instance serves every request.
#[derive(Clone)]
pub struct Classifier {
    scorer: Arc<dyn Scorer>,
    class_names: Vec<String>,
    image_size: u32,
    policy: DecisionPolicy,
}

impl Classifier {
    pub fn new(scorer: Arc<dyn Scorer>, config: &Config) -> Self {
        Self {
            scorer,
            class_names: config.class_names.clone(),
            image_size: config.image_size,
            policy: config.decision,
        }
    }

    pub fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = validation::decode(bytes, self.image_size)?;
        let result = scoring::score(self.scorer.as_ref(), &image, &self.class_names)?;
        let decision = self.policy.decide(&result);

        info!(
            scores = ?result.scores().collect::<Vec<_>>(),
            margin = result.margin(),
            decision = decision.message(),
            "classified image"
        );

        Ok(Prediction { result, decision })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;
    use crate::validation::ValidatedImage;
    use crate::test_support::png;
    use crate::Error;

    struct Fixed(Vec<f32>);

    impl Scorer for Fixed {
        fn logits(&self, _image: &ValidatedImage) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn confident_logits_yield_label() {
        // softmax([3, 0]) ~ [0.95, 0.05]
        let classifier = Classifier::new(Arc::new(Fixed(vec![3.0, 0.0])), &Config::default());
        let prediction = classifier.classify(&png(160, 160)).unwrap();
        assert_eq!(prediction.decision, Decision::Label("cat".into()));
    }

    #[test]
    fn even_logits_yield_unknown() {
        // softmax([0.2, 0]) ~ [0.55, 0.45]
        let classifier = Classifier::new(Arc::new(Fixed(vec![0.2, 0.0])), &Config::default());
        let prediction = classifier.classify(&png(160, 160)).unwrap();
        assert_eq!(prediction.decision, Decision::Unknown);
    }

    #[test]
    fn wrong_size_never_reaches_scorer() {
        struct Panics;
        impl Scorer for Panics {
            fn logits(&self, _image: &ValidatedImage) -> Result<Vec<f32>> {
                panic!("scorer must not run");
            }
        }

        let classifier = Classifier::new(Arc::new(Panics), &Config::default());
        assert!(matches!(
            classifier.classify(&png(50, 50)),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}

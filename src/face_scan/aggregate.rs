//! 评分聚合：Collecting → Aggregated

use serde::{Deserialize, Serialize};

/// 判定标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictLabel {
    Fake,
    Real,
}

/// 聚合结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateResult {
    /// 全程没有产生过任何评分；这是合法结局，不是错误
    NoEvidence,
    Verdict {
        label: VerdictLabel,
        /// 置信度百分比
        confidence: f32,
    },
}

impl AggregateResult {
    /// 人类可读的判定文案
    pub fn message(&self) -> String {
        match self {
            AggregateResult::NoEvidence => "⚠️ No face detected in video.".to_string(),
            AggregateResult::Verdict {
                label: VerdictLabel::Fake,
                confidence,
            } => format!("Video is {:.2}% likely to be a FAKE.", confidence),
            AggregateResult::Verdict {
                label: VerdictLabel::Real,
                confidence,
            } => format!("Video is {:.2}% likely to be REAL.", confidence),
        }
    }
}

/// 评分聚合器
///
/// push 阶段收集，finish 消费自身产出结果；一次分析只聚合一次。
/// 判定只由评分多重集决定，与帧序和人脸顺序无关。
#[derive(Debug, Default)]
pub struct ScoreAggregator {
    scores: Vec<f32>,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: f32) {
        self.scores.push(score);
    }

    pub fn extend(&mut self, scores: impl IntoIterator<Item = f32>) {
        self.scores.extend(scores);
    }

    pub fn count(&self) -> usize {
        self.scores.len()
    }

    pub fn finish(self) -> AggregateResult {
        if self.scores.is_empty() {
            return AggregateResult::NoEvidence;
        }

        let mean =
            self.scores.iter().map(|&s| s as f64).sum::<f64>() / self.scores.len() as f64;

        // 严格大于才判 FAKE，0.5 平局归 REAL
        if mean > 0.5 {
            AggregateResult::Verdict {
                label: VerdictLabel::Fake,
                confidence: (mean * 100.0) as f32,
            }
        } else {
            AggregateResult::Verdict {
                label: VerdictLabel::Real,
                confidence: ((1.0 - mean) * 100.0) as f32,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(scores: &[f32]) -> AggregateResult {
        let mut agg = ScoreAggregator::new();
        for &score in scores {
            agg.push(score);
        }
        assert_eq!(agg.count(), scores.len());
        agg.finish()
    }

    #[test]
    fn test_empty_scores_no_evidence() {
        assert_eq!(aggregate(&[]), AggregateResult::NoEvidence);
    }

    #[test]
    fn test_high_scores_fake_verdict() {
        // mean 0.8833 → FAKE 88.33
        let result = aggregate(&[0.9, 0.8, 0.95]);

        let AggregateResult::Verdict { label, confidence } = result else {
            panic!("expected verdict");
        };
        assert_eq!(label, VerdictLabel::Fake);
        assert!((confidence - 88.3333).abs() < 1e-3);
    }

    #[test]
    fn test_low_scores_real_verdict() {
        // mean 0.1167 → REAL 88.33
        let result = aggregate(&[0.1, 0.2, 0.05]);

        let AggregateResult::Verdict { label, confidence } = result else {
            panic!("expected verdict");
        };
        assert_eq!(label, VerdictLabel::Real);
        assert!((confidence - 88.3333).abs() < 1e-3);
    }

    #[test]
    fn test_tie_goes_to_real() {
        let result = aggregate(&[0.5]);

        assert_eq!(
            result,
            AggregateResult::Verdict {
                label: VerdictLabel::Real,
                confidence: 50.0
            }
        );
        assert_eq!(result.message(), "Video is 50.00% likely to be REAL.");
    }

    #[test]
    fn test_order_does_not_matter() {
        assert_eq!(aggregate(&[0.9, 0.1, 0.6]), aggregate(&[0.6, 0.9, 0.1]));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            aggregate(&[0.9, 0.8, 0.95]).message(),
            "Video is 88.33% likely to be a FAKE."
        );
        assert_eq!(
            aggregate(&[0.1, 0.2, 0.05]).message(),
            "Video is 88.33% likely to be REAL."
        );
        assert_eq!(
            AggregateResult::NoEvidence.message(),
            "⚠️ No face detected in video."
        );
    }
}

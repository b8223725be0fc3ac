use crate::face_scan::aggregate::AggregateResult;
use crate::face_scan::pipeline::ScanReport;
use serde::{Deserialize, Serialize};

/// 分析结果报告，可直接序列化为对外 JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// 人类可读判定文案
    pub prediction_result: String,
    /// 结构化判定
    pub verdict: AggregateResult,
    pub frames_processed: u64,
    pub faces_scored: u64,
}

impl PredictionReport {
    pub fn from_scan(report: &ScanReport) -> Self {
        Self {
            prediction_result: report.result.message(),
            verdict: report.result.clone(),
            frames_processed: report.stats.frames_processed,
            faces_scored: report.stats.faces_scored,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

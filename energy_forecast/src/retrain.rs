//! Retrain decision
//!
//! Each cycle is independent: evaluate, then either retrain once or skip.
//! A failed evaluation or a failed training run is reported in the
//! [`CycleOutcome`]; neither is propagated to the caller as an error.

use crate::config::RetrainThresholds;
use crate::error::{ForecastError, Result};
use crate::evaluation::EvaluationReport;
use serde::{Deserialize, Serialize};

/// What a cycle decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrainAction {
    Retrain,
    Skip,
}

/// Decision together with the report that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainDecision {
    pub action: RetrainAction,
    pub report: EvaluationReport,
}

/// External training operation triggered on [`RetrainAction::Retrain`]
pub trait TrainingJob {
    fn run(&mut self) -> Result<()>;
}

impl<F> TrainingJob for F
where
    F: FnMut() -> Result<()>,
{
    fn run(&mut self) -> Result<()> {
        self()
    }
}

/// Result of one evaluate/decide/retrain cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Evaluation failed (e.g. no overlap); no decision was taken
    NotEvaluated { error: ForecastError },
    /// Error within thresholds
    Skipped(RetrainDecision),
    /// Error above a threshold and the model was retrained
    Retrained(RetrainDecision),
    /// Error above a threshold but training failed; retried next cycle
    RetrainFailed {
        decision: RetrainDecision,
        error: ForecastError,
    },
}

impl CycleOutcome {
    /// The decision, when one was taken
    pub fn decision(&self) -> Option<&RetrainDecision> {
        match self {
            CycleOutcome::NotEvaluated { .. } => None,
            CycleOutcome::Skipped(decision) | CycleOutcome::Retrained(decision) => Some(decision),
            CycleOutcome::RetrainFailed { decision, .. } => Some(decision),
        }
    }

    /// Whether the cycle ran to completion (skip or successful retrain)
    pub fn is_complete(&self) -> bool {
        matches!(self, CycleOutcome::Skipped(_) | CycleOutcome::Retrained(_))
    }
}

/// Threshold rule deciding whether to retrain
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrainController {
    thresholds: RetrainThresholds,
}

impl RetrainController {
    pub fn new(thresholds: RetrainThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> RetrainThresholds {
        self.thresholds
    }

    /// `Retrain` iff MAE or RMSE exceeds its threshold
    pub fn decide(&self, report: &EvaluationReport) -> RetrainDecision {
        let action = if report.mae > self.thresholds.mae || report.rmse > self.thresholds.rmse {
            RetrainAction::Retrain
        } else {
            RetrainAction::Skip
        };

        RetrainDecision {
            action,
            report: report.clone(),
        }
    }

    /// Decide from an evaluation result and run the training job at most once
    pub fn run_cycle(
        &self,
        evaluation: Result<EvaluationReport>,
        job: &mut dyn TrainingJob,
    ) -> CycleOutcome {
        let report = match evaluation {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(%error, "Evaluation failed; skipping retrain decision this cycle");
                return CycleOutcome::NotEvaluated { error };
            }
        };

        let decision = self.decide(&report);
        match decision.action {
            RetrainAction::Skip => {
                tracing::info!(
                    mae = report.mae,
                    rmse = report.rmse,
                    "Model accuracy within acceptable range; no retraining needed"
                );
                CycleOutcome::Skipped(decision)
            }
            RetrainAction::Retrain => {
                tracing::info!(
                    mae = report.mae,
                    rmse = report.rmse,
                    mae_threshold = self.thresholds.mae,
                    rmse_threshold = self.thresholds.rmse,
                    "Error exceeds threshold; retraining model"
                );
                match job.run() {
                    Ok(()) => {
                        tracing::info!("Model retraining completed successfully");
                        CycleOutcome::Retrained(decision)
                    }
                    Err(e) => {
                        let error = match e {
                            ForecastError::TrainingFailed(_) => e,
                            other => ForecastError::TrainingFailed(other.to_string()),
                        };
                        tracing::error!(%error, "Retraining failed; deferring to next cycle");
                        CycleOutcome::RetrainFailed { decision, error }
                    }
                }
            }
        }
    }
}

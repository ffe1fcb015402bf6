//! Synthetic distillation teacher and loss telemetry.
//!
//! In training mode every tick draws a random "ground truth" from the teacher
//! and scores the cortex outputs against it. The losses are display-only;
//! nothing is learned from them.

use crate::cortex::bounded_tanh;
use pmm_core::state::WORKSPACE_DIM;
use pmm_core::{Action, EmotionVector, RandomSource, TrainingMetrics};

/// Base loss when the predicted action matches the target.
const ACTION_HIT_LOSS: f32 = 0.1;
/// Jitter span added to a hit.
const ACTION_HIT_JITTER: f32 = 0.1;
/// Base loss when the predicted action misses.
const ACTION_MISS_LOSS: f32 = 1.5;
/// Jitter span added to a miss.
const ACTION_MISS_JITTER: f32 = 1.0;

const VALUE_WEIGHT: f32 = 0.5;
const EMOTION_WEIGHT: f32 = 0.3;
const WORKSPACE_WEIGHT: f32 = 0.3;

/// One draw of teacher targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherTargets {
    pub action: Action,
    pub value: f32,
    pub emotion: EmotionVector,
    pub workspace: Vec<f32>,
}

/// Student outputs scored against the targets.
#[derive(Debug, Clone, Copy)]
pub struct StudentOutputs<'a> {
    pub action: Action,
    pub value: f32,
    pub emotion: &'a EmotionVector,
    pub workspace: &'a [f32],
}

#[derive(Debug, Clone)]
pub struct SyntheticTeacher {
    workspace_dim: usize,
}

impl Default for SyntheticTeacher {
    fn default() -> Self {
        Self::new(WORKSPACE_DIM)
    }
}

impl SyntheticTeacher {
    pub fn new(workspace_dim: usize) -> Self {
        Self { workspace_dim }
    }

    pub fn predict(&self, rng: &mut dyn RandomSource) -> TeacherTargets {
        let action = Action::SAMPLEABLE[rng.index(Action::SAMPLEABLE.len())];
        let value = rng.range(-1.0, 1.0);
        let emotion = EmotionVector {
            valence: squashed(rng),
            arousal: squashed(rng),
            dominance: squashed(rng),
        };
        let workspace = (0..self.workspace_dim).map(|_| squashed(rng)).collect();
        TeacherTargets {
            action,
            value,
            emotion,
            workspace,
        }
    }

    /// Score `outputs` against `targets` for training step `step`.
    pub fn evaluate(
        &self,
        step: u64,
        outputs: &StudentOutputs<'_>,
        targets: &TeacherTargets,
        rng: &mut dyn RandomSource,
    ) -> TrainingMetrics {
        let loss_act = if outputs.action == targets.action {
            ACTION_HIT_LOSS + rng.range(0.0, ACTION_HIT_JITTER)
        } else {
            ACTION_MISS_LOSS + rng.range(0.0, ACTION_MISS_JITTER)
        };
        let loss_val = (outputs.value - targets.value).powi(2);
        let loss_emo = mse(&outputs.emotion.as_array(), &targets.emotion.as_array());
        let loss_ws = mse(outputs.workspace, &targets.workspace);

        TrainingMetrics {
            step,
            total_loss: total_loss(loss_act, loss_val, loss_emo, loss_ws),
            loss_act,
            loss_val,
            loss_emo,
            loss_ws,
        }
    }
}

/// Weighted sum reported as the headline loss.
pub fn total_loss(loss_act: f32, loss_val: f32, loss_emo: f32, loss_ws: f32) -> f32 {
    loss_act + VALUE_WEIGHT * loss_val + EMOTION_WEIGHT * loss_emo + WORKSPACE_WEIGHT * loss_ws
}

/// Mean squared error over the overlapping prefix. Empty input is zero.
pub fn mse(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        / n as f32
}

fn squashed(rng: &mut dyn RandomSource) -> f32 {
    bounded_tanh(rng.symmetric(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::ScriptedRandom;

    #[test]
    fn test_targets_shape_and_bounds() {
        let mut rng = ScriptedRandom::new([0.0, 0.25, 0.5, 0.75, 0.999]);
        let targets = SyntheticTeacher::default().predict(&mut rng);
        assert_eq!(targets.workspace.len(), WORKSPACE_DIM);
        assert!((-1.0..=1.0).contains(&targets.value));
        assert!(targets.emotion.is_bounded());
        assert!(targets.workspace.iter().all(|v| (-1.0..=1.0).contains(v)));
        assert_ne!(targets.action, Action::BootSequence);
    }

    #[test]
    fn test_mse() {
        assert_eq!(mse(&[], &[]), 0.0);
        assert_eq!(mse(&[1.0, 0.0], &[0.0, 0.0]), 0.5);
        assert_eq!(mse(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_total_loss_weights() {
        let total = total_loss(1.0, 2.0, 3.0, 4.0);
        assert!((total - (1.0 + 1.0 + 0.9 + 1.2)).abs() < 1e-6);
    }

    #[test]
    fn test_action_hit_is_cheaper_than_miss() {
        let teacher = SyntheticTeacher::new(2);
        let emotion = EmotionVector::neutral();
        let targets = TeacherTargets {
            action: Action::Jump,
            value: 0.5,
            emotion,
            workspace: vec![0.0, 0.0],
        };
        let mut rng = ScriptedRandom::constant(0.999);

        let hit = teacher.evaluate(
            1,
            &StudentOutputs {
                action: Action::Jump,
                value: 0.5,
                emotion: &emotion,
                workspace: &[0.0, 0.0],
            },
            &targets,
            &mut rng,
        );
        let miss = teacher.evaluate(
            1,
            &StudentOutputs {
                action: Action::Crouch,
                value: 0.5,
                emotion: &emotion,
                workspace: &[0.0, 0.0],
            },
            &targets,
            &mut rng,
        );

        assert!(hit.loss_act < 0.2 + 1e-6);
        assert!(miss.loss_act >= 1.5);
        assert!(hit.loss_act < miss.loss_act);
        assert_eq!(hit.loss_val, 0.0);
        assert_eq!(hit.loss_emo, 0.0);
        assert_eq!(hit.loss_ws, 0.0);
        assert!((hit.total_loss - hit.loss_act).abs() < 1e-6);
    }

    #[test]
    fn test_component_losses() {
        let teacher = SyntheticTeacher::new(2);
        let targets = TeacherTargets {
            action: Action::Idle,
            value: -1.0,
            emotion: EmotionVector::new(1.0, 1.0, 1.0),
            workspace: vec![1.0, -1.0],
        };
        let emotion = EmotionVector::neutral();
        let m = teacher.evaluate(
            7,
            &StudentOutputs {
                action: Action::Idle,
                value: 1.0,
                emotion: &emotion,
                workspace: &[0.0, 0.0],
            },
            &targets,
            &mut ScriptedRandom::constant(0.0),
        );
        assert_eq!(m.step, 7);
        assert!((m.loss_val - 4.0).abs() < 1e-6);
        assert!((m.loss_emo - 1.0).abs() < 1e-6);
        assert!((m.loss_ws - 1.0).abs() < 1e-6);
        assert!((m.loss_act - 0.1).abs() < 1e-6);
    }
}

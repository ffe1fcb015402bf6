//! Cortex heads: thought, workspace, value and action.
//!
//! These are not learned. Each head is a bounded nonlinear recurrence with a
//! little structured noise, enough to make the dashboard vectors move. All
//! outputs live in [-1, 1].

use pmm_core::{Action, RandomSource};

/// Noise amplitude on the thought head.
const THOUGHT_NOISE: f32 = 0.25;
/// Noise amplitude on the workspace recurrence.
const WORKSPACE_NOISE: f32 = 0.1;
/// Weight of the hidden state fed back into the workspace.
const RECURRENT_GAIN: f32 = 0.1;
/// Noise amplitude on the value head.
const VALUE_NOISE: f32 = 0.5;

/// Result of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CortexOutput {
    pub thought: Vec<f32>,
    pub workspace: Vec<f32>,
    /// New hidden state; equals `workspace` after the pass.
    pub recurrent: Vec<f32>,
    pub value: f32,
    pub action: Action,
}

#[derive(Debug, Clone, Default)]
pub struct Cortex;

impl Cortex {
    pub fn new() -> Self {
        Self
    }

    pub fn forward(
        &self,
        thought: &[f32],
        workspace: &[f32],
        recurrent: &[f32],
        value: f32,
        rng: &mut dyn RandomSource,
    ) -> CortexOutput {
        let thought = self.thought_head(thought, rng);
        let workspace = self.workspace_core(workspace, recurrent, rng);
        let value = self.value_head(value, rng);
        let action = self.action_head(rng);
        CortexOutput {
            recurrent: workspace.clone(),
            thought,
            workspace,
            value,
            action,
        }
    }

    pub fn thought_head(&self, prev: &[f32], rng: &mut dyn RandomSource) -> Vec<f32> {
        prev.iter()
            .map(|v| bounded_tanh(v + rng.symmetric(THOUGHT_NOISE)))
            .collect()
    }

    /// workspace[i] = tanh(prev[i] + 0.1 · hidden[i] + noise)
    pub fn workspace_core(
        &self,
        prev: &[f32],
        recurrent: &[f32],
        rng: &mut dyn RandomSource,
    ) -> Vec<f32> {
        prev.iter()
            .enumerate()
            .map(|(i, v)| {
                let hidden = recurrent.get(i).copied().unwrap_or(0.0);
                bounded_tanh(v + RECURRENT_GAIN * hidden + rng.symmetric(WORKSPACE_NOISE))
            })
            .collect()
    }

    pub fn value_head(&self, prev: f32, rng: &mut dyn RandomSource) -> f32 {
        bounded_tanh(prev + rng.symmetric(VALUE_NOISE))
    }

    pub fn action_head(&self, rng: &mut dyn RandomSource) -> Action {
        Action::SAMPLEABLE[rng.index(Action::SAMPLEABLE.len())]
    }
}

/// tanh that maps non-finite input to 0 and guarantees [-1, 1].
#[inline]
pub(crate) fn bounded_tanh(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.tanh().clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::ScriptedRandom;

    #[test]
    fn test_shapes_preserved() {
        let mut rng = ScriptedRandom::new([0.1, 0.9, 0.4]);
        let out = Cortex::new().forward(&[0.0; 32], &[0.0; 64], &[0.0; 64], 0.0, &mut rng);
        assert_eq!(out.thought.len(), 32);
        assert_eq!(out.workspace.len(), 64);
        assert_eq!(out.recurrent, out.workspace);
    }

    #[test]
    fn test_zero_noise_is_tanh() {
        let mut rng = ScriptedRandom::constant(0.5);
        let cortex = Cortex::new();
        let ws = cortex.workspace_core(&[0.5], &[1.0], &mut rng);
        assert!((ws[0] - (0.6f32).tanh()).abs() < 1e-6);
        let th = cortex.thought_head(&[2.0], &mut rng);
        assert!((th[0] - 2.0f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_outputs_bounded_under_extremes() {
        let mut rng = ScriptedRandom::new([0.0, 0.999]);
        let cortex = Cortex::new();
        let out = cortex.forward(
            &[f32::INFINITY, f32::NAN, -1.0],
            &[f32::NEG_INFINITY, 1.0],
            &[50.0],
            f32::NAN,
            &mut rng,
        );
        for v in out.thought.iter().chain(out.workspace.iter()) {
            assert!((-1.0..=1.0).contains(v), "unbounded {v}");
        }
        assert!((-1.0..=1.0).contains(&out.value));
    }

    #[test]
    fn test_action_head_never_boots() {
        let mut rng = ScriptedRandom::new([0.0, 0.3, 0.6, 0.999]);
        for _ in 0..8 {
            assert_ne!(Cortex::new().action_head(&mut rng), Action::BootSequence);
        }
    }
}

use crate::error::{Result, TrainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Forward,
    Backward,
}

/// Per-sequence activation history with an explicit time cursor.
///
/// Every forward step records the buffers a module needs to differentiate that
/// step (inputs, hidden states, ...); by convention the last buffer of a step
/// is the module output. The backward pass walks the recorded steps in reverse.
#[derive(Debug, Clone)]
pub struct StepTrace {
    time: usize,
    phase: Phase,
    steps: Vec<Vec<Vec<f64>>>,
}

impl StepTrace {
    pub fn new() -> StepTrace {
        StepTrace { time: 0, phase: Phase::Forward, steps: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.time = 0;
        self.phase = Phase::Forward;
        self.steps.clear();
    }

    /// Current time index: steps recorded and not yet consumed backward.
    pub fn time(&self) -> usize {
        self.time
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Buffers of the most recently recorded step.
    pub fn last(&self) -> Option<&[Vec<f64>]> {
        self.time.checked_sub(1).map(|t| self.steps[t].as_slice())
    }

    /// Records one forward step and advances the time index.
    pub fn push(&mut self, buffers: Vec<Vec<f64>>) -> Result<()> {
        if self.phase == Phase::Backward {
            return Err(TrainError::TimeIndex {
                message: "forward step after the backward pass started; reset the module first",
            });
        }
        self.steps.push(buffers);
        self.time += 1;
        Ok(())
    }

    /// Moves the cursor one step back and returns the index of the step to
    /// differentiate.
    pub fn rewind(&mut self) -> Result<usize> {
        if self.time == 0 {
            return Err(TrainError::TimeIndex {
                message: "backward step without a matching forward step",
            });
        }
        self.phase = Phase::Backward;
        self.time -= 1;
        Ok(self.time)
    }

    pub fn step(&self, t: usize) -> &[Vec<f64>] {
        &self.steps[t]
    }

    pub fn output(&self, t: usize) -> Option<&[f64]> {
        self.steps.get(t).and_then(|s| s.last()).map(|v| v.as_slice())
    }
}

impl Default for StepTrace {
    fn default() -> Self {
        StepTrace::new()
    }
}

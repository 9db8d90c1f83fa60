//! Deployment progress estimation from log markers

use serde::Serialize;

/// A known stage of the deploy runner, recognized by a marker in its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub marker: &'static str,
    pub label: &'static str,
}

/// Stages in the order the runner executes them
pub const DEPLOYMENT_STEPS: [ProgressStep; 5] = [
    ProgressStep {
        marker: "rustup install",
        label: "Install Rust Toolchain",
    },
    ProgressStep {
        marker: "rustup override set",
        label: "Set Rust Toolchain Version",
    },
    ProgressStep {
        marker: "cargo generate-lockfile",
        label: "Generate Cargo Lockfile",
    },
    ProgressStep {
        marker: "docker run",
        label: "Build Contract with Docker",
    },
    ProgressStep {
        marker: "/root/go/bin/seid tx wasm store",
        label: "Deploy Contract to SEI",
    },
];

/// Highest stage seen so far; never moves backwards
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    current: Option<usize>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one more line, returning the current index
    pub fn observe(&mut self, line: &str) -> Option<usize> {
        let highest = DEPLOYMENT_STEPS
            .iter()
            .rposition(|step| line.contains(step.marker));
        if highest > self.current {
            self.current = highest;
        }
        self.current
    }

    pub fn index(&self) -> Option<usize> {
        self.current
    }

    pub fn step(&self) -> Option<&'static ProgressStep> {
        self.current.map(|i| &DEPLOYMENT_STEPS[i])
    }

    /// Fraction of known steps reached, for progress bars
    pub fn fraction(&self) -> f32 {
        self.current
            .map(|i| (i + 1) as f32 / DEPLOYMENT_STEPS.len() as f32)
            .unwrap_or(0.0)
    }
}

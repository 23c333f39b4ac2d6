use serde::{Deserialize, Serialize};

/// Evaluation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Depth used by [`crate::Evaluator::evaluate_attributes`] and other default-depth callers.
    pub default_depth: i32,
    /// Number of passes any evaluation may take before it stops.
    ///
    /// Negative depths run until this limit; positive depths are capped at it.
    pub recursion_safety_limit: u32,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            default_depth: 1,
            recursion_safety_limit: 20,
        }
    }
}

impl TemplateConfig {
    pub fn with_default_depth(mut self, depth: i32) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn with_recursion_safety_limit(mut self, limit: u32) -> Self {
        self.recursion_safety_limit = limit;
        self
    }

    /// Largest positive depth honored. Never below 1, so a single pass always runs.
    #[inline]
    pub(crate) fn depth_ceiling(&self) -> i64 {
        i64::from(self.recursion_safety_limit.max(1))
    }

    /// The depth at or below which unbounded evaluation stops.
    #[inline]
    pub(crate) fn depth_floor(&self) -> i64 {
        -i64::from(self.recursion_safety_limit)
    }
}

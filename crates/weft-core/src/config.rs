/// Engine settings attached to a class and inherited by its subclasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// What a dispatch does after a listener or advice fails.
    pub failure_policy: FailurePolicy,
    /// Emit a trace event for every listener invocation.
    pub trace_dispatch: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            failure_policy: FailurePolicy::Isolate,
            trace_dispatch: false,
        }
    }
}

impl Settings {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and keep notifying the remaining listeners
    #[default]
    Isolate,
    /// Stop the dispatch at the first failure
    Halt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_isolates() {
        let settings = Settings::default();
        assert_eq!(settings.failure_policy, FailurePolicy::Isolate);
        assert!(!settings.trace_dispatch);
    }

    #[test]
    fn test_builder() {
        let settings = Settings::default()
            .with_failure_policy(FailurePolicy::Halt)
            .with_trace_dispatch(true);
        assert_eq!(settings.failure_policy, FailurePolicy::Halt);
        assert!(settings.trace_dispatch);
    }
}

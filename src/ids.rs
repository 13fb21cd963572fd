//! Render-scoped identifier allocation
//!
//! Every diagram producer draws node identifiers from one [`RenderContext`]
//! created fresh per render and passed explicitly down the call tree. Nothing
//! here is global, so back-to-back or concurrent renders can never collide.

use indexmap::IndexMap;

/// Well-known counter scopes
pub mod scope {
    pub const RESOURCE_ACCOUNT: &str = "resourceAccount";
    pub const VOICE_APP: &str = "voiceApp";
    pub const CALL_QUEUE: &str = "callQueue";
    pub const HOLIDAY: &str = "holiday";
    pub const TOP_LEVEL_NUMBER: &str = "topLevelNumber";
    pub const ATTENDANT_DEFAULT: &str = "autoAttendantDefault";
    pub const ATTENDANT_AFTER_HOURS: &str = "autoAttendantAfterHours";
}

/// Monotonic per-scope counters for one render
///
/// Counters start at 1 and are never reused; different scopes are fully
/// independent. Insertion order is kept so that diagnostic dumps of the
/// counter table are deterministic.
#[derive(Debug, Default)]
pub struct RenderContext {
    counters: IndexMap<String, u64>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next value for the named scope
    pub fn next(&mut self, scope: &str) -> u64 {
        let counter = self.counters.entry(scope.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Allocate a node id of the form `{scope}{n}`
    pub fn node_id(&mut self, scope: &str) -> String {
        let n = self.next(scope);
        format!("{scope}{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_monotonic() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.next(scope::CALL_QUEUE), 1);
        assert_eq!(ctx.next(scope::CALL_QUEUE), 2);
        assert_eq!(ctx.next(scope::CALL_QUEUE), 3);
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.next(scope::CALL_QUEUE), 1);
        assert_eq!(ctx.next(scope::HOLIDAY), 1);
        assert_eq!(ctx.next(scope::CALL_QUEUE), 2);
        assert_eq!(ctx.next(scope::HOLIDAY), 2);
    }

    #[test]
    fn test_node_id_format() {
        let mut ctx = RenderContext::new();
        assert_eq!(ctx.node_id(scope::HOLIDAY), "holiday1");
        assert_eq!(ctx.node_id(scope::HOLIDAY), "holiday2");
    }

    #[test]
    fn test_fresh_context_restarts() {
        let mut first = RenderContext::new();
        first.next(scope::VOICE_APP);
        let mut second = RenderContext::new();
        assert_eq!(second.next(scope::VOICE_APP), 1);
    }
}

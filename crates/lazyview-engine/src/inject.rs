//! Injected Script Sequencing
//!
//! Scripts found in injected markup run in document order. A blocking
//! external script that has later siblings must fully load before the next
//! one begins; non-blocking scripts are started without waiting.

use std::collections::VecDeque;

use crate::element::ElementId;
use crate::host::{HostPage, ScriptRef};

#[derive(Debug, Default)]
pub struct ScriptQueue {
    queue: VecDeque<(ElementId, ScriptRef)>,
    /// Id of the blocking script whose load we are waiting on.
    waiting_on: Option<u64>,
}

impl ScriptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the scripts of a fresh injection and run as many as possible.
    pub fn begin(&mut self, host: &mut dyn HostPage, element: ElementId, scripts: Vec<ScriptRef>) {
        for script in scripts {
            self.queue.push_back((element, script));
        }
        self.pump(host);
    }

    /// A blocking script finished loading; resume the queue.
    pub fn script_finished(&mut self, host: &mut dyn HostPage, script_id: u64) {
        if self.waiting_on == Some(script_id) {
            self.waiting_on = None;
            self.pump(host);
        }
    }

    pub fn idle(&self) -> bool {
        self.waiting_on.is_none() && self.queue.is_empty()
    }

    fn pump(&mut self, host: &mut dyn HostPage) {
        while self.waiting_on.is_none() {
            let Some((element, script)) = self.queue.pop_front() else {
                break;
            };
            host.run_script(element, script);
            // Only wait when something actually comes after the script.
            if script.external && script.blocking && !self.queue.is_empty() {
                self.waiting_on = Some(script.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyview_geometry::{Rect, ViewportSize};
    use lazyview_select::ConditionalFormat;

    #[derive(Default)]
    struct ScriptHost {
        ran: Vec<u64>,
    }

    impl HostPage for ScriptHost {
        fn managed_elements(&self) -> Vec<ElementId> {
            Vec::new()
        }
        fn attribute(&self, _: ElementId, _: &str) -> Option<String> {
            None
        }
        fn set_attribute(&mut self, _: ElementId, _: &str, _: &str) {}
        fn remove_attribute(&mut self, _: ElementId, _: &str) {}
        fn bounding_rect(&self, _: ElementId) -> Rect {
            Rect::default()
        }
        fn viewport(&self) -> ViewportSize {
            ViewportSize::default()
        }
        fn start_fetch(&mut self, _: u64, _: &str) {}
        fn set_background_image(&mut self, _: ElementId, _: &str) {}
        fn inject_markup(&mut self, _: ElementId, _: &str) -> Vec<ScriptRef> {
            Vec::new()
        }
        fn run_script(&mut self, _: ElementId, script: ScriptRef) {
            self.ran.push(script.id);
        }
        fn decode_probe(&mut self, _: ConditionalFormat, _: &str) {}
        fn dispatch_lazy_load(&mut self, _: ElementId) {}
        fn observe_intersection(&mut self, _: ElementId, _: Option<&str>) {}
        fn observe_scroll_ancestors(&mut self, _: ElementId) {}
    }

    fn inline(id: u64) -> ScriptRef {
        ScriptRef { id, external: false, blocking: true }
    }

    fn external(id: u64, blocking: bool) -> ScriptRef {
        ScriptRef { id, external: true, blocking }
    }

    #[test]
    fn test_inline_scripts_run_in_order() {
        let mut host = ScriptHost::default();
        let mut queue = ScriptQueue::new();
        queue.begin(&mut host, ElementId(1), vec![inline(1), inline(2), inline(3)]);
        assert_eq!(host.ran, vec![1, 2, 3]);
        assert!(queue.idle());
    }

    #[test]
    fn test_blocking_external_gates_successors() {
        let mut host = ScriptHost::default();
        let mut queue = ScriptQueue::new();
        queue.begin(&mut host, ElementId(1), vec![external(1, true), inline(2)]);
        assert_eq!(host.ran, vec![1]);
        assert!(!queue.idle());

        queue.script_finished(&mut host, 1);
        assert_eq!(host.ran, vec![1, 2]);
        assert!(queue.idle());
    }

    #[test]
    fn test_async_external_does_not_wait() {
        let mut host = ScriptHost::default();
        let mut queue = ScriptQueue::new();
        queue.begin(&mut host, ElementId(1), vec![external(1, false), inline(2)]);
        assert_eq!(host.ran, vec![1, 2]);
    }

    #[test]
    fn test_trailing_blocking_script_does_not_wait() {
        let mut host = ScriptHost::default();
        let mut queue = ScriptQueue::new();
        queue.begin(&mut host, ElementId(1), vec![inline(1), external(2, true)]);
        assert_eq!(host.ran, vec![1, 2]);
        assert!(queue.idle());
    }

    #[test]
    fn test_unrelated_script_completion_ignored() {
        let mut host = ScriptHost::default();
        let mut queue = ScriptQueue::new();
        queue.begin(&mut host, ElementId(1), vec![external(1, true), inline(2)]);
        queue.script_finished(&mut host, 99);
        assert_eq!(host.ran, vec![1]);
    }
}

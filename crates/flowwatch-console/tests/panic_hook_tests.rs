//! The panic hook is process-global, so this file holds a single test.

use std::sync::atomic::{AtomicUsize, Ordering};

use flowwatch_console::PanicHookGuard;

static PREVIOUS_HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn guard_chains_then_reinstates_previous_hook() {
    std::panic::set_hook(Box::new(|_| {
        PREVIOUS_HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));

    let guard = PanicHookGuard::install();
    let _ = std::panic::catch_unwind(|| panic!("while the dashboard is open"));
    assert_eq!(PREVIOUS_HOOK_CALLS.load(Ordering::SeqCst), 1);

    drop(guard);
    let _ = std::panic::catch_unwind(|| panic!("after the dashboard closed"));
    assert_eq!(PREVIOUS_HOOK_CALLS.load(Ordering::SeqCst), 2);

    drop(std::panic::take_hook());
}

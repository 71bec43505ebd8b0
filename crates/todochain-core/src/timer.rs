use std::future::Future;
use std::time::Duration;

/// Host-provided sleep. Browser hosts back this with `setTimeout`.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

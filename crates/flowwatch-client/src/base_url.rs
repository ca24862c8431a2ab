use std::sync::{Arc, PoisonError, RwLock};

/// Live handle on the API base URL input.
///
/// The console edits the text in place while the client reads it on every
/// request, so a change takes effect on the next call without restarting
/// anything.
#[derive(Debug, Clone, Default)]
pub struct BaseUrl(Arc<RwLock<String>>);

impl BaseUrl {
    pub fn new(initial: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(initial.into())))
    }

    /// Trimmed value used to build request URLs. Empty means same origin.
    pub fn current(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .trim()
            .to_string()
    }

    /// Untrimmed input text, as typed.
    pub fn raw(&self) -> String {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    pub fn edit<R>(&self, f: impl FnOnce(&mut String) -> R) -> R {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_is_trimmed_and_shared() {
        let url = BaseUrl::new("  http://monitor:5001 ");
        let handle = url.clone();
        assert_eq!(url.current(), "http://monitor:5001");

        handle.set("http://other:8080");
        assert_eq!(url.current(), "http://other:8080");

        url.edit(|s| s.push('/'));
        assert_eq!(handle.raw(), "http://other:8080/");
    }
}

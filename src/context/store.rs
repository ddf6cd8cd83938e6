use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::keys::{ContextKey, Slot};

struct Frame {
    slot: Slot,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Frame>>,
}

/// Immutable, append-only chain of typed values for one in-flight call.
///
/// Cloning is cheap (one `Arc`). A write returns a new handle whose newest
/// frame points at the old head; readers holding the old handle are not
/// affected.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Frame>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer `value` under key `K` on top of this context.
    pub fn with<K: ContextKey>(&self, value: K::Value) -> Self {
        let frame = Frame {
            slot: K::SLOT,
            value: Box::new(value),
            parent: self.head.clone(),
        };

        Self {
            head: Some(Arc::new(frame)),
        }
    }

    /// Newest value stored under `K`, if any.
    pub fn get<K: ContextKey>(&self) -> Option<&K::Value> {
        let mut cursor = self.head.as_deref();
        while let Some(frame) = cursor {
            if frame.slot == K::SLOT {
                return frame.value.downcast_ref::<K::Value>();
            }
            cursor = frame.parent.as_deref();
        }
        None
    }

    pub fn contains<K: ContextKey>(&self) -> bool {
        self.get::<K>().is_some()
    }

    fn slots(&self) -> Vec<Slot> {
        let mut out = Vec::new();
        let mut cursor = self.head.as_deref();
        while let Some(frame) = cursor {
            if !out.contains(&frame.slot) {
                out.push(frame.slot);
            }
            cursor = frame.parent.as_deref();
        }
        out
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may hold credentials; only list which keys are set.
        f.debug_struct("Context")
            .field("slots", &self.slots())
            .finish()
    }
}

/// Response headers staged by hooks or handlers during a call.
///
/// This is a handle: clones share the same header map, and the RPC server
/// drains it onto the outgoing response.
#[derive(Clone, Default)]
pub struct StagedHeaders {
    inner: Arc<Mutex<HeaderMap>>,
}

impl StagedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: HeaderName, value: HeaderValue) {
        self.lock().insert(name, value);
    }

    pub fn take(&self) -> HeaderMap {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, HeaderMap> {
        // A poisoned map is still a valid map.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for StagedHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedHeaders")
            .field("len", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::keys;

    #[test]
    fn test_empty_context_has_nothing() {
        let ctx = Context::new();
        assert!(ctx.get::<keys::Sign>().is_none());
        assert!(!ctx.contains::<keys::CallerId>());
    }

    #[test]
    fn test_with_does_not_touch_parent() {
        let parent = Context::new().with::<keys::Sign>("abc".to_string());
        let child = parent.with::<keys::Device>("ios".to_string());

        assert_eq!(child.get::<keys::Sign>().map(String::as_str), Some("abc"));
        assert_eq!(child.get::<keys::Device>().map(String::as_str), Some("ios"));
        assert!(parent.get::<keys::Device>().is_none());
    }

    #[test]
    fn test_newest_frame_wins() {
        let ctx = Context::new()
            .with::<keys::CallerId>(1)
            .with::<keys::CallerId>(2);
        assert_eq!(ctx.get::<keys::CallerId>(), Some(&2));
    }

    #[test]
    fn test_siblings_are_independent() {
        let root = Context::new().with::<keys::Platform>("web".to_string());
        let a = root.with::<keys::CallerId>(7);
        let b = root.with::<keys::CallerId>(8);

        assert_eq!(a.get::<keys::CallerId>(), Some(&7));
        assert_eq!(b.get::<keys::CallerId>(), Some(&8));
        assert!(root.get::<keys::CallerId>().is_none());
    }

    #[test]
    fn test_keys_with_same_value_type_do_not_collide() {
        let ctx = Context::new()
            .with::<keys::PartIds>("1,2".to_string())
            .with::<keys::DepartmentIds>("3,4".to_string());

        assert_eq!(ctx.get::<keys::PartIds>().map(String::as_str), Some("1,2"));
        assert_eq!(
            ctx.get::<keys::DepartmentIds>().map(String::as_str),
            Some("3,4")
        );
    }

    #[test]
    fn test_debug_hides_values() {
        let ctx = Context::new().with::<keys::Sign>("secret-token".to_string());
        let printed = format!("{ctx:?}");
        assert!(printed.contains("Sign"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn test_staged_headers_are_shared_between_clones() {
        let staged = StagedHeaders::new();
        let clone = staged.clone();
        clone.insert(
            HeaderName::from_static("x-caller"),
            HeaderValue::from_static("7"),
        );

        let drained = staged.take();
        assert_eq!(drained.get("x-caller").unwrap(), "7");
        assert!(staged.take().is_empty());
    }
}

// Path navigation and in-place mutation over a decoded Value tree.
//
// `Container` owns the root. `Node` is what navigation hands out: either the
// root itself, a (parent, key) pair borrowed out of the tree, or absent.
// The absent state keeps the whole method surface so chained calls never
// need checks in between.
use tracing::trace;

use crate::path::format_path;
use crate::value::{Key, Value};

/// Root owner of a decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    data: Value,
}

impl Container {
    pub fn new(data: impl Into<Value>) -> Self {
        Self { data: data.into() }
    }

    /// Decode `bytes` with any decoder; its error is returned unmodified.
    pub fn from_bytes<F, E>(bytes: &[u8], decode: F) -> Result<Self, E>
    where
        F: FnOnce(&[u8]) -> Result<Value, E>,
    {
        decode(bytes).map(Self::new)
    }

    /// Invoke a streaming decoder exactly once and wrap what it produced.
    pub fn from_stream<F, E>(decode: F) -> Result<Self, E>
    where
        F: FnOnce() -> Result<Value, E>,
    {
        decode().map(Self::new)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// The root as a navigable node.
    pub fn root(&mut self) -> Node<'_> {
        Node::root(&mut self.data)
    }

    pub fn get(&mut self, path: &[Key]) -> Node<'_> {
        self.root().get(path)
    }

    pub fn has(&self, path: &[Key]) -> bool {
        lookup(&self.data, path).is_some()
    }

    /// Overwrite the root value. Never rejected.
    pub fn replace(&mut self, with: impl Into<Value>) -> &mut Self {
        self.data = with.into();
        self
    }

    pub fn set_data(&mut self, with: impl Into<Value>) -> &mut Self {
        self.replace(with)
    }

    /// Delete the value at `path`; missing paths are a no-op. Returns `self`
    /// so deletions can be chained.
    pub fn delete(&mut self, path: &[Key]) -> &mut Self {
        self.root().delete(path);
        self
    }
}

impl From<Value> for Container {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

#[derive(Debug)]
enum Link<'a> {
    Root(&'a mut Value),
    Child { parent: &'a mut Value, key: Key },
}

/// Handle on one location in a tree, as returned by [`Container::get`].
///
/// A non-root node borrows its parent value and remembers the key that
/// selects it; writes go through that borrow, so they are visible from the
/// owning [`Container`] once the node is dropped. An absent node stands for
/// both NotFound (failed navigation) and Rejected (failed replace).
#[derive(Debug)]
pub struct Node<'a> {
    link: Option<Link<'a>>,
}

impl<'a> Node<'a> {
    pub fn root(data: &'a mut Value) -> Self {
        Self {
            link: Some(Link::Root(data)),
        }
    }

    pub fn absent() -> Self {
        Self { link: None }
    }

    fn child(parent: &'a mut Value, key: Key) -> Self {
        Self {
            link: Some(Link::Child { parent, key }),
        }
    }

    pub fn exists(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_absent(&self) -> bool {
        self.link.is_none()
    }

    pub fn is_root(&self) -> bool {
        matches!(self.link, Some(Link::Root(_)))
    }

    /// Key selecting this node from its parent; `None` for roots and absent nodes.
    pub fn key(&self) -> Option<&Key> {
        match &self.link {
            Some(Link::Child { key, .. }) => Some(key),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<&Value> {
        match &self.link {
            Some(Link::Child { parent, .. }) => Some(&**parent),
            _ => None,
        }
    }

    /// Current value, read through the parent.
    pub fn data(&self) -> Option<&Value> {
        match &self.link {
            Some(Link::Root(data)) => Some(&**data),
            Some(Link::Child { parent, key }) => step(parent, key),
            None => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut Value> {
        match &mut self.link {
            Some(Link::Root(data)) => Some(&mut **data),
            Some(Link::Child { parent, key }) => step_mut(parent, key),
            None => None,
        }
    }

    pub fn into_data(self) -> Option<&'a mut Value> {
        match self.link? {
            Link::Root(data) => Some(data),
            Link::Child { parent, key } => step_mut(parent, &key),
        }
    }

    /// Shorter-lived handle on the same location.
    pub fn by_ref(&mut self) -> Node<'_> {
        match &mut self.link {
            Some(Link::Root(data)) => Node::root(data),
            Some(Link::Child { parent, key }) => Node::child(parent, key.clone()),
            None => Node::absent(),
        }
    }

    /// Walk `path` left to right from this node. The first step that cannot
    /// proceed (missing key, key type mismatch, index out of range, scalar
    /// with path remaining) makes the result absent. An empty path returns
    /// the node unchanged.
    pub fn get(self, path: &[Key]) -> Node<'a> {
        let Some((last, init)) = path.split_last() else {
            return self;
        };
        let Some(mut current) = self.into_data() else {
            return Node::absent();
        };
        for (depth, key) in init.iter().enumerate() {
            match step_mut(current, key) {
                Some(next) => current = next,
                None => {
                    trace!(path = %format_path(path), depth, "navigation stopped");
                    return Node::absent();
                }
            }
        }
        if step(current, last).is_none() {
            trace!(path = %format_path(path), depth = init.len(), "navigation stopped");
            return Node::absent();
        }
        Node::child(current, last.clone())
    }

    pub fn has(&self, path: &[Key]) -> bool {
        self.data().and_then(|data| lookup(data, path)).is_some()
    }

    /// Install `with` at this node's location. Roots are overwritten
    /// directly. A child is written into its parent only if the key still
    /// resolves there; otherwise the result is absent and the tree is
    /// untouched.
    pub fn replace(self, with: impl Into<Value>) -> Node<'a> {
        let with = with.into();
        match self.link {
            Some(Link::Root(data)) => {
                *data = with;
                Node::root(data)
            }
            Some(Link::Child { parent, key }) => match step_mut(parent, &key) {
                Some(slot) => {
                    *slot = with;
                    Node::child(parent, key)
                }
                None => {
                    trace!(%key, "replace rejected");
                    Node::absent()
                }
            },
            None => Node::absent(),
        }
    }

    pub fn set_data(self, with: impl Into<Value>) -> Node<'a> {
        self.replace(with)
    }

    /// Delete the value at `path` below this node and return this node.
    ///
    /// An empty path nulls this node's own value. Map entries are removed in
    /// place; a sequence element is removed by installing the shortened
    /// sequence in the sequence's own slot via [`Node::replace`]. Paths that
    /// do not resolve are a no-op.
    pub fn delete(&mut self, path: &[Key]) -> &mut Self {
        let Some((last, init)) = path.split_last() else {
            if let Some(data) = self.data_mut() {
                *data = Value::Null;
            }
            return self;
        };
        let mut parent = self.by_ref().get(init);
        let shortened = match parent.data_mut() {
            Some(Value::Mapping(map)) => {
                if map.remove(last).is_none() {
                    trace!(path = %format_path(path), "delete: no such key");
                }
                None
            }
            Some(Value::Sequence(items)) => match last.index_in(items.len()) {
                Some(idx) => {
                    let mut items = std::mem::take(items);
                    items.remove(idx);
                    Some(items)
                }
                None => {
                    trace!(path = %format_path(path), "delete: index out of range");
                    None
                }
            },
            _ => {
                trace!(path = %format_path(path), "delete: parent not found");
                None
            }
        };
        if let Some(items) = shortened {
            parent.replace(Value::Sequence(items));
        }
        self
    }
}

/// One navigation step: mapping lookup by key, or in-range sequence index.
fn step<'v>(value: &'v Value, key: &Key) -> Option<&'v Value> {
    match value {
        Value::Mapping(map) => map.get(key),
        Value::Sequence(items) => key.index_in(items.len()).map(|idx| &items[idx]),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut Value, key: &Key) -> Option<&'v mut Value> {
    match value {
        Value::Mapping(map) => map.get_mut(key),
        Value::Sequence(items) => {
            let idx = key.index_in(items.len())?;
            items.get_mut(idx)
        }
        _ => None,
    }
}

/// Read-only walk used by `has`.
pub fn lookup<'v>(value: &'v Value, path: &[Key]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| step(current, key))
}

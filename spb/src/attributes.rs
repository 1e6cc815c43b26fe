//! Key/value attribute lists passed to the native choose-config and
//! create-context entry points.

/// An ordered list of `(key, value)` pairs closed by a terminator.
///
/// The terminator is appended only when the list is flattened, so the pairs
/// can be inspected without native calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeList<T> {
    pairs: Vec<(T, T)>,
    terminator: T,
}

impl<T: Copy + PartialEq> AttributeList<T> {
    pub fn new(terminator: T) -> Self {
        Self { pairs: Vec::with_capacity(16), terminator }
    }

    /// Append an attribute.
    #[inline]
    pub fn push(&mut self, key: T, value: T) -> &mut Self {
        self.pairs.push((key, value));
        self
    }

    /// Append an attribute only when `condition` holds.
    #[inline]
    pub fn push_if(&mut self, condition: bool, key: T, value: T) -> &mut Self {
        if condition {
            self.pairs.push((key, value));
        }
        self
    }

    /// The value of the first pair using `key`.
    pub fn get(&self, key: T) -> Option<T> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn contains(&self, key: T) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> &[(T, T)] {
        &self.pairs
    }

    /// The keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = T> + '_ {
        self.pairs.iter().map(|(k, _)| *k)
    }

    pub fn terminator(&self) -> T {
        self.terminator
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Flatten into `key, value, key, value, ..., terminator`, the layout the
    /// native entry points read.
    pub fn to_raw(&self) -> Vec<T> {
        let mut raw = Vec::with_capacity(self.pairs.len() * 2 + 1);
        for &(key, value) in &self.pairs {
            raw.push(key);
            raw.push(value);
        }
        raw.push(self.terminator);
        raw
    }

    /// Parse a flattened list back. Reading stops at the first key equal to
    /// `terminator`.
    pub fn from_raw(raw: &[T], terminator: T) -> Self {
        let mut list = Self::new(terminator);
        let mut iter = raw.chunks(2);
        while let Some(&[key, value]) = iter.next() {
            if key == terminator {
                break;
            }
            list.push(key, value);
        }
        list
    }
}

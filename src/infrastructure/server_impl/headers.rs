use compact_str::CompactString;
use fnv::FnvHashMap;
use unicase::UniCase;

/// Header mapping with case-insensitive names.
///
/// Lookups fold case through [UniCase]; the spelling of the last insert is the
/// one written back out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    inner: FnvHashMap<UniCase<CompactString>, CompactString>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&UniCase::new(CompactString::from(name)))
            .map(|c| c.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name`, replacing any value stored under another casing.
    pub fn insert(&mut self, name: &str, value: impl Into<CompactString>) {
        let key = UniCase::new(CompactString::from(name));
        self.inner.remove(&key);
        self.inner.insert(key, value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<CompactString> {
        self.inner.remove(&UniCase::new(CompactString::from(name)))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: AsRef<str>,
    V: Into<CompactString>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

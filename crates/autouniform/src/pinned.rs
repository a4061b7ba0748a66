/// Variables surfaced in the quick-access panel, referenced by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedList {
    names: Vec<String>,
}

impl PinnedList {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Pin a variable. Returns false if it was already pinned.
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Unpin by name. Returns false if the name was not pinned.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for PinnedList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = Self::new();
        for name in iter {
            list.add(&name);
        }
        list
    }
}

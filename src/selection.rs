/// The attribute currently driving map colors and bar heights.
///
/// Owned by the app and handed out by reference; `select` is the one place the
/// expressed attribute changes.
#[derive(Clone, Debug)]
pub struct Selection {
    attributes: Vec<String>,
    index: usize,
}

impl Selection {
    /// Start on `initial` when it names a known attribute, else on the first one
    pub fn new(attributes: Vec<String>, initial: Option<&str>) -> Self {
        let index = match initial {
            Some(name) => attributes.iter().position(|a| a == name).unwrap_or_else(|| {
                tracing::warn!(
                    attribute = name,
                    available = ?attributes,
                    "unknown attribute, starting on the first one"
                );
                0
            }),
            None => 0,
        };
        Self { attributes, index }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The expressed attribute, `""` when no attributes are configured
    pub fn expressed(&self) -> &str {
        self.attributes.get(self.index).map_or("", String::as_str)
    }

    /// Express attribute `index`; returns true when the expressed attribute changed
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.attributes.len() || index == self.index {
            return false;
        }
        self.index = index;
        true
    }

    pub fn select_column(&mut self, column: &str) -> bool {
        match self.attributes.iter().position(|a| a == column) {
            Some(idx) => self.select(idx),
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        if self.attributes.is_empty() {
            return false;
        }
        self.select((self.index + 1) % self.attributes.len())
    }

    pub fn prev(&mut self) -> bool {
        if self.attributes.is_empty() {
            return false;
        }
        let len = self.attributes.len();
        self.select((self.index + len - 1) % len)
    }
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub const DEFAULT_NUMBER: usize = 1;
    pub const DEFAULT_SIZE: usize = 50;

    /// Returns `None` unless both the page number and size are at least 1.
    pub fn new(number: usize, size: usize) -> Option<Self> {
        (number >= 1 && size >= 1).then_some(Self { number, size })
    }

    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: Self::DEFAULT_NUMBER,
            size: Self::DEFAULT_SIZE,
        }
    }
}

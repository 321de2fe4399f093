use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct PageSize(pub u16);

impl PageSize {
    pub const MAX: PageSize = PageSize(100);

    /// Row limit with the page size clamped to `1..=MAX`.
    pub fn limit(&self) -> usize {
        self.0.clamp(1, Self::MAX.0) as usize
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(20)
    }
}

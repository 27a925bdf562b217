use crate::error::{GastosError, Result};

/// Rows-per-page choices offered by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    Five,
    Ten,
    TwentyFive,
}

impl PageSize {
    pub const OPTIONS: [PageSize; 3] = [PageSize::Five, PageSize::Ten, PageSize::TwentyFive];

    pub fn get(self) -> usize {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::TwentyFive => 25,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = GastosError;

    fn try_from(n: usize) -> Result<Self> {
        Self::OPTIONS
            .into_iter()
            .find(|size| size.get() == n)
            .ok_or_else(|| GastosError::Other(format!("page size must be 5, 10 or 25 (got {n})")))
    }
}

/// The slice of `rows` on page `index`. Out-of-range pages are empty.
pub fn page<T>(rows: &[T], index: usize, size: usize) -> &[T] {
    let start = index.saturating_mul(size).min(rows.len());
    let end = start.saturating_add(size).min(rows.len());
    &rows[start..end]
}

/// Current page position. Every mutator takes the filtered row count and
/// leaves `page * size < max(1, len)` true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pager {
    page: usize,
    size: PageSize,
}

impl Pager {
    pub fn new(size: PageSize) -> Self {
        Self { page: 0, size }
    }

    #[cfg(test)]
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.size.get()).max(1)
    }

    /// Move to `page`, stopping at the last page.
    pub fn set_page(&mut self, page: usize, len: usize) {
        self.page = page.min(self.page_count(len) - 1);
    }

    /// Change the page size. The current page is kept while it still
    /// contains rows; otherwise the pager goes back to the first page.
    pub fn set_page_size(&mut self, size: PageSize, len: usize) {
        self.size = size;
        if self.page.saturating_mul(size.get()) >= len.max(1) {
            self.page = 0;
        }
    }

    /// Pull the page back inside bounds after the row count changed.
    pub fn clamp(&mut self, len: usize) {
        let last = self.page_count(len) - 1;
        if self.page > last {
            self.page = last;
        }
    }

    pub fn visible<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        page(rows, self.page, self.size.get())
    }

    /// Footer text, e.g. `Mostrando 1 - 5 de 12 Registros`.
    pub fn range_label(&self, len: usize) -> String {
        let size = self.size.get();
        let from = if len == 0 { 0 } else { self.page * size + 1 };
        let to = len.min((self.page + 1) * size);
        format!("Mostrando {from} - {to} de {len} Registros")
    }
}

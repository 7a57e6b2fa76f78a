//! Bit-packed grid of scan cells already covered by accepted blocks.

use raster::Rect;

const BITS_PER_WORD: usize = 64;

/// Coarse visited mask over an analysis buffer.
///
/// Each bit covers a `cell_size`x`cell_size` square. Only cells lying
/// entirely inside a marked rectangle are set, so lattice points of a
/// neighbouring block sharing a partial cell are still scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedCells {
    words: Vec<u64>,
    cell_size: u32,
    columns: usize,
    rows: usize,
}

impl VisitedCells {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        let columns = width.div_ceil(cell_size) as usize;
        let rows = height.div_ceil(cell_size) as usize;
        Self {
            words: vec![0; (columns * rows).div_ceil(BITS_PER_WORD)],
            cell_size,
            columns,
            rows,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    #[inline]
    fn bit(&self, column: usize, row: usize) -> (usize, u64) {
        let i = row * self.columns + column;
        (i / BITS_PER_WORD, 1u64 << (i % BITS_PER_WORD))
    }

    /// True if the cell containing pixel (`x`, `y`) is marked.
    #[inline]
    pub fn is_visited(&self, x: u32, y: u32) -> bool {
        let column = (x / self.cell_size) as usize;
        let row = (y / self.cell_size) as usize;
        if column >= self.columns || row >= self.rows {
            return false;
        }
        let (word, mask) = self.bit(column, row);
        self.words[word] & mask != 0
    }

    /// Marks every cell fully covered by `rect`. Returns the number of
    /// newly marked cells.
    pub fn mark(&mut self, rect: Rect) -> usize {
        let c = self.cell_size;
        let first_column = rect.x.div_ceil(c) as usize;
        let first_row = rect.y.div_ceil(c) as usize;
        let end_column = ((rect.right() / c) as usize).min(self.columns);
        let end_row = ((rect.bottom() / c) as usize).min(self.rows);

        let mut marked = 0;
        for row in first_row..end_row {
            for column in first_column..end_column {
                let (word, mask) = self.bit(column, row);
                if self.words[word] & mask == 0 {
                    self.words[word] |= mask;
                    marked += 1;
                }
            }
        }
        marked
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

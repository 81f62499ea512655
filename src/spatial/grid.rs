//! Axis-aligned rectangles and top-level grid layouts
//!
//! Tile geometry is carried as `Rect<f64>` while it is still being halved by
//! recursive subdivision and finalized as `Rect<u32>` (`TileKey`) once it is
//! quantized. Quantization always rounds outward so the integer rectangle
//! covers every pixel the floating one touches.

use num_traits::Num;

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    /// Left edge
    pub x: T,
    /// Top edge
    pub y: T,
    /// Horizontal extent
    pub width: T,
    /// Vertical extent
    pub height: T,
}

/// Integer-quantized rectangle, the canonical key for crop caches
pub type TileKey = Rect<u32>;

impl<T: Num + Copy + PartialOrd> Rect<T> {
    /// Create a rectangle from origin and extent
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> T {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> T {
        self.y + self.height
    }

    /// Width times height
    pub fn area(&self) -> T {
        self.width * self.height
    }

    /// Extent as `[width, height]`
    pub fn size(&self) -> [T; 2] {
        [self.width, self.height]
    }

    /// Check whether `other` lies entirely within this rectangle
    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check whether the two rectangles share any area
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

impl Rect<f64> {
    /// Quantize to integer pixels, rounding the origin down and the far edge up
    pub fn quantize(&self) -> TileKey {
        let x = self.x.floor().max(0.0);
        let y = self.y.floor().max(0.0);
        let right = self.right().ceil().max(x);
        let bottom = self.bottom().ceil().max(y);

        TileKey {
            x: x as u32,
            y: y as u32,
            width: (right - x) as u32,
            height: (bottom - y) as u32,
        }
    }

    /// Split into four half-size children
    ///
    /// Children are ordered top-left, top-right, bottom-left, bottom-right,
    /// matching quadrant indices `(0,0), (1,0), (0,1), (1,1)`.
    pub fn quadrants(&self) -> [Self; 4] {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        [
            Self::new(self.x, self.y, half_w, half_h),
            Self::new(self.x + half_w, self.y, half_w, half_h),
            Self::new(self.x, self.y + half_h, half_w, half_h),
            Self::new(self.x + half_w, self.y + half_h, half_w, half_h),
        ]
    }
}

impl From<TileKey> for Rect<f64> {
    fn from(key: TileKey) -> Self {
        Self::new(
            f64::from(key.x),
            f64::from(key.y),
            f64::from(key.width),
            f64::from(key.height),
        )
    }
}

/// Divide an image into a `dimensions[0] × dimensions[1]` grid of equal cells
///
/// Cells are produced row-major.
pub fn simple_layout(width: f64, height: f64, dimensions: [u32; 2]) -> Vec<Rect<f64>> {
    let [cols, rows] = dimensions;
    let cell_w = width / f64::from(cols);
    let cell_h = height / f64::from(rows);

    let mut cells = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            cells.push(Rect::new(
                f64::from(col) * cell_w,
                f64::from(row) * cell_h,
                cell_w,
                cell_h,
            ));
        }
    }
    cells
}

/// Running-bond layout: odd rows shift right by half a cell
///
/// Odd rows start and end with a half-width cell so every row spans the full
/// image width.
pub fn brick_layout(width: f64, height: f64, dimensions: [u32; 2]) -> Vec<Rect<f64>> {
    let [cols, rows] = dimensions;
    let cell_w = width / f64::from(cols);
    let cell_h = height / f64::from(rows);
    let half_w = cell_w / 2.0;

    let mut cells = Vec::with_capacity(((cols + 1) * rows) as usize);
    for row in 0..rows {
        let y = f64::from(row) * cell_h;
        if row % 2 == 0 {
            for col in 0..cols {
                cells.push(Rect::new(f64::from(col) * cell_w, y, cell_w, cell_h));
            }
        } else {
            cells.push(Rect::new(0.0, y, half_w, cell_h));
            for col in 0..cols.saturating_sub(1) {
                cells.push(Rect::new(
                    f64::from(col).mul_add(cell_w, half_w),
                    y,
                    cell_w,
                    cell_h,
                ));
            }
            cells.push(Rect::new(width - half_w, y, half_w, cell_h));
        }
    }
    cells
}

//! Grid planning: crop rectangles from row/column counts and pixel offsets.

/// Grid parameters supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    /// Number of grid rows. Zero produces an empty plan.
    pub rows: u32,

    /// Number of grid columns. Zero produces an empty plan.
    pub cols: u32,

    /// Horizontal shift applied to every rectangle, in source pixels.
    pub offset_x: f64,

    /// Vertical shift applied to every rectangle, in source pixels.
    pub offset_y: f64,
}

impl GridSpec {
    /// A grid with neutral offsets.
    #[must_use]
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// One crop rectangle in source pixel coordinates.
///
/// Coordinates are real-valued: cell sizes come from dividing the source
/// dimensions by the grid counts, which rarely lands on whole pixels.
/// Offsets may push a rectangle partially or fully outside the source.
/// Rectangles are never clamped; the renderer samples out-of-bounds
/// regions as transparent pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub sx: f64,
    pub sy: f64,
    pub sw: f64,
    pub sh: f64,
}

/// Compute the ordered crop rectangles for a uniform grid over a
/// `width` x `height` source.
///
/// Rectangles are emitted in row-major order (outer loop rows, inner loop
/// columns) and all share the same size `(width/cols, height/rows)`. The
/// grid offsets shift every rectangle by the same amount, so cell ordering
/// and numbering are independent of them.
#[must_use]
pub fn plan(width: u32, height: u32, spec: GridSpec) -> Vec<CellRect> {
    let mut rects = Vec::with_capacity(spec.rows as usize * spec.cols as usize);
    if spec.rows == 0 || spec.cols == 0 {
        return rects;
    }

    let sw = f64::from(width) / f64::from(spec.cols);
    let sh = f64::from(height) / f64::from(spec.rows);

    for r in 0..spec.rows {
        for c in 0..spec.cols {
            rects.push(CellRect {
                sx: f64::from(c) * sw + spec.offset_x,
                sy: f64::from(r) * sh + spec.offset_y,
                sw,
                sh,
            });
        }
    }

    rects
}

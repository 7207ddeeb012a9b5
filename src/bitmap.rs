use crate::{error::Error, Matrix};

/// 1-bit bitmap ready to be sent to the printer.
///
/// Rows are stored top line first. Each row holds `ceil(width / 8)` bytes,
/// pixel `x` lives in bit `7 - x % 8` of byte `x / 8` and a set bit prints
/// black. Unused bits of the last byte stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    rows: Matrix,
}

/// Size of a label as seen by the protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelGeometry {
    pub line_width_bits: usize,
    pub line_count: usize,
}

impl LabelGeometry {
    pub fn line_width_bytes(&self) -> usize {
        (self.line_width_bits + 7) / 8
    }
}

impl Bitmap {
    /// Create an all white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let row_len = Self::row_len(width);
        Bitmap {
            width,
            rows: vec![vec![0x00; row_len]; height as usize],
        }
    }

    /// Wrap already packed rows.
    ///
    /// Fails when a row does not hold exactly `ceil(width / 8)` bytes.
    pub fn from_rows(width: u32, rows: Matrix) -> Result<Self, Error> {
        let row_len = Self::row_len(width);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != row_len) {
            return Err(Error::InvalidArgument(format!(
                "row {} has {} bytes, expected {} for a width of {} pixels",
                i,
                row.len(),
                row_len,
                width
            )));
        }
        Ok(Bitmap { width, rows })
    }

    fn row_len(width: u32) -> usize {
        ((width + 7) / 8) as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn bytes_per_row(&self) -> usize {
        Self::row_len(self.width)
    }

    pub fn rows(&self) -> &Matrix {
        &self.rows
    }

    pub fn into_rows(self) -> Matrix {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows.is_empty()
    }

    /// Geometry derived from the current rows, recomputed on every call.
    pub fn geometry(&self) -> LabelGeometry {
        LabelGeometry {
            line_width_bits: self.bytes_per_row() * 8,
            line_count: self.rows.len(),
        }
    }

    /// `true` when the pixel prints black. Out of range reads are white.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width {
            return false;
        }
        match self.rows.get(y as usize) {
            Some(row) => row[(x / 8) as usize] & Self::mask(x) != 0,
            None => false,
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width {
            return;
        }
        if let Some(row) = self.rows.get_mut(y as usize) {
            let byte = &mut row[(x / 8) as usize];
            if black {
                *byte |= Self::mask(x);
            } else {
                *byte &= !Self::mask(x);
            }
        }
    }

    fn mask(x: u32) -> u8 {
        0x80 >> (x % 8)
    }
}

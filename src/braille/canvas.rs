/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell holds a 2x4 dot grid; patterns live at U+2800..U+28FF.
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>, // Dot bits, row-major
}

/// Dot bit for (x % 2, y % 4):
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

const BLANK: u32 = 0x2800;

impl BrailleCanvas {
    /// Create a canvas of `width` x `height` characters.
    /// Pixel resolution is `width*2` x `height*4`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Set the dot at pixel (x, y); out-of-range pixels are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[x % 2][y % 4];
    }

    /// Signed variant for projected coordinates (negative values ignored)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Character at cell (cx, cy), `None` when the cell has no dots or is out of range
    pub fn cell(&self, cx: usize, cy: usize) -> Option<char> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        match self.cells[cy * self.width + cx] {
            0 => None,
            bits => char::from_u32(BLANK + bits as u32),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// Get a row as a string of Braille characters
    pub fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(BLANK + b as u32).unwrap_or(' '))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(|i| self.row_to_string(i))
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows().collect::<Vec<_>>().join("\n")
    }
}

use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set_pixel_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Crosshair with arms of `size` pixels (focused location)
pub fn draw_marker(canvas: &mut BrailleCanvas, x: i32, y: i32, size: i32) {
    for i in -size..=size {
        // Leave a gap in the middle so the point glyph stays readable
        if i.abs() < 2 {
            continue;
        }
        canvas.set_pixel_signed(x + i, y);
        canvas.set_pixel_signed(x, y + i);
    }
}

/// Circle outline (midpoint algorithm), used for the globe rim
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }
    let (mut x, mut y) = (radius, 0);
    let mut err = 1 - radius;
    while x >= y {
        for (px, py) in [
            (x, y), (y, x), (-y, x), (-x, y),
            (-x, -y), (-y, -x), (y, -x), (x, -y),
        ] {
            canvas.set_pixel_signed(cx + px, cy + py);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

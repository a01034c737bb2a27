//! Shape rasterizers drawing straight into the frame buffer.
//!
//! Coordinates are signed so shapes may hang off the panel; pixels outside
//! are dropped, and line endpoints are clamped to the panel edges.

use embedded_graphics::pixelcolor::BinaryColor;

use super::framebuffer::FrameBuffer;
use super::{HEIGHT, WIDTH};

impl FrameBuffer {
    /// Bresenham line with fast paths for vertical and horizontal lines.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: BinaryColor) {
        let mut x0 = x0.clamp(0, WIDTH - 1);
        let mut y0 = y0.clamp(0, HEIGHT - 1);
        let x1 = x1.clamp(0, WIDTH - 1);
        let y1 = y1.clamp(0, HEIGHT - 1);

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        if dx == 0 {
            for y in y0.min(y1)..=y0.max(y1) {
                self.draw_pixel(x0, y, color);
            }
            return;
        }
        if dy == 0 {
            for x in x0.min(x1)..=x0.max(x1) {
                self.draw_pixel(x, y0, color);
            }
            return;
        }

        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = (if dx > dy { dx } else { -dy }) / 2;
        loop {
            self.draw_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = err;
            if e2 > -dx {
                err -= dy;
                x0 += sx;
            }
            if e2 < dy {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Outline spanning `x..=x + w`, `y..=y + h`, clipped at the panel.
    pub fn draw_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: BinaryColor) {
        let Some((w, h)) = clip_rect(x, y, w, h) else {
            return;
        };
        self.draw_line(x, y, x + w, y, color);
        self.draw_line(x, y + h, x + w, y + h, color);
        self.draw_line(x, y, x, y + h, color);
        self.draw_line(x + w, y, x + w, y + h, color);
    }

    pub fn draw_filled_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: BinaryColor) {
        let Some((w, h)) = clip_rect(x, y, w, h) else {
            return;
        };
        for i in 0..=h {
            self.draw_line(x, y + i, x + w, y + i, color);
        }
    }

    pub fn draw_triangle(
        &mut self,
        (x1, y1): (i32, i32),
        (x2, y2): (i32, i32),
        (x3, y3): (i32, i32),
        color: BinaryColor,
    ) {
        self.draw_line(x1, y1, x2, y2, color);
        self.draw_line(x2, y2, x3, y3, color);
        self.draw_line(x3, y3, x1, y1, color);
    }

    /// Walks the edge from the first to the second vertex and fans a line
    /// from every step to the third vertex.
    pub fn draw_filled_triangle(
        &mut self,
        (x1, y1): (i32, i32),
        (x2, y2): (i32, i32),
        (x3, y3): (i32, i32),
        color: BinaryColor,
    ) {
        let deltax = i64::from(x2.abs_diff(x1));
        let deltay = i64::from(y2.abs_diff(y1));
        let mut x = x1;
        let mut y = y1;

        let step_x = if x2 >= x1 { 1 } else { -1 };
        let step_y = if y2 >= y1 { 1 } else { -1 };
        let (mut xinc1, mut xinc2) = (step_x, step_x);
        let (mut yinc1, mut yinc2) = (step_y, step_y);

        let (den, mut num, numadd, numpixels);
        if deltax >= deltay {
            xinc1 = 0;
            yinc2 = 0;
            den = deltax;
            num = deltax / 2;
            numadd = deltay;
            numpixels = deltax;
        } else {
            xinc2 = 0;
            yinc1 = 0;
            den = deltay;
            num = deltay / 2;
            numadd = deltax;
            numpixels = deltay;
        }

        for _ in 0..=numpixels {
            self.draw_line(x, y, x3, y3, color);
            num += numadd;
            if num >= den {
                num -= den;
                x = x.saturating_add(xinc1);
                y = y.saturating_add(yinc1);
            }
            x = x.saturating_add(xinc2);
            y = y.saturating_add(yinc2);
        }
    }

    /// Midpoint circle of radius `r` centred on (`x0`, `y0`).
    pub fn draw_circle(&mut self, x0: i32, y0: i32, r: i32, color: BinaryColor) {
        self.draw_pixel(x0, y0 + r, color);
        self.draw_pixel(x0, y0 - r, color);
        self.draw_pixel(x0 + r, y0, color);
        self.draw_pixel(x0 - r, y0, color);

        for (x, y) in MidpointOctant::new(r) {
            self.draw_pixel(x0 + x, y0 + y, color);
            self.draw_pixel(x0 - x, y0 + y, color);
            self.draw_pixel(x0 + x, y0 - y, color);
            self.draw_pixel(x0 - x, y0 - y, color);

            self.draw_pixel(x0 + y, y0 + x, color);
            self.draw_pixel(x0 - y, y0 + x, color);
            self.draw_pixel(x0 + y, y0 - x, color);
            self.draw_pixel(x0 - y, y0 - x, color);
        }
    }

    pub fn draw_filled_circle(&mut self, x0: i32, y0: i32, r: i32, color: BinaryColor) {
        self.draw_pixel(x0, y0 + r, color);
        self.draw_pixel(x0, y0 - r, color);
        self.draw_pixel(x0 + r, y0, color);
        self.draw_pixel(x0 - r, y0, color);
        self.draw_line(x0 - r, y0, x0 + r, y0, color);

        for (x, y) in MidpointOctant::new(r) {
            self.draw_line(x0 - x, y0 + y, x0 + x, y0 + y, color);
            self.draw_line(x0 + x, y0 - y, x0 - x, y0 - y, color);

            self.draw_line(x0 + y, y0 + x, x0 - y, y0 + x, color);
            self.draw_line(x0 + y, y0 - x, x0 - y, y0 - x, color);
        }
    }

    /// Row-major 1bpp bitmap, MSB first, each row padded to a whole byte.
    /// Set bits are drawn in `color`, clear bits are left alone.
    pub fn draw_bitmap(&mut self, x: i32, y: i32, bitmap: &[u8], w: i32, h: i32, color: BinaryColor) {
        let byte_width = (w + 7) / 8;
        for j in 0..h {
            let mut byte = 0u8;
            for i in 0..w {
                if i & 7 != 0 {
                    byte <<= 1;
                } else {
                    byte = bitmap
                        .get((j * byte_width + i / 8) as usize)
                        .copied()
                        .unwrap_or(0);
                }
                if byte & 0x80 != 0 {
                    self.draw_pixel(x + i, y + j, color);
                }
            }
        }
    }
}

/// Width and height clipped so the far edge stays on the panel, or `None`
/// when the origin is off-panel.
fn clip_rect(x: i32, y: i32, w: i32, h: i32) -> Option<(i32, i32)> {
    if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
        return None;
    }
    let w = if x.saturating_add(w) >= WIDTH { WIDTH - x } else { w };
    let h = if y.saturating_add(h) >= HEIGHT { HEIGHT - y } else { h };
    Some((w, h))
}

/// Points `(x, y)` of the second octant for radius `r`, excluding the four
/// axis points, in the order the midpoint algorithm produces them.
pub struct MidpointOctant {
    f: i32,
    ddf_x: i32,
    ddf_y: i32,
    x: i32,
    y: i32,
}

impl MidpointOctant {
    pub fn new(r: i32) -> Self {
        Self {
            f: 1 - r,
            ddf_x: 1,
            ddf_y: -2 * r,
            x: 0,
            y: r,
        }
    }
}

impl Iterator for MidpointOctant {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if self.x >= self.y {
            return None;
        }
        if self.f >= 0 {
            self.y -= 1;
            self.ddf_y += 2;
            self.f += self.ddf_y;
        }
        self.x += 1;
        self.ddf_x += 2;
        self.f += self.ddf_x;
        Some((self.x, self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(fb: &FrameBuffer) -> Vec<(i32, i32)> {
        let mut points = Vec::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if fb.pixel(x, y) == Some(BinaryColor::On) {
                    points.push((x, y));
                }
            }
        }
        points
    }

    fn sorted(mut points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
        points.sort_by_key(|&(x, y)| (y, x));
        points
    }

    #[test]
    fn bresenham_visits_expected_points() {
        let mut fb = FrameBuffer::new();
        fb.draw_line(0, 0, 6, 2, BinaryColor::On);
        assert_eq!(
            lit(&fb),
            sorted(vec![(0, 0), (1, 0), (2, 1), (3, 1), (4, 1), (5, 2), (6, 2)])
        );
    }

    #[test]
    fn steep_line_steps_in_y() {
        let mut fb = FrameBuffer::new();
        fb.draw_line(3, 5, 1, 0, BinaryColor::On);
        let points = lit(&fb);
        assert_eq!(points.len(), 6, "one pixel per row");
        assert!(points.contains(&(3, 5)) && points.contains(&(1, 0)));
    }

    #[test]
    fn axis_aligned_lines_take_fast_paths() {
        let mut fb = FrameBuffer::new();
        fb.draw_line(4, 9, 4, 2, BinaryColor::On);
        assert_eq!(lit(&fb), (2..=9).map(|y| (4, y)).collect::<Vec<_>>());

        let mut fb = FrameBuffer::new();
        fb.draw_line(20, 1, 10, 1, BinaryColor::On);
        assert_eq!(lit(&fb), (10..=20).map(|x| (x, 1)).collect::<Vec<_>>());
    }

    #[test]
    fn line_endpoints_are_clamped() {
        let mut fb = FrameBuffer::new();
        fb.draw_line(100, 70, 200, 70, BinaryColor::On);
        assert_eq!(lit(&fb), (100..=127).map(|x| (x, 63)).collect::<Vec<_>>());

        let mut fb = FrameBuffer::new();
        fb.draw_line(-5, 0, 2, 0, BinaryColor::On);
        assert_eq!(lit(&fb), vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn rectangle_is_clipped_to_panel() {
        let mut fb = FrameBuffer::new();
        fb.draw_rectangle(120, 60, 20, 20, BinaryColor::On);
        let points = lit(&fb);
        assert!(points.contains(&(120, 60)));
        assert!(points.contains(&(127, 63)));

        let mut fb = FrameBuffer::new();
        fb.draw_rectangle(130, 0, 5, 5, BinaryColor::On);
        assert!(lit(&fb).is_empty());
    }

    #[test]
    fn filled_rectangle_covers_inclusive_area() {
        let mut fb = FrameBuffer::new();
        fb.draw_filled_rectangle(2, 3, 4, 2, BinaryColor::On);
        assert_eq!(lit(&fb).len(), 5 * 3);
    }

    #[test]
    fn midpoint_octant_points() {
        let points: Vec<_> = MidpointOctant::new(5).collect();
        assert_eq!(points, vec![(1, 5), (2, 5), (3, 4), (4, 3)]);
    }

    #[test]
    fn circle_is_symmetric() {
        let mut fb = FrameBuffer::new();
        fb.draw_circle(30, 30, 5, BinaryColor::On);
        let points = lit(&fb);
        for &(x, y) in &points {
            let (dx, dy) = (x - 30, y - 30);
            assert!(points.contains(&(30 - dx, 30 + dy)));
            assert!(points.contains(&(30 + dy, 30 + dx)));
        }
        assert!(points.contains(&(35, 30)) && points.contains(&(30, 25)));
        assert!(!points.contains(&(30, 30)));
    }

    #[test]
    fn filled_circle_contains_its_outline() {
        let mut outline = FrameBuffer::new();
        outline.draw_circle(64, 32, 10, BinaryColor::On);
        let mut filled = FrameBuffer::new();
        filled.draw_filled_circle(64, 32, 10, BinaryColor::On);
        let filled_points = lit(&filled);
        for point in lit(&outline) {
            assert!(filled_points.contains(&point), "{point:?} missing");
        }
        assert!(filled_points.contains(&(64, 32)));
    }

    #[test]
    fn filled_triangle_includes_vertices_and_interior() {
        let mut fb = FrameBuffer::new();
        fb.draw_filled_triangle((10, 10), (30, 10), (20, 30), BinaryColor::On);
        let points = lit(&fb);
        for point in [(10, 10), (30, 10), (20, 30), (20, 15)] {
            assert!(points.contains(&point), "{point:?} missing");
        }
        assert!(!points.contains(&(10, 30)));
    }

    #[test]
    fn extreme_sizes_do_not_overflow() {
        let mut fb = FrameBuffer::new();
        fb.draw_filled_rectangle(120, 60, i32::MAX, i32::MAX, BinaryColor::On);
        assert!(lit(&fb).contains(&(127, 63)));

        let mut fb = FrameBuffer::new();
        fb.draw_rectangle(0, 0, i32::MAX, 10, BinaryColor::On);
        assert!(lit(&fb).contains(&(127, 10)));

        let mut fb = FrameBuffer::new();
        fb.draw_filled_triangle((i32::MIN, 0), (i32::MIN + 3, 2), (5, 5), BinaryColor::On);
        assert!(lit(&fb).contains(&(5, 5)));
    }

    #[test]
    fn bitmap_draws_set_bits_only() {
        let mut fb = FrameBuffer::new();
        // 10 px wide rows padded to two bytes
        let bitmap = [0b1000_0001, 0b0100_0000, 0b0000_0000, 0b1000_0000];
        fb.draw_bitmap(0, 0, &bitmap, 10, 2, BinaryColor::On);
        assert_eq!(lit(&fb), vec![(0, 0), (7, 0), (9, 0), (8, 1)]);
    }
}

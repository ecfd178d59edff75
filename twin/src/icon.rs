//! Window-frame icons drawn as vector paths.
//!
//! Icons live in a byte-coded table of path commands over a unit square
//! in Q1.6 coordinates, inset by half the stroke width so hairlines land
//! inside the cell: `m`/`d` move and draw, `x` closes, `w` changes the
//! stroke width, `f`/`s`/`p` fill, stroke, or both, `e` ends.
use fxp::Fixed;

use crate::draw;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::pixmap::Pixmap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Menu,
    Iconify,
    Restore,
    Close,
    Resize,
}

#[rustfmt::skip]
static ICON_TABLE: [i8; 160] = [
    109, 1, 1, 100, 62, 1, 100, 62, 62, 100, 1, 62, 120, 115, 109, 12, 12,
    100, 51, 12, 115, 109, 12, 25, 100, 51, 25, 115, 109, 12, 38, 100, 51,
    38, 115, 109, 12, 51, 100, 51, 51, 115, 101, 109, 1, 51, 100, 1, 62,
    100, 62, 62, 100, 62, 51, 120, 119, 3, 112, 101, 109, 1, 1, 100, 1, 12,
    100, 62, 12, 100, 62, 1, 102, 109, 1, 1, 100, 1, 62, 100, 62, 62, 100,
    62, 1, 120, 115, 101, 109, 1, 1, 100, 1, 8, 100, 25, 32, 100, 1, 56,
    100, 1, 62, 100, 8, 62, 100, 32, 38, 100, 56, 62, 100, 62, 62, 100, 62,
    56, 100, 38, 32, 100, 62, 8, 100, 62, 1, 100, 56, 1, 100, 32, 25, 100,
    8, 1, 120, 112, 101, 109, 1, -51, 100, 1, 1, 100, -51, 1, 100, -51, 12,
    100, 12, 12, 100, 12, -51, 120, 112, 101,
];

static ICON_POS: [usize; 5] = [0, 43, 60, 88, 139];

const ICON_FILL: u32 = 0xff80_8080;
const ICON_STROKE: u32 = 0xff20_2020;

/// Hairline width relative to the unit icon cell.
const ICON_THIN: Fixed = Fixed(Fixed::ONE.0 / 20);

/// Q1.6 table byte widened to Q15.16.
fn v(b: i8) -> Fixed {
    Fixed((b as i32) << 10)
}

/// Draw `icon` through `matrix` (normally a translate+scale onto the
/// title bar cell).
pub fn icon_draw(pixmap: &mut Pixmap, icon: Icon, matrix: Matrix) {
    let mut g = ICON_TABLE[ICON_POS[icon as usize]..].iter();
    let mut path = Path::new();
    let mut stroke_width = ICON_THIN;

    path.set_matrix(matrix);
    loop {
        let op = match g.next() {
            Some(&op) => op as u8,
            None => break,
        };
        let mut arg = || v(*g.next().unwrap_or(&0));
        match op {
            b'm' => {
                let (x, y) = (arg(), arg());
                path.move_to(x, y);
            }
            b'd' => {
                let (x, y) = (arg(), arg());
                path.draw(x, y);
            }
            b'c' => {
                let (x1, y1, x2, y2, x3, y3) = (arg(), arg(), arg(), arg(), arg(), arg());
                path.curve(x1, y1, x2, y2, x3, y3);
            }
            b'x' => path.close(),
            b'w' => stroke_width = arg(),
            b'f' => {
                draw::paint_path(pixmap, ICON_FILL, &path);
                path.empty();
            }
            b's' => {
                draw::paint_stroke(pixmap, ICON_STROKE, &path, stroke_width);
                path.empty();
            }
            b'p' => {
                draw::paint_path(pixmap, ICON_FILL, &path);
                draw::paint_stroke(pixmap, ICON_STROKE, &path, stroke_width);
                path.empty();
            }
            _ => break,
        }
    }
}

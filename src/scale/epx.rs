// Phase 2: EPX / AdvMAME Scale2x・Scale3x
//
// 元画素Eの近傍:
//
//   A B C
//   D E F
//   G H I
//
// 画像外の画素は最も近い端の画素を繰り返す。

struct Grid<'a> {
    src: &'a [u32],
    width: usize,
    height: usize,
}

impl Grid<'_> {
    fn at(&self, x: isize, y: isize) -> u32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.src[y * self.width + x]
    }
}

/// Scale2x: 各画素を2x2ブロックにする。
pub fn scale2x(src: &[u32], width: u32, height: u32) -> Vec<u32> {
    let grid = Grid {
        src,
        width: width as usize,
        height: height as usize,
    };
    let out_w = grid.width * 2;
    let mut out = vec![0u32; out_w * grid.height * 2];

    for y in 0..grid.height {
        for x in 0..grid.width {
            let (xi, yi) = (x as isize, y as isize);
            let b = grid.at(xi, yi - 1);
            let d = grid.at(xi - 1, yi);
            let e = grid.at(xi, yi);
            let f = grid.at(xi + 1, yi);
            let h = grid.at(xi, yi + 1);

            let (e0, e1, e2, e3) = if b != h && d != f {
                (
                    if d == b { d } else { e },
                    if b == f { f } else { e },
                    if d == h { d } else { e },
                    if h == f { f } else { e },
                )
            } else {
                (e, e, e, e)
            };

            let top = (y * 2) * out_w + x * 2;
            out[top] = e0;
            out[top + 1] = e1;
            out[top + out_w] = e2;
            out[top + out_w + 1] = e3;
        }
    }
    out
}

/// Scale3x: 各画素を3x3ブロックにする。
pub fn scale3x(src: &[u32], width: u32, height: u32) -> Vec<u32> {
    let grid = Grid {
        src,
        width: width as usize,
        height: height as usize,
    };
    let out_w = grid.width * 3;
    let mut out = vec![0u32; out_w * grid.height * 3];

    for y in 0..grid.height {
        for x in 0..grid.width {
            let (xi, yi) = (x as isize, y as isize);
            let a = grid.at(xi - 1, yi - 1);
            let b = grid.at(xi, yi - 1);
            let c = grid.at(xi + 1, yi - 1);
            let d = grid.at(xi - 1, yi);
            let e = grid.at(xi, yi);
            let f = grid.at(xi + 1, yi);
            let g = grid.at(xi - 1, yi + 1);
            let h = grid.at(xi, yi + 1);
            let i = grid.at(xi + 1, yi + 1);

            let block = if b != h && d != f {
                [
                    if d == b { d } else { e },
                    if (d == b && e != c) || (b == f && e != a) { b } else { e },
                    if b == f { f } else { e },
                    if (d == b && e != g) || (d == h && e != a) { d } else { e },
                    e,
                    if (b == f && e != i) || (h == f && e != c) { f } else { e },
                    if d == h { d } else { e },
                    if (d == h && e != i) || (h == f && e != g) { h } else { e },
                    if h == f { f } else { e },
                ]
            } else {
                [e; 9]
            };

            for (k, &pixel) in block.iter().enumerate() {
                let (dx, dy) = (k % 3, k / 3);
                out[(y * 3 + dy) * out_w + x * 3 + dx] = pixel;
            }
        }
    }
    out
}

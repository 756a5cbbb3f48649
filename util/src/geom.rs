use glam::{IVec2, IVec3};

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in the chessboard metric, the number of king
    /// moves needed to cross it.
    fn king_len(&self) -> i32;
}

impl VecExt for IVec2 {
    fn king_len(&self) -> i32 {
        self[0].abs().max(self[1].abs())
    }
}

impl VecExt for IVec3 {
    fn king_len(&self) -> i32 {
        self.truncate().king_len().max(self[2].abs())
    }
}

/// Integer division rounding half away from zero, `den` must be positive.
fn div_round(num: i64, den: i64) -> i32 {
    debug_assert!(den > 0);
    ((2 * num + den * num.signum()) / (2 * den)) as i32
}

/// Cells along a straight line from `a` to `b`.
///
/// The starting point is not included, the end point always is. Every
/// consecutive pair of cells is at most one king move apart.
pub fn king_line(a: IVec3, b: IVec3) -> Vec<IVec3> {
    let d = b - a;
    let n = d.king_len();
    let d = d.as_i64vec3();

    (1..=n as i64)
        .map(|i| {
            a + IVec3::new(
                div_round(d.x * i, n as i64),
                div_round(d.y * i, n as i64),
                div_round(d.z * i, n as i64),
            )
        })
        .collect()
}

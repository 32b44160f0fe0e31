use super::types::Point2;

/// Collinearity tolerance for orientation tests (plate units squared).
const ORIENT_EPS: f64 = 1e-12;

#[inline]
pub(crate) fn cross(a: Point2, b: Point2, c: Point2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Sign of the turn a→b→c: 1 counterclockwise, -1 clockwise, 0 collinear.
#[inline]
fn orientation(a: Point2, b: Point2, c: Point2) -> i8 {
    let v = cross(a, b, c);
    if v > ORIENT_EPS {
        1
    } else if v < -ORIENT_EPS {
        -1
    } else {
        0
    }
}

/// `p` collinear with segment ab lies within its extent.
#[inline]
fn within_extent(a: Point2, b: Point2, p: Point2) -> bool {
    p.x <= a.x.max(b.x) && p.x >= a.x.min(b.x) && p.y <= a.y.max(b.y) && p.y >= a.y.min(b.y)
}

/// Closed segment intersection test (touching and collinear overlap count).
pub fn segments_intersect(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);
    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && within_extent(p1, p2, q1))
        || (o2 == 0 && within_extent(p1, p2, q2))
        || (o3 == 0 && within_extent(q1, q2, p1))
        || (o4 == 0 && within_extent(q1, q2, p2))
}

/// Even-odd ray casting. Points exactly on the boundary may go either way;
/// callers pair this with an edge test.
pub fn point_in_polygon(p: Point2, pts: &[Point2]) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

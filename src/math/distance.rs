use palette::Lab;

/// Euclidean (CIE76) distance between two Lab colors
pub fn lab_distance(a: &Lab, b: &Lab) -> f64 {
    let dl = f64::from(a.l - b.l);
    let da = f64::from(a.a - b.a);
    let db = f64::from(a.b - b.b);
    dl.mul_add(dl, da.mul_add(da, db * db)).sqrt()
}

/// Multi-point distance: sum of pairwise distances of corresponding samples
///
/// Extra samples in the longer slice are ignored.
pub fn profile_distance(a: &[Lab], b: &[Lab]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| lab_distance(x, y)).sum()
}

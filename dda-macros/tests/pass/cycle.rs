//! Auxiliaries in a cycle read the value left by the previous evaluation
//! and settle on the fixed point.

dda_macros::circuit! {
    #[trap_fp(false)]
    #[max_iterations(1)]
    a = add(b, 1)
    b = mult(a, 0.5)
    y = int(a, 0.5, 0)
}

fn main() {
    let mut aux = Aux::default();
    for _ in 0..60 {
        let dqdt = f(&INITIAL, &mut aux);
        assert_eq!(dqdt.y, aux.a);
    }
    assert!((aux.a - 2.0).abs() < 1e-9);
    assert!((aux.b - 1.0).abs() < 1e-9);
}

//! Exponential decay with the classical Runge-Kutta scheme reaches
//! `exp(-1)` at `t = 1`.

dda_macros::circuit! {
    #[rk_order(4)]
    #[max_iterations(100)]
    #[modulo_write(50)]
    dt = const(0.01)
    y0 = const(1)
    y = int(neg(y), dt, y0)
}

fn main() {
    assert_eq!(HEADER, "dt y y0");
    assert_eq!(RK_ORDER, 4);
    assert_eq!(INITIAL, State { y: 1.0 });
    let end = simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, RK_ORDER);
    assert!((end.y - (-1.0_f64).exp()).abs() < 1e-6);
}

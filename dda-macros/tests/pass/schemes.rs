//! Every order is available at runtime, and a higher order is closer to
//! the exact solution.

dda_macros::circuit! {
    #[max_iterations(10)]
    #[modulo_write(10)]
    #[writer(y)]
    y = int(neg(y), 0.1, 1)
}

fn main() {
    let exact = (-1.0_f64).exp();
    let errors: Vec<f64> = (1..=4)
        .map(|order| (simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, order).y - exact).abs())
        .collect();
    assert!(errors.windows(2).all(|w| w[1] < w[0]), "{errors:?}");
    // Explicit Euler is exactly `(1 - h)^n`.
    let mut euler = 1.0_f64;
    for _ in 0..10 {
        euler = euler + 0.1 * -euler;
    }
    assert_eq!(simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, 1).y, euler);
}

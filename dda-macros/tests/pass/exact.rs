//! The generated schemes perform exactly the operations of their formulas.

dda_macros::circuit! {
    #[max_iterations(25)]
    #[modulo_write(25)]
    #[writer(y)]
    y = int(neg(y), 0.1, 1)
}

/// One step of `y' = -y`, written out by hand.
fn step(order: u32, y: f64, h: f64) -> f64 {
    let f = |y: f64| -y;
    let k1 = f(y);
    match order {
        2 => {
            let k2 = f(y + h * k1);
            y + h * (k1 + k2) / 2.0
        }
        3 => {
            let k2 = f(y + h * k1 / 2.0);
            let k3 = f(y - h * k1 + h * k2 * 2.0);
            y + h * (k1 + k2 * 4.0 + k3) / 6.0
        }
        4 => {
            let k2 = f(y + h * k1 / 2.0);
            let k3 = f(y + h * k2 / 2.0);
            let k4 = f(y + h * k3);
            y + h * (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0
        }
        _ => y + h * k1,
    }
}

fn main() {
    for order in 1..=4 {
        let mut y = 1.0_f64;
        for _ in 0..25 {
            y = step(order, y, 0.1);
        }
        assert_eq!(simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, order).y, y, "order {order}");
    }
}

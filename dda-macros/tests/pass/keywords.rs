//! Variables may be named after Rust keywords. `type` is computed after
//! the derivatives, so the first step reads its previous value.

dda_macros::circuit! {
    #[trap_fp(false)]
    #[max_iterations(10)]
    #[modulo_write(100)]
    type = const(2)
    speed = int(type, 1, 0)
}

fn main() {
    let end = simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, RK_ORDER);
    assert_eq!(end.speed, 18.0);
    let mut aux = Aux::default();
    f(&INITIAL, &mut aux);
    assert_eq!(aux.r#type, 2.0);
}

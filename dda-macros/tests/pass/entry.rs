//! `#[main]` generates the entry point, with floating-point traps.

dda_macros::circuit! {
    #[main]
    #[max_iterations(20)]
    #[modulo_write(5)]
    #[writer(x)]
    x = int(v, 0.1, 1)
    v = int(neg(x), 0.1, 0)
}

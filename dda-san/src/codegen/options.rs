//! Generate code depending on the generation options.

use proc_macro2::TokenStream;
use quote::quote;

use crate::options::Options;

/// Define the behavior of an option as a trait implemented by `Options`.
///
/// ```skip
/// generic_option! {
///     #[doc = "Explanation of the option"]
///     trait Stuff
///     impl {
///         from stuff return bool;
///         fn stuff(&self) -> TokenStream {
///             unimplemented!()
///         }
///     }
/// }
/// ```
macro_rules! generic_option {
    (
      $( #[$($doc:tt)*] )*
      trait $trait:ident
      impl {
          from $field:ident return $fetch:ty ;
          $($func:tt)*
      }
    ) => {
        $( #[$($doc)*] )*
        pub trait $trait {
            #[doc = "How to get the value for this option"]
            fn fetch(&self) -> $fetch;

            #[doc = "How to construct a TokenStream that implements the feature from this option"]
            $($func)*
        }

        impl $trait for Options {
            fn fetch(&self) -> $fetch {
                self.$field
            }
        }
    };
}

generic_option! {
    #[doc = "`trap_fp`: abort on division by zero, invalid operation and overflow."]
    trait FpTraps
    impl {
        from trap_fp return bool;
        fn fp_traps(&self) -> TokenStream {
            if !self.fetch() {
                return quote!();
            }
            // Exception flags of glibc's <fenv.h> on x86.
            quote! {
                /// Make floating-point exceptions (division by zero, invalid
                /// operation, overflow) abort the process.
                #[cfg(all(
                    target_os = "linux",
                    target_env = "gnu",
                    any(target_arch = "x86", target_arch = "x86_64")
                ))]
                #[allow(dead_code)]
                pub fn enable_fp_traps() {
                    #[link(name = "m")]
                    unsafe extern "C" {
                        fn feenableexcept(excepts: ::std::os::raw::c_int) -> ::std::os::raw::c_int;
                    }
                    const FE_INVALID: ::std::os::raw::c_int = 0x01;
                    const FE_DIVBYZERO: ::std::os::raw::c_int = 0x04;
                    const FE_OVERFLOW: ::std::os::raw::c_int = 0x08;
                    unsafe {
                        feenableexcept(FE_INVALID | FE_DIVBYZERO | FE_OVERFLOW);
                    }
                }

                /// Floating-point traps are not available on this target.
                #[cfg(not(all(
                    target_os = "linux",
                    target_env = "gnu",
                    any(target_arch = "x86", target_arch = "x86_64")
                )))]
                #[allow(dead_code)]
                pub fn enable_fp_traps() {}
            }
        }
    }
}

generic_option! {
    #[doc = "`emit_main`: build a `main` function that prints the header and runs the simulation."]
    trait FnMain
    impl {
        from emit_main return bool;
        fn fn_main(&self, traps: bool) -> TokenStream {
            if !self.fetch() {
                return quote!();
            }
            let traps = if traps {
                quote!(enable_fp_traps();)
            } else {
                quote!()
            };
            quote! {
                /// Run the simulation with the configured parameters.
                pub fn main() {
                    #traps
                    println!("{}", HEADER);
                    simulate(INITIAL, MAX_ITERATIONS, MODULO_WRITE, RK_ORDER);
                }
            }
        }
    }
}

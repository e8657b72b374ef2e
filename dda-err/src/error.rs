//! Error message generation.
//!
//! Here we provide the facilities to instanciate prebuilt error messages.
//! The general structure is that each kind of error message will be implemented
//! by a `struct` that implements [IntoError], where the blanks are filled
//! in by the `struct` fields' [Display] and [TrySpan] `impl`s.

use std::fmt::Display;

use crate::{Kind, Span};

/// Anything that went wrong: a sequence of [Span] and associated message.
pub type Error = Vec<(String, Option<Span>)>;

/// Generate an [Error].
#[expect(
    clippy::module_name_repetitions,
    reason = "Of course the trait contains the word 'Error'"
)]
pub trait IntoError {
    /// Category of the message.
    fn kind(&self) -> Kind;
    /// Produce the sequence of spans and help messages.
    fn into_err(self) -> Error;
}

/// Objects that can be converted to spans.
pub trait TrySpan {
    /// Try to get a span from the object (by default we don't get any,
    /// but a wrapper might provide one)
    fn try_span(&self) -> Option<Span> {
        None
    }
}

/// Always [Some].
impl TrySpan for Span {
    fn try_span(&self) -> Option<Span> {
        Some(*self)
    }
}

/// Trivial projection.
impl<T: TrySpan> TrySpan for &T {
    fn try_span(&self) -> Option<Span> {
        (*self).try_span()
    }
}

/// Trivial projection.
impl<T: TrySpan> TrySpan for Option<T> {
    fn try_span(&self) -> Option<Span> {
        self.as_ref().and_then(TrySpan::try_span)
    }
}

/// More macro black magic.
/// This one is supposed to reduce how repetitive it is to add new error messages.
/// Describe the error message in a succint format and the macro will generate
/// the `impl IntoError` automaticaly.
///
/// Each error consists of a declaration and an implementation.
///
/// The declaration looks like this:
/// ```skip
/// ["Documentation for SomeError"]
/// struct SomeError as Reference where {
///     ["Documentation for foo"] foo: {Display},
///     ["Documentation for bar"] bar: {TrySpan},
/// }
/// ```
/// The fields can be of any type that implements the trait bounds,
/// and `as Reference` selects the [Kind] of the diagnostic.
///
/// The second part is the implementation
/// ```skip
/// impl {
///     "Uh oh this is bad: {foo} occured here" @ bar;
///     "Some extra explanation";
/// }
/// ```
///
/// Available line constructs:
/// - `"msg"` plain message without span, may use fields as format arguments
/// - `"msg" @ foo` use the span of `foo` (requires `foo: {TrySpan}`)
/// - `for items => "msg"` one line per element of `items`
///   (requires `items: [It .. Display]`), the element being bound to `items`.
macro_rules! error_message {
    (
        $( [ $predoc:expr ] )* // documentation of the struct
        struct $name:tt $( <$($explicit_generics:ident),*> )? as $kind:ident where {
            $( // fields and trait bounds (typically `Display` and/or `TrySpan`)
                [ $doc:expr ]
                $field:ident : $( [$item:ident .. $($iterbounds:tt)* ] )? $( { $($bounds:tt)+ } )?,
            )*
        } impl { // ;-separated list of messages, handled by the auxiliary arms
            $( $message:tt )*
        }
    ) => {
        #[allow(non_camel_case_types, reason = "each field has a generic of the same name")]
        $( #[doc = $predoc] )*
        pub struct $name <$($field),*> {
            $(
                #[doc = $doc]
                pub $field : $field ,
            )*
        }

        #[allow(non_camel_case_types, reason = "each field has a generic of the same name")]
        impl <$($($explicit_generics),*,)? $($field),*> IntoError for $name<$($field),*>
        where $(
            $field: $( IntoIterator<Item = $item>, $item: $($iterbounds)* )?
                $( $($bounds)* , )? )*
        {
            fn kind(&self) -> Kind {
                Kind::$kind
            }

            fn into_err(self) -> Error {
                let Self { $($field),* } = self;
                let mut constructed = Vec::new();
                error_message!([constructed]
                    $($message)* // more black magic to turn these into statements
                );
                constructed
            }
        }
    };
    // Auxiliary arms to build just the message constructor.
    // These recursively consume the stream of tokens that describe the message
    // and produce the appropriate `push` operations.
    ( [$constructed:ident] ) => {}; // done
    ( [$constructed:ident] for $iterator:ident => $fmt:tt ; $($rest:tt)* ) => {
        // Loop over the base case without a span [for items => "foo"]
        for $iterator in $iterator {
            $constructed.push((format!($fmt), None));
        }
        error_message!([$constructed] $($rest)*);
    };
    ( [$constructed:ident] $fmt:tt @ $site:ident ; $($rest:tt)* ) => {
        // Base case looks like ["foo" @ site]: "foo" is treated as a format
        // string and `site` gives the `Span`.
        $constructed.push((format!($fmt), $site.try_span()));
        error_message!([$constructed] $($rest)*);
    };
    ( [$constructed:ident] $fmt:tt ; $($rest:tt)* ) => {
        // Base case without `Span`.
        $constructed.push((format!($fmt), None));
        error_message!([$constructed] $($rest)*);
    };
}

/// Wrapper to display suggestions.
pub struct Suggest<Its> {
    /// Iterator of suggested items
    pub available: Its,
}

impl<Its, It> Display for Suggest<Its>
where
    Its: IntoIterator<Item = It> + Clone,
    It: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut suggest = self
            .available
            .clone()
            .into_iter()
            .map(|v| format!("{v}"))
            .collect::<Vec<_>>();
        suggest.sort();
        if suggest.is_empty() {
            write!(f, "(none declared)")
        } else {
            write!(f, "{}", suggest.join(", "))
        }
    }
}

error_message! {
    ["Generate an error for text that does not follow the circuit grammar."]
    struct SyntaxError as Syntax where {
        ["What the parser expected."] msg: {Display},
        ["Location of the error."] site: {TrySpan},
    } impl {
        "{msg}" @ site;
    }
}

error_message! {
    ["Generate an error for a name that cannot become an identifier"]
    ["in generated code."]
    struct InvalidName as Syntax where {
        ["The offending name."] var: {Display},
        ["Where it is defined."] site: {TrySpan},
    } impl {
        "`{var}` cannot be used as a variable name" @ site;
        "Variable names must be identifiers other than `self`, `Self`, `super` and `crate`";
    }
}

error_message! {
    ["Generate an error for an integrator without its step or initial value."]
    struct IntArity as Arity where {
        ["The state variable being defined."] var: {Display},
        ["Location of the `int(...)` application."] site: {TrySpan},
        ["How many arguments were given."] found: {Display},
    } impl {
        "`{var} = int(...)` has {found} argument(s), but an integrator needs an integrand, a step and an initial value" @ site;
        "Expected `int(integrand, ..., step, initial)`";
    }
}

error_message! {
    ["Generate an error for a computing element applied to the wrong number"]
    ["of arguments."]
    struct ElementArity as Arity where {
        ["Name of the element."] element: {Display},
        ["Location of the application."] site: {TrySpan},
        ["What the element accepts."] expected: {Display},
        ["How many arguments were given."] found: {Display},
    } impl {
        "Computing element `{element}` expects {expected} argument(s), found {found}" @ site;
    }
}

error_message! {
    ["Generate an error for the application of an element that does not exist."]
    struct UnknownElement as Reference where {
        ["Name of the element."] element: {Display},
        ["Location of the application."] site: {TrySpan},
        ["Elements that do exist."] suggest: {Display},
    } impl {
        "Unknown computing element `{element}`" @ site;
        "Available elements are: {suggest}";
    }
}

error_message! {
    ["Generate an error for a variable that is used but never defined."]
    struct UndeclaredVariable as Reference where {
        ["What is missing."] var: {Display},
        ["Where it is used."] site: {TrySpan},
        ["Whose definition uses it."] user: {Display},
        ["Variables that are defined."] suggest: {Display},
    } impl {
        "Variable `{var}` is used in the definition of `{user}` but is never defined" @ site;
        "Defined variables are: {suggest}";
    }
}

error_message! {
    ["Generate an error for a writer field that names no variable."]
    struct UnknownWriterField as Reference where {
        ["The requested field."] field: {Display},
        ["Where it was requested."] site: {TrySpan},
        ["Variables that are defined."] suggest: {Display},
    } impl {
        "Cannot report `{field}`: there is no such variable" @ site;
        "Defined variables are: {suggest}";
    }
}

error_message! {
    ["Error message for a variable that was defined twice when only one"]
    ["definition should exist."]
    struct DefinedTwice as Redefinition where {
        ["The redefined variable."] var: {Display},
        ["Location of the superfluous definition."] new_site: {TrySpan},
        ["Location of the first definition."] prior_site: {TrySpan},
    } impl {
        "Variable `{var}` is defined more than once" @ new_site;
        "Already defined here" @ prior_site;
    }
}

error_message! {
    ["Generate an error for a step or initial value that cannot be computed"]
    ["before the simulation starts."]
    struct NotConstant as Constant where {
        ["The state variable."] var: {Display},
        ["Which argument of `int` (step or initial value)."] role: {Display},
        ["Location of the argument."] site: {TrySpan},
        ["Why it is not a constant."] reason: {Display},
    } impl {
        "The {role} of state variable `{var}` does not reduce to a constant" @ site;
        "{reason}";
    }
}

error_message! {
    ["Generate an error for an integration scheme that does not exist."]
    struct UnsupportedScheme as Scheme where {
        ["The requested order."] order: {Display},
        ["Where it was requested."] site: {TrySpan},
    } impl {
        "There is no integration scheme of order {order}" @ site;
        "Supported orders are 1 (Euler), 2, 3 (Kutta) and 4 (classical Runge-Kutta)";
    }
}

error_message! {
    ["Generate a warning for auxiliaries that depend on each other."]
    struct Cycle<Its> as Cycle where {
        ["First auxiliary of the cycle."] head: {Display},
        ["Where it is defined."] site: {TrySpan},
        ["Rest of the cycle (not necessarily ordered)."] items: [Its .. Display],
    } impl {
        "Auxiliary `{head}` is part of a dependency cycle" @ site;
        for items => "The cycle also goes through `{items}`";
        "Cyclic auxiliaries are computed after the ordered ones and may read values from the previous evaluation";
    }
}

error_message! {
    ["Generate a warning for a value read before it is computed."]
    struct StaleRead as StaleRead where {
        ["The variable whose definition reads too early."] reader: {Display},
        ["The auxiliary being read."] source: {Display},
        ["Where the auxiliary is read."] site: {TrySpan},
        ["When the auxiliary is actually computed."] when: {Display},
    } impl {
        "`{reader}` reads auxiliary `{source}`, which is computed {when}" @ site;
        "The value read is the one left by the previous evaluation";
    }
}

error_message! {
    ["Generate an error for an attribute that is not a generation option."]
    struct UnknownOption as Option where {
        ["Name of the attribute."] name: {Display},
        ["Location of the attribute."] site: {TrySpan},
    } impl {
        "Unknown or malformed attribute `{name}`" @ site;
        "Available attributes are rk_order(n), max_iterations(n), modulo_write(n), writer(names...), trap_fp(bool) and main";
    }
}

error_message! {
    ["Generate an error for an option given more than once."]
    struct OptionTwice as Option where {
        ["Name of the option."] name: {Display},
        ["Location of the superfluous attribute."] new_site: {TrySpan},
        ["Location of the first attribute."] prior_site: {TrySpan},
    } impl {
        "Attribute `{name}` is given more than once" @ new_site;
        "First given here" @ prior_site;
    }
}

error_message! {
    ["Generate an error for an option whose value is out of range."]
    struct OptionValue as Option where {
        ["Name of the option."] name: {Display},
        ["Location of the value."] site: {TrySpan},
        ["What would have been accepted."] expect: {Display},
    } impl {
        "Invalid value for option `{name}`: expected {expect}" @ site;
    }
}

error_message! {
    ["Generate an error for a floating-point exception during simulation."]
    struct RuntimeTrap as RuntimeTrap where {
        ["Variable being computed."] var: {Display},
        ["Iteration of the simulation loop."] step: {Display},
        ["Which exception."] what: {Display},
    } impl {
        "Floating-point trap ({what}) while computing `{var}` at iteration {step}";
    }
}

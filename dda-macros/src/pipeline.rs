//! Here we define a wrapper around the intermediate representations that
//! makes it impossible for clients to call compiler passes in a wrong
//! order. The exact contents of this file are deeply connected with the
//! internal details of `dda_san`.
//!
//! The order of compiler passes is enforced by a state machine with
//! transitions
//! - `[init] -> Post<Parsing>` given by the translation of the parsing AST,
//! - `Pre<Codegen> -> [end]` given by `ToTokens`,
//! - `Pre<S> -> Post<S>` for each `S` that implements `Apply`,
//! - `Post<S> -> Pre<T>` when `S: Finish<Next = T>`.
//!
//! Unlike a single AST that every pass transforms in place, each pass
//! here produces a new representation, so `Apply` also states what it
//! consumes and what it produces.

use std::marker::PhantomData;

use dda_err::EAccum;
use dda_san::ast::Program;
use dda_san::causality::Schedule;
use dda_san::classify::Classified;
use dda_san::options::Options;
use dda_san::plan::Plan;
use dda_syn as syntax;

/// Listing of compiler passes.
mod stage {
    use std::marker::PhantomData;

    /// Compiler pass: translated but unverified program.
    /// Gives access to classification.
    pub struct Parsing {}
    /// Compiler pass: split state and auxiliary variables.
    /// Gives access to causality.
    pub struct Classify {}
    /// Compiler pass: order the auxiliaries.
    /// Gives access to lowering.
    pub struct Causality {}
    /// Compiler pass: resolve names to slots and group equations in phases.
    /// Last step before codegen.
    pub struct Lowering {}
    /// Final transformation by generation of the output token stream.
    pub struct Codegen {}

    /// Compiler pass status modifier.
    pub struct Pre<T> {
        /// `stage` is the next thing to execute.
        stage: PhantomData<T>,
    }
    /// Compiler pass status modifier.
    pub struct Post<T> {
        /// `stage` has just finished executing.
        stage: PhantomData<T>,
    }
}
use stage::{Post, Pre};

/// Current status of the compiler's transformations.
pub struct CompilerPass<Stage, Repr> {
    /// Current operation being applied.
    /// `Stage` will typically be `Pre<stage::*>` or `Post<stage::*>`.
    stage: PhantomData<Stage>,
    /// Current representation of the circuit.
    repr: Repr,
    /// Generation options, fixed by the attributes.
    options: Options,
}

impl CompilerPass<Post<stage::Parsing>, Program> {
    /// Begin the pipeline from the parsing AST.
    ///
    /// Attributes override `base`.
    pub fn new(eaccum: &mut EAccum, circuit: syntax::Circuit, base: Options) -> Option<Self> {
        let attrs = syntax::translate::options::Attrs::collect(&circuit.attrs, eaccum);
        let program = circuit.into_program(eaccum);
        Some(CompilerPass::auto(program?, attrs?.apply(base)))
    }
}

impl<S, R> CompilerPass<S, R> {
    /// Arbitrary wrapper to simplify the rest of the implementation.
    /// Very important that this is not public because it bypasses the
    /// mechanisms declared here.
    fn auto(repr: R, options: Options) -> Self {
        Self {
            stage: PhantomData {},
            repr,
            options,
        }
    }
}

impl CompilerPass<Pre<stage::Codegen>, Plan> {
    /// Final phase of the program transformation: there's nothing to do
    /// after `Codegen`, we have a `TokenStream` that we can return.
    #[expect(
        clippy::unnecessary_wraps,
        reason = "Option in return type for consistency with other passes"
    )]
    pub fn codegen(self) -> Option<proc_macro2::TokenStream> {
        use quote::ToTokens;
        Some(self.repr.into_token_stream())
    }
}

/// Execute a compiler pass.
pub trait Apply {
    /// What the pass consumes.
    type Input;
    /// What the pass produces.
    type Output;
    /// Check/transform the representation and collect errors.
    fn apply(eaccum: &mut EAccum, repr: Self::Input, options: &Options) -> Option<Self::Output>;
}

impl Apply for stage::Classify {
    type Input = Program;
    type Output = Classified;
    fn apply(eaccum: &mut EAccum, repr: Program, _: &Options) -> Option<Classified> {
        repr.classify(eaccum)
    }
}

impl Apply for stage::Causality {
    type Input = Classified;
    type Output = Schedule;
    fn apply(eaccum: &mut EAccum, repr: Classified, _: &Options) -> Option<Schedule> {
        repr.causality(eaccum)
    }
}

impl Apply for stage::Lowering {
    type Input = Schedule;
    type Output = Plan;
    fn apply(eaccum: &mut EAccum, repr: Schedule, options: &Options) -> Option<Plan> {
        repr.lower(eaccum, options)
    }
}

/// Enforce the ordering of compiler passes.
pub trait Finish {
    /// The pass that comes next.
    type Next;
}

impl Finish for stage::Parsing {
    type Next = stage::Classify;
}
impl Finish for stage::Classify {
    type Next = stage::Causality;
}
impl Finish for stage::Causality {
    type Next = stage::Lowering;
}
impl Finish for stage::Lowering {
    type Next = stage::Codegen;
}

impl<T, U, R> CompilerPass<Post<T>, R>
where
    T: Finish<Next = U>,
{
    /// Prepare for the next pass.
    pub fn finish(self) -> CompilerPass<Pre<U>, R> {
        CompilerPass::auto(self.repr, self.options)
    }
}

impl<T> CompilerPass<Pre<T>, T::Input>
where
    T: Apply,
{
    /// Apply the current pass.
    pub fn apply(self, eaccum: &mut EAccum) -> Option<CompilerPass<Post<T>, T::Output>> {
        let repr = T::apply(eaccum, self.repr, &self.options)?;
        Some(CompilerPass::auto(repr, self.options))
    }
}

//! Typed terms: fully elaborated, directly executable by the evaluator
//! (§3.1, §4.C). Everything an inferrable/checkable term could express is
//! carried over in elaborated form, plus the handful of constructs that
//! only ever appear *after* elaboration (metavariable references,
//! literals, singletons, sliced constraint sets, ...).

use std::rc::Rc;

use crate::solver::slice::ConstraintElem;
use crate::span::SpannedName;
use crate::term::{Level, Purity, Visibility};
use crate::value::Flex;
use crate::metavariable::MetaVarId;
use crate::value::strict::Unique;

#[derive(Debug, Clone)]
pub struct TypedEnumArm {
    pub variant: String,
    pub payload_debug: SpannedName,
    pub body: Rc<Typed>,
}

#[derive(Debug, Clone)]
pub enum Typed {
    Var {
        debug: SpannedName,
        index: usize,
    },

    Pi {
        param_debug: SpannedName,
        param_ty: Rc<Typed>,
        visibility: Visibility,
        purity: Purity,
        body: Rc<Typed>,
    },

    /// The sole lambda form in typed terms: its capture has already been
    /// computed by the closure-builder (§4.D), so evaluating it never
    /// needs to see the definition site's runtime context.
    Lambda {
        param_debug: SpannedName,
        capture_debug: SpannedName,
        /// Builds the tuple of captured bindings, evaluated eagerly when
        /// the lambda itself is evaluated.
        capture: Rc<Typed>,
        /// A tuple-elim over the capture, naming each captured binding,
        /// followed by the substituted original body; the parameter
        /// occupies the next free index.
        body: Rc<Typed>,
    },

    App {
        func: Rc<Typed>,
        arg: Rc<Typed>,
    },

    TupleCons(Vec<Rc<Typed>>),

    TupleElim {
        names: Vec<SpannedName>,
        subject: Rc<Typed>,
        body: Rc<Typed>,
    },

    TupleType(Vec<Rc<Typed>>),

    HostTupleType(Vec<Rc<Typed>>),

    RecordCons(Vec<(String, Rc<Typed>)>),

    RecordElim {
        fields: Vec<SpannedName>,
        subject: Rc<Typed>,
        body: Rc<Typed>,
    },

    EnumCons {
        variant: String,
        payload: Rc<Typed>,
    },

    EnumCase {
        subject: Rc<Typed>,
        arms: Vec<TypedEnumArm>,
    },

    EnumType(Vec<(String, Rc<Typed>)>),

    HostIntrinsic {
        source: Rc<Typed>,
        ty: Rc<Typed>,
    },

    HostFunctionType {
        param_ty: Rc<Typed>,
        result_ty: Rc<Typed>,
    },

    Universe(Level),

    LevelLiteral(Level),
    LevelSucc(Rc<Typed>),
    LevelMax(Rc<Typed>, Rc<Typed>),

    Let {
        name_debug: SpannedName,
        expr: Rc<Typed>,
        body: Rc<Typed>,
    },

    ProgramSequence {
        effect: Rc<Typed>,
        cont_name: SpannedName,
        cont: Rc<Typed>,
    },

    ProgramEnd(Rc<Typed>),

    ProgramType {
        result_ty: Rc<Typed>,
        effect_row: Rc<Typed>,
    },

    // --- typed-only additions (§3.1) ---
    /// A value that has already been fully evaluated, embedded directly.
    /// Produced whenever the solver or substitution pass needs to hand a
    /// concrete value back to something that expects a term.
    Literal(Flex),

    /// A reference to a metavariable's `value` node; evaluating it
    /// yields whatever the metavariable currently stands for.
    MetaRef(MetaVarId),

    UniqueToken(Unique),

    TupleElemAccess {
        subject: Rc<Typed>,
        index: usize,
    },

    HostWrap(Rc<Typed>),
    HostUnwrap(Rc<Typed>),

    HostIntFold {
        count: Rc<Typed>,
        acc: Rc<Typed>,
        fun: Rc<Typed>,
    },

    HostIf {
        subject: Rc<Typed>,
        then_branch: Rc<Typed>,
        else_branch: Rc<Typed>,
    },

    Singleton {
        ty: Rc<Typed>,
        witness: Rc<Typed>,
    },

    UnionType(Rc<Typed>, Rc<Typed>),
    IntersectionType(Rc<Typed>, Rc<Typed>),

    /// A deferred metavariable: the elaborated form of a metavariable
    /// that escaped the block it was created in (§4.G slicing).
    /// Evaluating this re-allocates a fresh metavariable in the *current*
    /// scope and re-registers each sliced constraint against it.
    ConstrainedType {
        elems: Vec<ConstraintElem>,
        ctx_len: usize,
    },

    /// Eliminator for the empty enum type; the subject's type being
    /// `enum_type([])` makes the body of this case vacuously well typed.
    EnumAbsurd {
        subject: Rc<Typed>,
    },
}

impl Typed {
    pub fn literal(value: Flex) -> Rc<Typed> {
        Rc::new(Typed::Literal(value))
    }
}

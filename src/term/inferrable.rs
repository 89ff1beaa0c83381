//! Inferrable terms: what `infer` synthesises a type for (§3.1, §4.E).

use std::rc::Rc;

use crate::span::SpannedName;
use crate::term::{checkable::Checkable, typed::Typed, Level, Purity, Visibility};

/// One arm of an `enum_case`: the variant name, the debug info for the
/// bound payload, and the arm body.
#[derive(Debug, Clone)]
pub struct EnumArm {
    pub variant: String,
    pub payload_debug: SpannedName,
    pub body: Rc<Inferrable>,
}

#[derive(Debug, Clone)]
pub enum Inferrable {
    /// A bound variable, addressed by its 1-based index into the
    /// typechecking context (§3.3).
    Var { debug: SpannedName, index: usize },

    /// `\(param : param_ty) => body`, with the parameter type given
    /// explicitly so the whole lambda can be *inferred* rather than only
    /// checked (contrast with `Checkable::Lambda`).
    AnnotatedLambda {
        param_debug: SpannedName,
        param_ty: Rc<Inferrable>,
        visibility: Visibility,
        purity: Purity,
        body: Rc<Inferrable>,
    },

    /// `(param : param_ty) -> body`.
    Pi {
        param_debug: SpannedName,
        param_ty: Rc<Inferrable>,
        visibility: Visibility,
        purity: Purity,
        body: Rc<Inferrable>,
    },

    /// `func arg`. While the head pi's parameter is implicit, `infer`
    /// inserts a fresh metavariable and recurses (§4.E).
    App { func: Rc<Inferrable>, arg: Rc<Checkable> },

    TupleCons(Vec<Rc<Inferrable>>),

    /// `tuple_elim(names, subject, body)`. Elaborated via speculation:
    /// try the subject as an n-tuple-type, then as an n-host-tuple-type.
    TupleElim {
        names: Vec<SpannedName>,
        subject: Rc<Inferrable>,
        body: Rc<Inferrable>,
    },

    /// A tuple type written as a list of (possibly dependent) element
    /// types, later desugared into the canonical `cons`/`empty`
    /// descriptor chain by the elaborator.
    TupleType(Vec<Rc<Inferrable>>),

    /// Tuple type built directly from a host (non-dependent) tuple.
    HostTupleType(Vec<Rc<Inferrable>>),

    RecordCons(Vec<(String, Rc<Inferrable>)>),

    RecordElim {
        fields: Vec<SpannedName>,
        subject: Rc<Inferrable>,
        body: Rc<Inferrable>,
    },

    EnumCons {
        variant: String,
        payload: Rc<Checkable>,
    },

    EnumCase {
        subject: Rc<Inferrable>,
        arms: Vec<EnumArm>,
    },

    EnumType(Vec<(String, Rc<Inferrable>)>),

    /// `host_intrinsic(source : host_string, ty)`: `source` must check
    /// against `host_string_type`; `ty` is inferred and evaluated to
    /// become the intrinsic's type.
    HostIntrinsic { source: Rc<Checkable>, ty: Rc<Inferrable> },

    HostFunctionType {
        param_ty: Rc<Inferrable>,
        result_ty: Rc<Inferrable>,
    },

    /// A universe itself, written as a term (e.g. the `star 0` an
    /// embedder writes for a pi parameter's type). Its own type is the
    /// next universe up (§4.F star/star subtyping).
    Universe(Level),

    LevelLiteral(Level),
    LevelSucc(Rc<Inferrable>),
    LevelMax(Rc<Inferrable>, Rc<Inferrable>),

    Let {
        name_debug: SpannedName,
        expr: Rc<Inferrable>,
        body: Rc<Inferrable>,
    },

    /// `effect arg >>= \cont_name -> cont`.
    ProgramSequence {
        effect: Rc<Inferrable>,
        cont_name: SpannedName,
        cont: Rc<Inferrable>,
    },

    /// `pure value` - the end of an effect program.
    ProgramEnd(Rc<Checkable>),

    ProgramType {
        result_ty: Rc<Inferrable>,
        effect_row: Rc<Inferrable>,
    },

    Annotated {
        expr: Rc<Checkable>,
        ty: Rc<Inferrable>,
    },

    /// Embeds an already-elaborated typed term back into an inferrable
    /// position (used by the solver when materialising metavariable
    /// solutions, and by `check`'s `inferrable` case).
    AlreadyTyped(Rc<Typed>, Rc<crate::value::Flex>),
}

impl Inferrable {
    pub fn var(debug: SpannedName, index: usize) -> Rc<Inferrable> {
        Rc::new(Inferrable::Var { debug, index })
    }
}

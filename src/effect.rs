//! Driving a `program_type` value to completion (§4.C, §6).
//!
//! The core only owns the *algebra* of programs: sequencing
//! (`program_sequence`) and termination (`pure`) as data, plus
//! `program_type`'s effect-row subtyping. Actually dispatching an effect
//! to a host implementation is the embedder's job - this module is
//! deliberately the thinnest driver that can still thread a result back
//! into a continuation, not a scheduler or an effect-handler framework.
//!
//! The wire convention a pending effect is expected to follow: a
//! `program_sequence` evaluates (`evaluate::evaluate`) to a two-element
//! tuple `(effect_value, continuation)`, and `effect_value` is itself a
//! two-element tuple `(effect_id_as_host_number, payload)`. An embedder
//! that needs a richer protocol builds it on top of this, the same way
//! it would add any other host convention on top of `HostValue`.

use crate::error::{ConstraintError, InternalError};
use crate::host::HostValue;
use crate::state::TypecheckerState;
use crate::value::strict::Strict;
use crate::value::Flex;

pub fn execute_program(state: &mut TypecheckerState, program: &Flex) -> Result<Flex, ConstraintError> {
    let mut current = program.clone();
    loop {
        let pending = match current.as_strict() {
            Some(Strict::TupleCons(parts)) if parts.len() == 2 => Some((parts[0].clone(), parts[1].clone())),
            _ => None,
        };
        let (effect_value, cont_value) = match pending {
            Some(pair) => pair,
            None => return Ok(current),
        };
        let (effect_id, payload) = decode_effect(&effect_value)?;
        let handler = state
            .effect_handlers
            .get(&effect_id)
            .cloned()
            .ok_or(ConstraintError::Internal(InternalError::UnhandledEffect(effect_id)))?;
        let host_payload = as_host_value(&payload)?;
        let result = (handler.0.call)(&host_payload).map_err(ConstraintError::Internal)?;
        current = crate::evaluate::apply_value(&cont_value, Flex::strict(Strict::Host(result)));
    }
}

fn decode_effect(value: &Flex) -> Result<(crate::host::EffectId, Flex), ConstraintError> {
    match value.as_strict() {
        Some(Strict::TupleCons(parts)) if parts.len() == 2 => {
            let id = match parts[0].as_strict() {
                Some(Strict::Host(HostValue::Number(n))) => crate::host::EffectId(*n as u32),
                _ => return Err(ConstraintError::Internal(InternalError::NotAHostValue)),
            };
            Ok((id, parts[1].clone()))
        }
        _ => Err(ConstraintError::Internal(InternalError::NotAHostValue)),
    }
}

fn as_host_value(value: &Flex) -> Result<HostValue, ConstraintError> {
    match value.as_strict() {
        Some(Strict::Host(h)) => Ok(h.clone()),
        _ => Err(ConstraintError::Internal(InternalError::NotAHostValue)),
    }
}

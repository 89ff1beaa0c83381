//! Elaboration memoisation (§4.E): `infer` results are cached per
//! `(term identity, context length)` so that re-checking the same
//! subterm against multiple candidate types (common while resolving
//! overloaded host intrinsics) doesn't redo the same inference twice.
//! Built on the same per-shadow [`MemoCache`] used by the evaluator's
//! memo tables.

use std::rc::Rc;

use crate::transact::MemoCache;
use crate::value::Flex;

pub type InferKey = (usize, usize);

#[derive(Clone)]
pub struct InferMemo {
    cache: Rc<MemoCache<InferKey, Flex>>,
}

impl InferMemo {
    pub fn new() -> InferMemo {
        InferMemo { cache: MemoCache::new() }
    }

    pub fn key(term: &crate::term::Inferrable, ctx_len: usize) -> InferKey {
        (term as *const _ as usize, ctx_len)
    }

    pub fn get(&self, key: InferKey) -> Option<Flex> {
        self.cache.get(&key)
    }

    pub fn insert(&self, key: InferKey, ty: Flex) {
        self.cache.insert(key, ty);
    }

    pub fn shadow(&self) -> InferMemo {
        InferMemo {
            cache: self.cache.shadow(),
        }
    }

    pub fn commit(self) -> InferMemo {
        InferMemo { cache: self.cache.commit() }
    }

    pub fn revert(self) -> InferMemo {
        InferMemo { cache: self.cache.revert() }
    }
}

impl Default for InferMemo {
    fn default() -> InferMemo {
        InferMemo::new()
    }
}

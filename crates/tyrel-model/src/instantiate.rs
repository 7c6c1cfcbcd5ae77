//! Generic type instantiation and substitution.
//!
//! Rewrites a type tree by replacing generic parameters with the types a
//! substitution maps them to. Parameters without a mapping pass through
//! unchanged, so a partial substitution yields a partially open type.

use crate::error::ModelError;
use crate::model::TypeComposition;
use crate::types::{TypeId, TypeList};
use rustc_hash::FxHashMap;
use tyrel_common::limits::MAX_INSTANTIATION_DEPTH;

/// Mapping from generic parameters to their replacements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `params[i]` with `args[i]`. Extra entries on either side are
    /// ignored.
    pub fn from_args(params: &[TypeId], args: &[TypeId]) -> Self {
        let mut subst = Self::new();
        for (&param, &arg) in params.iter().zip(args) {
            if param != arg {
                subst.insert(param, arg);
            }
        }
        subst
    }

    pub fn insert(&mut self, param: TypeId, replacement: TypeId) {
        self.map.insert(param, replacement);
    }

    pub fn get(&self, param: TypeId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn contains(&self, param: TypeId) -> bool {
        self.map.contains_key(&param)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, TypeId)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

/// Instantiate `ty` with the given substitution.
pub fn instantiate_type<C>(model: &C, ty: TypeId, subst: &TypeSubstitution) -> Result<TypeId, ModelError>
where
    C: TypeComposition + ?Sized,
{
    if subst.is_empty() {
        return Ok(ty);
    }
    instantiate_inner(model, ty, subst, 0)
}

fn instantiate_inner<C>(
    model: &C,
    ty: TypeId,
    subst: &TypeSubstitution,
    depth: u32,
) -> Result<TypeId, ModelError>
where
    C: TypeComposition + ?Sized,
{
    if depth > MAX_INSTANTIATION_DEPTH {
        return Err(ModelError::InstantiationTooDeep {
            limit: MAX_INSTANTIATION_DEPTH,
        });
    }

    if model.is_generic_parameter(ty) {
        return Ok(subst.get(ty).unwrap_or(ty));
    }

    if let Some(element) = model.element_type(ty) {
        let new_element = instantiate_inner(model, element, subst, depth + 1)?;
        if new_element == element {
            return Ok(ty);
        }
        return model.make_array_type(new_element, model.array_rank(ty));
    }

    let Some(definition) = model.generic_definition(ty) else {
        return Ok(ty);
    };

    let args = model.generic_arguments(ty);
    let mut changed = false;
    let mut new_args = TypeList::with_capacity(args.len());
    for &arg in &args {
        let new_arg = instantiate_inner(model, arg, subst, depth + 1)?;
        changed |= new_arg != arg;
        new_args.push(new_arg);
    }

    if !changed {
        return Ok(ty);
    }
    model.make_generic_type(definition, &new_args)
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;

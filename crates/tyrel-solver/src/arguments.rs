//! Argument vectors: the per-slot binding state of a generic type.

use smallvec::SmallVec;
use std::fmt;
use tyrel_model::{TypeId, TypeList, TypeModel};

/// One slot of an argument vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgumentSlot {
    /// Still a generic parameter.
    Unbound(TypeId),
    /// Bound to a type. The type may itself contain parameters
    /// (`List<T>` in `Pair<List<T>, int>`).
    Bound(TypeId),
}

impl ArgumentSlot {
    /// Classify a raw type argument.
    pub fn classify(model: &dyn TypeModel, ty: TypeId) -> Self {
        if model.is_generic_parameter(ty) {
            Self::Unbound(ty)
        } else {
            Self::Bound(ty)
        }
    }

    /// The type in this slot: the parameter when unbound.
    #[inline]
    pub fn ty(self) -> TypeId {
        match self {
            Self::Unbound(ty) | Self::Bound(ty) => ty,
        }
    }

    #[inline]
    pub fn is_bound(self) -> bool {
        matches!(self, Self::Bound(_))
    }

    #[inline]
    pub fn bound(self) -> Option<TypeId> {
        match self {
            Self::Bound(ty) => Some(ty),
            Self::Unbound(_) => None,
        }
    }
}

/// Ordered slots of a generic type's arguments.
///
/// Vectors are values: inference and completion produce new vectors and never
/// touch a descriptor's own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArgumentVector {
    slots: SmallVec<[ArgumentSlot; 4]>,
}

impl ArgumentVector {
    /// Every slot unbound.
    pub fn unbound(params: &[TypeId]) -> Self {
        Self {
            slots: params.iter().map(|&p| ArgumentSlot::Unbound(p)).collect(),
        }
    }

    /// Slots holding a generic parameter are unbound, all others bound.
    pub fn from_types(model: &dyn TypeModel, types: &[TypeId]) -> Self {
        Self {
            slots: types
                .iter()
                .map(|&ty| ArgumentSlot::classify(model, ty))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<ArgumentSlot> {
        self.slots.get(index).copied()
    }

    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = ArgumentSlot> + '_ {
        self.slots.iter().copied()
    }

    /// Bind a slot. Out-of-range indices are ignored.
    pub fn bind(&mut self, index: usize, ty: TypeId) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ArgumentSlot::Bound(ty);
        }
    }

    /// The types in slot order, parameters for unbound slots.
    pub fn types(&self) -> TypeList {
        self.slots.iter().map(|slot| slot.ty()).collect()
    }

    /// Parameters of the unbound slots, in order.
    pub fn unbound_parameters(&self) -> TypeList {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                ArgumentSlot::Unbound(param) => Some(*param),
                ArgumentSlot::Bound(_) => None,
            })
            .collect()
    }

    /// Types of the bound slots, in order.
    pub fn bound_types(&self) -> TypeList {
        self.slots.iter().filter_map(|slot| slot.bound()).collect()
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_bound()).count()
    }

    pub fn is_fully_bound(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_bound())
    }

    pub fn is_fully_unbound(&self) -> bool {
        !self.slots.iter().any(|slot| slot.is_bound())
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match slot {
                ArgumentSlot::Unbound(param) => write!(f, "?{param}")?,
                ArgumentSlot::Bound(ty) => write!(f, "{ty}")?,
            }
        }
        f.write_str("]")
    }
}

impl FromIterator<ArgumentSlot> for ArgumentVector {
    fn from_iter<I: IntoIterator<Item = ArgumentSlot>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

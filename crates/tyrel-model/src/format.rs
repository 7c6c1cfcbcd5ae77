//! Type formatting for diagnostics and logs.

use crate::store::TypeStore;
use crate::types::{TypeData, TypeId};
use std::fmt::Write;

/// Append a readable rendering of `ty` to `out`.
///
/// | Type | Rendering |
/// |------|-----------|
/// | definition | `Dictionary<TKey, TValue>` |
/// | constructed | `Dictionary<string, List<int>>` |
/// | parameter | `TKey` |
/// | array | `int[]`, `int[,]` |
pub(crate) fn format_type(store: &TypeStore, ty: TypeId, out: &mut String) {
    let Some(data) = store.get(ty) else {
        let _ = write!(out, "<unknown {ty}>");
        return;
    };
    match &*data {
        TypeData::Declared(decl) => {
            out.push_str(&decl.name);
            format_list(store, &decl.params, out);
        }
        TypeData::Constructed { definition, args } => {
            match store.get(*definition).as_deref() {
                Some(TypeData::Declared(decl)) => out.push_str(&decl.name),
                _ => {
                    let _ = write!(out, "<unknown {definition}>");
                }
            }
            format_list(store, args, out);
        }
        TypeData::Parameter(param) => out.push_str(&param.name),
        TypeData::Array { element, rank } => {
            format_type(store, *element, out);
            out.push('[');
            for _ in 1..*rank {
                out.push(',');
            }
            out.push(']');
        }
    }
}

fn format_list(store: &TypeStore, args: &[TypeId], out: &mut String) {
    if args.is_empty() {
        return;
    }
    out.push('<');
    for (i, &arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_type(store, arg, out);
    }
    out.push('>');
}

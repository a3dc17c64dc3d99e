//! Type identity registry and signature interner.
//!
//! Every reflected type receives a process-stable [`TypeUid`] the first
//! time it is seen; repeated queries for the same type return the same
//! uid, and no two distinct types share one. Parameter signatures are
//! interned the same way: a `[TypeUid]` slice maps to a stable
//! [`SigId`], so signature equality is a single integer comparison at
//! dispatch time.
//!
//! Calling conventions are expressed with marker types rather than
//! qualifiers: [`ByVal`], [`ByRef`] and [`ByRefMut`] wrap a parameter
//! type at registration. The marker's own uid is the *strict* id of
//! that parameter; the underlying type's uid is its *normal* id, used
//! to match "the same argument" across conventions.

use std::any::TypeId as StdTypeId;
use std::marker::PhantomData;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::value::Erased;

/// Process-stable identifier for one reflected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUid(u32);

impl TypeUid {
    /// Reserved uid for "no type" (empty erased values).
    pub const NIL: TypeUid = TypeUid(0);

    /// Raw numeric form, for diagnostics only.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Process-stable identifier for one interned parameter signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigId(u32);

struct UidTables {
    ids: FxHashMap<StdTypeId, u32>,
    /// Type name per uid, indexed by the uid value. Slot 0 is the NIL
    /// placeholder.
    names: Vec<&'static str>,
}

static UIDS: Lazy<RwLock<UidTables>> = Lazy::new(|| {
    RwLock::new(UidTables {
        ids: FxHashMap::default(),
        names: vec!["<none>"],
    })
});

static SIGS: Lazy<RwLock<FxHashMap<Box<[TypeUid]>, u32>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Uid for `T`, assigning a fresh one on first use.
///
/// Total and deterministic within one process run: there is no error
/// path, and two calls for the same `T` always agree.
pub fn uid_of<T: 'static>() -> TypeUid {
    let key = StdTypeId::of::<T>();

    // Fast path: already assigned.
    {
        let tables = UIDS.read();
        if let Some(&id) = tables.ids.get(&key) {
            return TypeUid(id);
        }
    }

    let mut tables = UIDS.write();
    // Double-check after taking the write lock.
    if let Some(&id) = tables.ids.get(&key) {
        return TypeUid(id);
    }
    let id = tables.names.len() as u32;
    tables.names.push(std::any::type_name::<T>());
    tables.ids.insert(key, id);
    TypeUid(id)
}

/// Human-readable name recorded for a uid, for diagnostics.
pub fn name_of(uid: TypeUid) -> &'static str {
    let tables = UIDS.read();
    tables
        .names
        .get(uid.0 as usize)
        .copied()
        .unwrap_or("<unknown>")
}

/// Intern a parameter signature, assigning a fresh id on first use.
///
/// Identical uid sequences always yield identical ids; distinct
/// sequences never collide.
pub fn sig_of(uids: &[TypeUid]) -> SigId {
    {
        let sigs = SIGS.read();
        if let Some(&id) = sigs.get(uids) {
            return SigId(id);
        }
    }

    let mut sigs = SIGS.write();
    if let Some(&id) = sigs.get(uids) {
        return SigId(id);
    }
    let id = sigs.len() as u32;
    sigs.insert(uids.into(), id);
    SigId(id)
}

// ============================================================================
// Parameter markers
// ============================================================================

/// Parameter passed by value.
pub struct ByVal<T>(PhantomData<T>);

/// Parameter passed by shared reference.
pub struct ByRef<T>(PhantomData<T>);

/// Parameter passed by exclusive reference. An overload with any
/// `ByRefMut` parameter is excluded from the reference slot during
/// resolution.
pub struct ByRefMut<T>(PhantomData<T>);

/// One registered parameter: its calling convention plus the
/// underlying owned type the erased call extracts.
pub trait Param: 'static {
    /// The owned form the dispatcher extracts from an erased argument.
    type Owned: 'static;

    /// Whether this parameter takes an exclusive reference.
    const BY_REF_MUT: bool;

    /// Strict id: captures the exact calling convention.
    fn strict_uid() -> TypeUid;

    /// Normal id: the convention-erased underlying type.
    fn normal_uid() -> TypeUid;
}

impl<T: 'static> Param for ByVal<T> {
    type Owned = T;
    const BY_REF_MUT: bool = false;

    fn strict_uid() -> TypeUid {
        uid_of::<T>()
    }

    fn normal_uid() -> TypeUid {
        uid_of::<T>()
    }
}

impl<T: 'static> Param for ByRef<T> {
    type Owned = T;
    const BY_REF_MUT: bool = false;

    fn strict_uid() -> TypeUid {
        uid_of::<ByRef<T>>()
    }

    fn normal_uid() -> TypeUid {
        uid_of::<T>()
    }
}

impl<T: 'static> Param for ByRefMut<T> {
    type Owned = T;
    const BY_REF_MUT: bool = true;

    fn strict_uid() -> TypeUid {
        uid_of::<ByRefMut<T>>()
    }

    fn normal_uid() -> TypeUid {
        uid_of::<T>()
    }
}

/// A registered parameter list (tuple of [`Param`] markers).
pub trait ParamList {
    /// Strict signature id of the whole list.
    fn strict_sig() -> SigId;
    /// Normal signature id of the whole list.
    fn normal_sig() -> SigId;
    /// Whether any parameter takes an exclusive reference.
    fn any_ref_mut() -> bool;
}

macro_rules! impl_param_list {
    ($($p:ident),*) => {
        impl<$($p: Param),*> ParamList for ($($p,)*) {
            fn strict_sig() -> SigId {
                sig_of(&[$($p::strict_uid()),*])
            }

            fn normal_sig() -> SigId {
                sig_of(&[$($p::normal_uid()),*])
            }

            fn any_ref_mut() -> bool {
                false $(|| $p::BY_REF_MUT)*
            }
        }
    };
}

impl_param_list!();
impl_param_list!(P1);
impl_param_list!(P1, P2);
impl_param_list!(P1, P2, P3);
impl_param_list!(P1, P2, P3, P4);

// ============================================================================
// Caller-side argument packs
// ============================================================================

/// A caller-supplied argument tuple: yields the requested normal
/// signature and packs each value into an erased payload.
///
/// The signature accessor is named apart from
/// [`ParamList::normal_sig`] because marker tuples implement both
/// traits; a shared name would make every call ambiguous.
pub trait ArgPack {
    /// Normal signature id of this argument tuple.
    fn args_sig() -> SigId;
    /// Erase each argument in order.
    fn pack(self) -> Vec<Erased>;
}

macro_rules! impl_arg_pack {
    ($($a:ident : $idx:tt),*) => {
        impl<$($a: 'static),*> ArgPack for ($($a,)*) {
            fn args_sig() -> SigId {
                sig_of(&[$(uid_of::<$a>()),*])
            }

            #[allow(unused_mut)]
            fn pack(self) -> Vec<Erased> {
                let mut args = Vec::new();
                $(args.push(Erased::value(self.$idx));)*
                args
            }
        }
    };
}

impl_arg_pack!();
impl_arg_pack!(A1: 0);
impl_arg_pack!(A1: 0, A2: 1);
impl_arg_pack!(A1: 0, A2: 1, A3: 2);
impl_arg_pack!(A1: 0, A2: 1, A3: 2, A4: 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_stable_and_distinct() {
        assert_eq!(uid_of::<i32>(), uid_of::<i32>());
        assert_eq!(uid_of::<String>(), uid_of::<String>());
        assert_ne!(uid_of::<i32>(), uid_of::<i64>());
        assert_ne!(uid_of::<String>(), uid_of::<Box<str>>());
    }

    #[test]
    fn test_uid_never_nil() {
        assert_ne!(uid_of::<i32>(), TypeUid::NIL);
        assert_ne!(uid_of::<()>(), TypeUid::NIL);
    }

    #[test]
    fn test_name_of() {
        let uid = uid_of::<u64>();
        assert_eq!(name_of(uid), std::any::type_name::<u64>());
        assert_eq!(name_of(TypeUid::NIL), "<none>");
    }

    #[test]
    fn test_sig_stable_and_distinct() {
        let a = sig_of(&[uid_of::<i32>(), uid_of::<i32>()]);
        let b = sig_of(&[uid_of::<i32>(), uid_of::<i32>()]);
        let c = sig_of(&[uid_of::<i32>()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, sig_of(&[]));
    }

    #[test]
    fn test_param_markers() {
        // Strict ids distinguish conventions; normal ids collapse them.
        assert_ne!(ByVal::<i32>::strict_uid(), ByRef::<i32>::strict_uid());
        assert_ne!(ByRef::<i32>::strict_uid(), ByRefMut::<i32>::strict_uid());
        assert_eq!(ByVal::<i32>::normal_uid(), ByRef::<i32>::normal_uid());
        assert_eq!(ByRef::<i32>::normal_uid(), ByRefMut::<i32>::normal_uid());
        assert!(!ByRef::<i32>::BY_REF_MUT);
        assert!(ByRefMut::<i32>::BY_REF_MUT);
    }

    #[test]
    fn test_param_list_sigs() {
        // By-value lists have strict == normal.
        assert_eq!(
            <(ByVal<i32>, ByVal<String>)>::strict_sig(),
            <(ByVal<i32>, ByVal<String>)>::normal_sig()
        );
        // Reference lists differ in strict form only.
        assert_ne!(
            <(ByRef<i32>,)>::strict_sig(),
            <(ByRef<i32>,)>::normal_sig()
        );
        assert_eq!(
            <(ByRef<i32>,)>::normal_sig(),
            <(ByVal<i32>,)>::normal_sig()
        );
        assert!(<(ByVal<i32>, ByRefMut<String>)>::any_ref_mut());
        assert!(!<(ByVal<i32>, ByRef<String>)>::any_ref_mut());
    }

    #[test]
    fn test_arg_pack_matches_param_list() {
        // A caller tuple resolves to the same normal signature as the
        // registered parameter list, whatever the convention. Both
        // traits are in scope here; the accessors must not collide.
        assert_eq!(
            <(String, i32)>::args_sig(),
            <(ByRef<String>, ByVal<i32>)>::normal_sig()
        );
        let args = ("hi".to_string(), 7i32).pack();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].uid(), uid_of::<String>());
        assert_eq!(args[1].uid(), uid_of::<i32>());
    }
}

//! Methods: named overload collections and slot classification.
//!
//! A [`Method`] is the full set of overloads registered under one name
//! on a record. It is cheap to clone (shared overload storage) so
//! lookups hand out the method by value, and binding handles keep their
//! own copy for the duration of a call expression.

use std::sync::Arc;

use lustra_core::{SigId, TypeUid};

use crate::overload::Overload;

/// A named collection of registered overloads.
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    owner: TypeUid,
    overloads: Arc<[Overload]>,
}

impl Method {
    pub(crate) fn new(name: &str, owner: TypeUid, overloads: Vec<Overload>) -> Self {
        Method {
            name: Arc::from(name),
            owner,
            overloads: overloads.into(),
        }
    }

    /// Registered method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uid of the record this method belongs to.
    pub fn owner(&self) -> TypeUid {
        self.owner
    }

    /// The full registered overload list.
    pub fn overloads(&self) -> &[Overload] {
        &self.overloads
    }

    /// Classify overloads against a requested normal signature.
    ///
    /// Fixed slots hold at most one canonical match per calling
    /// convention; a later match overwrites an earlier one, so
    /// duplicate registration behaves like re-registration. Remaining
    /// normal-id matches are appended as extras.
    pub(crate) fn select(&self, requested: SigId) -> Selection<'_> {
        let mut sel = Selection::default();
        for overload in self.overloads.iter() {
            if overload.normal_sig() != requested {
                continue;
            }
            if overload.strict_sig() == requested {
                sel.value = Some(overload);
            } else if !overload.any_ref_mut() {
                sel.reference = Some(overload);
            } else {
                sel.extras.push(overload);
            }
        }
        sel
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("overloads", &self.overloads.len())
            .finish()
    }
}

/// Result of classifying overloads against one requested signature.
#[derive(Default)]
pub(crate) struct Selection<'a> {
    /// Exact-value match: strict id equals the requested normal id.
    pub value: Option<&'a Overload>,
    /// Exact-reference match: no exclusive-reference parameter.
    pub reference: Option<&'a Overload>,
    /// Remaining compatible candidates, in registration order.
    pub extras: Vec<&'a Overload>,
}

impl<'a> Selection<'a> {
    /// Candidates in priority order: value, reference, extras.
    pub fn ranked(&self) -> Vec<&'a Overload> {
        let mut out = Vec::new();
        if let Some(v) = self.value {
            out.push(v);
        }
        if let Some(r) = self.reference {
            out.push(r);
        }
        out.extend(self.extras.iter().copied());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overload::OverloadFn;
    use lustra_core::{sig_of, uid_of, ByRef, ByRefMut, ByVal, ParamList};
    use std::sync::Arc as StdArc;

    fn dummy(strict: SigId, normal: SigId, ret: TypeUid, ref_mut: bool) -> Overload {
        Overload::new(
            strict,
            normal,
            ret,
            ref_mut,
            OverloadFn::Ctor(StdArc::new(|_, _| Ok(lustra_core::Erased::none()))),
        )
    }

    #[test]
    fn test_select_classifies_slots() {
        let by_value = dummy(
            <(ByVal<i32>, ByVal<i32>)>::strict_sig(),
            <(ByVal<i32>, ByVal<i32>)>::normal_sig(),
            uid_of::<()>(),
            false,
        );
        let by_ref = dummy(
            <(ByRef<i32>, ByRef<i32>)>::strict_sig(),
            <(ByRef<i32>, ByRef<i32>)>::normal_sig(),
            uid_of::<()>(),
            false,
        );
        let by_ref_mut = dummy(
            <(ByRefMut<i32>, ByVal<i32>)>::strict_sig(),
            <(ByRefMut<i32>, ByVal<i32>)>::normal_sig(),
            uid_of::<()>(),
            true,
        );
        let m = Method::new(
            "f",
            uid_of::<()>(),
            vec![by_ref_mut, by_ref, by_value],
        );

        let requested = sig_of(&[uid_of::<i32>(), uid_of::<i32>()]);
        let sel = m.select(requested);
        assert!(sel.value.is_some());
        assert!(sel.reference.is_some());
        assert_eq!(sel.extras.len(), 1);

        // Priority: exact-value first, then reference, then extras.
        let ranked = sel.ranked();
        assert_eq!(ranked[0].strict_sig(), requested);
        assert!(!ranked[1].any_ref_mut());
        assert!(ranked[2].any_ref_mut());
    }

    #[test]
    fn test_select_no_match() {
        let by_value = dummy(
            <(ByVal<i32>,)>::strict_sig(),
            <(ByVal<i32>,)>::normal_sig(),
            uid_of::<()>(),
            false,
        );
        let m = Method::new("f", uid_of::<()>(), vec![by_value]);
        let sel = m.select(sig_of(&[uid_of::<String>()]));
        assert!(sel.value.is_none());
        assert!(sel.reference.is_none());
        assert!(sel.ranked().is_empty());
    }

    #[test]
    fn test_duplicate_slot_registration_last_wins() {
        // Two overloads land in the same fixed slot; the later one
        // replaces the earlier, like re-registration.
        let strict = <(ByVal<i32>,)>::strict_sig();
        let normal = <(ByVal<i32>,)>::normal_sig();
        let first = dummy(strict, normal, uid_of::<u8>(), false);
        let second = dummy(strict, normal, uid_of::<u16>(), false);
        let m = Method::new("f", uid_of::<()>(), vec![first, second]);

        let sel = m.select(normal);
        assert_eq!(sel.value.unwrap().ret_uid(), uid_of::<u16>());
    }
}

//! Registered value conversions.
//!
//! Conversions are a process-global table keyed by source type uid,
//! each entry mapping a target uid to an erased conversion closure.
//! `convert` performs exactly one hop: it never chains registered
//! conversions, and any failure - no table for the source, no entry for
//! the target, or a closure that cannot read its input - yields the
//! empty value rather than an error.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use lustra_core::{uid_of, Erased, TypeUid};

/// Erased conversion closure: borrows the source, produces a fresh
/// erased value (or the empty value on failure).
pub type ConversionFn = Arc<dyn Fn(&Erased) -> Erased + Send + Sync>;

static CASTS: Lazy<RwLock<FxHashMap<TypeUid, Vec<(TypeUid, ConversionFn)>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Register a conversion from `Src` to `Dst`.
///
/// Entries are appended; registering the same pair twice leaves both in
/// the table and the first registration wins at lookup.
pub fn push_conversion<Src: 'static, Dst: 'static>(
    f: impl Fn(&Erased) -> Erased + Send + Sync + 'static,
) {
    CASTS
        .write()
        .entry(uid_of::<Src>())
        .or_default()
        .push((uid_of::<Dst>(), Arc::new(f)));
}

/// Convert `value` to the requested target type, one hop at most.
///
/// Returns the empty value when no conversion is registered for the
/// pair or when the registered closure fails.
pub fn convert(value: &Erased, target: TypeUid) -> Erased {
    let f = {
        let casts = CASTS.read();
        casts.get(&value.uid()).and_then(|entries| {
            entries
                .iter()
                .find(|(to, _)| *to == target)
                .map(|(_, f)| f.clone())
        })
    };
    match f {
        Some(f) => f(value),
        None => Erased::none(),
    }
}

/// A non-owning view of a string's byte storage.
///
/// Produced by the text conversions below; the view borrows the source
/// string's buffer, so its erased form carries kind `Ptr`.
#[derive(Clone, Copy)]
pub struct CharSeq {
    ptr: *const u8,
    len: usize,
}

impl CharSeq {
    fn from_str(s: &str) -> Self {
        CharSeq {
            ptr: s.as_ptr(),
            len: s.len(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the viewed string is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reborrow the viewed bytes as `&str`.
    ///
    /// # Safety
    /// The source string this view was created from must still be alive
    /// and unmoved.
    pub unsafe fn as_str(&self) -> &str {
        std::str::from_utf8_unchecked(std::slice::from_raw_parts(self.ptr, self.len))
    }
}

impl std::fmt::Debug for CharSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CharSeq(len={})", self.len)
    }
}

/// Register the built-in text conversions.
///
/// `String` and `Box<str>` each convert to a [`CharSeq`] view (kind
/// `Ptr`, borrowing the source buffer), and `Box<str>` additionally
/// converts to an owned `String` (kind `Value`).
pub fn register_text_conversions() {
    push_conversion::<String, CharSeq>(|src| match src.view::<String>() {
        Some(s) => Erased::pointer_view(CharSeq::from_str(s)),
        None => Erased::none(),
    });
    push_conversion::<Box<str>, CharSeq>(|src| match src.view::<Box<str>>() {
        Some(s) => Erased::pointer_view(CharSeq::from_str(s)),
        None => Erased::none(),
    });
    push_conversion::<Box<str>, String>(|src| match src.view::<Box<str>>() {
        Some(s) => Erased::value(s.to_string()),
        None => Erased::none(),
    });
}

//! Value Classification
//!
//! A write whose new value is identical to the current one is skipped
//! entirely, but only for primitive values. Reference-like values (records,
//! collections, shared pointers) always propagate, since "same contents"
//! says nothing about whether a consumer holding the old value is now stale.
//!
//! The [`Value`] trait carries that distinction. Primitive impls compare by
//! value; everything else keeps the default, which never reports identity.
//! Your own types opt in with an empty impl:
//!
//! ```rust
//! use cascade_core::Value;
//!
//! #[derive(Clone)]
//! struct Point { x: f64, y: f64 }
//!
//! impl Value for Point {}
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// A value that can live in a reactive node.
pub trait Value: Clone + 'static {
    /// Whether writing `next` over `self` is a no-op.
    ///
    /// Returns `false` unless the type is a primitive.
    fn is_identical(&self, next: &Self) -> bool {
        let _ = next;
        false
    }
}

macro_rules! primitive_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Value for $ty {
                fn is_identical(&self, next: &Self) -> bool {
                    self == next
                }
            }
        )*
    };
}

primitive_value!(
    (), bool, char,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
    String, &'static str,
);

impl<T: Value> Value for Option<T> {
    fn is_identical(&self, next: &Self) -> bool {
        match (self, next) {
            (None, None) => true,
            (Some(current), Some(next)) => current.is_identical(next),
            _ => false,
        }
    }
}

impl<T: Clone + 'static> Value for Vec<T> {}
impl<T: Clone + 'static> Value for VecDeque<T> {}
impl<T: Clone + 'static> Value for Box<T> {}
impl<T: ?Sized + 'static> Value for Rc<T> {}
impl<T: ?Sized + 'static> Value for Arc<T> {}
impl<K: Clone + 'static, V: Clone + 'static, S: Clone + 'static> Value for HashMap<K, V, S> {}
impl<K: Clone + 'static, S: Clone + 'static> Value for HashSet<K, S> {}
impl<K: Clone + 'static, V: Clone + 'static> Value for BTreeMap<K, V> {}
impl<K: Clone + 'static> Value for BTreeSet<K> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert!(1_i32.is_identical(&1));
        assert!(!1_i32.is_identical(&2));
        assert!("a".is_identical(&"a"));
        assert!(String::from("x").is_identical(&String::from("x")));
        assert!(().is_identical(&()));
    }

    #[test]
    fn nan_is_never_identical() {
        assert!(!f64::NAN.is_identical(&f64::NAN));
    }

    #[test]
    fn options_follow_their_payload() {
        assert!(None::<i32>.is_identical(&None));
        assert!(Some(3_u8).is_identical(&Some(3)));
        assert!(!Some(3_u8).is_identical(&None));
        assert!(!Some(vec![1_i32]).is_identical(&Some(vec![1])));
    }

    #[test]
    fn references_always_propagate() {
        let shared = Rc::new(5_i64);
        assert!(!shared.is_identical(&shared));
        assert!(!vec![1_i32, 2].is_identical(&vec![1, 2]));
    }
}

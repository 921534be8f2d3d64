//! The success/failure container carried by correlated responses.
//!
//! On the wire a result is a single-key map: `{ "ok": value }` or
//! `{ "error": value }`. Being an enum, exactly one side is ever present.

use serde::{Deserialize, Serialize};

/// Outcome of a remote operation as reported by the domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteResult<T, E> {
    /// The operation succeeded with a value.
    Ok(T),
    /// The operation failed with an error payload.
    Error(E),
}

impl<T, E> RemoteResult<T, E> {
    /// Whether this is a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Whether this is a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// The failure value, if any.
    pub fn error(self) -> Option<E> {
        match self {
            Self::Ok(_) => None,
            Self::Error(err) => Some(err),
        }
    }

    /// Borrow both sides.
    pub fn as_ref(&self) -> RemoteResult<&T, &E> {
        match self {
            Self::Ok(value) => RemoteResult::Ok(value),
            Self::Error(err) => RemoteResult::Error(err),
        }
    }

    /// Convert into a standard [`Result`].
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for RemoteResult<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Error(err),
        }
    }
}

impl<T, E> From<RemoteResult<T, E>> for Result<T, E> {
    fn from(result: RemoteResult<T, E>) -> Self {
        result.into_result()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ok_wire_shape() {
        let r: RemoteResult<u64, String> = RemoteResult::Ok(7);
        assert_eq!(serde_json::to_value(&r).unwrap(), serde_json::json!({"ok": 7}));
    }

    #[test]
    fn error_wire_shape() {
        let r: RemoteResult<u64, String> = RemoteResult::Error("conflict".into());
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({"error": "conflict"})
        );
    }

    #[test]
    fn into_result_maps_sides() {
        let ok: RemoteResult<u8, &str> = RemoteResult::Ok(1);
        assert_eq!(ok.into_result(), Ok(1));
        let err: RemoteResult<u8, &str> = RemoteResult::Error("no");
        assert_eq!(err.into_result(), Err("no"));
    }

    #[test]
    fn msgpack_ok_unit() {
        let r: RemoteResult<(), String> = RemoteResult::Ok(());
        let bytes = rmp_serde::to_vec_named(&r).unwrap();
        let back: RemoteResult<(), String> = rmp_serde::from_slice(&bytes).unwrap();
        assert!(back.is_ok());
    }

    proptest! {
        #[test]
        fn exactly_one_side_present(value in any::<i64>(), fail in any::<bool>()) {
            let r: RemoteResult<i64, i64> = if fail {
                RemoteResult::Error(value)
            } else {
                RemoteResult::Ok(value)
            };
            prop_assert!(r.is_ok() != r.is_error());
            let sides = r.as_ref();
            prop_assert!(sides.clone().ok().is_some() ^ sides.error().is_some());
        }

        #[test]
        fn std_result_conversion_preserves_side(value in any::<u32>(), fail in any::<bool>()) {
            let std: Result<u32, u32> = if fail { Err(value) } else { Ok(value) };
            let remote = RemoteResult::from(std);
            prop_assert_eq!(remote.is_error(), fail);
            prop_assert_eq!(Result::from(remote), std);
        }
    }
}

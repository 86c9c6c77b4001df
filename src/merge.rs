//! Leaf-by-leaf merging of partially populated records.
//!
//! Implements field-by-field merging where a higher-precedence record
//! overrides a lower one. Sequences are replaced entirely, not concatenated.

use crate::schema::Node;

/// Merge `src` into `dst`, with `src` taking precedence.
///
/// - Nested records are merged recursively
/// - Scalars are replaced unless `src` holds the zero value (`""`, `false`, `0`, `0.0`)
/// - Sequences are replaced entirely unless `src` is empty
/// - Optional scalars are replaced whenever `src` is `Some`
///
/// A zero or empty `src` leaf means "not specified", so it can never clear a
/// value merged earlier. Use `Option` leaves where an explicit zero must win.
///
/// # Example
/// ```
/// use layercfg::merge;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
///     features: Vec<String>,
/// }
/// layercfg::record!(Server { host, port, features });
///
/// let mut base = Server {
///     host: "localhost".into(),
///     port: 8080,
///     features: vec!["a".into(), "b".into()],
/// };
/// let overlay = Server {
///     port: 9000,
///     features: vec!["c".into()],
///     ..Default::default()
/// };
/// merge(&mut base, &overlay);
/// assert_eq!(base.host, "localhost");
/// assert_eq!(base.port, 9000);
/// assert_eq!(base.features, vec!["c".to_string()]);
/// ```
pub fn merge<T: Node>(dst: &mut T, src: &T) {
    dst.merge_from(src);
}

/// Merge multiple records in order, with later records taking precedence.
///
/// Equivalent to folding [`merge`] over the list, starting from the zero record.
pub fn merge_all<'a, T>(records: impl IntoIterator<Item = &'a T>) -> T
where
    T: Node + Default + 'a,
{
    records.into_iter().fold(T::default(), |mut acc, record| {
        merge(&mut acc, record);
        acc
    })
}

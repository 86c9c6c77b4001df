//! Leaf implementations for scalars, sequences and optional scalars.

use super::{LeafKind, Node, Visitor};
use crate::coerce::{CoercionError, Radix, Scalar, parse_all, split_list};
use crate::error::Result;

/// A typed leaf slot that sources write through.
///
/// Object safe so adapters can handle every leaf of a record uniformly.
pub trait Leaf {
    fn kind(&self) -> LeafKind;

    /// Whether the slot holds its "not provided" value.
    fn is_unset(&self) -> bool;

    /// Assign from a single textual value.
    ///
    /// Sequences read a comma-separated list. Nothing is written on error.
    fn assign_text(&mut self, text: &str, radix: Radix) -> Result<(), CoercionError>;

    /// Assign from repeated occurrences of the same key.
    ///
    /// Sequences take one element per occurrence, in order; scalars keep the
    /// last occurrence. Every occurrence must parse. Nothing is written on error.
    fn assign_occurrences(&mut self, values: &[&str], radix: Radix) -> Result<(), CoercionError>;

    /// Textual form of the current value.
    fn render(&self) -> String;
}

macro_rules! scalar_leaf {
    ($($ty:ty),* $(,)?) => {$(
        impl Leaf for $ty {
            fn kind(&self) -> LeafKind {
                LeafKind::Scalar(<$ty as Scalar>::KIND)
            }

            fn is_unset(&self) -> bool {
                Scalar::is_zero(self)
            }

            fn assign_text(&mut self, text: &str, radix: Radix) -> Result<(), CoercionError> {
                *self = <$ty as Scalar>::parse_text(text, radix)?;
                Ok(())
            }

            fn assign_occurrences(
                &mut self,
                values: &[&str],
                radix: Radix,
            ) -> Result<(), CoercionError> {
                let parsed: Vec<$ty> = parse_all(values, radix)?;
                if let Some(last) = parsed.into_iter().last() {
                    *self = last;
                }
                Ok(())
            }

            fn render(&self) -> String {
                self.format_text()
            }
        }

        impl Node for $ty {
            fn walk(
                &mut self,
                path: &mut Vec<&'static str>,
                name_override: Option<&'static str>,
                visitor: &mut dyn Visitor,
            ) -> Result<()> {
                visitor.visit_leaf(path, name_override, self)
            }

            fn merge_from(&mut self, src: &Self) {
                if !Scalar::is_zero(src) {
                    self.clone_from(src);
                }
            }
        }
    )*};
}

scalar_leaf!(String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f64);

impl<S: Scalar> Leaf for Vec<S> {
    fn kind(&self) -> LeafKind {
        LeafKind::Sequence(S::KIND)
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn assign_text(&mut self, text: &str, radix: Radix) -> Result<(), CoercionError> {
        *self = parse_all(&split_list(text), radix)?;
        Ok(())
    }

    fn assign_occurrences(&mut self, values: &[&str], radix: Radix) -> Result<(), CoercionError> {
        *self = parse_all(values, radix)?;
        Ok(())
    }

    fn render(&self) -> String {
        let parts: Vec<String> = self.iter().map(Scalar::format_text).collect();
        parts.join(",")
    }
}

impl<S: Scalar> Node for Vec<S> {
    fn walk(
        &mut self,
        path: &mut Vec<&'static str>,
        name_override: Option<&'static str>,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        visitor.visit_leaf(path, name_override, self)
    }

    /// An empty `src` means "not provided"; anything else replaces `self` whole.
    fn merge_from(&mut self, src: &Self) {
        if !src.is_empty() {
            self.clone_from(src);
        }
    }
}

impl<S: Scalar> Leaf for Option<S> {
    fn kind(&self) -> LeafKind {
        LeafKind::Optional(S::KIND)
    }

    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn assign_text(&mut self, text: &str, radix: Radix) -> Result<(), CoercionError> {
        *self = Some(S::parse_text(text, radix)?);
        Ok(())
    }

    fn assign_occurrences(&mut self, values: &[&str], radix: Radix) -> Result<(), CoercionError> {
        let parsed: Vec<S> = parse_all(values, radix)?;
        if let Some(last) = parsed.into_iter().last() {
            *self = Some(last);
        }
        Ok(())
    }

    fn render(&self) -> String {
        self.as_ref().map(Scalar::format_text).unwrap_or_default()
    }
}

impl<S: Scalar> Node for Option<S> {
    fn walk(
        &mut self,
        path: &mut Vec<&'static str>,
        name_override: Option<&'static str>,
        visitor: &mut dyn Visitor,
    ) -> Result<()> {
        visitor.visit_leaf(path, name_override, self)
    }

    /// `Some` always wins, including `Some(0)` and `Some(false)`.
    fn merge_from(&mut self, src: &Self) {
        if src.is_some() {
            self.clone_from(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::ScalarKind;

    #[test]
    fn test_scalar_assign_and_render() {
        let mut port = 0u16;
        port.assign_text("8081", Radix::Decimal).unwrap();
        assert_eq!(port, 8081);
        assert_eq!(port.render(), "8081");
        assert_eq!(port.kind(), LeafKind::Scalar(ScalarKind::Unsigned(16)));

        assert!(port.assign_text("nope", Radix::Decimal).is_err());
        assert_eq!(port, 8081);
    }

    #[test]
    fn test_scalar_occurrences_keep_last() {
        let mut host = String::new();
        host.assign_occurrences(&["first", "second"], Radix::Decimal).unwrap();
        assert_eq!(host, "second");

        let mut level = 3i8;
        assert!(level.assign_occurrences(&["x", "1"], Radix::Decimal).is_err());
        assert_eq!(level, 3);
    }

    #[test]
    fn test_sequence_text_is_comma_separated() {
        let mut levels: Vec<u32> = Vec::new();
        levels.assign_text("3,2,1", Radix::Decimal).unwrap();
        assert_eq!(levels, vec![3, 2, 1]);
        assert_eq!(levels.render(), "3,2,1");
        assert_eq!(levels.kind(), LeafKind::Sequence(ScalarKind::Unsigned(32)));
    }

    #[test]
    fn test_sequence_failure_commits_nothing() {
        let mut temps = vec![1.5f64];
        let err = temps.assign_text("12.5,oops,3", Radix::Decimal).unwrap_err();
        assert_eq!(err.input, "oops");
        assert_eq!(temps, vec![1.5]);
    }

    #[test]
    fn test_sequence_occurrences_append_in_order() {
        let mut flags: Vec<bool> = Vec::new();
        flags.assign_occurrences(&["true", "false", "1"], Radix::Decimal).unwrap();
        assert_eq!(flags, vec![true, false, true]);

        let mut names: Vec<String> = Vec::new();
        names.assign_occurrences(&["a,b", "c"], Radix::Decimal).unwrap();
        assert_eq!(names, vec!["a,b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_optional_leaf() {
        let mut retries: Option<u8> = None;
        assert!(retries.is_unset());
        assert_eq!(retries.render(), "");
        retries.assign_text("0", Radix::Decimal).unwrap();
        assert_eq!(retries, Some(0));
        assert!(!retries.is_unset());
        assert_eq!(retries.render(), "0");
    }

    #[test]
    fn test_merge_rules() {
        let mut port = 8080u16;
        port.merge_from(&0);
        assert_eq!(port, 8080);
        port.merge_from(&9090);
        assert_eq!(port, 9090);

        let mut enabled = true;
        enabled.merge_from(&false);
        assert!(enabled);

        let mut hosts = vec!["a".to_string()];
        hosts.merge_from(&Vec::new());
        assert_eq!(hosts, vec!["a".to_string()]);
        hosts.merge_from(&vec!["b".to_string(), "c".to_string()]);
        assert_eq!(hosts, vec!["b".to_string(), "c".to_string()]);

        let mut verbose = Some(true);
        verbose.merge_from(&None);
        assert_eq!(verbose, Some(true));
        verbose.merge_from(&Some(false));
        assert_eq!(verbose, Some(false));
    }
}

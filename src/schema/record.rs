//! The `record!` macro.

/// Implement [`Node`](crate::Node) and [`Record`](crate::Record) for a struct.
///
/// List every field of the struct, in declaration order. A field may carry an
/// explicit source key with `=> "KEY"`; environment and flag sources then use
/// the key verbatim instead of deriving one from the field path. Every listed
/// field must itself be a record, a supported scalar, an `Option` of a scalar
/// or a `Vec` of scalars.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Database {
///     port: u16,
///     url: String,
/// }
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Config {
///     hostname: String,
///     database: Database,
/// }
///
/// layercfg::record!(Database { port, url => "DATABASE_URL" });
/// layercfg::record!(Config { hostname, database });
///
/// let schema = layercfg::Schema::of::<Config>();
/// assert_eq!(schema.leaves()[2].path.to_string(), "database.url");
/// assert_eq!(schema.leaves()[2].name_override, Some("DATABASE_URL"));
/// ```
///
/// Leaf types outside the supported set are rejected at compile time:
///
/// ```compile_fail
/// #[derive(Debug, Clone, Default, serde::Deserialize)]
/// struct Sensor {
///     reading: f32,
/// }
///
/// layercfg::record!(Sensor { reading });
/// ```
///
/// So is a struct with a field missing from the list:
///
/// ```compile_fail
/// #[derive(Debug, Clone, Default, serde::Deserialize)]
/// struct Partial {
///     host: String,
///     port: u16,
/// }
///
/// layercfg::record!(Partial { port });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident $(=> $name:literal)?),* $(,)? }) => {
        impl $crate::Node for $ty {
            #[allow(unused_variables)]
            fn walk(
                &mut self,
                path: &mut ::std::vec::Vec<&'static str>,
                _name_override: ::std::option::Option<&'static str>,
                visitor: &mut dyn $crate::Visitor,
            ) -> $crate::Result<()> {
                $(
                    path.push(::std::stringify!($field));
                    let walked = $crate::Node::walk(
                        &mut self.$field,
                        path,
                        ::std::option::Option::None $(.or(::std::option::Option::Some($name)))?,
                        visitor,
                    );
                    path.pop();
                    walked?;
                )*
                ::std::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn merge_from(&mut self, src: &Self) {
                // Every field must be listed.
                let Self { $($field: _),* } = src;
                $( $crate::Node::merge_from(&mut self.$field, &src.$field); )*
            }
        }

        impl $crate::Record for $ty {}
    };
}

/// Declares a C-like enum that additionally keeps the raw values it does not know about, instead
/// of making parsing/construction from an out-of-range value fail.
///
/// This is the pattern wire-coded OpenFlow enums (`Version`, `Kind`, the error `Code` families)
/// use throughout this crate: every enum gets a `Unknown(T)` fallback variant and a pair of
/// lossless `From` conversions to and from its underlying integer representation.
macro_rules! enum_with_unknown {
    (
        $(#[$enum_attr:meta])*
        pub doc enum $name:ident($ty:ty) {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident = $value:expr
            ),+
            $(,)*
        }
    ) => {
        $(#[$enum_attr])*
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
        pub enum $name {
            $(
                $(#[$variant_attr])*
                $variant
            ),+,
            /// An unrecognized value for this field.
            Unknown($ty)
        }

        impl ::core::convert::From<$ty> for $name {
            fn from(value: $ty) -> Self {
                match value {
                    $( $value => $name::$variant ),+,
                    other => $name::Unknown(other)
                }
            }
        }

        impl ::core::convert::From<$name> for $ty {
            fn from(value: $name) -> Self {
                match value {
                    $( $name::$variant => $value ),+,
                    $name::Unknown(other) => other
                }
            }
        }
    }
}

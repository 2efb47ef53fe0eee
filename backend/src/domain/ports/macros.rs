//! `define_port_error!` generates a port error enum with `thiserror`
//! messages and one snake_case constructor per variant. Constructor
//! parameters take `impl Into<T>` so callers can pass `&str` for `String`.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum ChannelPortError {
            Closed => "channel closed",
            Rejected { message: String } => "channel rejected: {message}",
            Overflow { slot: u32 } => "slot {slot} overflowed",
            Stale { message: String, age_ms: u64 } => "{message} after {age_ms}ms",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(ChannelPortError::closed(), ChannelPortError::Closed);
        assert_eq!(ChannelPortError::closed().to_string(), "channel closed");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ChannelPortError::rejected("transport gone");
        assert_eq!(err.to_string(), "channel rejected: transport gone");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ChannelPortError::overflow(14_u32);
        assert_eq!(err.to_string(), "slot 14 overflowed");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = ChannelPortError::stale("snapshot", 250_u64);
        assert!(matches!(err, ChannelPortError::Stale { age_ms: 250, .. }));
        assert_eq!(err.to_string(), "snapshot after 250ms");
    }
}

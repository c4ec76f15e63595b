//! Declaration macros
//!
//! `ujo_keys!` declares the keys of a domain type where the field identifier
//! of each key becomes its name, `ujo_store!` implements `Ujo` for a struct
//! delegating to a storage field.

/// Declare a struct holding the keys of a domain type
///
/// ```
/// use std::sync::LazyLock;
/// use ujorm_core::{ujo_keys, ujo_store, ArrayStore};
///
/// struct Person {
///     data: ArrayStore,
/// }
///
/// ujo_keys! {
///     pub struct PersonKeys for Person {
///         id: i64,
///         name: String = String::new(),
///     }
/// }
///
/// static KEYS: LazyLock<PersonKeys> = LazyLock::new(|| PersonKeys::new().unwrap());
/// ujo_store!(Person, data);
///
/// let mut person = Person { data: ArrayStore::new(KEYS.key_list.clone()) };
/// assert_eq!(KEYS.name.of(&person), Some(String::new()));
/// KEYS.name.set_value(&mut person, "Pavel".to_string()).unwrap();
/// assert_eq!(KEYS.name.of(&person), Some("Pavel".to_string()));
/// ```
///
/// A field declared as `name: ref Target` is a relation key.
#[macro_export]
macro_rules! ujo_keys {
    (
        $(#[$meta:meta])*
        $vis:vis struct $keys:ident for $domain:ty {
            $($body:tt)*
        }
    ) => {
        $crate::ujo_keys!(@munch
            [$(#[$meta])* $vis struct $keys for $domain]
            [$domain] [factory] [] [] []
            $($body)*
        );
    };

    (@munch $head:tt [$domain:ty] [$f:ident] [$($decl:tt)*] [$($init:tt)*] [$($names:ident)*]
        $(#[$fmeta:meta])* $field:ident : ref $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::ujo_keys!(@munch $head [$domain] [$f]
            [$($decl)* $(#[$fmeta])* pub $field: $crate::models::Key<$domain, $ty>,]
            [$($init)* let $field: $crate::models::Key<$domain, $ty> = $f.new_relation(stringify!($field));]
            [$($names)* $field]
            $($($rest)*)?
        );
    };

    (@munch $head:tt [$domain:ty] [$f:ident] [$($decl:tt)*] [$($init:tt)*] [$($names:ident)*]
        $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr $(, $($rest:tt)*)?
    ) => {
        $crate::ujo_keys!(@munch $head [$domain] [$f]
            [$($decl)* $(#[$fmeta])* pub $field: $crate::models::Key<$domain, $ty>,]
            [$($init)* let $field: $crate::models::Key<$domain, $ty> = $f.new_key_default(stringify!($field), $default);]
            [$($names)* $field]
            $($($rest)*)?
        );
    };

    (@munch $head:tt [$domain:ty] [$f:ident] [$($decl:tt)*] [$($init:tt)*] [$($names:ident)*]
        $(#[$fmeta:meta])* $field:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::ujo_keys!(@munch $head [$domain] [$f]
            [$($decl)* $(#[$fmeta])* pub $field: $crate::models::Key<$domain, $ty>,]
            [$($init)* let $field: $crate::models::Key<$domain, $ty> = $f.new_key(stringify!($field));]
            [$($names)* $field]
            $($($rest)*)?
        );
    };

    (@munch [$(#[$meta:meta])* $vis:vis struct $keys:ident for $domain:ty]
        [$d:ty] [$f:ident] [$($decl:tt)*] [$($init:tt)*] [$($names:ident)*]
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        $vis struct $keys {
            $($decl)*
            /// Locked key list of the domain
            pub key_list: $crate::models::KeyList,
        }

        impl $keys {
            /// Create and lock the keys
            pub fn new() -> $crate::error::Result<Self> {
                Self::with_factory($crate::models::KeyFactory::new(stringify!($domain)))
            }

            /// Create the keys by a configured factory and lock them
            #[allow(non_snake_case)]
            pub fn with_factory(
                mut $f: $crate::models::KeyFactory<$domain>,
            ) -> $crate::error::Result<Self> {
                $($init)*
                let key_list = $f.lock()?;
                Ok($keys {
                    $($names,)*
                    key_list,
                })
            }
        }
    };
}

/// Implement `Ujo` for a struct delegating to a storage field
///
/// The storage field must implement `Ujo`, for example `ArrayStore` or
/// `MapStore`.
#[macro_export]
macro_rules! ujo_store {
    ($domain:ty, $field:ident) => {
        impl $crate::ujo::Ujo for $domain {
            fn read_keys(&self) -> &$crate::models::KeyList {
                $crate::ujo::Ujo::read_keys(&self.$field)
            }

            fn read_value(&self, key: &$crate::models::AnyKey) -> $crate::models::Value {
                $crate::ujo::Ujo::read_value(&self.$field, key)
            }

            fn write_value(
                &mut self,
                key: &$crate::models::AnyKey,
                value: $crate::models::Value,
            ) -> $crate::error::Result<()> {
                $crate::ujo::Ujo::write_value(&mut self.$field, key, value)
            }
        }
    };
}

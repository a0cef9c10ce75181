//! Macro for declaring closed status enumerations.

/// Declare a status enum whose variants carry a wire name.
///
/// Generates the enum (with serde renames to the wire names), an `ALL`
/// constant, `as_str`, `Display`, and the [`State`](crate::core::State)
/// implementation.
///
/// # Example
///
/// ```
/// use exchange_connect::status_enum;
/// use exchange_connect::core::State;
///
/// status_enum! {
///     pub enum DoorStatus {
///         Open => "door:open",
///         Closed => "door:closed",
///         Broken => "door:broken",
///     }
///     final: [Broken]
///     error: [Broken]
/// }
///
/// assert_eq!(DoorStatus::Open.name(), "door:open");
/// assert!(DoorStatus::Broken.is_final());
/// assert_eq!(DoorStatus::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $wire:literal
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            $crate::__serde::Serialize,
            $crate::__serde::Deserialize,
        )]
        #[serde(crate = "exchange_connect::__serde")]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $wire)]
                $variant
            ),*
        }

        impl $name {
            /// Every member of the enumeration, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                self.as_str()
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            #[allow(unreachable_patterns)]
            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}

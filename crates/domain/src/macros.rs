//! Macro for implementing string conversions for status enums
//!
//! Status columns are stored as lowercase text, so every status enum needs
//! the same `as_str`/`Display`/`FromStr` trio.
//!
//! # Example
//!
//! ```rust
//! use rendezvous_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryStatus {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_status_conversions!(DeliveryStatus {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(DeliveryStatus::Queued.as_str(), "queued");
//! assert_eq!(" Delivered ".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Delivered));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for status enums
///
/// Parsing trims surrounding whitespace and ignores case. The error names the
/// enum and echoes the rejected input.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical lowercase representation
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

//! Macros for defining external name types.

/// Maximum length accepted for an external name.
///
/// Matches the DNS subdomain limit the cluster API applies to object names.
pub const MAX_NAME_LEN: usize = 253;

/// Macro to define a validated name handed to us by an external system.
///
/// Unlike [`ResourceId`](crate::ResourceId), these are not generated here: the
/// cluster inventory owns them and we only carry them around. The generated
/// newtype wraps a `String` with:
/// - A `KIND` constant used in error messages
/// - `parse()` which rejects empty, oversized, or whitespace-bearing input
/// - `as_str()`, `Display`, `FromStr`, `AsRef<str>`
/// - `Serialize` and `Deserialize` (validated on the way in)
///
/// # Example
///
/// ```ignore
/// define_name!(NodeName, "node name");
///
/// let name: NodeName = "worker-1".parse()?;
/// ```
#[macro_export]
macro_rules! define_name {
    ($name:ident, $kind:literal) => {
        /// An externally-assigned name.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Human-readable kind, used in error messages.
            pub const KIND: &'static str = $kind;

            /// Parses and validates a name.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                if s.len() > $crate::MAX_NAME_LEN {
                    return Err($crate::IdError::InvalidFormat {
                        kind: Self::KIND,
                        message: format!(
                            "length {} exceeds {}",
                            s.len(),
                            $crate::MAX_NAME_LEN
                        ),
                    });
                }

                if let Some(c) = s.chars().find(|c| c.is_whitespace() || c.is_control()) {
                    return Err($crate::IdError::InvalidFormat {
                        kind: Self::KIND,
                        message: format!("contains disallowed character {:?}", c),
                    });
                }

                Ok(Self(s.to_string()))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the name and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

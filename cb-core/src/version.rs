use std::fmt;

use crate::error::{BundleError, Result};

/// Dotted-integer version, compared component-wise. A missing version is
/// treated as `0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTuple(Vec<u64>);

impl VersionTuple {
    pub fn parse(s: Option<&str>) -> Result<Self> {
        let Some(s) = s else {
            return Ok(Self(vec![0, 0, 0]));
        };
        let parts = s
            .split('.')
            .map(|p| {
                p.parse::<u64>().map_err(|_| {
                    BundleError::Format(format!("invalid version component `{p}` in `{s}`"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(parts))
    }

    /// Next bundle version when none is supplied explicitly: versions shorter
    /// than three components grow a `.1`, the rest bump the last component.
    pub fn next(&self) -> Self {
        let mut parts = self.0.clone();
        if parts.len() < 3 {
            parts.push(1);
        } else if let Some(last) = parts.last_mut() {
            *last += 1;
        }
        Self(parts)
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_components_bump_the_last() {
        let v = VersionTuple::parse(Some("1.2.3")).unwrap();
        assert_eq!(v.next().to_string(), "1.2.4");
    }

    #[test]
    fn two_components_grow_a_third() {
        let v = VersionTuple::parse(Some("1.2")).unwrap();
        assert_eq!(v.next().to_string(), "1.2.1");
    }

    #[test]
    fn four_components_bump_the_last() {
        let v = VersionTuple::parse(Some("1.2.3.7")).unwrap();
        assert_eq!(v.next().to_string(), "1.2.3.8");
    }

    #[test]
    fn missing_version_defaults_to_zero() {
        let v = VersionTuple::parse(None).unwrap();
        assert_eq!(v.to_string(), "0.0.0");
        assert_eq!(v.next().to_string(), "0.0.1");
    }

    #[test]
    fn ordering_is_component_wise_integer() {
        let a = VersionTuple::parse(Some("1.10")).unwrap();
        let b = VersionTuple::parse(Some("1.9")).unwrap();
        assert!(a > b);

        let c = VersionTuple::parse(Some("1.2")).unwrap();
        let d = VersionTuple::parse(Some("1.2.1")).unwrap();
        assert!(d > c);
    }

    #[test]
    fn non_integer_component_is_rejected() {
        assert!(matches!(
            VersionTuple::parse(Some("1.x.3")),
            Err(BundleError::Format(_))
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::RclError;

/// A numeric comparison operator used by thresholds and wait conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparison {
    /// Apply `lhs <op> rhs`
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Eq => lhs == rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Gt => lhs > rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
        }
    }
}

impl FromStr for Comparison {
    type Err = RclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            "==" => Ok(Comparison::Eq),
            ">=" => Ok(Comparison::Ge),
            ">" => Ok(Comparison::Gt),
            other => Err(RclError::UnknownOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Comparison {
    type Error = RclError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Comparison> for String {
    fn from(c: Comparison) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_apply() {
        let ge: Comparison = ">=".parse().unwrap();
        assert!(ge.apply(10.0, 10.0));
        assert!(!ge.apply(9.9, 10.0));

        let lt: Comparison = "<".parse().unwrap();
        assert!(lt.apply(1.0, 2.0));
        assert!(!lt.apply(2.0, 2.0));

        assert!(Comparison::Eq.apply(3.0, 3.0));
    }

    #[test]
    fn test_unknown_operator() {
        let err = "=>".parse::<Comparison>().unwrap_err();
        assert!(matches!(err, RclError::UnknownOperator(op) if op == "=>"));
    }

    #[test]
    fn test_serde_as_symbol() {
        let c: Comparison = serde_json::from_str(r#""<=""#).unwrap();
        assert_eq!(c, Comparison::Le);
        assert_eq!(serde_json::to_string(&Comparison::Gt).unwrap(), r#"">""#);
        assert!(serde_json::from_str::<Comparison>(r#""~""#).is_err());
    }
}

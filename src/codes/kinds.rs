//! Market and security classifications reported by the code manager.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Market
// ============================================================================

/// Market a listed code trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Not classified.
    Null,
    Kospi,
    Kosdaq,
    Freeboard,
    Krx,
    Konex,
}

impl Market {
    /// Decodes the provider's integer code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] for an unknown code.
    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            0 => Self::Null,
            1 => Self::Kospi,
            2 => Self::Kosdaq,
            3 => Self::Freeboard,
            4 => Self::Krx,
            5 => Self::Konex,
            other => return Err(Error::unexpected_value("market kind", Value::from(other))),
        })
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Kospi => "kospi",
            Self::Kosdaq => "kosdaq",
            Self::Freeboard => "freeboard",
            Self::Krx => "krx",
            Self::Konex => "konex",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SecurityKind
// ============================================================================

/// Security type of a listed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityKind {
    Null,
    Stock,
    MutualFund,
    /// Real estate investment trust.
    Reits,
    /// Ship investment company.
    ShipInvestment,
    /// Infrastructure fund.
    InfraFund,
    /// Depository receipt.
    DepositoryReceipt,
    /// Subscription warrant.
    Warrant,
    /// Subscription right certificate.
    SubscriptionRight,
    /// Equity linked warrant.
    Elw,
    Etf,
    /// Beneficiary certificate.
    BeneficiaryCertificate,
    ForeignEtf,
    Foreign,
    Future,
    Option,
    Konex,
    /// Exchange-traded note.
    Etn,
}

impl SecurityKind {
    /// Decodes the provider's integer code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValue`] for an unknown code.
    pub fn from_code(code: i64) -> Result<Self> {
        const BY_CODE: [SecurityKind; 18] = [
            SecurityKind::Null,
            SecurityKind::Stock,
            SecurityKind::MutualFund,
            SecurityKind::Reits,
            SecurityKind::ShipInvestment,
            SecurityKind::InfraFund,
            SecurityKind::DepositoryReceipt,
            SecurityKind::Warrant,
            SecurityKind::SubscriptionRight,
            SecurityKind::Elw,
            SecurityKind::Etf,
            SecurityKind::BeneficiaryCertificate,
            SecurityKind::ForeignEtf,
            SecurityKind::Foreign,
            SecurityKind::Future,
            SecurityKind::Option,
            SecurityKind::Konex,
            SecurityKind::Etn,
        ];

        usize::try_from(code)
            .ok()
            .and_then(|index| BY_CODE.get(index).copied())
            .ok_or_else(|| Error::unexpected_value("security kind", Value::from(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_codes() {
        assert_eq!(Market::from_code(1).unwrap(), Market::Kospi);
        assert_eq!(Market::from_code(5).unwrap(), Market::Konex);
        assert!(Market::from_code(6).is_err());
        assert_eq!(Market::Kosdaq.to_string(), "kosdaq");
    }

    #[test]
    fn test_security_kind_codes() {
        assert_eq!(SecurityKind::from_code(10).unwrap(), SecurityKind::Etf);
        assert_eq!(SecurityKind::from_code(17).unwrap(), SecurityKind::Etn);
        assert!(SecurityKind::from_code(-1).is_err());
        assert!(SecurityKind::from_code(18).is_err());
    }
}

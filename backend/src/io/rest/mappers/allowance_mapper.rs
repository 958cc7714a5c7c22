//! Mappers for converting allowance domain models into shared DTOs.

use crate::domain::models::Allowance as DomainAllowance;
use shared::Allowance as SharedAllowance;

pub struct AllowanceMapper;

impl AllowanceMapper {
    pub fn to_dto(domain: DomainAllowance) -> SharedAllowance {
        SharedAllowance {
            id: domain.id.unwrap_or_default(),
            name: domain.name,
            wallet: domain.wallet,
            lightning_address: domain.lightning_address,
            amount: domain.amount,
            currency: domain.currency.to_string(),
            frequency_type: domain.frequency_type.to_string(),
            start_date: domain.start_date,
            end_date: domain.end_date,
            next_payment_date: domain.next_payment_date,
            active: domain.active,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainAllowance>) -> Vec<SharedAllowance> {
        domain.into_iter().map(Self::to_dto).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frequency::Frequency;
    use crate::domain::models::Currency;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_dto_uses_wire_tags() {
        let domain = DomainAllowance {
            id: Some("abc".to_string()),
            name: "Streaming".to_string(),
            wallet: "w1".to_string(),
            lightning_address: "kid@getalby.com".to_string(),
            amount: 21,
            currency: Currency::Fiat("EUR".to_string()),
            frequency_type: Frequency::Streaming { seconds: 10 },
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: None,
            next_payment_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap(),
            active: true,
        };

        let dto = AllowanceMapper::to_dto(domain);
        assert_eq!(dto.id, "abc");
        assert_eq!(dto.currency, "EUR");
        assert_eq!(dto.frequency_type, "streaming-10");
        assert_eq!(dto.end_date, None);
    }
}

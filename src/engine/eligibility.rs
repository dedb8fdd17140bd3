use crate::models::courier::CourierType;

/// Base pay per delivered order, multiplied by the courier type's rate.
pub const BASE_PAY: i64 = 500;

pub fn max_weight(courier_type: CourierType) -> f64 {
    match courier_type {
        CourierType::Foot => 10.0,
        CourierType::Bike => 15.0,
        CourierType::Car => 50.0,
    }
}

pub fn eligible(courier_type: CourierType, weight: f64) -> bool {
    weight <= max_weight(courier_type)
}

pub fn pay_rate(courier_type: CourierType) -> i64 {
    match courier_type {
        CourierType::Foot => 2,
        CourierType::Bike => 5,
        CourierType::Car => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{eligible, pay_rate};
    use crate::models::courier::CourierType;

    #[test]
    fn caps_are_inclusive() {
        assert!(eligible(CourierType::Foot, 10.0));
        assert!(!eligible(CourierType::Foot, 10.01));
        assert!(eligible(CourierType::Bike, 15.0));
        assert!(!eligible(CourierType::Bike, 15.01));
        assert!(eligible(CourierType::Car, 50.0));
    }

    #[test]
    fn heavier_types_carry_everything_lighter_types_can() {
        for weight in [0.01, 5.0, 9.99, 10.0] {
            assert!(eligible(CourierType::Foot, weight));
            assert!(eligible(CourierType::Bike, weight));
            assert!(eligible(CourierType::Car, weight));
        }
        assert!(!eligible(CourierType::Foot, 12.0));
        assert!(eligible(CourierType::Bike, 12.0));
    }

    #[test]
    fn pay_rates_per_type() {
        assert_eq!(pay_rate(CourierType::Foot), 2);
        assert_eq!(pay_rate(CourierType::Bike), 5);
        assert_eq!(pay_rate(CourierType::Car), 9);
    }
}

//! Offer triage: validate a delivery offer, compute its economics locally and
//! optionally ask the intelligence service whether to take it.

use serde::Serialize;
use thiserror::Error;

use crate::config::Settings;
use crate::intelligence::advice::{OfferExtraction, OfferRecommendation};
use crate::intelligence::advisor;
use crate::intelligence::{ContentGenerator, IntelligenceError};
use crate::shift::IRS_MILEAGE_RATE;

/// Minimum pay for a high-value alert, in dollars.
pub const HIGH_VALUE_MIN_PAY: f64 = 18.0;
/// Minimum dollars per mile for a high-value alert.
pub const HIGH_VALUE_MIN_RATE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OfferValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be a positive number")]
    NotPositive(&'static str),
}

/// An offer as typed into a form or read off a screenshot; any field may be
/// missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OfferDraft {
    pub pay: Option<f64>,
    pub distance: Option<f64>,
    pub estimated_minutes: Option<f64>,
}

/// A validated offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Offer {
    pub pay: f64,
    pub distance: f64,
    pub estimated_minutes: f64,
}

impl OfferDraft {
    pub fn validate(&self) -> Result<Offer, OfferValidationError> {
        fn require(value: Option<f64>, field: &'static str) -> Result<f64, OfferValidationError> {
            let v = value.ok_or(OfferValidationError::Missing(field))?;
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(OfferValidationError::NotPositive(field))
            }
        }
        Ok(Offer {
            pay: require(self.pay, "pay")?,
            distance: require(self.distance, "distance")?,
            estimated_minutes: require(self.estimated_minutes, "estimated time")?,
        })
    }
}

impl From<&OfferExtraction> for OfferDraft {
    fn from(extraction: &OfferExtraction) -> Self {
        Self {
            pay: extraction.pay,
            distance: extraction.distance,
            estimated_minutes: extraction.estimated_time.map(f64::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OfferMetrics {
    pub dollars_per_mile: f64,
    pub dollars_per_hour: f64,
    /// Pay minus fuel cost, or minus the IRS rate when no vehicle figures are set.
    pub net_profit: f64,
    pub high_value: bool,
}

impl OfferMetrics {
    pub fn compute(offer: &Offer, settings: &Settings) -> Self {
        let net_profit = if settings.mpg > 0.0 && settings.fuel_cost > 0.0 {
            offer.pay - offer.distance / settings.mpg * settings.fuel_cost
        } else {
            offer.pay - offer.distance * IRS_MILEAGE_RATE
        };
        Self {
            dollars_per_mile: offer.pay / offer.distance,
            dollars_per_hour: offer.pay / (offer.estimated_minutes / 60.0),
            net_profit,
            high_value: is_high_value(offer.pay, offer.distance),
        }
    }
}

pub fn is_high_value(pay: f64, distance: f64) -> bool {
    distance > 0.0 && pay >= HIGH_VALUE_MIN_PAY && pay / distance >= HIGH_VALUE_MIN_RATE
}

#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Invalid(#[from] OfferValidationError),

    #[error(transparent)]
    Intelligence(#[from] IntelligenceError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferAssessment {
    pub offer: Offer,
    pub metrics: OfferMetrics,
    pub recommendation: OfferRecommendation,
}

/// Validate `draft`, compute local metrics and ask for a recommendation.
///
/// Validation runs first; an incomplete draft never reaches the service.
pub async fn assess_offer(
    generator: &impl ContentGenerator,
    draft: &OfferDraft,
    settings: &Settings,
) -> Result<OfferAssessment, TriageError> {
    let offer = draft.validate()?;
    let metrics = OfferMetrics::compute(&offer, settings);
    let recommendation =
        advisor::recommend_offer(generator, offer.pay, offer.distance, offer.estimated_minutes).await?;
    Ok(OfferAssessment {
        offer,
        metrics,
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::advice::Recommendation;
    use crate::intelligence::advisor::tests::MockGenerator;

    fn draft(pay: f64, distance: f64, minutes: f64) -> OfferDraft {
        OfferDraft {
            pay: Some(pay),
            distance: Some(distance),
            estimated_minutes: Some(minutes),
        }
    }

    #[test]
    fn validation_reports_first_problem() {
        let mut d = draft(10.0, 4.0, 20.0);
        d.distance = None;
        assert_eq!(d.validate(), Err(OfferValidationError::Missing("distance")));

        let d = draft(10.0, 0.0, 20.0);
        assert_eq!(d.validate(), Err(OfferValidationError::NotPositive("distance")));

        let d = draft(f64::NAN, 3.0, 20.0);
        assert_eq!(d.validate(), Err(OfferValidationError::NotPositive("pay")));

        assert_eq!(
            OfferDraft::default().validate().unwrap_err().to_string(),
            "pay is required"
        );
    }

    #[test]
    fn metrics_with_vehicle_settings() {
        let offer = draft(10.0, 5.0, 30.0).validate().unwrap();
        let m = OfferMetrics::compute(&offer, &Settings::default());
        assert_eq!(m.dollars_per_mile, 2.0);
        assert_eq!(m.dollars_per_hour, 20.0);
        // 5 mi / 25 mpg * $3.50 = $0.70 of fuel
        assert!((m.net_profit - 9.30).abs() < 1e-9);
        assert!(!m.high_value);
    }

    #[test]
    fn metrics_fall_back_to_mileage_rate() {
        let offer = draft(10.0, 5.0, 30.0).validate().unwrap();
        let settings = Settings {
            mpg: 0.0,
            ..Settings::default()
        };
        let m = OfferMetrics::compute(&offer, &settings);
        assert!((m.net_profit - (10.0 - 5.0 * 0.67)).abs() < 1e-9);
    }

    #[test]
    fn high_value_predicate() {
        assert!(is_high_value(18.0, 12.0));
        assert!(!is_high_value(18.0, 12.5));
        assert!(!is_high_value(17.99, 2.0));
        assert!(!is_high_value(20.0, 0.0));
    }

    #[test]
    fn draft_from_extraction() {
        let extraction = OfferExtraction {
            platform: crate::shift::Platform::GrubHub,
            restaurant: "Wok".into(),
            pay: Some(7.0),
            distance: None,
            address: "Unknown".into(),
            profit_score: 5,
            estimated_time: Some(15),
        };
        let d = OfferDraft::from(&extraction);
        assert_eq!(d.estimated_minutes, Some(15.0));
        assert_eq!(d.validate(), Err(OfferValidationError::Missing("distance")));
    }

    #[tokio::test]
    async fn invalid_draft_never_calls_service() {
        let generator = MockGenerator::ok(r#"{"recommendation":"Take","reasoning":"x"}"#);
        let mut d = draft(10.0, 4.0, 20.0);
        d.estimated_minutes = None;
        let err = assess_offer(&generator, &d, &Settings::default()).await.unwrap_err();
        assert!(matches!(
            err,
            TriageError::Invalid(OfferValidationError::Missing("estimated time"))
        ));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn assessment_combines_metrics_and_advice() {
        let generator = MockGenerator::ok(r#"{"recommendation":"Decline","reasoning":"Too far."}"#);
        let assessment = assess_offer(&generator, &draft(4.0, 8.0, 35.0), &Settings::default())
            .await
            .unwrap();
        assert_eq!(assessment.metrics.dollars_per_mile, 0.5);
        assert_eq!(assessment.recommendation.recommendation, Recommendation::Decline);
    }
}

//! High-level questions put to the intelligence service.
//!
//! Each function builds a prompt plus a JSON response schema, sends it
//! through a [`ContentGenerator`] and parses the answer into a typed value.
//! None of them mutate caller state; on error the caller keeps what it had.

use std::fmt;

use rand::Rng;
use serde_json::{Value, json};
use tracing::debug;

use super::advice::{
    DeliveryVerification, DispatchPlan, EarningsAnalysis, EarningsForecast, OfferExtraction,
    OfferRecommendation, StackAnalysis, parse_json, strip_code_fence,
};
use super::client::ContentGenerator;
use super::error::IntelligenceError;
use super::types::GenerateContentRequest;
use crate::fleet::{DriverStatus, Fleet, FleetScenario, OrderStatus, scenario};
use crate::shift::{Job, JobStatus};

/// Simulated road conditions attached to route and stack prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traffic {
    Light,
    Moderate,
    Heavy,
}

impl Traffic {
    fn for_route<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random::<f64>() {
            r if r < 0.2 => Traffic::Heavy,
            r if r < 0.5 => Traffic::Moderate,
            _ => Traffic::Light,
        }
    }

    fn for_stack<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random::<f64>() < 0.3 {
            Traffic::Heavy
        } else {
            Traffic::Light
        }
    }
}

impl fmt::Display for Traffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traffic::Light => write!(f, "Light"),
            Traffic::Moderate => write!(f, "Moderate"),
            Traffic::Heavy => write!(f, "Heavy (Accident Reported)"),
        }
    }
}

async fn ask_text(
    generator: &impl ContentGenerator,
    req: &GenerateContentRequest,
) -> Result<String, IntelligenceError> {
    let response = generator.generate_content(req).await?;
    response.text().ok_or(IntelligenceError::EmptyResponse)
}

async fn ask<T: serde::de::DeserializeOwned>(
    generator: &impl ContentGenerator,
    req: GenerateContentRequest,
    what: &'static str,
) -> Result<T, IntelligenceError> {
    let text = ask_text(generator, &req).await?;
    debug!(what, bytes = text.len(), "intelligence answer received");
    parse_json(&text, what)
}

fn job_line(job: &Job) -> String {
    format!(
        "- id={} platform={} restaurant=\"{}\" pay=${:.2} distance={:.1}mi address=\"{}\"",
        job.id, job.platform, job.restaurant, job.pay, job.distance, job.address
    )
}

/// Take, stack or decline a single offer.
pub async fn recommend_offer(
    generator: &impl ContentGenerator,
    pay: f64,
    distance: f64,
    minutes: f64,
) -> Result<OfferRecommendation, IntelligenceError> {
    let prompt = format!(
        "You are an expert gig-economy delivery strategist. A driver received an offer:\n\
         Pay: ${pay:.2}\nDistance: {distance:.1} miles\nEstimated time: {minutes:.0} minutes\n\
         Decide whether to Take it, hold it to Stack with another order, or Decline it. \
         Consider dollars per mile, dollars per hour and fuel cost. Keep the reasoning to one \
         or two sentences."
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "recommendation": {"type": "STRING", "enum": ["Take", "Stack", "Decline"]},
            "reasoning": {"type": "STRING"}
        },
        "required": ["recommendation", "reasoning"]
    });
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "offer recommendation",
    )
    .await
}

/// Pick the subset of candidate jobs worth carrying together.
pub async fn analyze_stack<R: Rng + ?Sized>(
    generator: &impl ContentGenerator,
    rng: &mut R,
    jobs: &[Job],
) -> Result<StackAnalysis, IntelligenceError> {
    if jobs.is_empty() {
        return Err(IntelligenceError::InvalidRequest(
            "stack analysis needs at least one job".into(),
        ));
    }
    let traffic = Traffic::for_stack(rng);
    let listing: Vec<String> = jobs.iter().map(job_line).collect();
    let prompt = format!(
        "You are a delivery dispatcher helping a driver stack orders.\n\
         Current traffic: {traffic}\n\
         Candidate jobs:\n{}\n\
         Choose the jobs to accept together so pay per mile and pay per hour are maximised. \
         Return their ids in pickup order, projected totals, an efficiency rating and one \
         concrete strategy tip.",
        listing.join("\n")
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "recommendedJobIds": {"type": "ARRAY", "items": {"type": "STRING"}},
            "reasoning": {"type": "STRING"},
            "totalProjectedPay": {"type": "NUMBER"},
            "totalDistance": {"type": "NUMBER"},
            "efficiencyRating": {"type": "STRING", "enum": ["High", "Medium", "Low"]},
            "strategyTip": {"type": "STRING"}
        },
        "required": ["recommendedJobIds", "reasoning", "totalProjectedPay",
                     "totalDistance", "efficiencyRating", "strategyTip"]
    });
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "stack analysis",
    )
    .await
}

/// Ordered ids of the active jobs, best delivery sequence first.
///
/// With fewer than two active jobs there is nothing to order and the service
/// is not called.
pub async fn optimize_route<R: Rng + ?Sized>(
    generator: &impl ContentGenerator,
    rng: &mut R,
    jobs: &[Job],
) -> Result<Vec<String>, IntelligenceError> {
    let active: Vec<&Job> = jobs.iter().filter(|j| j.status == JobStatus::Active).collect();
    if active.len() < 2 {
        return Ok(active.iter().map(|j| j.id.clone()).collect());
    }

    let listing: Vec<String> = active
        .iter()
        .map(|job| format!("{} traffic={}", job_line(job), Traffic::for_route(rng)))
        .collect();
    let prompt = format!(
        "Order these active deliveries into the most efficient route. Avoid legs with heavy \
         traffic where possible and deliver high-pay orders early.\n{}\n\
         Answer with the job ids in delivery order.",
        listing.join("\n")
    );
    let schema = json!({"type": "ARRAY", "items": {"type": "STRING"}});
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "route sequence",
    )
    .await
}

/// Match pending orders to available drivers.
///
/// Returns an empty plan without calling the service when there is nothing
/// to match.
pub async fn dispatch_fleet(
    generator: &impl ContentGenerator,
    fleet: &Fleet,
) -> Result<DispatchPlan, IntelligenceError> {
    let orders: Vec<_> = fleet
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .collect();
    let drivers: Vec<_> = fleet.drivers.iter().filter(|d| d.is_available()).collect();
    if orders.is_empty() || drivers.is_empty() {
        return Ok(DispatchPlan::default());
    }

    let drivers_json: Vec<Value> = drivers
        .iter()
        .map(|d| {
            json!({
                "id": d.id,
                "name": d.name,
                "status": d.status.to_string(),
                "coordinates": d.coordinates,
                "rating": d.rating,
            })
        })
        .collect();
    let orders_json: Vec<Value> = orders
        .iter()
        .map(|o| {
            json!({
                "id": o.id,
                "address": o.address,
                "amount": o.amount,
                "coordinates": o.coordinates,
            })
        })
        .collect();
    let prompt = format!(
        "You are an automated fleet dispatcher. Assign pending orders to idle drivers, nearest \
         driver first, one order per driver. Busy drivers may only be chosen if no idle driver \
         remains.\nDrivers: {}\nPending orders: {}",
        Value::Array(drivers_json),
        Value::Array(orders_json)
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "assignments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "orderId": {"type": "STRING"},
                        "driverId": {"type": "STRING"}
                    },
                    "required": ["orderId", "driverId"]
                }
            }
        },
        "required": ["assignments"]
    });
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "dispatch plan",
    )
    .await
}

/// Best hours, zones and platform split over a job history.
pub async fn analyze_earnings(
    generator: &impl ContentGenerator,
    jobs: &[Job],
) -> Result<EarningsAnalysis, IntelligenceError> {
    if jobs.is_empty() {
        return Err(IntelligenceError::InvalidRequest(
            "earnings analysis needs job history".into(),
        ));
    }
    let history: Vec<String> = jobs
        .iter()
        .map(|j| {
            format!(
                "- {} {} pay=${:.2} distance={:.1}mi address=\"{}\"",
                j.timestamp.format("%a %H:%M"),
                j.platform,
                j.pay,
                j.distance,
                j.address
            )
        })
        .collect();
    let prompt = format!(
        "Analyse this delivery driver's job history. Identify the most profitable hours, the \
         best zones, each platform's share of earnings, the top performing weekday and one \
         efficiency tip.\n{}",
        history.join("\n")
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "bestHours": {"type": "STRING"},
            "bestZones": {"type": "ARRAY", "items": {"type": "STRING"}},
            "platformComparison": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "platform": {"type": "STRING"},
                        "totalEarnings": {"type": "NUMBER"},
                        "percentage": {"type": "NUMBER"}
                    }
                }
            },
            "topPerformingDay": {"type": "STRING"},
            "efficiencyTip": {"type": "STRING"}
        },
        "required": ["bestHours", "bestZones", "platformComparison",
                     "topPerformingDay", "efficiencyTip"]
    });
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "earnings analysis",
    )
    .await
}

/// Hourly rate prediction. Without completed jobs the fixed baseline is
/// returned and the service is not called.
pub async fn forecast_earnings(
    generator: &impl ContentGenerator,
    jobs: &[Job],
) -> Result<EarningsForecast, IntelligenceError> {
    let completed: Vec<&Job> = jobs.iter().filter(|j| j.status == JobStatus::Completed).collect();
    if completed.is_empty() {
        return Ok(EarningsForecast::baseline());
    }
    let total: f64 = completed.iter().map(|j| j.pay).sum();
    let prompt = format!(
        "A driver completed {} deliveries earning ${total:.2}. Recent jobs:\n{}\n\
         Predict their hourly rate for the next shift and the peak time window.",
        completed.len(),
        completed.iter().map(|j| job_line(j)).collect::<Vec<_>>().join("\n")
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "predictedRate": {"type": "NUMBER"},
            "reasoning": {"type": "STRING"},
            "peakTime": {"type": "STRING"}
        },
        "required": ["predictedRate", "reasoning", "peakTime"]
    });
    ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "earnings forecast",
    )
    .await
}

/// A fresh fleet from the service, with the admin queue seeds appended.
pub async fn generate_fleet_scenario(
    generator: &impl ContentGenerator,
) -> Result<FleetScenario, IntelligenceError> {
    let prompt = format!(
        "Generate a realistic delivery fleet: {} drivers and {} pending orders placed on a \
         100x100 city grid with coordinates between 10 and 90. Drivers are idle, busy or \
         offline. Orders have a customer name, street address, amount in dollars and a short \
         list of items.",
        scenario::SCENARIO_DRIVERS,
        scenario::SCENARIO_ORDERS
    );
    let point = json!({
        "type": "OBJECT",
        "properties": {"x": {"type": "NUMBER"}, "y": {"type": "NUMBER"}},
        "required": ["x", "y"]
    });
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "drivers": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": {"type": "STRING"},
                        "name": {"type": "STRING"},
                        "status": {"type": "STRING", "enum": ["idle", "busy", "offline"]},
                        "currentLocation": {"type": "STRING"},
                        "coordinates": point,
                        "earnings": {"type": "NUMBER"},
                        "rating": {"type": "NUMBER"}
                    },
                    "required": ["id", "name", "status", "coordinates"]
                }
            },
            "orders": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": {"type": "STRING"},
                        "customer": {"type": "STRING"},
                        "address": {"type": "STRING"},
                        "amount": {"type": "NUMBER"},
                        "coordinates": point,
                        "items": {"type": "ARRAY", "items": {"type": "STRING"}}
                    },
                    "required": ["id", "customer", "address", "amount", "coordinates"]
                }
            }
        },
        "required": ["drivers", "orders"]
    });
    let mut generated: FleetScenario = ask(
        generator,
        GenerateContentRequest::text(prompt).json_schema(schema),
        "fleet scenario",
    )
    .await?;

    // Generated drivers never start mid-delivery.
    for driver in &mut generated.drivers {
        driver.active_order_id = None;
        if driver.status == DriverStatus::Busy {
            driver.status = DriverStatus::Idle;
        }
    }
    for order in &mut generated.orders {
        order.status = OrderStatus::Pending;
        order.assigned_driver_id = None;
    }
    Ok(scenario::with_admin_queue(generated))
}

/// Read offer fields from a screenshot of a delivery app.
pub async fn extract_offer(
    generator: &impl ContentGenerator,
    image_base64: &str,
    mime_type: &str,
) -> Result<OfferExtraction, IntelligenceError> {
    let prompt = "This is a screenshot of a food delivery offer. Extract the platform, \
                  restaurant, pay in dollars, distance in miles, drop-off address and \
                  estimated time in minutes, and rate its profitability from 1 to 10 as \
                  profitScore. Answer with a single JSON object.";
    let req = GenerateContentRequest::with_image(image_base64, mime_type, prompt);
    let text = ask_text(generator, &req).await?;
    let value: Value = serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| IntelligenceError::malformed("offer extraction", e))?;
    OfferExtraction::from_value(&value)
}

/// Check a proof-of-delivery photo.
pub async fn verify_delivery_photo(
    generator: &impl ContentGenerator,
    image_base64: &str,
    mime_type: &str,
) -> Result<DeliveryVerification, IntelligenceError> {
    let prompt = "Is this a valid proof-of-delivery photo showing a package or food bag left \
                  at a door? Answer verified=true or false with a short reason.";
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "verified": {"type": "BOOLEAN"},
            "reason": {"type": "STRING"}
        },
        "required": ["verified", "reason"]
    });
    ask(
        generator,
        GenerateContentRequest::with_image(image_base64, mime_type, prompt).json_schema(schema),
        "delivery verification",
    )
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fleet::{DispatchOrder, Dispatcher, Driver, FleetEvent, MotionParams};
    use crate::geo::Point;
    use crate::intelligence::advice::{EfficiencyRating, Recommendation};
    use crate::intelligence::types::{Candidate, Content, GenerateContentResponse, Part};
    use crate::shift::Platform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    /// Canned generator that records every prompt it is sent.
    pub(crate) struct MockGenerator {
        reply: Result<String, u16>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockGenerator {
        pub(crate) fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl ContentGenerator for MockGenerator {
        async fn generate_content(
            &self,
            req: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, IntelligenceError> {
            let prompt: String = req
                .contents
                .iter()
                .flat_map(|c| c.parts.iter())
                .filter_map(|p| p.text.clone())
                .collect();
            self.prompts.lock().unwrap().push(prompt);
            match &self.reply {
                Ok(text) => Ok(GenerateContentResponse {
                    candidates: vec![Candidate {
                        content: Some(Content {
                            role: Some("model".into()),
                            parts: vec![Part::text(text.clone())],
                        }),
                        finish_reason: Some("STOP".into()),
                    }],
                    usage_metadata: None,
                }),
                Err(status) => Err(IntelligenceError::ApiError {
                    status: *status,
                    message: "mock error".into(),
                }),
            }
        }
    }

    fn active_job(id: &str, pay: f64, distance: f64) -> Job {
        let mut job = Job::new(Platform::DoorDash, "Taco Bell", pay, distance);
        job.id = id.into();
        job
    }

    fn small_fleet() -> Fleet {
        let mut fleet = Fleet::new(MotionParams::default(), 5);
        let mut driver = Driver::new("Ana", DriverStatus::Idle, Some(Point::new(10.0, 10.0)));
        driver.id = "d1".into();
        let mut order = DispatchOrder::new("Bo", 12.0, Some(Point::new(10.0, 13.0)));
        order.id = "o1".into();
        Dispatcher::next(
            &mut fleet,
            FleetEvent::LoadScenario(FleetScenario {
                drivers: vec![driver],
                orders: vec![order],
            }),
        );
        fleet
    }

    #[tokio::test]
    async fn recommend_offer_parses_answer() {
        let generator =
            MockGenerator::ok(r#"{"recommendation":"Take","reasoning":"$2.50 per mile."}"#);
        let rec = recommend_offer(&generator, 10.0, 4.0, 20.0).await.unwrap();
        assert_eq!(rec.recommendation, Recommendation::Take);
        assert!(generator.prompts.lock().unwrap()[0].contains("Pay: $10.00"));
    }

    #[tokio::test]
    async fn service_failure_is_typed() {
        let generator = MockGenerator::failing(500);
        let err = recommend_offer(&generator, 10.0, 4.0, 20.0).await.unwrap_err();
        assert!(matches!(err, IntelligenceError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn empty_answer_is_empty_response() {
        let generator = MockGenerator::ok("   ");
        let err = recommend_offer(&generator, 10.0, 4.0, 20.0).await.unwrap_err();
        assert!(matches!(err, IntelligenceError::EmptyResponse));
    }

    #[tokio::test]
    async fn analyze_stack_rejects_empty_input_without_calling() {
        let generator = MockGenerator::ok("{}");
        let mut rng = StdRng::seed_from_u64(1);
        let err = analyze_stack(&generator, &mut rng, &[]).await.unwrap_err();
        assert!(matches!(err, IntelligenceError::InvalidRequest(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn analyze_stack_parses_fenced_answer() {
        let generator = MockGenerator::ok(
            "```json\n{\"recommendedJobIds\":[\"a\"],\"reasoning\":\"r\",\"totalProjectedPay\":9,\
             \"totalDistance\":3,\"efficiencyRating\":\"Medium\",\"strategyTip\":\"t\"}\n```",
        );
        let mut rng = StdRng::seed_from_u64(1);
        let jobs = [active_job("a", 9.0, 3.0), active_job("b", 4.0, 6.0)];
        let stack = analyze_stack(&generator, &mut rng, &jobs).await.unwrap();
        assert_eq!(stack.efficiency_rating, EfficiencyRating::Medium);
        assert!(generator.prompts.lock().unwrap()[0].contains("Current traffic:"));
    }

    #[tokio::test]
    async fn optimize_route_skips_trivial_routes() {
        let generator = MockGenerator::ok("[]");
        let mut rng = StdRng::seed_from_u64(7);
        let ids = optimize_route(&generator, &mut rng, &[active_job("only", 5.0, 1.0)])
            .await
            .unwrap();
        assert_eq!(ids, vec!["only"]);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn optimize_route_tags_traffic() {
        let generator = MockGenerator::ok(r#"["b","a"]"#);
        let mut rng = StdRng::seed_from_u64(7);
        let jobs = [active_job("a", 5.0, 1.0), active_job("b", 9.0, 2.0)];
        let ids = optimize_route(&generator, &mut rng, &jobs).await.unwrap();
        assert_eq!(ids, vec!["b", "a"]);
        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert_eq!(prompt.matches("traffic=").count(), 2);
    }

    #[tokio::test]
    async fn dispatch_without_candidates_makes_no_call() {
        let generator = MockGenerator::ok("{}");
        let fleet = Fleet::new(MotionParams::default(), 5);
        let plan = dispatch_fleet(&generator, &fleet).await.unwrap();
        assert!(plan.assignments.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn dispatch_plan_is_parsed() {
        let generator =
            MockGenerator::ok(r#"{"assignments":[{"orderId":"o1","driverId":"d1"}]}"#);
        let fleet = small_fleet();
        let plan = dispatch_fleet(&generator, &fleet).await.unwrap();
        assert_eq!(plan.assignments[0].order_id, "o1");
        assert_eq!(plan.assignments[0].driver_id, "d1");
    }

    #[tokio::test]
    async fn malformed_dispatch_plan_leaves_fleet_untouched() {
        let generator = MockGenerator::ok(r#"{"assignments": [{"orderId": "o1""#);
        let mut fleet = small_fleet();
        let before = fleet.clone();

        match dispatch_fleet(&generator, &fleet).await {
            Ok(plan) => {
                Dispatcher::assign(&mut fleet, plan.assignments);
            }
            Err(err) => assert!(matches!(err, IntelligenceError::Malformed { .. })),
        }
        assert_eq!(fleet.drivers, before.drivers);
        assert_eq!(fleet.orders, before.orders);
    }

    #[tokio::test]
    async fn forecast_without_history_is_baseline() {
        let generator = MockGenerator::ok("{}");
        let forecast = forecast_earnings(&generator, &[active_job("a", 5.0, 1.0)])
            .await
            .unwrap();
        assert_eq!(forecast, EarningsForecast::baseline());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn forecast_with_history_calls_service() {
        let generator = MockGenerator::ok(
            r#"{"predictedRate":24.5,"reasoning":"Dinner rush","peakTime":"6 PM - 8 PM"}"#,
        );
        let mut job = active_job("a", 12.0, 3.0);
        job.status = JobStatus::Completed;
        let forecast = forecast_earnings(&generator, &[job]).await.unwrap();
        assert_eq!(forecast.predicted_rate, 24.5);
    }

    #[tokio::test]
    async fn analyze_earnings_requires_history() {
        let generator = MockGenerator::ok("{}");
        assert!(matches!(
            analyze_earnings(&generator, &[]).await,
            Err(IntelligenceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn generated_scenario_is_normalised() {
        let generator = MockGenerator::ok(
            r#"{
                "drivers": [
                    {"id": "d1", "name": "Ana", "status": "busy", "coordinates": {"x": 20, "y": 30},
                     "activeOrderId": "ghost"}
                ],
                "orders": [
                    {"id": "o1", "customer": "Bo", "address": "1 Main St", "amount": 14.5,
                     "coordinates": {"x": 40, "y": 50}, "status": "assigned"}
                ]
            }"#,
        );
        let scenario = generate_fleet_scenario(&generator).await.unwrap();
        assert_eq!(scenario.drivers[0].status, DriverStatus::Idle);
        assert_eq!(scenario.drivers[0].active_order_id, None);
        assert_eq!(scenario.orders[0].status, OrderStatus::Pending);
        assert!(
            scenario
                .drivers
                .iter()
                .any(|d| d.status == DriverStatus::PendingApproval)
        );
        assert!(scenario.orders.iter().any(|o| o.status == OrderStatus::Disputed));
    }

    #[tokio::test]
    async fn extract_offer_accepts_loose_json() {
        let generator = MockGenerator::ok(
            "```json\n{\"Platform\":\"DoorDash\",\"Pay\":\"8.25\",\"Distance\":\"2.5\"}\n```",
        );
        let offer = extract_offer(&generator, "AAAA", "image/png").await.unwrap();
        assert_eq!(offer.platform, Platform::DoorDash);
        assert_eq!(offer.pay, Some(8.25));
        assert_eq!(offer.profit_score, 5);
    }

    #[tokio::test]
    async fn extract_offer_rejects_prose() {
        let generator = MockGenerator::ok("I could not read this image.");
        let err = extract_offer(&generator, "AAAA", "image/png").await.unwrap_err();
        assert!(matches!(err, IntelligenceError::Malformed { what: "offer extraction", .. }));
    }

    #[tokio::test]
    async fn verify_delivery_photo_parses_verdict() {
        let generator = MockGenerator::ok(r#"{"verified":false,"reason":"No package visible"}"#);
        let verdict = verify_delivery_photo(&generator, "AAAA", "image/jpeg").await.unwrap();
        assert!(!verdict.verified);
        assert_eq!(verdict.reason, "No package visible");
    }
}

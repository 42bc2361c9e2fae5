pub mod calendar;
pub mod catalog;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{CollectionDay, Modality};

pub use calendar::{add_business_days, add_months, is_weekend, next_weekday_after, parse_weekday, weekday_label};
pub use catalog::{installment_count, TermCatalog, TermOption, TermSelection};

/// loan terms as entered by the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub capital: Money,
    pub interest: Rate,
    pub modality: Modality,
    /// term label, e.g. "20 cuotas a 1 mes"
    pub term: String,
    pub disbursement_date: NaiveDate,
    /// requested collection weekday; ignored for daily loans
    pub anchor_weekday: Option<Weekday>,
    pub observation: Option<String>,
}

impl LoanRequest {
    /// check the inputs the schedule is derived from
    pub fn validate(&self) -> Result<()> {
        if !self.capital.is_positive() {
            return Err(LoanError::Validation {
                field: "capital",
                message: format!("must be a positive amount, got {}", self.capital),
            });
        }

        if self.interest.is_negative() {
            return Err(LoanError::Validation {
                field: "interest",
                message: format!("must not be negative, got {}", self.interest),
            });
        }

        if !matches!(installment_count(&self.term), Some(n) if n > 0) {
            return Err(LoanError::InvalidTerm {
                label: self.term.clone(),
            });
        }

        if self.capital.with_flat_rate(self.interest).is_none() {
            return Err(LoanError::Validation {
                field: "capital",
                message: format!("total debt of {} at {} is too large", self.capital, self.interest),
            });
        }

        // the last installment must land on a representable date
        if self.schedule().due_date.is_none() {
            return Err(LoanError::InvalidTerm {
                label: self.term.clone(),
            });
        }

        Ok(())
    }

    /// derive the schedule
    pub fn schedule(&self) -> LoanSchedule {
        ScheduleCalculator::compute(self)
    }
}

/// raw text inputs of the loan section of the client form
#[derive(Debug, Clone, Default)]
pub struct LoanFormInput {
    pub capital: String,
    pub interest_percentage: String,
    pub modality: String,
    pub term: String,
    pub weekday: String,
    pub observation: String,
}

impl LoanFormInput {
    /// blank form with the configured interest and modality pre-filled
    pub fn with_defaults(config: &EngineConfig) -> Self {
        Self {
            interest_percentage: config.lending.default_interest_percentage.normalize().to_string(),
            modality: config.lending.default_modality.label().to_string(),
            ..Self::default()
        }
    }

    /// parse and validate into a loan request
    pub fn parse(&self, disbursement_date: NaiveDate) -> Result<LoanRequest> {
        let capital = parse_amount("capital", &self.capital)?;
        let interest = parse_amount("interest", &self.interest_percentage)?;
        let modality: Modality = self.modality.parse()?;

        if self.term.trim().is_empty() {
            return Err(LoanError::Validation {
                field: "term",
                message: "must not be empty".to_string(),
            });
        }

        let anchor_weekday = if modality.uses_anchor_weekday() && !self.weekday.trim().is_empty() {
            Some(parse_weekday(&self.weekday).ok_or_else(|| LoanError::Validation {
                field: "weekday",
                message: format!("unknown weekday {:?}", self.weekday),
            })?)
        } else {
            None
        };

        let observation = Some(self.observation.trim().to_string()).filter(|o| !o.is_empty());

        let request = LoanRequest {
            capital: Money::from_decimal(capital),
            interest: Rate::from_percentage(interest),
            modality,
            term: self.term.trim().to_string(),
            disbursement_date,
            anchor_weekday,
            observation,
        };
        request.validate()?;
        Ok(request)
    }
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LoanError::Validation {
            field,
            message: "must not be empty".to_string(),
        });
    }
    raw.parse::<Decimal>().map_err(|_| LoanError::Validation {
        field,
        message: format!("{:?} is not a number", raw),
    })
}

/// one installment of the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub number: u32,
    pub date: NaiveDate,
    pub amount: Money,
}

/// fields derived from a loan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub modality: Modality,
    pub total_debt: Money,
    /// zero when the term has no valid installment count
    pub installments: u32,
    pub quota: Money,
    pub first_installment_date: NaiveDate,
    pub collection_day: CollectionDay,
    /// monthly loans only
    pub day_of_month: Option<u32>,
    /// unset when the term has no valid installment count
    pub due_date: Option<NaiveDate>,
}

impl LoanSchedule {
    pub fn is_valid(&self) -> bool {
        self.installments > 0 && self.due_date.is_some()
    }

    /// date of installment `number` (1-based)
    pub fn installment_date(&self, number: u32) -> Option<NaiveDate> {
        if number == 0 || number > self.installments {
            return None;
        }
        ScheduleCalculator::advance(self.modality, self.first_installment_date, number - 1)
    }

    /// full installment plan; the last installment absorbs rounding
    pub fn installments(&self) -> Vec<ScheduledInstallment> {
        if !self.is_valid() {
            return Vec::new();
        }
        let mut plan = Vec::with_capacity(self.installments as usize);
        let mut allocated = Money::ZERO;

        for number in 1..=self.installments {
            let Some(date) = self.installment_date(number) else {
                break;
            };
            let amount = if number == self.installments {
                self.total_debt - allocated
            } else {
                self.quota
            };
            allocated += amount;
            plan.push(ScheduledInstallment { number, date, amount });
        }

        plan
    }
}

/// pure calendar and amortization rules
pub struct ScheduleCalculator;

impl ScheduleCalculator {
    /// a total debt too large to represent degrades like an unparseable
    /// term: zero debt and quota, no due date
    pub fn compute(request: &LoanRequest) -> LoanSchedule {
        let total_debt = request.capital.with_flat_rate(request.interest);
        let installments = if total_debt.is_some() {
            installment_count(&request.term).unwrap_or(0)
        } else {
            0
        };
        let total_debt = total_debt.unwrap_or(Money::ZERO);

        let quota = if installments > 0 {
            (total_debt / Decimal::from(installments)).to_cents()
        } else {
            Money::ZERO
        };

        let first = Self::first_installment_date(request);
        // only reached at the end of the date range; the schedule has no due date then
        let first_installment_date = first.unwrap_or(request.disbursement_date);

        let collection_day = match request.modality {
            Modality::Daily => CollectionDay::Daily,
            Modality::Weekly | Modality::Monthly => CollectionDay::Weekday(
                request.anchor_weekday.unwrap_or(first_installment_date.weekday()),
            ),
        };

        let day_of_month = match request.modality {
            Modality::Monthly => Some(first_installment_date.day()),
            _ => None,
        };

        let due_date = match first {
            Some(first) if installments > 0 => Self::advance(request.modality, first, installments - 1),
            _ => None,
        };

        LoanSchedule {
            modality: request.modality,
            total_debt,
            installments,
            quota,
            first_installment_date,
            collection_day,
            day_of_month,
            due_date,
        }
    }

    /// a monthly loan without an anchor weekday starts one calendar month
    /// after disbursement, not the next day
    fn first_installment_date(request: &LoanRequest) -> Option<NaiveDate> {
        let disbursed = request.disbursement_date;
        match (request.modality, request.anchor_weekday) {
            (Modality::Daily, _) | (Modality::Weekly, None) => disbursed.succ_opt(),
            (Modality::Weekly | Modality::Monthly, Some(weekday)) => next_weekday_after(disbursed, weekday),
            (Modality::Monthly, None) => add_months(disbursed, 1),
        }
    }

    /// move `periods` installments forward from `first`
    fn advance(modality: Modality, first: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match modality {
            Modality::Daily => add_business_days(first, periods),
            Modality::Weekly => calendar::add_weeks(first, periods),
            Modality::Monthly => add_months(first, periods),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(modality: Modality, term: &str, disbursed: NaiveDate) -> LoanRequest {
        LoanRequest {
            capital: Money::from_major(1_000),
            interest: Rate::from_percentage(10),
            modality,
            term: term.to_string(),
            disbursement_date: disbursed,
            anchor_weekday: None,
            observation: None,
        }
    }

    #[test]
    fn test_monthly_example() {
        let schedule = request(Modality::Monthly, "3 cuotas a 3 meses", date(2025, 1, 15)).schedule();

        assert_eq!(schedule.total_debt, Money::from_major(1_100));
        assert_eq!(schedule.quota, Money::from_cents(36667));
        assert_eq!(schedule.first_installment_date, date(2025, 2, 15));
        assert_eq!(schedule.due_date, Some(date(2025, 4, 15)));
        assert_eq!(schedule.day_of_month, Some(15));
        // 2025-02-15 is a saturday
        assert_eq!(schedule.collection_day, CollectionDay::Weekday(Weekday::Sat));
    }

    #[test]
    fn test_daily_friday_disbursement() {
        let schedule = request(Modality::Daily, "5 cuotas", date(2025, 1, 3)).schedule();

        // first date is not moved off the weekend
        assert_eq!(schedule.first_installment_date, date(2025, 1, 4));
        assert_eq!(schedule.due_date, Some(date(2025, 1, 9)));
        assert_eq!(schedule.collection_day, CollectionDay::Daily);
        assert_eq!(schedule.day_of_month, None);
    }

    #[test]
    fn test_daily_due_date_never_on_weekend() {
        let start = date(2025, 3, 1);
        for offset in 0..14 {
            let disbursed = start + Duration::days(offset);
            for option in TermCatalog::options(Modality::Daily) {
                let schedule = request(Modality::Daily, &option.label, disbursed).schedule();
                let due = schedule.due_date.unwrap();
                assert!(!is_weekend(due), "{} from {} due on {}", option.label, disbursed, due);
            }
            let single = request(Modality::Daily, "1 cuota", disbursed).schedule();
            assert_eq!(single.due_date, Some(single.first_installment_date));
        }
    }

    #[test]
    fn test_weekly_with_anchor() {
        let mut req = request(Modality::Weekly, "4 semanas a 1 mes", date(2025, 1, 15));
        req.anchor_weekday = Some(Weekday::Mon);
        let schedule = req.schedule();

        assert_eq!(schedule.first_installment_date, date(2025, 1, 20));
        assert_eq!(schedule.due_date, Some(date(2025, 2, 10)));
        assert_eq!(schedule.collection_day, CollectionDay::Weekday(Weekday::Mon));
        assert_eq!(schedule.quota, Money::from_major(275));
    }

    #[test]
    fn test_anchor_on_disbursement_weekday_moves_a_full_week() {
        let mut req = request(Modality::Weekly, "4 semanas a 1 mes", date(2025, 1, 15));
        req.anchor_weekday = Some(Weekday::Wed);
        assert_eq!(req.schedule().first_installment_date, date(2025, 1, 22));
    }

    #[test]
    fn test_weekly_without_anchor_reads_weekday_back() {
        let schedule = request(Modality::Weekly, "6 semanas a 1.5 meses", date(2025, 1, 15)).schedule();
        assert_eq!(schedule.first_installment_date, date(2025, 1, 16));
        assert_eq!(schedule.collection_day, CollectionDay::Weekday(Weekday::Thu));
        assert_eq!(schedule.due_date, Some(date(2025, 2, 20)));
    }

    #[test]
    fn test_monthly_with_anchor() {
        let mut req = request(Modality::Monthly, "2 cuotas a 2 meses", date(2025, 1, 15));
        req.anchor_weekday = Some(Weekday::Fri);
        let schedule = req.schedule();
        assert_eq!(schedule.first_installment_date, date(2025, 1, 17));
        assert_eq!(schedule.due_date, Some(date(2025, 2, 17)));
    }

    #[test]
    fn test_invalid_term_degrades() {
        let schedule = request(Modality::Daily, "sin plazo", date(2025, 1, 3)).schedule();
        assert_eq!(schedule.quota, Money::ZERO);
        assert_eq!(schedule.due_date, None);
        assert!(!schedule.is_valid());
        assert!(schedule.installments().is_empty());

        let zero = request(Modality::Weekly, "0 semanas", date(2025, 1, 3)).schedule();
        assert_eq!(zero.quota, Money::ZERO);
        assert_eq!(zero.due_date, None);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        for modality in Modality::ALL {
            for option in TermCatalog::options(modality) {
                let mut req = request(modality, &option.label, date(2025, 5, 30));
                req.anchor_weekday = Some(Weekday::Tue);
                assert_eq!(req.schedule(), req.schedule());
            }
        }
    }

    #[test]
    fn test_total_debt_and_quota_formula() {
        let cases = [
            (dec!(1000), dec!(10), 3u32),
            (dec!(2500.50), dec!(15), 20),
            (dec!(750), dec!(0), 7),
            (dec!(1234.56), dec!(12.5), 365),
        ];
        for (capital, pct, n) in cases {
            let req = LoanRequest {
                capital: Money::from_decimal(capital),
                interest: Rate::from_percentage(pct),
                modality: Modality::Daily,
                term: format!("{} cuotas", n),
                disbursement_date: date(2025, 1, 1),
                anchor_weekday: None,
                observation: None,
            };
            let schedule = req.schedule();
            let expected_total = capital * (Decimal::ONE + pct / dec!(100));
            assert_eq!(schedule.total_debt.as_decimal(), expected_total);
            assert_eq!(
                schedule.quota,
                Money::from_decimal(expected_total / Decimal::from(n)).to_cents()
            );
        }
    }

    #[test]
    fn test_installment_plan_sums_to_total() {
        let schedule = request(Modality::Monthly, "3 cuotas a 3 meses", date(2025, 1, 15)).schedule();
        let plan = schedule.installments();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].amount, Money::from_cents(36667));
        assert_eq!(plan[2].amount, Money::from_cents(36666));
        let total: Money = plan.iter().map(|i| i.amount).sum();
        assert_eq!(total, schedule.total_debt);
        assert_eq!(plan.last().map(|i| i.date), schedule.due_date);
    }

    #[test]
    fn test_daily_plan_skips_weekends() {
        let schedule = request(Modality::Daily, "20 cuotas a 1 mes", date(2025, 1, 3)).schedule();
        let plan = schedule.installments();
        assert_eq!(plan.len(), 20);
        assert_eq!(plan[0].date, date(2025, 1, 4));
        assert!(plan[1..].iter().all(|i| !is_weekend(i.date)));
        assert_eq!(plan.last().map(|i| i.date), schedule.due_date);
    }

    #[test]
    fn test_validation() {
        let mut req = request(Modality::Daily, "20 cuotas a 1 mes", date(2025, 1, 3));
        assert!(req.validate().is_ok());

        req.capital = Money::ZERO;
        assert!(matches!(req.validate(), Err(LoanError::Validation { field: "capital", .. })));

        req.capital = Money::from_major(100);
        req.interest = Rate::from_percentage(-1);
        assert!(matches!(req.validate(), Err(LoanError::Validation { field: "interest", .. })));

        req.interest = Rate::ZERO;
        req.term = "cero".to_string();
        assert!(matches!(req.validate(), Err(LoanError::InvalidTerm { .. })));
    }

    #[test]
    fn test_form_input_parsing() {
        let input = LoanFormInput {
            capital: "1000".to_string(),
            interest_percentage: "15".to_string(),
            modality: "Semanal".to_string(),
            term: "4 semanas a 1 mes".to_string(),
            weekday: "Lunes".to_string(),
            observation: "  ".to_string(),
        };
        let req = input.parse(date(2025, 1, 15)).unwrap();
        assert_eq!(req.anchor_weekday, Some(Weekday::Mon));
        assert_eq!(req.observation, None);
        assert_eq!(req.schedule().total_debt, Money::from_major(1_150));

        let blank_capital = LoanFormInput { capital: " ".to_string(), ..input.clone() };
        assert!(matches!(
            blank_capital.parse(date(2025, 1, 15)),
            Err(LoanError::Validation { field: "capital", .. })
        ));

        let bad_interest = LoanFormInput { interest_percentage: "abc".to_string(), ..input.clone() };
        assert!(matches!(
            bad_interest.parse(date(2025, 1, 15)),
            Err(LoanError::Validation { field: "interest", .. })
        ));

        let bad_day = LoanFormInput { weekday: "Funday".to_string(), ..input.clone() };
        assert!(bad_day.parse(date(2025, 1, 15)).is_err());

        // weekday is ignored for daily loans
        let daily = LoanFormInput {
            modality: "Diario".to_string(),
            term: "20 cuotas a 1 mes".to_string(),
            ..input
        };
        assert_eq!(daily.parse(date(2025, 1, 15)).unwrap().anchor_weekday, None);
    }

    #[test]
    fn test_term_past_the_calendar_is_refused() {
        let disbursed = date(2025, 1, 15);
        for (modality, term) in [
            (Modality::Weekly, "20000000 semanas a 1 mes"),
            (Modality::Daily, "4000000000 cuotas"),
            (Modality::Monthly, "4000000000 cuotas"),
        ] {
            let req = request(modality, term, disbursed);
            let schedule = req.schedule();
            assert_eq!(schedule.due_date, None, "{}", term);
            assert!(!schedule.is_valid());
            assert!(schedule.installments().is_empty());
            assert!(matches!(req.validate(), Err(LoanError::InvalidTerm { .. })), "{}", term);
        }

        // long but representable terms still work
        let long = request(Modality::Daily, "100000 cuotas", disbursed);
        assert!(long.validate().is_ok());
        assert!(long.schedule().due_date.unwrap() > date(2400, 1, 1));
    }

    #[test]
    fn test_disbursed_at_end_of_calendar() {
        let req = request(Modality::Daily, "1 cuota", NaiveDate::MAX);
        let schedule = req.schedule();
        assert_eq!(schedule.first_installment_date, NaiveDate::MAX);
        assert_eq!(schedule.due_date, None);
        assert!(matches!(req.validate(), Err(LoanError::InvalidTerm { .. })));
    }

    #[test]
    fn test_capital_too_large_is_a_validation_error() {
        let input = LoanFormInput {
            capital: Decimal::MAX.to_string(),
            interest_percentage: "10".to_string(),
            modality: "Diario".to_string(),
            term: "20 cuotas a 1 mes".to_string(),
            ..LoanFormInput::default()
        };
        assert!(matches!(
            input.parse(date(2025, 1, 15)),
            Err(LoanError::Validation { field: "capital", .. })
        ));

        let mut req = request(Modality::Daily, "20 cuotas a 1 mes", date(2025, 1, 15));
        req.capital = Money::from_decimal(Decimal::MAX);
        let schedule = req.schedule();
        assert_eq!(schedule.total_debt, Money::ZERO);
        assert_eq!(schedule.due_date, None);

        // no interest, no growth: the maximum itself is accepted
        req.interest = Rate::ZERO;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_form_defaults_come_from_config() {
        let mut config = EngineConfig::default();
        let blank = LoanFormInput::with_defaults(&config);
        assert_eq!(blank.interest_percentage, "15");
        assert_eq!(blank.modality, "Diario");
        assert!(blank.capital.is_empty());

        config.lending.default_interest_percentage = dec!(12.50);
        config.lending.default_modality = Modality::Weekly;
        let input = LoanFormInput {
            capital: "1000".to_string(),
            term: "4 semanas a 1 mes".to_string(),
            ..LoanFormInput::with_defaults(&config)
        };
        let req = input.parse(date(2025, 1, 15)).unwrap();
        assert_eq!(req.modality, Modality::Weekly);
        assert_eq!(req.interest.as_percentage(), dec!(12.5));
    }
}

//! The research form and its validation

use crate::companies;
use crate::dates::{DateRange, format_date};
use agent_core::context::keys;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days between the default start date and today
pub const DEFAULT_START_OFFSET_DAYS: u64 = 366;

/// Why a form submission was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Please select a company")]
    NoCompany,

    #[error("End date should be after the start date")]
    EndBeforeStart,

    #[error("Dates should be before today")]
    FutureDate,
}

/// What the user filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchForm {
    /// Display name (or ticker) of the selected company
    pub company: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ResearchForm {
    /// A blank form: no company, `[today - 366 days, today]`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            company: None,
            start_date: today
                .checked_sub_days(Days::new(DEFAULT_START_OFFSET_DAYS))
                .unwrap_or(NaiveDate::MIN),
            end_date: today,
        }
    }

    /// Select a company
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Set the start date
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self
    }

    /// Set the end date
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = date;
        self
    }

    /// Check the submission, in order: company, date order, no future dates
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use stock_research::{FormError, ResearchForm};
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    /// let form = ResearchForm::new(today).company("Select a company");
    /// assert_eq!(form.validate(today), Err(FormError::NoCompany));
    ///
    /// let request = ResearchForm::new(today).company("Apple Inc.").validate(today).unwrap();
    /// assert_eq!(request.ticker, "AAPL");
    /// ```
    pub fn validate(&self, today: NaiveDate) -> Result<ResearchRequest, FormError> {
        let (company, ticker) = self
            .company
            .as_deref()
            .and_then(companies::resolve)
            .ok_or(FormError::NoCompany)?;

        if self.end_date < self.start_date {
            return Err(FormError::EndBeforeStart);
        }

        if self.end_date > today || self.start_date > today {
            return Err(FormError::FutureDate);
        }

        Ok(ResearchRequest {
            company: company.to_string(),
            ticker: ticker.to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// A validated research request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub company: String,
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ResearchRequest {
    /// Crew inputs: `ticker`, `start_date` and `end_date` as strings
    pub fn inputs(&self) -> [(&'static str, String); 3] {
        [
            (keys::TICKER, self.ticker.clone()),
            (keys::START_DATE, format_date(self.start_date)),
            (keys::END_DATE, format_date(self.end_date)),
        ]
    }

    /// The requested window
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Heading shown above the results
    pub fn heading(&self) -> String {
        format!("Research Results for {} ({})", self.company, self.ticker)
    }
}

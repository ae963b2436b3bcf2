use serde::{Deserialize, Serialize};

/// Applicant attributes as entered on the eligibility form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawApplication {
    pub age: u32,
    pub annual_income: f64,
    pub employment_length_years: u32,
    pub loan_amount: f64,
    pub interest_rate_pct: f64,
    pub credit_history_years: u32,
    pub home_ownership: HomeOwnership,
    pub prior_default: bool,
    pub loan_intent: LoanIntent,
    pub loan_grade: LoanGrade,
}

impl Default for RawApplication {
    fn default() -> Self {
        Self {
            age: 30,
            annual_income: 50_000.0,
            employment_length_years: 5,
            loan_amount: 10_000.0,
            interest_rate_pct: 10.0,
            credit_history_years: 10,
            home_ownership: HomeOwnership::Renter,
            prior_default: false,
            loan_intent: LoanIntent::RealEstate,
            loan_grade: LoanGrade::A,
        }
    }
}

impl RawApplication {
    /// Loan amount over annual income, rounded to two decimals.
    pub fn loan_to_income_ratio(&self) -> f64 {
        loan_to_income_ratio(self.loan_amount, self.annual_income)
    }

    /// Pull every numeric field into its form bounds, reporting what moved.
    pub fn clamped(mut self) -> (Self, Vec<InputAdjustment>) {
        let mut adjustments = Vec::new();

        self.age = AGE_BOUNDS.clamp_recorded("age", self.age, &mut adjustments);
        self.annual_income =
            ANNUAL_INCOME_BOUNDS.clamp_recorded("annual_income", self.annual_income, &mut adjustments);
        self.employment_length_years = EMPLOYMENT_LENGTH_BOUNDS.clamp_recorded(
            "employment_length_years",
            self.employment_length_years,
            &mut adjustments,
        );
        self.loan_amount =
            LOAN_AMOUNT_BOUNDS.clamp_recorded("loan_amount", self.loan_amount, &mut adjustments);
        self.interest_rate_pct = INTEREST_RATE_BOUNDS.clamp_recorded(
            "interest_rate_pct",
            self.interest_rate_pct,
            &mut adjustments,
        );
        self.credit_history_years = CREDIT_HISTORY_BOUNDS.clamp_recorded(
            "credit_history_years",
            self.credit_history_years,
            &mut adjustments,
        );

        (self, adjustments)
    }
}

/// Ratio of loan to income rounded at two decimals.
///
/// Rounds the exact binary value of the quotient, so `1175 / 5000` (stored
/// just below 0.235) yields 0.23. Only exact decimal ties go to even.
pub fn loan_to_income_ratio(loan_amount: f64, annual_income: f64) -> f64 {
    let ratio = loan_amount / annual_income;
    format!("{ratio:.2}").parse().unwrap_or(ratio)
}

/// Inclusive input range enforced at entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputBounds<T> {
    pub min: T,
    pub max: T,
}

pub const AGE_BOUNDS: InputBounds<u32> = InputBounds { min: 18, max: 100 };
pub const ANNUAL_INCOME_BOUNDS: InputBounds<f64> = InputBounds {
    min: 5_000.0,
    max: 500_000.0,
};
pub const EMPLOYMENT_LENGTH_BOUNDS: InputBounds<u32> = InputBounds { min: 0, max: 50 };
pub const LOAN_AMOUNT_BOUNDS: InputBounds<f64> = InputBounds {
    min: 1_000.0,
    max: 50_000.0,
};
pub const INTEREST_RATE_BOUNDS: InputBounds<f64> = InputBounds {
    min: 1.0,
    max: 30.0,
};
pub const CREDIT_HISTORY_BOUNDS: InputBounds<u32> = InputBounds { min: 0, max: 50 };

impl InputBounds<u32> {
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn clamp_recorded(
        &self,
        field: &'static str,
        value: u32,
        adjustments: &mut Vec<InputAdjustment>,
    ) -> u32 {
        let applied = value.clamp(self.min, self.max);
        if applied != value {
            adjustments.push(InputAdjustment {
                field,
                entered: f64::from(value),
                applied: f64::from(applied),
            });
        }
        applied
    }
}

impl InputBounds<f64> {
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn clamp_recorded(
        &self,
        field: &'static str,
        value: f64,
        adjustments: &mut Vec<InputAdjustment>,
    ) -> f64 {
        // NaN falls to the floor so the ratio never divides by a non-number.
        let applied = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
        if applied != value || value.is_nan() {
            adjustments.push(InputAdjustment {
                field,
                entered: value,
                applied,
            });
        }
        applied
    }
}

/// A numeric input that was pulled back inside its bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputAdjustment {
    pub field: &'static str,
    pub entered: f64,
    pub applied: f64,
}

/// Shared behaviour of the one-hot encoded selections.
pub trait Category: Copy + Eq + Sized + 'static {
    /// Every variant in encoding order.
    fn all() -> &'static [Self];

    /// Stable name used on the wire.
    fn wire_name(self) -> &'static str;

    fn label(self) -> &'static str;

    /// Alternate spellings accepted from CSV and CLI input.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    fn position(self) -> usize {
        Self::all()
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or_default()
    }

    /// Case-insensitive parse over wire name, label, and aliases.
    fn parse_lenient(raw: &str) -> Result<Self, CategoryParseError> {
        let needle = raw.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|candidate| {
                [candidate.wire_name(), candidate.label()]
                    .into_iter()
                    .chain(candidate.aliases().iter().copied())
                    .any(|name| name.to_lowercase() == needle)
            })
            .ok_or_else(|| CategoryParseError {
                value: raw.to_string(),
                expected: Self::all()
                    .iter()
                    .map(|candidate| candidate.wire_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised value '{value}' (expected one of: {expected})")]
pub struct CategoryParseError {
    pub value: String,
    pub expected: String,
}

/// Housing situation of the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeOwnership {
    Renter,
    Owner,
    Mortgage,
}

impl HomeOwnership {
    pub const ALL: [Self; 3] = [Self::Renter, Self::Owner, Self::Mortgage];
}

impl Category for HomeOwnership {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn wire_name(self) -> &'static str {
        match self {
            Self::Renter => "renter",
            Self::Owner => "owner",
            Self::Mortgage => "mortgage",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Renter => "Renter",
            Self::Owner => "Owner",
            Self::Mortgage => "Mortgage",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Renter => &["Locataire", "rent"],
            Self::Owner => &["Propriétaire", "own"],
            Self::Mortgage => &["Hypothèque"],
        }
    }
}

/// Declared purpose of the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanIntent {
    RealEstate,
    Vehicle,
    Education,
    Business,
    Wedding,
}

impl LoanIntent {
    pub const ALL: [Self; 5] = [
        Self::RealEstate,
        Self::Vehicle,
        Self::Education,
        Self::Business,
        Self::Wedding,
    ];
}

impl Category for LoanIntent {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn wire_name(self) -> &'static str {
        match self {
            Self::RealEstate => "real_estate",
            Self::Vehicle => "vehicle",
            Self::Education => "education",
            Self::Business => "business",
            Self::Wedding => "wedding",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::RealEstate => "Real estate",
            Self::Vehicle => "Vehicle",
            Self::Education => "Education",
            Self::Business => "Business",
            Self::Wedding => "Wedding",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::RealEstate => &["Achat immobilier", "realestate", "home"],
            Self::Vehicle => &["Voiture", "car"],
            Self::Education => &["Éducation"],
            Self::Business => &["venture"],
            Self::Wedding => &["Mariage"],
        }
    }
}

/// Lender-assigned risk grade, A being the lowest risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanGrade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl LoanGrade {
    pub const ALL: [Self; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];
}

impl Category for LoanGrade {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn wire_name(self) -> &'static str {
        self.label()
    }

    fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

/// Parse a yes/no answer in the spellings the form and exports use.
pub fn parse_flag(raw: &str) -> Result<bool, CategoryParseError> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" | "oui" | "true" | "1" => Ok(true),
        "no" | "n" | "non" | "false" | "0" => Ok(false),
        _ => Err(CategoryParseError {
            value: raw.to_string(),
            expected: "yes, no".to_string(),
        }),
    }
}

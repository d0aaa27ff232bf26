use serde::{Deserialize, Serialize};

/// How the level debt-service payment is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationMode {
    /// Payment recomputed each year from the remaining balance and remaining term.
    #[default]
    Recomputed,
    /// Payment computed once from the original amount and term.
    Fixed,
}

/// Debt service for one project year.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoanYear {
    pub interest: f64,
    pub principal: f64,
    /// Balance after this year's principal payment.
    pub balance: f64,
}

impl LoanYear {
    pub fn debt_service(&self) -> f64 {
        self.interest + self.principal
    }
}

/// Level-payment term loan stepped one year at a time.
///
/// # Examples
///
/// ```
/// use eaf_bess_finance::finance::{AmortizationMode, LoanSchedule};
///
/// let mut loan = LoanSchedule::new(1_000.0, 0.0, 4, AmortizationMode::Recomputed);
/// assert_eq!(loan.next_year().principal, 250.0);
/// ```
#[derive(Debug, Clone)]
pub struct LoanSchedule {
    rate: f64,
    term_years: u32,
    mode: AmortizationMode,
    balance: f64,
    fixed_payment: f64,
    year: u32,
}

impl LoanSchedule {
    /// Creates a schedule for `amount` borrowed at `rate` over `term_years`.
    ///
    /// A non-positive amount or a zero term yields a schedule with no debt service.
    pub fn new(amount: f64, rate: f64, term_years: u32, mode: AmortizationMode) -> Self {
        let balance = if amount > 0.0 && term_years > 0 {
            amount
        } else {
            0.0
        };
        Self {
            rate,
            term_years,
            mode,
            balance,
            fixed_payment: annuity_payment(balance, rate, term_years),
            year: 0,
        }
    }

    /// Outstanding balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Advances one year and returns its interest and principal.
    pub fn next_year(&mut self) -> LoanYear {
        self.year += 1;
        if self.year > self.term_years || self.balance <= 0.0 {
            return LoanYear {
                balance: self.balance,
                ..LoanYear::default()
            };
        }

        let interest = self.balance * self.rate;
        let payment = match self.mode {
            AmortizationMode::Recomputed => {
                annuity_payment(self.balance, self.rate, self.term_years - self.year + 1)
            }
            AmortizationMode::Fixed => self.fixed_payment,
        };

        let principal = if self.year == self.term_years {
            self.balance
        } else {
            (payment - interest).clamp(0.0, self.balance)
        };
        self.balance -= principal;

        LoanYear {
            interest,
            principal,
            balance: self.balance,
        }
    }
}

/// Level annual payment that retires `amount` over `years` at `rate`.
pub fn annuity_payment(amount: f64, rate: f64, years: u32) -> f64 {
    if years == 0 || amount <= 0.0 {
        return 0.0;
    }
    let n = f64::from(years);
    if rate.abs() < 1e-12 {
        return amount / n;
    }
    amount * rate / (1.0 - (1.0 + rate).powf(-n))
}

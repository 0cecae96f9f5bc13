//! Line validation and chart-of-accounts checks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use kontor_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{JournalLineInput, JournalTotals};

/// Chart-of-accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Asset.
    Asset,
    /// Liability.
    Liability,
    /// Equity.
    Equity,
    /// Revenue.
    Revenue,
    /// Expense.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Information about an account needed for validation.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Account classification.
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account allows direct posting (false for control accounts).
    pub allow_direct_posting: bool,
    /// Whether posting to this account needs `journal.final_post`.
    pub requires_final_post: bool,
}

impl AccountInfo {
    /// Requires the account to be of the given type.
    pub fn expect_type(&self, expected: AccountType) -> Result<(), LedgerError> {
        if self.account_type == expected {
            Ok(())
        } else {
            Err(LedgerError::AccountTypeMismatch {
                account_id: self.id,
                expected,
            })
        }
    }
}

/// Fractional digits the amount columns store (`NUMERIC(19, 4)`).
pub const AMOUNT_SCALE: u32 = 4;

/// Integer digits the amount columns store.
const AMOUNT_INTEGER_DIGITS: u32 = 15;

fn amount_limit() -> Decimal {
    Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS))
}

fn fits_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= AMOUNT_SCALE
}

/// Returns true when the amount is stored without rounding or overflow.
#[must_use]
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount.abs() < amount_limit() && fits_scale(amount)
}

/// Validates a single line's amounts.
///
/// Each amount must be stored as given, without rounding.
pub fn validate_line_amounts(index: usize, line: &JournalLineInput) -> Result<(), LedgerError> {
    if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount { line: index });
    }
    match (line.debit.is_zero(), line.credit.is_zero()) {
        (true, true) => return Err(LedgerError::ZeroAmount { line: index }),
        (false, false) => return Err(LedgerError::BothSides { line: index }),
        _ => {}
    }
    let amount = line.amount();
    if amount >= amount_limit() {
        return Err(LedgerError::AmountOutOfRange { line: index });
    }
    if !fits_scale(amount) {
        return Err(LedgerError::AmountPrecision { line: index });
    }
    Ok(())
}

/// Validates an account against the chart of accounts.
pub fn validate_account<A>(account_id: AccountId, account_lookup: &A) -> Result<AccountInfo, LedgerError>
where
    A: Fn(AccountId) -> Option<AccountInfo>,
{
    let info = account_lookup(account_id).ok_or(LedgerError::AccountNotFound(account_id))?;
    if !info.is_active {
        return Err(LedgerError::AccountInactive(account_id));
    }
    if !info.allow_direct_posting {
        return Err(LedgerError::AccountNoDirectPosting(account_id));
    }
    Ok(info)
}

/// Validates a full set of lines and returns their totals.
///
/// Checks, in order: at least one line; each line's amounts; each line's
/// account; debits equal credits exactly.
pub fn validate_lines<A>(lines: &[JournalLineInput], account_lookup: A) -> Result<JournalTotals, LedgerError>
where
    A: Fn(AccountId) -> Option<AccountInfo>,
{
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    for (index, line) in lines.iter().enumerate() {
        validate_line_amounts(index, line)?;
        validate_account(line.account_id, &account_lookup)?;
    }

    let totals = JournalTotals::of(lines)?;
    if !totals.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

/// Returns true if any line touches a controller-only account.
pub fn requires_final_post<A>(lines: &[JournalLineInput], account_lookup: A) -> bool
where
    A: Fn(AccountId) -> Option<AccountInfo>,
{
    lines
        .iter()
        .filter_map(|line| account_lookup(line.account_id))
        .any(|info| info.requires_final_post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn account(account_type: AccountType) -> AccountInfo {
        AccountInfo {
            id: AccountId::new(),
            account_type,
            is_active: true,
            allow_direct_posting: true,
            requires_final_post: false,
        }
    }

    fn chart(accounts: &[AccountInfo]) -> HashMap<AccountId, AccountInfo> {
        accounts.iter().map(|a| (a.id, a.clone())).collect()
    }

    #[test]
    fn test_balanced_lines() {
        let expense = account(AccountType::Expense);
        let payable = account(AccountType::Liability);
        let coa = chart(&[expense.clone(), payable.clone()]);

        let totals = validate_lines(
            &[
                JournalLineInput::debit(expense.id, dec!(100.00)),
                JournalLineInput::credit(payable.id, dec!(100.00)),
            ],
            |id| coa.get(&id).cloned(),
        )
        .unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.credit, dec!(100.00));
    }

    #[test]
    fn test_unbalanced_by_one_cent() {
        let a = account(AccountType::Expense);
        let coa = chart(&[a.clone()]);
        let result = validate_lines(
            &[
                JournalLineInput::debit(a.id, dec!(100.00)),
                JournalLineInput::credit(a.id, dec!(99.99)),
            ],
            |id| coa.get(&id).cloned(),
        );
        assert!(matches!(result, Err(LedgerError::Unbalanced { .. })));
    }

    #[test]
    fn test_empty_lines() {
        let result = validate_lines(&[], |_| None);
        assert!(matches!(result, Err(LedgerError::NoLines)));
    }

    #[test]
    fn test_line_amount_rules() {
        let id = AccountId::new();
        assert!(matches!(
            validate_line_amounts(2, &JournalLineInput::debit(id, dec!(0))),
            Err(LedgerError::ZeroAmount { line: 2 })
        ));
        assert!(matches!(
            validate_line_amounts(0, &JournalLineInput::credit(id, dec!(-5))),
            Err(LedgerError::NegativeAmount { line: 0 })
        ));
        let both = JournalLineInput {
            credit: dec!(1),
            ..JournalLineInput::debit(id, dec!(1))
        };
        assert!(matches!(
            validate_line_amounts(1, &both),
            Err(LedgerError::BothSides { line: 1 })
        ));
    }

    #[test]
    fn test_amount_precision_limit() {
        let id = AccountId::new();
        assert!(validate_line_amounts(0, &JournalLineInput::debit(id, dec!(0.0001))).is_ok());
        assert!(validate_line_amounts(0, &JournalLineInput::debit(id, dec!(12.50000))).is_ok());
        assert!(matches!(
            validate_line_amounts(3, &JournalLineInput::credit(id, dec!(0.00004))),
            Err(LedgerError::AmountPrecision { line: 3 })
        ));
    }

    #[test]
    fn test_amount_magnitude_limit() {
        let id = AccountId::new();
        assert!(
            validate_line_amounts(0, &JournalLineInput::debit(id, dec!(999999999999999.9999)))
                .is_ok()
        );
        assert!(matches!(
            validate_line_amounts(1, &JournalLineInput::debit(id, dec!(1000000000000000))),
            Err(LedgerError::AmountOutOfRange { line: 1 })
        ));
    }

    #[test]
    fn test_sub_precision_lines_rejected_before_balancing() {
        let a = account(AccountType::Expense);
        let b = account(AccountType::Liability);
        let coa = chart(&[a.clone(), b.clone()]);
        let result = validate_lines(
            &[
                JournalLineInput::debit(a.id, dec!(0.00004)),
                JournalLineInput::debit(a.id, dec!(0.00004)),
                JournalLineInput::credit(b.id, dec!(0.00008)),
            ],
            |id| coa.get(&id).cloned(),
        );
        assert!(matches!(result, Err(LedgerError::AmountPrecision { line: 0 })));
    }

    #[test]
    fn test_max_decimal_lines_return_error() {
        let a = account(AccountType::Expense);
        let b = account(AccountType::Liability);
        let coa = chart(&[a.clone(), b.clone()]);
        let result = validate_lines(
            &[
                JournalLineInput::debit(a.id, Decimal::MAX),
                JournalLineInput::debit(a.id, Decimal::MAX),
                JournalLineInput::credit(b.id, Decimal::MAX),
                JournalLineInput::credit(b.id, Decimal::MAX),
            ],
            |id| coa.get(&id).cloned(),
        );
        assert!(matches!(result, Err(LedgerError::AmountOutOfRange { line: 0 })));
    }

    #[test]
    fn test_storable_amount() {
        assert!(is_storable_amount(dec!(-250.75)));
        assert!(!is_storable_amount(dec!(-1000000000000000)));
        assert!(!is_storable_amount(dec!(1.23456)));
    }

    #[test]
    fn test_account_rules() {
        let mut inactive = account(AccountType::Asset);
        inactive.is_active = false;
        let mut control = account(AccountType::Liability);
        control.allow_direct_posting = false;
        let coa = chart(&[inactive.clone(), control.clone()]);
        let lookup = |id| coa.get(&id).cloned();

        assert!(matches!(
            validate_account(inactive.id, &lookup),
            Err(LedgerError::AccountInactive(_))
        ));
        assert!(matches!(
            validate_account(control.id, &lookup),
            Err(LedgerError::AccountNoDirectPosting(_))
        ));
        assert!(matches!(
            validate_account(AccountId::new(), &lookup),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_requires_final_post() {
        let plain = account(AccountType::Expense);
        let mut restricted = account(AccountType::Equity);
        restricted.requires_final_post = true;
        let coa = chart(&[plain.clone(), restricted.clone()]);

        let lines = [
            JournalLineInput::debit(plain.id, dec!(10)),
            JournalLineInput::credit(restricted.id, dec!(10)),
        ];
        assert!(requires_final_post(&lines, |id| coa.get(&id).cloned()));
        assert!(!requires_final_post(&lines[..1], |id| coa.get(&id).cloned()));
    }

    #[test]
    fn test_expect_type() {
        let bank = account(AccountType::Asset);
        assert!(bank.expect_type(AccountType::Asset).is_ok());
        assert!(matches!(
            bank.expect_type(AccountType::Expense),
            Err(LedgerError::AccountTypeMismatch { .. })
        ));
    }
}

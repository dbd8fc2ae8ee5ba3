use thiserror::Error;

pub type Result<T> = std::result::Result<T, FinanceError>;

/// Error type covering configuration, readiness, domain, numerical and referential
/// failures raised while building a capital project.
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown financial parameter `{name}`{}", suggestion.as_ref().map(|s| format!(" (did you mean `{s}`?)")).unwrap_or_default())]
    UnknownParameter {
        name: String,
        suggestion: Option<String>,
    },
    #[error("Parameter `{name}` expects a {expected} value, got {found}")]
    ParameterType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Parameter `{name}` is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Parameter `{0}` has not been set")]
    MissingParameter(String),

    #[error("Project is not ready for assembly; missing: {missing}")]
    NotReady { missing: String },

    #[error("Capital item `{item}` has bad depreciation input: {reason}")]
    BadCapitalDepreciationInput { item: String, reason: String },
    #[error("Capital item `{item}` cannot compute installed cost: {reason}")]
    BadCapitalTicInput { item: String, reason: String },
    #[error("Capital item `{item}` has bad payment terms: {reason}")]
    BadCapitalPaymentInput { item: String, reason: String },
    #[error("Debt `{debt}` is invalid: {reason}")]
    BadDebtInput { debt: String, reason: String },
    #[error("`{object}` is missing required field `{field}`")]
    MissingInfo { object: String, field: String },
    #[error("Expense `{name}` is invalid: {reason}")]
    BadExpenseInput { name: String, reason: String },
    #[error("Pricing input is invalid: {0}")]
    BadPricingInput(String),
    #[error("Tax `{tax}` is underdefined: {reason}")]
    TaxUnderdefined { tax: String, reason: String },

    #[error("No root found for IRR between {lower} and {upper}")]
    NoRootFound { lower: f64, upper: f64 },
    #[error("Division by zero: {0}")]
    DivisionByZero(String),
    #[error("Incompatible units `{left}` and `{right}`")]
    IncompatibleUnits { left: String, right: String },

    #[error("Duplicate name `{name}` in {collection}")]
    DuplicateName { collection: String, name: String },
    #[error("Tax manager error: {0}")]
    TaxManager(String),
    #[error("Expense `{expense}` references unknown production stream `{product}`")]
    UnknownProduct { expense: String, product: String },

    #[error("Ledger has no column `{0}`")]
    MissingColumn(String),
    #[error("Column `{column}` has {found} values but the ledger has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid date window: {0}")]
    InvalidWindow(String),
}

impl FinanceError {
    pub(crate) fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FinanceError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_info(object: impl Into<String>, field: impl Into<String>) -> Self {
        FinanceError::MissingInfo {
            object: object.into(),
            field: field.into(),
        }
    }
}

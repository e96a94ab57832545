#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{
    __path_add_expense_handler, __path_list_expenses_handler, __path_list_payments_handler,
};
use crate::models::{PaymentRecord, PaymentStatus};
use eventpay_common::{Amount, ExpenseDto, ExpenseRecord};

#[derive(OpenApi)]
#[openapi(
    paths(add_expense_handler, list_expenses_handler, list_payments_handler),
    components(schemas(Amount, ExpenseRecord, ExpenseDto, PaymentRecord, PaymentStatus)),
    tags((name = "Ledger", description = "Event expenses and payment records"))
)]
pub struct LedgerApiDoc;

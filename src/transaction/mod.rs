//! Transactions: the data model, the new transaction form, the transaction
//! list on the home page and the endpoints for adding and deleting.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod form;
mod home_page;
mod view;

pub use core::{NewTransaction, Transaction, TransactionId};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::{delete_transaction_endpoint, get_confirm_delete_row, get_transaction_row};
pub use form::{CATEGORY_OPTIONS, merchant_options, transaction_form_endpoint};
pub use home_page::get_home_page;

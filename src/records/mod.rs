pub mod client;
pub mod collateral;
pub mod document;
pub mod loan;
pub mod payment;
pub mod user;

pub use client::Client;
pub use collateral::{Evaluation, Guarantee};
pub use document::{Document, DocumentOwner};
pub use loan::Loan;
pub use payment::Payment;
pub use user::User;
